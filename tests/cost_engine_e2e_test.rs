// ==========================================
// 成本计算端到端测试
// ==========================================
// 测试范围:
// 1. 后端原始成本（未换算单位）与校正后成本的差异
// 2. 缺价前置校验、无成本数据
// 3. 毛利报表、生产单与出库单
// ==========================================

mod helpers;

use kitchen_cost_control::api::ApiError;
use kitchen_cost_control::backend::KitchenBackend;
use kitchen_cost_control::engine::EngineError;
use helpers::api_test_helper::KitchenTestEnv;
use helpers::test_data_builder::RecipeBuilder;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[tokio::test]
async fn test_后端原始成本未换算单位() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    // 服务端直接 每份用量 × 份数 × 单价: 300 × 10 × 200 + 2 × 10 × 60
    let raw = env
        .backend
        .calculate_cost("Veg Pulao".to_string(), 10.0)
        .await
        .unwrap();
    let raw_total: f64 = raw.iter().map(|l| l.total_cost).sum();
    assert!(approx(raw_total, 601_200.0));
}

#[tokio::test]
async fn test_校正后成本_按原料单位换算() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let analysis = env.state.cost_api.calculate_cost("Veg Pulao", 10.0).await.unwrap();

    // 3000 ml → 3 L × 200 = 600；20 Kg × 60 = 1200
    assert_eq!(analysis.breakdown.len(), 2);
    assert!(approx(analysis.breakdown[0].total_cost, 600.0));
    assert!(approx(analysis.breakdown[0].cost_per_unit, 200.0));
    assert!(approx(analysis.breakdown[1].total_cost, 1200.0));
    assert!(approx(analysis.total_batch_cost, 1800.0));
    assert!(approx(analysis.cost_per_portion, 180.0));
}

#[tokio::test]
async fn test_成本报表_含毛利() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let report = env
        .state
        .cost_api
        .cost_report("Veg Pulao", 10.0, 250.0)
        .await
        .unwrap();

    assert!(approx(report.profit.profit_per_portion, 70.0));
    assert!(approx(report.profit.profit_percentage, 28.0));
    assert!(approx(report.profit.food_cost_percentage, 72.0));

    assert_eq!(report.lines.len(), 2);
    assert_eq!(report.lines[0].raw_material_name, "Sunflower Oil");
    assert_eq!(report.lines[0].quantity_display, "3 L");
    assert_eq!(report.lines[1].raw_material_name, "Basmati Rice");
    assert_eq!(report.lines[1].total_cost_display, "₹1200.00");
}

#[tokio::test]
async fn test_售价为零_毛利率为零() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let report = env
        .state
        .cost_api
        .cost_report("Veg Pulao", 1.0, 0.0)
        .await
        .unwrap();
    assert!(approx(report.profit.profit_per_portion, -180.0));
    assert_eq!(report.profit.profit_percentage, 0.0);
    assert_eq!(report.profit.food_cost_percentage, 0.0);
}

#[tokio::test]
async fn test_缺价原料_拒绝计算() {
    let env = KitchenTestEnv::new().unwrap();
    let seeded = env.seed_kitchen().await;
    let saffron = env.add_raw_material("Saffron", "g", "0").await;

    let recipe = RecipeBuilder::new("Kesari")
        .category("Special Item")
        .portion_weight(120.0)
        .ingredient(seeded.rice_id, 0.1, "Kg")
        .ingredient(saffron, 0.05, "g")
        .build();
    env.state.recipe_api.save_recipe(&recipe).await.unwrap();

    let err = env.state.cost_api.calculate_cost("Kesari", 4.0).await.unwrap_err();
    match err {
        ApiError::MissingCosts { names } => assert_eq!(names, vec!["Saffron".to_string()]),
        other => panic!("期望 MissingCosts，实际: {:?}", other),
    }
    // 前置校验失败时不调用 calculate_cost
    assert_eq!(env.backend.calls("calculate_cost"), 0);
}

#[tokio::test]
async fn test_无配料菜谱_无成本数据() {
    let env = KitchenTestEnv::new().unwrap();
    env.backend.inner().setup_admin().await.unwrap();

    // 绕过表单校验直接写入空配料菜谱
    let recipe = RecipeBuilder::new("Plain Water").category("Juice").build();
    env.backend.inner().add_recipe(recipe).await.unwrap();

    let err = env.state.cost_api.calculate_cost("Plain Water", 2.0).await.unwrap_err();
    assert!(matches!(err, ApiError::NoCostData));
}

#[tokio::test]
async fn test_份数非法() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    for quantity in [0.0, -3.0, f64::NAN] {
        let err = env
            .state
            .cost_api
            .calculate_cost("Veg Pulao", quantity)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Calculation(EngineError::InvalidQuantity(_))));
    }
    assert_eq!(env.backend.calls("calculate_production"), 0);
}

#[tokio::test]
async fn test_菜谱不存在_不重试() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let err = env.state.cost_api.calculate_cost("Ghost Curry", 1.0).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(env.backend.calls("calculate_production"), 1);
}

#[tokio::test]
async fn test_生产单_按展示单位格式化() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let sheet = env
        .state
        .production_api
        .production_sheet("Veg Pulao", 5.0)
        .await
        .unwrap();

    assert_eq!(sheet.recipe_name, "Veg Pulao");
    assert_eq!(sheet.lines.len(), 2);
    // 300 ml × 5 = 1500 ml → 1.5 L
    assert_eq!(sheet.lines[0].display, "1.5 L");
    assert_eq!(sheet.lines[1].display, "10 Kg");
}

#[tokio::test]
async fn test_出库单_记录生产并失效统计缓存() {
    let env = KitchenTestEnv::new().unwrap();
    env.seed_kitchen().await;

    let before = env.state.dashboard_api.get_stats().await.unwrap();
    assert_eq!(before.most_produced_item, "");

    let slip = env
        .state
        .production_api
        .store_issue_slip("Veg Pulao", 8.0)
        .await
        .unwrap();
    assert_eq!(slip.slip.recipe_name, "Veg Pulao");
    assert_eq!(slip.slip.production_quantity, 8.0);
    assert!(approx(slip.slip.ingredients[0].quantity_per_portion, 2400.0));

    let after = env.state.dashboard_api.get_stats().await.unwrap();
    assert_eq!(after.most_produced_item, "Veg Pulao");
    assert_eq!(env.backend.calls("get_dashboard_stats"), 2);
}
