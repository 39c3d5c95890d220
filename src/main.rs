// ==========================================
// 厨房成本控制系统 - 命令行入口
// ==========================================
// 用法:
//   kitchen-cost-control [health|dashboard|seed-demo|cost <菜谱名> <份数> <售价>]
// 环境变量:
//   KITCHEN_COST_CONTROL_DB_PATH  数据库路径
//   KITCHEN_LOG_FORMAT=json       结构化日志
// ==========================================

use anyhow::{anyhow, Context};
use kitchen_cost_control::api::RawMaterialForm;
use kitchen_cost_control::app::{get_default_db_path, map_api_error_json, AppState};
use kitchen_cost_control::domain::{Ingredient, Recipe};
use kitchen_cost_control::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::var("KITCHEN_LOG_FORMAT").as_deref() == Ok("json") {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{} v{}", kitchen_cost_control::APP_NAME, kitchen_cost_control::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    state.start_background_tasks();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = run(&state, &args).await;

    state.shutdown().await;
    result
}

async fn run(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    match args.first().map(String::as_str).unwrap_or("dashboard") {
        "health" => {
            let status = state.health_api.check_now().await;
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        "seed-demo" => seed_demo(state).await?,
        "cost" => {
            let name = args.get(1).context("缺少菜谱名")?;
            let quantity: f64 = args.get(2).context("缺少份数")?.parse()?;
            let selling: f64 = args.get(3).map(|s| s.parse::<f64>()).transpose()?.unwrap_or(0.0);

            match state.cost_api.cost_report(name, quantity, selling).await {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(e) => println!("{}", map_api_error_json(&e)),
            }
        }
        _ => {
            match state.dashboard_api.get_stats().await {
                Ok(stats) => println!("{}", serde_json::to_string_pretty(&stats)?),
                Err(e) => println!("{}", map_api_error_json(&e)),
            }
            let summary = state.dashboard_api.production_summary(None)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

/// 写入一组演示数据（原料已存在时跳过）
async fn seed_demo(state: &AppState) -> anyhow::Result<()> {
    state.backend.setup_admin().await.map_err(|e| anyhow!(e))?;

    if !state.raw_material_api.list_raw_materials().await?.is_empty() {
        tracing::info!("已有原料数据，跳过演示数据写入");
        return Ok(());
    }

    let oil = state
        .raw_material_api
        .add_raw_material(&RawMaterialForm::new("Sunflower Oil", "L", "200"))
        .await?;
    let rice = state
        .raw_material_api
        .add_raw_material(&RawMaterialForm::new("Basmati Rice", "Kg", "60"))
        .await?;

    state
        .recipe_api
        .save_recipe(&Recipe {
            name: "Veg Fried Rice".to_string(),
            category: "Chinese".to_string(),
            portion_weight: 250.0,
            ingredients: vec![
                Ingredient {
                    raw_material_id: oil,
                    quantity_per_portion: 30.0,
                    unit: "ml".to_string(),
                },
                Ingredient {
                    raw_material_id: rice,
                    quantity_per_portion: 200.0,
                    unit: "g".to_string(),
                },
            ],
        })
        .await?;

    let record = state.production_api.record_production("Veg Fried Rice", 10.0).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
