// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use kitchen_cost_control::domain::{Ingredient, Recipe};

// ==========================================
// Recipe 构建器
// ==========================================

pub struct RecipeBuilder {
    name: String,
    category: String,
    portion_weight: f64,
    ingredients: Vec<Ingredient>,
}

impl RecipeBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            category: "Lunch".to_string(),
            portion_weight: 250.0,
            ingredients: Vec::new(),
        }
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn portion_weight(mut self, weight: f64) -> Self {
        self.portion_weight = weight;
        self
    }

    pub fn ingredient(mut self, raw_material_id: u64, quantity_per_portion: f64, unit: &str) -> Self {
        self.ingredients.push(Ingredient {
            raw_material_id,
            quantity_per_portion,
            unit: unit.to_string(),
        });
        self
    }

    pub fn build(self) -> Recipe {
        Recipe {
            name: self.name,
            category: self.category,
            portion_weight: self.portion_weight,
            ingredients: self.ingredients,
        }
    }
}
