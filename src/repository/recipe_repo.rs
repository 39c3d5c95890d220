// ==========================================
// 厨房成本控制系统 - 菜谱数据仓储
// ==========================================
// 表: recipe / recipe_ingredient / production_log
// 红线: 配料顺序即 position 顺序，读取时必须保持
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::recipe::{Ingredient, Recipe};
use crate::repository::error::{from_sql_id, to_sql_id, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// RecipeRepository - 菜谱仓储
// ==========================================
pub struct RecipeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RecipeRepository {
    /// 创建新的 RecipeRepository 实例（自动建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖菜谱（事务内替换全部配料行）
    ///
    /// # 参数
    /// - recipe: 完整菜谱，配料按给定顺序写入
    pub fn upsert(&self, recipe: &Recipe) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO recipe (name, category, portion_weight, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(name) DO UPDATE SET
                category = excluded.category,
                portion_weight = excluded.portion_weight,
                updated_at = excluded.updated_at
            "#,
            params![
                recipe.name,
                recipe.category,
                recipe.portion_weight,
                Utc::now().to_rfc3339()
            ],
        )?;

        tx.execute(
            "DELETE FROM recipe_ingredient WHERE recipe_name = ?1",
            params![recipe.name],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO recipe_ingredient (recipe_name, position, raw_material_id, quantity_per_portion, unit)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for (position, ing) in recipe.ingredients.iter().enumerate() {
                stmt.execute(params![
                    recipe.name,
                    position as i64,
                    to_sql_id(ing.raw_material_id)?,
                    ing.quantity_per_portion,
                    ing.unit
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 按名称查询菜谱（含有序配料）
    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<Recipe>> {
        let conn = self.get_conn()?;
        let header = conn
            .query_row(
                "SELECT name, category, portion_weight FROM recipe WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, f64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, category, portion_weight)) = header else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT raw_material_id, quantity_per_portion, unit
            FROM recipe_ingredient
            WHERE recipe_name = ?1
            ORDER BY position
            "#,
        )?;
        let rows = stmt.query_map(params![name], |row| {
            Ok(Ingredient {
                raw_material_id: from_sql_id(row.get(0)?),
                quantity_per_portion: row.get(1)?,
                unit: row.get(2)?,
            })
        })?;

        let mut ingredients = Vec::new();
        for row in rows {
            ingredients.push(row?);
        }

        Ok(Some(Recipe {
            name,
            category,
            portion_weight,
            ingredients,
        }))
    }

    /// 已使用的分类（去重、升序）
    pub fn list_categories(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT category FROM recipe ORDER BY category")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// 分类下的菜谱名称（升序）
    pub fn list_names_by_category(&self, category: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT name FROM recipe WHERE category = ?1 ORDER BY name")?;
        let rows = stmt.query_map(params![category], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for row in rows {
            names.push(row?);
        }
        Ok(names)
    }

    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipe", [], |row| row.get(0))?;
        Ok(from_sql_id(count))
    }

    // ==========================================
    // 生产日志（仪表盘统计来源）
    // ==========================================

    /// 记录一次生产（出库单生成时调用）
    pub fn log_production(&self, recipe_name: &str, quantity: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO production_log (recipe_name, quantity, logged_at) VALUES (?1, ?2, ?3)",
            params![recipe_name, quantity, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// 累计产量最高的菜谱（并列时取名称字典序最小者）
    pub fn most_produced(&self) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let name = conn
            .query_row(
                r#"
                SELECT recipe_name
                FROM production_log
                GROUP BY recipe_name
                ORDER BY SUM(quantity) DESC, recipe_name ASC
                LIMIT 1
                "#,
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RecipeRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        RecipeRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn recipe(name: &str, category: &str, ids: &[u64]) -> Recipe {
        Recipe {
            name: name.to_string(),
            category: category.to_string(),
            portion_weight: 250.0,
            ingredients: ids
                .iter()
                .map(|id| Ingredient {
                    raw_material_id: *id,
                    quantity_per_portion: *id as f64 * 10.0,
                    unit: "g".to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_upsert_保持配料顺序() {
        let repo = repo();
        repo.upsert(&recipe("Veg Pulao", "Lunch", &[3, 1, 2])).unwrap();

        let found = repo.find_by_name("Veg Pulao").unwrap().expect("应存在");
        let ids: Vec<u64> = found.ingredients.iter().map(|i| i.raw_material_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_upsert_覆盖已有菜谱() {
        let repo = repo();
        repo.upsert(&recipe("Idli", "Tiffin", &[1, 2])).unwrap();
        repo.upsert(&recipe("Idli", "Snacks", &[5])).unwrap();

        let found = repo.find_by_name("Idli").unwrap().unwrap();
        assert_eq!(found.category, "Snacks");
        assert_eq!(found.ingredients.len(), 1);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_categories_and_names() {
        let repo = repo();
        repo.upsert(&recipe("Vada", "Tiffin", &[1])).unwrap();
        repo.upsert(&recipe("Dosa", "Tiffin", &[1])).unwrap();
        repo.upsert(&recipe("Tomato Soup", "Soup", &[2])).unwrap();

        assert_eq!(repo.list_categories().unwrap(), vec!["Soup", "Tiffin"]);
        assert_eq!(repo.list_names_by_category("Tiffin").unwrap(), vec!["Dosa", "Vada"]);
        assert!(repo.list_names_by_category("Juice").unwrap().is_empty());
        assert!(repo.find_by_name("Missing").unwrap().is_none());
    }

    #[test]
    fn test_most_produced() {
        let repo = repo();
        assert_eq!(repo.most_produced().unwrap(), None);

        repo.log_production("Dosa", 20.0).unwrap();
        repo.log_production("Idli", 15.0).unwrap();
        repo.log_production("Idli", 10.0).unwrap();
        assert_eq!(repo.most_produced().unwrap().as_deref(), Some("Idli"));
    }
}
