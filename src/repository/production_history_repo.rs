// ==========================================
// 厨房成本控制系统 - 生产历史仓储
// ==========================================
// 表: production_history（配料明细以 JSON 存储）
// 记录只追加，不修改
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::production::{ConsumedIngredient, ProductionRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

pub struct ProductionHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionHistoryRepository {
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

    /// 追加一条生产记录
    pub fn append(&self, record: &ProductionRecord) -> RepositoryResult<()> {
        let ingredients_json = serde_json::to_string(&record.ingredients)?;
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO production_history
                (record_id, produced_at, production_date, recipe_name, quantity, cost, ingredients_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.record_id,
                // 固定纳秒精度，保证按文本排序即按时间排序
                record.produced_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
                record.production_date().to_string(),
                record.recipe_name,
                record.quantity,
                record.cost,
                ingredients_json
            ],
        )?;
        Ok(())
    }

    /// 全部记录（按生产时间升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, produced_at, recipe_name, quantity, cost, ingredients_json
            FROM production_history
            ORDER BY produced_at, record_id
            "#,
        )?;
        let rows = stmt.query_map([], Self::read_row)?;
        Self::collect(rows)
    }

    /// 指定日期（UTC）的记录
    pub fn list_for_date(&self, date: NaiveDate) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT record_id, produced_at, recipe_name, quantity, cost, ingredients_json
            FROM production_history
            WHERE production_date = ?1
            ORDER BY produced_at, record_id
            "#,
        )?;
        let rows = stmt.query_map(params![date.to_string()], Self::read_row)?;
        Self::collect(rows)
    }

    /// 清空历史
    ///
    /// # 返回
    /// - Ok(usize): 删除的记录数
    pub fn clear(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM production_history", [])?;
        Ok(affected)
    }

    // 行 → 原始字段（JSON/时间解析在 collect 中完成，以便返回 RepositoryError）
    fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
        Ok(RawRow {
            record_id: row.get(0)?,
            produced_at: row.get(1)?,
            recipe_name: row.get(2)?,
            quantity: row.get(3)?,
            cost: row.get(4)?,
            ingredients_json: row.get(5)?,
        })
    }

    fn collect(
        rows: impl Iterator<Item = rusqlite::Result<RawRow>>,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }
}

struct RawRow {
    record_id: String,
    produced_at: String,
    recipe_name: String,
    quantity: f64,
    cost: f64,
    ingredients_json: String,
}

impl RawRow {
    fn into_record(self) -> RepositoryResult<ProductionRecord> {
        let produced_at = DateTime::parse_from_rfc3339(&self.produced_at)
            .map_err(|e| RepositoryError::FieldValueError {
                field: "produced_at".to_string(),
                message: e.to_string(),
            })?
            .with_timezone(&Utc);
        let ingredients: Vec<ConsumedIngredient> = serde_json::from_str(&self.ingredients_json)?;

        Ok(ProductionRecord {
            record_id: self.record_id,
            produced_at,
            recipe_name: self.recipe_name,
            quantity: self.quantity,
            cost: self.cost,
            ingredients,
        })
    }
}
