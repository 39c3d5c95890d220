// ==========================================
// 厨房成本控制系统 - 原料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（校验在后端服务层完成）
// 表: raw_material（name_key 为小写名称，保证大小写不敏感唯一）
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::raw_material::RawMaterial;
use crate::repository::error::{from_sql_id, to_sql_id, RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

/// 名称归一化键（去首尾空白 + 小写）
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

// ==========================================
// RawMaterialRepository - 原料仓储
// ==========================================
pub struct RawMaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RawMaterialRepository {
    /// 创建新的 RawMaterialRepository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<RawMaterial> {
        Ok(RawMaterial {
            id: from_sql_id(row.get(0)?),
            raw_material_name: row.get(1)?,
            unit_type: row.get(2)?,
            price_per_unit: row.get(3)?,
        })
    }

    /// 新增原料
    ///
    /// # 返回
    /// - Ok(u64): 新分配的 id
    /// - Err(UniqueConstraintViolation): 名称（忽略大小写）已存在
    pub fn insert(&self, raw_material_name: &str, unit_type: &str, price_per_unit: f64) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO raw_material (raw_material_name, name_key, unit_type, price_per_unit, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                raw_material_name.trim(),
                name_key(raw_material_name),
                unit_type,
                price_per_unit,
                now
            ],
        )?;
        Ok(from_sql_id(conn.last_insert_rowid()))
    }

    /// 更新原料
    ///
    /// # 返回
    /// - Err(NotFound): id 不存在
    /// - Err(UniqueConstraintViolation): 新名称与其他原料重复
    pub fn update(&self, id: u64, raw_material_name: &str, unit_type: &str, price_per_unit: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE raw_material
            SET raw_material_name = ?2, name_key = ?3, unit_type = ?4, price_per_unit = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                to_sql_id(id)?,
                raw_material_name.trim(),
                name_key(raw_material_name),
                unit_type,
                price_per_unit,
                Utc::now().to_rfc3339()
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RawMaterial".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除原料
    pub fn delete(&self, id: u64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM raw_material WHERE id = ?1", params![to_sql_id(id)?])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "RawMaterial".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: u64) -> RepositoryResult<Option<RawMaterial>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT id, raw_material_name, unit_type, price_per_unit FROM raw_material WHERE id = ?1",
                params![to_sql_id(id)?],
                Self::map_row,
            )
            .optional()?;
        Ok(result)
    }

    /// 按名称查询（忽略大小写）
    pub fn find_by_name(&self, raw_material_name: &str) -> RepositoryResult<Option<RawMaterial>> {
        let conn = self.get_conn()?;
        let result = conn
            .query_row(
                "SELECT id, raw_material_name, unit_type, price_per_unit FROM raw_material WHERE name_key = ?1",
                params![name_key(raw_material_name)],
                Self::map_row,
            )
            .optional()?;
        Ok(result)
    }

    /// 查询全部原料（按 id 升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<RawMaterial>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, raw_material_name, unit_type, price_per_unit FROM raw_material ORDER BY id",
        )?;
        let rows = stmt.query_map([], Self::map_row)?;

        let mut materials = Vec::new();
        for row in rows {
            materials.push(row?);
        }
        Ok(materials)
    }

    /// 原料总数
    pub fn count(&self) -> RepositoryResult<u64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM raw_material", [], |row| row.get(0))?;
        Ok(from_sql_id(count))
    }
}
