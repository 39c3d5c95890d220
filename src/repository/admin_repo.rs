// ==========================================
// 厨房成本控制系统 - 管理员初始化仓储
// ==========================================
// 表: admin_setup（单行，id 恒为 1）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct AdminRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AdminRepository {
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 标记管理员已初始化（幂等）
    pub fn mark_set_up(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO admin_setup (id, set_up_at) VALUES (1, ?1)",
            params![Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn is_set_up(&self) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row("SELECT 1 FROM admin_setup WHERE id = 1", [], |_row| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }
}
