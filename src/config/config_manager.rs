// ==========================================
// 厨房成本控制系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 规则: 值缺失或格式错误时回退默认值（记录 warn）
// ==========================================

use crate::config::supervisor_config::{
    HealthMonitorConfig, RetryConfig, DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
    DEFAULT_HEALTH_INTERVAL_HEALTHY_MS, DEFAULT_HEALTH_INTERVAL_UNHEALTHY_MS,
    DEFAULT_HEALTH_MAX_RETRY_COUNT, DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_MAX_ATTEMPTS,
    DEFAULT_RETRY_MAX_DELAY_MS,
};
use crate::db::{ensure_schema, open_sqlite_connection};
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取并解析数值配置；缺失或无法解析时返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): 配置快照的JSON字符串
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名 global 配置，快照中没有的键保持不变
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            let affected = tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
            count += affected;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 可用性监督配置 =====

    /// 获取重试退避配置
    pub fn get_retry_config(&self) -> Result<RetryConfig, Box<dyn Error>> {
        let base_delay_ms =
            self.get_parsed_or_default(config_keys::RETRY_BASE_DELAY_MS, DEFAULT_RETRY_BASE_DELAY_MS)?;
        let max_delay_ms =
            self.get_parsed_or_default(config_keys::RETRY_MAX_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS)?;
        let max_retries =
            self.get_parsed_or_default(config_keys::RETRY_MAX_ATTEMPTS, DEFAULT_RETRY_MAX_ATTEMPTS)?;

        Ok(RetryConfig {
            base_delay_ms,
            // 上限不得小于基数
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            max_retries,
        })
    }

    /// 获取健康监测配置
    pub fn get_health_monitor_config(&self) -> Result<HealthMonitorConfig, Box<dyn Error>> {
        Ok(HealthMonitorConfig {
            healthy_interval_ms: self.get_parsed_or_default(
                config_keys::HEALTH_INTERVAL_HEALTHY_MS,
                DEFAULT_HEALTH_INTERVAL_HEALTHY_MS,
            )?,
            unhealthy_interval_ms: self.get_parsed_or_default(
                config_keys::HEALTH_INTERVAL_UNHEALTHY_MS,
                DEFAULT_HEALTH_INTERVAL_UNHEALTHY_MS,
            )?,
            max_retry_count: self.get_parsed_or_default(
                config_keys::HEALTH_MAX_RETRY_COUNT,
                DEFAULT_HEALTH_MAX_RETRY_COUNT,
            )?,
            check_timeout_ms: self.get_parsed_or_default(
                config_keys::HEALTH_CHECK_TIMEOUT_MS,
                DEFAULT_HEALTH_CHECK_TIMEOUT_MS,
            )?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // ===== 重试退避 =====
    pub const RETRY_BASE_DELAY_MS: &str = "retry_base_delay_ms";
    pub const RETRY_MAX_DELAY_MS: &str = "retry_max_delay_ms";
    pub const RETRY_MAX_ATTEMPTS: &str = "retry_max_attempts";

    // ===== 健康监测 =====
    pub const HEALTH_INTERVAL_HEALTHY_MS: &str = "health_interval_healthy_ms";
    pub const HEALTH_INTERVAL_UNHEALTHY_MS: &str = "health_interval_unhealthy_ms";
    pub const HEALTH_MAX_RETRY_COUNT: &str = "health_max_retry_count";
    pub const HEALTH_CHECK_TIMEOUT_MS: &str = "health_check_timeout_ms";
}
