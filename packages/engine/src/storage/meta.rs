//! 键值 meta 存储
//!
//! 会话快照、界面偏好等少量状态以 JSON 值落在 meta 表里，
//! 按 key 存取。

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::storage::{StorageError, StorageResult};

/// meta 表仓储
pub struct MetaRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MetaRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 写入（或覆盖）一个键
    pub fn set_meta<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO meta (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            params![key, json],
        )?;
        Ok(())
    }

    /// 读取一个键；不存在返回 None
    pub fn get_meta<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let conn = self.get_conn()?;
        let json: Option<String> = conn
            .query_row("SELECT value FROM meta WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;

        match json {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// 删除一个键（不存在也算成功）
    pub fn delete_meta(&self, key: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM meta WHERE key = ?1", params![key])?;
        Ok(())
    }
}
