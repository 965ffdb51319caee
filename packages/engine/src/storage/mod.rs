//! SQLite 本地存储模块
//!
//! 提供单机版闪卡数据的本地持久化，支持：
//! - 卡片及其 SRS 调度状态的存取
//! - 文件夹 / 卡组的分组管理
//! - 到期卡片查询（复习队列的数据来源）
//! - 会话快照与备份导入导出

// ============================================================
// 子模块声明
// ============================================================

pub mod backup;
pub mod card;
pub mod collection;
pub mod meta;
pub mod migrations;
pub mod models;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use backup::{BackupDocument, BackupManager, ImportSummary};
pub use card::{CardRepository, StudyScope, StudyStats};
pub use collection::CollectionRepository;
pub use meta::MetaRepository;
pub use migrations::run_migrations;
pub use models::{Card, CardSet, Folder};

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// 底层数据库不可用或语句执行失败
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// DatabaseManager - 数据库连接管理器
// ============================================================

/// 数据库连接管理器
///
/// 打开（或创建）数据库文件，设置 pragma 并运行迁移。
/// 连接经 `Arc<Mutex<_>>` 共享给各仓储。
pub struct DatabaseManager {
    connection: Arc<Mutex<Connection>>,
    db_path: Option<String>,
}

impl DatabaseManager {
    /// 创建新的数据库管理器
    ///
    /// 自动启用 WAL 模式、外键约束，并运行数据库迁移。
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        let path_str = db_path.as_ref().to_string_lossy().to_string();
        let connection = Connection::open(&db_path)?;

        connection.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;

        let manager = Self {
            connection: Arc::new(Mutex::new(connection)),
            db_path: Some(path_str),
        };

        manager.initialize()?;

        Ok(manager)
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;

        connection.execute_batch("PRAGMA foreign_keys=ON;")?;

        let manager = Self {
            connection: Arc::new(Mutex::new(connection)),
            db_path: None,
        };

        manager.initialize()?;

        Ok(manager)
    }

    /// 运行迁移，把数据库结构升到当前版本
    fn initialize(&self) -> StorageResult<()> {
        let conn = self.lock()?;
        migrations::run_migrations(&conn)?;
        Ok(())
    }

    /// 获取共享连接（供仓储构造使用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.connection)
    }

    /// 数据库文件路径；内存库为 None
    pub fn db_path(&self) -> Option<&str> {
        self.db_path.as_deref()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_manager_migrates() {
        let db = DatabaseManager::in_memory().expect("Failed to open in-memory db");
        let conn = db.connection();
        let conn = conn.lock().expect("Failed to lock connection");

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('folder','card_set','card','meta')",
                [],
                |row| row.get(0),
            )
            .expect("Failed to query schema");

        assert_eq!(count, 4);
        assert!(db.db_path().is_none());
    }
}
