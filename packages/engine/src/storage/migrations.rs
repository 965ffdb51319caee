//! 数据库迁移模块
//!
//! 管理 SQLite 数据库的版本迁移。
//!
//! ## 迁移策略
//! - 每个迁移在独立事务中执行，失败即回滚该迁移
//! - 已应用的版本记录在 schema_migrations 表中，重复运行是幂等的

use rusqlite::Connection;

use crate::storage::{StorageError, StorageResult};

/// 当前数据库 schema 版本
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// 初始化 schema SQL (V1)
const INIT_SCHEMA: &str = include_str!("schema.sql");

/// 迁移记录
#[derive(Debug, Clone)]
pub struct Migration {
    /// 迁移版本号
    pub version: i32,
    /// 迁移名称/描述
    pub name: String,
    /// 迁移 SQL 语句
    pub sql: String,
}

impl Migration {
    pub fn new(version: i32, name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            sql: sql.into(),
        }
    }
}

/// 获取所有迁移定义，按版本号排序
pub fn get_migrations() -> Vec<Migration> {
    vec![
        // V1: 初始表结构
        Migration::new(1, "初始表结构", INIT_SCHEMA),
        // V2: 按卡组过滤到期查询的复合索引
        Migration::new(
            2,
            "到期查询复合索引",
            r#"
            CREATE INDEX IF NOT EXISTS idx_card_set_due ON card(set_id, due_at);
            "#,
        ),
    ]
}

/// 运行数据库迁移
///
/// 检查当前数据库版本并执行缺失的迁移脚本。
///
/// # Returns
/// * `StorageResult<i32>` - 成功返回最终版本号
pub fn run_migrations(conn: &Connection) -> StorageResult<i32> {
    ensure_migrations_table(conn)?;

    let applied_versions = get_applied_versions(conn)?;
    let mut final_version = applied_versions.iter().copied().max().unwrap_or(0);

    for migration in get_migrations() {
        if applied_versions.contains(&migration.version) {
            continue;
        }

        log::info!("运行迁移 v{}: {}", migration.version, migration.name);

        match execute_migration_in_transaction(conn, &migration) {
            Ok(()) => {
                final_version = migration.version;
            }
            Err(e) => {
                log::error!("迁移 v{} 失败: {}", migration.version, e);
                return Err(e);
            }
        }
    }

    Ok(final_version)
}

/// 确保迁移记录表存在
fn ensure_migrations_table(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;
    Ok(())
}

/// 已应用的迁移版本列表
fn get_applied_versions(conn: &Connection) -> StorageResult<Vec<i32>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let versions: Vec<i32> = stmt
        .query_map([], |row| row.get(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(versions)
}

/// 在事务中执行单个迁移
fn execute_migration_in_transaction(conn: &Connection, migration: &Migration) -> StorageResult<()> {
    conn.execute_batch("BEGIN IMMEDIATE")?;

    let result: StorageResult<()> = (|| {
        conn.execute_batch(&migration.sql)?;
        conn.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )?;
        Ok(())
    })();

    match result {
        Ok(()) => {
            conn.execute_batch("COMMIT")?;
            Ok(())
        }
        Err(e) => {
            if let Err(rollback_err) = conn.execute_batch("ROLLBACK") {
                return Err(StorageError::Migration(format!(
                    "迁移 v{} 失败 ({e})，回滚也失败: {rollback_err}",
                    migration.version
                )));
            }
            Err(e)
        }
    }
}
