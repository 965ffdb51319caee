//! # shengci-engine - 本地学习引擎
//!
//! 单机版闪卡学习的核心引擎：
//!
//! - **存储** ([`storage`]) - SQLite 本地库、文件夹/卡组/卡片 CRUD、
//!   到期卡片查询、键值 meta、备份导入导出
//! - **会话** ([`session`]) - 显式的复习会话上下文与快照
//! - **学习服务** ([`study`]) - 评分动作的完整闭环：
//!   计算 → 写回 → 重查 → 收敛位置
//!
//! 调度算法本身在 `shengci-algo`，本 crate 只负责把它接到数据上。
//! 界面层（标签页、渲染、手势）是外部协作方，不在此 crate 内。
//!
//! ## 使用示例
//!
//! ```rust
//! use shengci_engine::storage::{CollectionRepository, DatabaseManager, StudyScope};
//! use shengci_engine::study::StudyService;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseManager::in_memory()?;
//!
//! let collections = CollectionRepository::new(db.connection());
//! let folder = collections.add_folder("日常")?;
//! let set = collections.add_set(&folder.id, "水果")?;
//!
//! // 尚未添加卡片，复习队列为空
//! let service = StudyService::new(&db, StudyScope::Set(set.id.clone()))?;
//! assert!(service.due_list().is_empty());
//! # Ok(())
//! # }
//! ```

pub mod session;
pub mod storage;
pub mod study;

pub use session::SessionContext;
pub use storage::{
    BackupDocument, BackupManager, Card, CardRepository, CardSet, CollectionRepository,
    DatabaseManager, Folder, MetaRepository, StorageError, StorageResult, StudyScope, StudyStats,
};
pub use study::{StudyError, StudyResult, StudyService};
