//! 备份导入导出
//!
//! 把整个库（文件夹、卡组、卡片连同 SRS 状态）导出为单个 JSON
//! 文档，或从文档整体恢复。恢复在一个事务里完成：先清空再写入，
//! 失败则回滚，库保持原样。

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::storage::models::{Card, CardSet, Folder};
use crate::storage::{CardRepository, CollectionRepository, StorageError, StorageResult};

/// 备份文档格式版本
pub const BACKUP_FORMAT_VERSION: i32 = 1;

/// 备份文档
///
/// 卡片记录原样透传，不做任何调度语义上的变换。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    /// 文档格式版本
    pub format_version: i32,
    /// 导出时间
    pub exported_at: DateTime<Utc>,
    pub folders: Vec<Folder>,
    pub sets: Vec<CardSet>,
    pub cards: Vec<Card>,
}

/// 导入结果统计
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    pub folders: usize,
    pub sets: usize,
    pub cards: usize,
}

/// 备份管理器
pub struct BackupManager {
    conn: Arc<Mutex<Connection>>,
}

impl BackupManager {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 导出全部数据
    pub fn export_all(&self) -> StorageResult<BackupDocument> {
        let collections = CollectionRepository::new(Arc::clone(&self.conn));
        let cards = CardRepository::new(Arc::clone(&self.conn));

        Ok(BackupDocument {
            format_version: BACKUP_FORMAT_VERSION,
            exported_at: Utc::now(),
            folders: collections.get_all_folders()?,
            sets: collections.get_all_sets()?,
            cards: cards.get_all_cards()?,
        })
    }

    /// 从备份文档整体恢复，替换现有内容
    pub fn import_all(&self, doc: &BackupDocument) -> StorageResult<ImportSummary> {
        if doc.format_version > BACKUP_FORMAT_VERSION {
            return Err(StorageError::Serialization(format!(
                "不支持的备份格式版本: {}",
                doc.format_version
            )));
        }

        let mut conn = self
            .conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))?;
        let tx = conn.transaction()?;

        // 子表先清，避开外键约束的顺序问题
        tx.execute("DELETE FROM card", [])?;
        tx.execute("DELETE FROM card_set", [])?;
        tx.execute("DELETE FROM folder", [])?;

        for folder in &doc.folders {
            folder.insert(&tx)?;
        }
        for set in &doc.sets {
            set.insert(&tx)?;
        }
        for card in &doc.cards {
            card.upsert(&tx)?;
        }

        tx.commit()?;

        let summary = ImportSummary {
            folders: doc.folders.len(),
            sets: doc.sets.len(),
            cards: doc.cards.len(),
        };
        log::info!(
            "备份导入完成: {} 文件夹, {} 卡组, {} 卡片",
            summary.folders,
            summary.sets,
            summary.cards
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::migrations;
    use crate::storage::StudyScope;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory connection");
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .expect("Failed to set pragma");
        migrations::run_migrations(&conn).expect("Failed to run migrations");
        Arc::new(Mutex::new(conn))
    }

    fn seed(conn: &Arc<Mutex<Connection>>) -> (Folder, CardSet, Card) {
        let collections = CollectionRepository::new(Arc::clone(conn));
        let cards = CardRepository::new(Arc::clone(conn));

        let folder = collections.add_folder("日常").expect("Failed to add folder");
        let set = collections
            .add_set(&folder.id, "水果")
            .expect("Failed to add set");
        let card = Card::new(&set.id, "apple", "蘋果", Utc::now());
        cards.save_card(&card).expect("Failed to save card");

        (folder, set, card)
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = setup_test_db();
        let (_, _, card) = seed(&source);

        let doc = BackupManager::new(Arc::clone(&source))
            .export_all()
            .expect("Failed to export");

        // JSON 串行化后再还原，模拟写盘读盘
        let json = serde_json::to_string_pretty(&doc).expect("Failed to serialize");
        let parsed: BackupDocument = serde_json::from_str(&json).expect("Failed to parse");

        let target = setup_test_db();
        let summary = BackupManager::new(Arc::clone(&target))
            .import_all(&parsed)
            .expect("Failed to import");

        assert_eq!(summary.folders, 1);
        assert_eq!(summary.sets, 1);
        assert_eq!(summary.cards, 1);

        let cards = CardRepository::new(target);
        let restored = cards
            .get_card(&card.id)
            .expect("Failed to get card")
            .expect("Card not found");
        assert_eq!(restored.term, "apple");
        assert_eq!(restored.srs.interval_days, card.srs.interval_days);
    }

    #[test]
    fn test_import_replaces_existing_content() {
        let db = setup_test_db();
        seed(&db);

        let empty = BackupDocument {
            format_version: BACKUP_FORMAT_VERSION,
            exported_at: Utc::now(),
            folders: vec![],
            sets: vec![],
            cards: vec![],
        };

        BackupManager::new(Arc::clone(&db))
            .import_all(&empty)
            .expect("Failed to import");

        let cards = CardRepository::new(Arc::clone(&db));
        assert_eq!(cards.count_all().expect("Failed to count"), 0);
        assert!(cards
            .get_due_cards(&StudyScope::All, Utc::now())
            .expect("Failed to query")
            .is_empty());
    }

    #[test]
    fn test_import_rejects_newer_format() {
        let db = setup_test_db();
        let doc = BackupDocument {
            format_version: BACKUP_FORMAT_VERSION + 1,
            exported_at: Utc::now(),
            folders: vec![],
            sets: vec![],
            cards: vec![],
        };

        let err = BackupManager::new(db).import_all(&doc).unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
