//! 卡片数据库操作模块
//!
//! 提供 Card 的 CRUD、检索，以及作为复习队列数据来源的到期卡片查询。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::storage::models::{format_datetime, Card};
use crate::storage::{StorageError, StorageResult};

// ============================================================
// StudyScope - 到期查询范围
// ============================================================

/// 到期查询范围
///
/// 选择器的范围过滤条件：全部、某个卡组，或某个文件夹下的
/// 全部卡组。范围只做划分，不携带任何调度语义。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StudyScope {
    /// 全部卡片
    All,
    /// 指定卡组
    Set(String),
    /// 指定文件夹下的所有卡组
    Folder(String),
}

impl Default for StudyScope {
    fn default() -> Self {
        Self::All
    }
}

// ============================================================
// StudyStats - 学习统计
// ============================================================

/// 首页统计数据
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StudyStats {
    /// 卡片总数
    pub total_cards: i64,
    /// 当前到期数
    pub due_cards: i64,
}

// ============================================================
// CardRepository - 卡片仓储
// ============================================================

/// 卡片仓储
pub struct CardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CardRepository {
    /// 创建新的仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    // ========== 基本 CRUD 操作 ==========

    /// 根据 ID 获取卡片
    pub fn get_card(&self, id: &str) -> StorageResult<Option<Card>> {
        let conn = self.get_conn()?;
        let card = conn
            .query_row("SELECT * FROM card WHERE id = ?1", params![id], |row| {
                Card::from_row(row)
            })
            .optional()?;
        Ok(card)
    }

    /// 保存卡片（按 id 插入或整条替换）
    pub fn save_card(&self, card: &Card) -> StorageResult<()> {
        let conn = self.get_conn()?;
        card.upsert(&conn)
    }

    /// 删除卡片
    pub fn delete_card(&self, id: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM card WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("card {id}")));
        }
        Ok(())
    }

    /// 获取卡组内所有卡片，按词条排序（词库表格视图）
    pub fn get_cards_by_set(&self, set_id: &str) -> StorageResult<Vec<Card>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT * FROM card WHERE set_id = ?1 ORDER BY term COLLATE NOCASE")?;

        let cards: Vec<Card> = stmt
            .query_map(params![set_id], |row| Card::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(cards)
    }

    /// 获取全部卡片（备份导出用）
    pub fn get_all_cards(&self) -> StorageResult<Vec<Card>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT * FROM card ORDER BY id")?;

        let cards: Vec<Card> = stmt
            .query_map([], |row| Card::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(cards)
    }

    /// 按词条或释义模糊检索
    pub fn search_cards(&self, query: &str, limit: i32) -> StorageResult<Vec<Card>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", query);

        let mut stmt = conn.prepare(
            r#"
            SELECT * FROM card
            WHERE term LIKE ?1 OR definition LIKE ?1
            ORDER BY term COLLATE NOCASE
            LIMIT ?2
            "#,
        )?;

        let cards: Vec<Card> = stmt
            .query_map(params![pattern, limit], |row| Card::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(cards)
    }

    /// 卡片总数
    pub fn count_all(&self) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM card", [], |row| row.get(0))?;
        Ok(count)
    }

    // ========== 到期查询（Due-Set Selector） ==========

    /// 获取范围内所有到期卡片
    ///
    /// 谓词：`due_at <= now` 且落在范围内。排序 `due_at ASC, id ASC`，
    /// 对相同输入重复查询结果一致。每次评分之后必须重新查询。
    pub fn get_due_cards(&self, scope: &StudyScope, now: DateTime<Utc>) -> StorageResult<Vec<Card>> {
        let conn = self.get_conn()?;
        let now_str = format_datetime(now);

        let cards: Vec<Card> = match scope {
            StudyScope::All => {
                let mut stmt = conn.prepare(
                    "SELECT * FROM card WHERE due_at <= ?1 ORDER BY due_at ASC, id ASC",
                )?;
                let rows = stmt
                    .query_map(params![now_str], |row| Card::from_row(row))?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
            StudyScope::Set(set_id) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT * FROM card
                    WHERE set_id = ?1 AND due_at <= ?2
                    ORDER BY due_at ASC, id ASC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![set_id, now_str], |row| Card::from_row(row))?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
            StudyScope::Folder(folder_id) => {
                let mut stmt = conn.prepare(
                    r#"
                    SELECT card.* FROM card
                    JOIN card_set ON card.set_id = card_set.id
                    WHERE card_set.folder_id = ?1 AND card.due_at <= ?2
                    ORDER BY card.due_at ASC, card.id ASC
                    "#,
                )?;
                let rows = stmt
                    .query_map(params![folder_id, now_str], |row| Card::from_row(row))?
                    .filter_map(|r| r.ok())
                    .collect();
                rows
            }
        };

        Ok(cards)
    }

    /// 范围内到期卡片数
    pub fn count_due(&self, scope: &StudyScope, now: DateTime<Utc>) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        let now_str = format_datetime(now);

        let count = match scope {
            StudyScope::All => conn.query_row(
                "SELECT COUNT(*) FROM card WHERE due_at <= ?1",
                params![now_str],
                |row| row.get(0),
            )?,
            StudyScope::Set(set_id) => conn.query_row(
                "SELECT COUNT(*) FROM card WHERE set_id = ?1 AND due_at <= ?2",
                params![set_id, now_str],
                |row| row.get(0),
            )?,
            StudyScope::Folder(folder_id) => conn.query_row(
                r#"
                SELECT COUNT(*) FROM card
                JOIN card_set ON card.set_id = card_set.id
                WHERE card_set.folder_id = ?1 AND card.due_at <= ?2
                "#,
                params![folder_id, now_str],
                |row| row.get(0),
            )?,
        };

        Ok(count)
    }

    /// 首页统计：总数与到期数
    pub fn get_stats(&self, scope: &StudyScope, now: DateTime<Utc>) -> StorageResult<StudyStats> {
        Ok(StudyStats {
            total_cards: self.count_all()?,
            due_cards: self.count_due(scope, now)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{CardSet, Folder};
    use crate::storage::migrations;
    use chrono::Duration;

    fn setup_test_db() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().expect("Failed to open in-memory connection");
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .expect("Failed to set pragma");
        migrations::run_migrations(&conn).expect("Failed to run migrations");
        Arc::new(Mutex::new(conn))
    }

    fn seed_set(conn: &Arc<Mutex<Connection>>, folder_name: &str, set_name: &str) -> CardSet {
        let guard = conn.lock().expect("Failed to lock connection");
        let now = Utc::now();
        let folder = Folder::new(folder_name, now);
        folder.insert(&guard).expect("Failed to insert folder");
        let set = CardSet::new(&folder.id, set_name, now);
        set.insert(&guard).expect("Failed to insert set");
        set
    }

    fn card_due_at(set_id: &str, term: &str, due_at: DateTime<Utc>) -> Card {
        let mut card = Card::new(set_id, term, "釋義", Utc::now());
        card.srs.due_at = due_at;
        card
    }

    #[test]
    fn test_save_and_get_card() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);

        let mut card = Card::new(&set.id, "apple", "蘋果", Utc::now());
        card.tags = vec!["fruit".to_string()];
        repo.save_card(&card).expect("Failed to save card");

        let retrieved = repo
            .get_card(&card.id)
            .expect("Failed to get card")
            .expect("Card not found");

        assert_eq!(retrieved.term, "apple");
        assert_eq!(retrieved.tags, vec!["fruit".to_string()]);
        assert_eq!(retrieved.srs.repetitions, 0);
    }

    #[test]
    fn test_put_replaces_whole_record() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);

        let mut card = Card::new(&set.id, "apple", "蘋果", Utc::now());
        repo.save_card(&card).expect("Failed to save card");

        card.definition = "蘋果 (水果)".to_string();
        card.srs.repetitions = 3;
        card.srs.interval_days = 8;
        repo.save_card(&card).expect("Failed to replace card");

        let retrieved = repo
            .get_card(&card.id)
            .expect("Failed to get card")
            .expect("Card not found");
        assert_eq!(retrieved.definition, "蘋果 (水果)");
        assert_eq!(retrieved.srs.repetitions, 3);
        assert_eq!(repo.count_all().expect("Failed to count"), 1);
    }

    #[test]
    fn test_delete_missing_card_is_not_found() {
        let conn = setup_test_db();
        let repo = CardRepository::new(conn);

        let err = repo.delete_card("no-such-id").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn test_due_query_predicate() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);
        let now = Utc::now();

        let overdue = card_due_at(&set.id, "old", now - Duration::hours(2));
        let due_now = card_due_at(&set.id, "now", now);
        let future = card_due_at(&set.id, "later", now + Duration::days(3));
        for card in [&overdue, &due_now, &future] {
            repo.save_card(card).expect("Failed to save card");
        }

        let due = repo
            .get_due_cards(&StudyScope::All, now)
            .expect("Failed to query due cards");

        let ids: Vec<&str> = due.iter().map(|c| c.id.as_str()).collect();
        assert!(ids.contains(&overdue.id.as_str()));
        assert!(ids.contains(&due_now.id.as_str()));
        assert!(!ids.contains(&future.id.as_str()));
        // 最早到期的排最前
        assert_eq!(due[0].id, overdue.id);
    }

    #[test]
    fn test_due_query_scope_filter() {
        let conn = setup_test_db();
        let set_a = seed_set(&conn, "folder-a", "set-a");
        let set_b = seed_set(&conn, "folder-b", "set-b");
        let repo = CardRepository::new(Arc::clone(&conn));
        let now = Utc::now();

        let in_a = card_due_at(&set_a.id, "a", now - Duration::hours(1));
        let in_b = card_due_at(&set_b.id, "b", now - Duration::hours(1));
        repo.save_card(&in_a).expect("Failed to save card");
        repo.save_card(&in_b).expect("Failed to save card");

        let scoped = repo
            .get_due_cards(&StudyScope::Set(set_a.id.clone()), now)
            .expect("Failed to query due cards");
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].id, in_a.id);

        let folder_scoped = repo
            .get_due_cards(&StudyScope::Folder(set_b.folder_id.clone()), now)
            .expect("Failed to query due cards");
        assert_eq!(folder_scoped.len(), 1);
        assert_eq!(folder_scoped[0].id, in_b.id);

        let all = repo
            .get_due_cards(&StudyScope::All, now)
            .expect("Failed to query due cards");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_due_query_is_idempotent() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);
        let now = Utc::now();

        for i in 0..5 {
            let card = card_due_at(&set.id, &format!("word-{i}"), now - Duration::minutes(i));
            repo.save_card(&card).expect("Failed to save card");
        }

        let first = repo
            .get_due_cards(&StudyScope::All, now)
            .expect("Failed to query due cards");
        let second = repo
            .get_due_cards(&StudyScope::All, now)
            .expect("Failed to query due cards");

        let first_ids: Vec<String> = first.iter().map(|c| c.id.clone()).collect();
        let second_ids: Vec<String> = second.iter().map(|c| c.id.clone()).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_search_cards() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);
        let now = Utc::now();

        let apple = Card::new(&set.id, "apple", "蘋果", now);
        let grape = Card::new(&set.id, "grape", "葡萄", now);
        repo.save_card(&apple).expect("Failed to save card");
        repo.save_card(&grape).expect("Failed to save card");

        let hits = repo.search_cards("app", 10).expect("Failed to search");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].term, "apple");

        let by_definition = repo.search_cards("葡萄", 10).expect("Failed to search");
        assert_eq!(by_definition.len(), 1);
        assert_eq!(by_definition[0].term, "grape");
    }

    #[test]
    fn test_stats_counts() {
        let conn = setup_test_db();
        let set = seed_set(&conn, "folder", "set");
        let repo = CardRepository::new(conn);
        let now = Utc::now();

        repo.save_card(&card_due_at(&set.id, "due", now - Duration::hours(1)))
            .expect("Failed to save card");
        repo.save_card(&card_due_at(&set.id, "later", now + Duration::days(2)))
            .expect("Failed to save card");

        let stats = repo
            .get_stats(&StudyScope::All, now)
            .expect("Failed to get stats");
        assert_eq!(stats.total_cards, 2);
        assert_eq!(stats.due_cards, 1);
    }
}
