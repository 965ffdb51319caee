//! 文件夹和卡组数据库操作
//!
//! 提供文件夹与卡组的 CRUD。两者都是纯分组元数据，
//! 删除靠外键级联清掉下层记录。

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::storage::models::{CardSet, Folder};
use crate::storage::{StorageError, StorageResult};

/// 文件夹和卡组仓储
pub struct CollectionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CollectionRepository {
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

    // ============================================================
    // Folder 操作
    // ============================================================

    /// 新建文件夹
    pub fn add_folder(&self, name: &str) -> StorageResult<Folder> {
        let folder = Folder::new(name, Utc::now());
        let conn = self.get_conn()?;
        folder.insert(&conn)?;
        Ok(folder)
    }

    /// 根据 ID 获取文件夹
    pub fn get_folder(&self, id: &str) -> StorageResult<Option<Folder>> {
        let conn = self.get_conn()?;
        let folder = conn
            .query_row("SELECT * FROM folder WHERE id = ?1", params![id], |row| {
                Folder::from_row(row)
            })
            .optional()?;
        Ok(folder)
    }

    /// 获取所有文件夹，按名称排序
    pub fn get_all_folders(&self) -> StorageResult<Vec<Folder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT * FROM folder ORDER BY name COLLATE NOCASE")?;

        let folders: Vec<Folder> = stmt
            .query_map([], |row| Folder::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(folders)
    }

    /// 重命名文件夹
    pub fn rename_folder(&self, id: &str, name: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE folder SET name = ?2 WHERE id = ?1",
            params![id, name],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("folder {id}")));
        }
        Ok(())
    }

    /// 删除文件夹（级联删除其下卡组和卡片）
    pub fn delete_folder(&self, id: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM folder WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("folder {id}")));
        }
        Ok(())
    }

    // ============================================================
    // CardSet 操作
    // ============================================================

    /// 在文件夹下新建卡组
    pub fn add_set(&self, folder_id: &str, name: &str) -> StorageResult<CardSet> {
        let set = CardSet::new(folder_id, name, Utc::now());
        let conn = self.get_conn()?;
        set.insert(&conn)?;
        Ok(set)
    }

    /// 根据 ID 获取卡组
    pub fn get_set(&self, id: &str) -> StorageResult<Option<CardSet>> {
        let conn = self.get_conn()?;
        let set = conn
            .query_row("SELECT * FROM card_set WHERE id = ?1", params![id], |row| {
                CardSet::from_row(row)
            })
            .optional()?;
        Ok(set)
    }

    /// 获取所有卡组，按名称排序
    pub fn get_all_sets(&self) -> StorageResult<Vec<CardSet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT * FROM card_set ORDER BY name COLLATE NOCASE")?;

        let sets: Vec<CardSet> = stmt
            .query_map([], |row| CardSet::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(sets)
    }

    /// 获取文件夹下的卡组
    pub fn get_sets_by_folder(&self, folder_id: &str) -> StorageResult<Vec<CardSet>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM card_set WHERE folder_id = ?1 ORDER BY name COLLATE NOCASE",
        )?;

        let sets: Vec<CardSet> = stmt
            .query_map(params![folder_id], |row| CardSet::from_row(row))?
            .filter_map(|r| r.ok())
            .collect();

        Ok(sets)
    }

    /// 重命名卡组
    pub fn rename_set(&self, id: &str, name: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE card_set SET name = ?2 WHERE id = ?1",
            params![id, name],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("card_set {id}")));
        }
        Ok(())
    }

    /// 删除卡组（级联删除其下卡片）
    pub fn delete_set(&self, id: &str) -> StorageResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM card_set WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("card_set {id}")));
        }
        Ok(())
    }
}
