//! 数据模型定义
//!
//! 定义 SQLite 存储所需的数据结构，以及与数据库交互的方法。
//! SRS 调度状态不在这里建模，复用 `shengci_algo::SrsState`，
//! 在 card 表中平铺为列。

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shengci_algo::{sanitize, SrsState};

use crate::storage::StorageResult;

// ============================================================
// Folder - 文件夹
// ============================================================

/// 文件夹：卡组的上层分组，纯组织元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    /// 唯一标识 (UUID)
    pub id: String,
    /// 文件夹名称
    pub name: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
        }
    }

    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    /// 插入到数据库
    pub fn insert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO folder (id, name, created_at) VALUES (?1, ?2, ?3)",
            params![self.id, self.name, format_datetime(self.created_at)],
        )?;
        Ok(())
    }
}

// ============================================================
// CardSet - 卡组
// ============================================================

/// 卡组：卡片的直接归属，每张卡属于且仅属于一个卡组
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSet {
    /// 唯一标识 (UUID)
    pub id: String,
    /// 所属文件夹 ID
    pub folder_id: String,
    /// 卡组名称
    pub name: String,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

impl CardSet {
    pub fn new(folder_id: impl Into<String>, name: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            folder_id: folder_id.into(),
            name: name.into(),
            created_at: now,
        }
    }

    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            folder_id: row.get("folder_id")?,
            name: row.get("name")?,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
        })
    }

    /// 插入到数据库
    pub fn insert(&self, conn: &Connection) -> StorageResult<()> {
        conn.execute(
            "INSERT INTO card_set (id, folder_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                self.id,
                self.folder_id,
                self.name,
                format_datetime(self.created_at)
            ],
        )?;
        Ok(())
    }
}

// ============================================================
// Card - 卡片
// ============================================================

/// 卡片：学习的最小单元
///
/// 内容字段由用户编辑；`srs` 字段只由调度转移整体替换，
/// 一次评分写回一条完整记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// 唯一标识 (UUID)
    pub id: String,
    /// 所属卡组 ID
    pub set_id: String,
    /// 词条
    pub term: String,
    /// 词性
    pub part_of_speech: Option<String>,
    /// 释义
    pub definition: String,
    /// 例句
    pub example: Option<String>,
    /// 自由标签
    pub tags: Vec<String>,
    /// SRS 调度状态
    pub srs: SrsState,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// 新建卡片：立即到期，从未复习
    pub fn new(
        set_id: impl Into<String>,
        term: impl Into<String>,
        definition: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            set_id: set_id.into(),
            term: term.into(),
            part_of_speech: None,
            definition: definition.into(),
            example: None,
            tags: Vec::new(),
            srs: SrsState::new_card(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// 从数据库行解析
    ///
    /// tags 列无法解析时回退为空；ease 经过数值清洗，
    /// 保证进入调度前处于合法区间。
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        let tags: Vec<String> =
            serde_json::from_str(&row.get::<_, String>("tags")?).unwrap_or_default();

        let mut srs = SrsState {
            repetitions: row.get("repetitions")?,
            interval_days: row.get("interval_days")?,
            ease: row.get("ease")?,
            last_reviewed_at: row
                .get::<_, Option<String>>("last_reviewed_at")?
                .map(parse_datetime),
            due_at: parse_datetime(row.get::<_, String>("due_at")?),
        };
        sanitize::sanitize_srs_state(&mut srs);

        Ok(Self {
            id: row.get("id")?,
            set_id: row.get("set_id")?,
            term: row.get("term")?,
            part_of_speech: row.get("part_of_speech")?,
            definition: row.get("definition")?,
            example: row.get("example")?,
            tags,
            srs,
            created_at: parse_datetime(row.get::<_, String>("created_at")?),
            updated_at: parse_datetime(row.get::<_, String>("updated_at")?),
        })
    }

    /// 插入或整条替换（按 id）
    pub fn upsert(&self, conn: &Connection) -> StorageResult<()> {
        let tags_json = serde_json::to_string(&self.tags)
            .map_err(|e| crate::storage::StorageError::Serialization(e.to_string()))?;

        conn.execute(
            r#"
            INSERT INTO card (
                id, set_id, term, part_of_speech, definition, example, tags,
                repetitions, interval_days, ease, last_reviewed_at, due_at,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14
            )
            ON CONFLICT(id) DO UPDATE SET
                set_id = excluded.set_id,
                term = excluded.term,
                part_of_speech = excluded.part_of_speech,
                definition = excluded.definition,
                example = excluded.example,
                tags = excluded.tags,
                repetitions = excluded.repetitions,
                interval_days = excluded.interval_days,
                ease = excluded.ease,
                last_reviewed_at = excluded.last_reviewed_at,
                due_at = excluded.due_at,
                updated_at = excluded.updated_at
            "#,
            params![
                self.id,
                self.set_id,
                self.term,
                self.part_of_speech,
                self.definition,
                self.example,
                tags_json,
                self.srs.repetitions,
                self.srs.interval_days,
                self.srs.ease,
                self.srs.last_reviewed_at.map(format_datetime),
                format_datetime(self.srs.due_at),
                format_datetime(self.created_at),
                format_datetime(self.updated_at),
            ],
        )?;
        Ok(())
    }
}

// ============================================================
// 时间列辅助函数
// ============================================================

/// 解析时间列
pub(crate) fn parse_datetime(s: String) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(&s) {
        return dt.with_timezone(&Utc);
    }

    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S") {
        return DateTime::from_naive_utc_and_offset(dt, Utc);
    }

    // 无法解析时退回当前时间
    Utc::now()
}

/// 格式化时间列
pub(crate) fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
