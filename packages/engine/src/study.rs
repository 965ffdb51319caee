//! 学习服务
//!
//! 把调度算法和本地存储接起来的那一层：一次评分动作在这里走完
//! 读卡 → 计算下一条 SRS 状态 → 整条写回 → 重查到期列表 → 收敛
//! 会话位置的完整闭环，然后才返回给调用方。写回失败整个动作放弃，
//! 不自动重试：第一次写入可能已经生效，重试会把转移应用两次。

use chrono::Utc;
use thiserror::Error;

use shengci_algo::{next_srs_state, ReviewScore, ScoreError};

use crate::session::SessionContext;
use crate::storage::{
    Card, CardRepository, DatabaseManager, MetaRepository, StorageError, StudyScope, StudyStats,
};

/// 会话快照在 meta 表中的键
const SESSION_META_KEY: &str = "study_session";

/// 学习服务错误类型
#[derive(Error, Debug)]
pub enum StudyError {
    #[error("存储错误: {0}")]
    Store(#[from] StorageError),

    #[error("无效评分: {0}")]
    InvalidScore(#[from] ScoreError),

    #[error("卡片不存在: {0}")]
    CardNotFound(String),
}

pub type StudyResult<T> = Result<T, StudyError>;

// ============================================================
// StudyService - 复习会话服务
// ============================================================

/// 复习会话服务
///
/// 持有当前到期列表和会话上下文。同一时刻只服务一个用户动作，
/// 每个动作完整结束后才接受下一个。
pub struct StudyService {
    cards: CardRepository,
    meta: MetaRepository,
    session: SessionContext,
    due_list: Vec<Card>,
}

impl StudyService {
    /// 以给定范围开启新会话
    pub fn new(db: &DatabaseManager, scope: StudyScope) -> StudyResult<Self> {
        let mut service = Self {
            cards: CardRepository::new(db.connection()),
            meta: MetaRepository::new(db.connection()),
            session: SessionContext::new(scope, Utc::now()),
            due_list: Vec::new(),
        };
        service.refresh()?;
        service.save_session()?;
        Ok(service)
    }

    /// 恢复上次会话
    ///
    /// meta 表里有快照就从快照继续；没有（或解析失败）就退回
    /// 全范围新会话。恢复后的位置一定会按当前到期列表重新收敛。
    pub fn resume(db: &DatabaseManager) -> StudyResult<Self> {
        let meta = MetaRepository::new(db.connection());
        let session = match meta.get_meta::<SessionContext>(SESSION_META_KEY) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => SessionContext::new(StudyScope::All, Utc::now()),
            Err(e) => {
                log::warn!("会话快照损坏，重开新会话: {e}");
                SessionContext::new(StudyScope::All, Utc::now())
            }
        };

        let mut service = Self {
            cards: CardRepository::new(db.connection()),
            meta,
            session,
            due_list: Vec::new(),
        };
        service.session.roll_over_if_new_day(Utc::now());
        service.refresh()?;
        service.save_session()?;
        Ok(service)
    }

    // ========== 评分 ==========

    /// 对一张卡片评分
    ///
    /// 评分产生的新 SRS 状态整条替换旧状态；随后到期列表重建，
    /// 刚评过的卡片通常因 `due_at` 后移而离开列表。
    pub fn rate(&mut self, card_id: &str, score: ReviewScore) -> StudyResult<()> {
        let mut card = self
            .cards
            .get_card(card_id)?
            .ok_or_else(|| StudyError::CardNotFound(card_id.to_string()))?;

        let now = Utc::now();
        card.srs = next_srs_state(&card.srs, score, now);
        card.updated_at = now;
        self.cards.save_card(&card)?;

        log::debug!(
            "评分 {card_id}: score={score:?} -> interval={}d ease={:.2}",
            card.srs.interval_days,
            card.srs.ease
        );

        self.refresh()?;
        self.session.record_review(now);
        self.session.is_flipped = false;
        self.save_session()?;
        Ok(())
    }

    /// 对当前卡片评分
    pub fn rate_current(&mut self, score: ReviewScore) -> StudyResult<()> {
        let card_id = match self.current_card() {
            Some(card) => card.id.clone(),
            None => return Ok(()),
        };
        self.rate(&card_id, score)
    }

    /// 评分入口的浮点边界：拒绝非有限值，其余收敛到 0-3 档
    pub fn rate_raw(&mut self, card_id: &str, raw_score: f64) -> StudyResult<()> {
        let score = ReviewScore::try_from_f64(raw_score)?;
        self.rate(card_id, score)
    }

    // ========== 会话操作 ==========

    /// 切换复习范围，从头开始
    pub fn set_scope(&mut self, scope: StudyScope) -> StudyResult<()> {
        self.session.scope = scope;
        self.session.current_index = 0;
        self.session.is_flipped = false;
        self.refresh()?;
        self.save_session()?;
        Ok(())
    }

    /// 翻面
    pub fn flip(&mut self) {
        self.session.flip();
    }

    /// 跳到下一张（不评分）
    pub fn advance(&mut self) -> StudyResult<()> {
        self.session.advance(self.due_list.len());
        self.save_session()?;
        Ok(())
    }

    /// 重查到期列表并收敛会话位置
    pub fn refresh(&mut self) -> StudyResult<()> {
        self.due_list = self.cards.get_due_cards(&self.session.scope, Utc::now())?;
        self.session.clamp_index(self.due_list.len());
        Ok(())
    }

    // ========== 读取 ==========

    /// 当前卡片；到期列表为空时返回 None
    pub fn current_card(&self) -> Option<&Card> {
        self.due_list.get(self.session.current_index)
    }

    /// 当前到期列表
    pub fn due_list(&self) -> &[Card] {
        &self.due_list
    }

    /// 会话上下文
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// 今日进度：(已完成, 剩余)
    pub fn progress(&self) -> (u32, usize) {
        (self.session.reviewed_today, self.due_list.len())
    }

    /// 范围内统计
    pub fn stats(&self) -> StudyResult<StudyStats> {
        Ok(self.cards.get_stats(&self.session.scope, Utc::now())?)
    }

    fn save_session(&self) -> StudyResult<()> {
        self.meta.set_meta(SESSION_META_KEY, &self.session)?;
        Ok(())
    }
}
