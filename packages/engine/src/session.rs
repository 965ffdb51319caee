//! 复习会话状态
//!
//! 会话位置是显式的上下文对象，随每次转移传入传出，不做进程级
//! 全局变量。到期列表在每次评分后都会重建，长度与成员都可能变，
//! 所以 `current_index` 必须在每次刷新后重新收敛到合法区间。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::StudyScope;

/// 复习会话上下文
///
/// 可整体序列化为快照存入 meta 表，下次启动恢复进度。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    /// 当前复习范围
    pub scope: StudyScope,
    /// 在当前到期列表中的位置
    pub current_index: usize,
    /// 当前卡片是否已翻面
    pub is_flipped: bool,
    /// 今日已复习张数
    pub reviewed_today: u32,
    /// `reviewed_today` 对应的 UTC 日期，跨天清零
    pub progress_date: NaiveDate,
}

impl SessionContext {
    /// 新会话：从列表头开始，正面朝上
    pub fn new(scope: StudyScope, now: DateTime<Utc>) -> Self {
        Self {
            scope,
            current_index: 0,
            is_flipped: false,
            reviewed_today: 0,
            progress_date: now.date_naive(),
        }
    }

    /// 把位置收敛进 `[0, len-1]`；空列表归零
    pub fn clamp_index(&mut self, len: usize) {
        if len == 0 {
            self.current_index = 0;
        } else if self.current_index >= len {
            self.current_index = len - 1;
        }
    }

    /// 移到下一张（到尾部后绕回开头），并翻回正面
    pub fn advance(&mut self, len: usize) {
        if len > 0 {
            self.current_index = (self.current_index + 1) % len;
        } else {
            self.current_index = 0;
        }
        self.is_flipped = false;
    }

    /// 翻面
    pub fn flip(&mut self) {
        self.is_flipped = !self.is_flipped;
    }

    /// 记一次复习，跨天时先清零当日计数
    pub fn record_review(&mut self, now: DateTime<Utc>) {
        self.roll_over_if_new_day(now);
        self.reviewed_today = self.reviewed_today.saturating_add(1);
    }

    /// UTC 日期变化时重置当日进度
    pub fn roll_over_if_new_day(&mut self, now: DateTime<Utc>) {
        let today = now.date_naive();
        if self.progress_date != today {
            self.progress_date = today;
            self.reviewed_today = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 21, 30, 0).unwrap()
    }

    #[test]
    fn test_clamp_into_shrunk_list() {
        let mut session = SessionContext::new(StudyScope::All, fixed_now());
        session.current_index = 5;

        session.clamp_index(3);
        assert_eq!(session.current_index, 2);

        session.clamp_index(0);
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn test_advance_wraps_and_unflips() {
        let mut session = SessionContext::new(StudyScope::All, fixed_now());
        session.flip();
        assert!(session.is_flipped);

        session.advance(2);
        assert_eq!(session.current_index, 1);
        assert!(!session.is_flipped);

        session.advance(2);
        assert_eq!(session.current_index, 0);
    }

    #[test]
    fn test_review_counter_rolls_over_at_midnight() {
        let now = fixed_now();
        let mut session = SessionContext::new(StudyScope::All, now);

        session.record_review(now);
        session.record_review(now);
        assert_eq!(session.reviewed_today, 2);

        let next_day = now + chrono::Duration::hours(5);
        assert_ne!(now.date_naive(), next_day.date_naive());
        session.record_review(next_day);
        assert_eq!(session.reviewed_today, 1);
        assert_eq!(session.progress_date, next_day.date_naive());
    }

    #[test]
    fn test_snapshot_serde_round_trip() {
        let mut session = SessionContext::new(StudyScope::Set("set-1".to_string()), fixed_now());
        session.current_index = 4;
        session.flip();
        session.record_review(fixed_now());

        let json = serde_json::to_string(&session).expect("Failed to serialize");
        let back: SessionContext = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(session, back);
    }
}
