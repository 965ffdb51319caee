//! Data Sanitization
//!
//! Numerical hygiene for persisted scheduling state.
//!
//! SRS records live in a local store for years and may come back with
//! values the current code never wrote (partial imports, hand-edited
//! backups). Everything here is total: repair, never reject.

use crate::types::{SrsState, INITIAL_EASE, MAX_EASE, MIN_EASE};

/// 检查浮点值是否无效 (NaN 或 Inf)
pub fn is_invalid(value: f64) -> bool {
    value.is_nan() || value.is_infinite()
}

/// 清理 ease 因子：无效值回退到初始值，其余收敛到合法区间
pub fn sanitize_ease(ease: f64) -> f64 {
    if is_invalid(ease) {
        return INITIAL_EASE;
    }
    ease.clamp(MIN_EASE, MAX_EASE)
}

/// 清理整条 SRS 状态记录
///
/// 修复 ease 因子；repetitions 与 interval_days 是无符号整数，
/// 类型本身已排除负值。
pub fn sanitize_srs_state(state: &mut SrsState) {
    state.ease = sanitize_ease(state.ease);
}
