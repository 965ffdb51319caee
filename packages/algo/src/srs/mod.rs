//! SM-2 style review scheduling
//!
//! The better a card is known, the longer it waits: a lapse resets the card
//! to tomorrow and decays its ease, a success grows the interval by a fixed
//! ramp (1 day, 3 days) and then geometrically by the ease factor.

use chrono::{DateTime, Days, Utc};

use crate::sanitize::sanitize_ease;
use crate::types::{
    ReviewScore, SrsState, EASE_EASY_STEP, EASE_FAIL_STEP, EASE_HARD_STEP, FIRST_INTERVAL_DAYS,
    LAPSE_INTERVAL_DAYS, MAX_EASE, MIN_EASE, SECOND_INTERVAL_DAYS,
};

/// Calendar-day addition in UTC, preserving time-of-day.
///
/// Not a fixed 86400-second offset: the due date is "the same wall-clock
/// moment N days later". Overflow saturates to the far future.
pub fn add_days(ts: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    ts.checked_add_days(Days::new(u64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Compute the state after one review rating.
///
/// Total over its domain: a persisted state with a non-finite or
/// out-of-range ease is repaired before use, and every output ease is
/// clamped back into `[MIN_EASE, MAX_EASE]`. The caller reads the wall
/// clock once and passes it as `now`.
pub fn next_srs_state(prev: &SrsState, score: ReviewScore, now: DateTime<Utc>) -> SrsState {
    let prev_ease = sanitize_ease(prev.ease);

    let (repetitions, interval_days, ease) = if score.is_success() {
        let repetitions = prev.repetitions.saturating_add(1);
        let step = match score {
            ReviewScore::Easy => EASE_EASY_STEP,
            _ => EASE_HARD_STEP,
        };
        let ease = (prev_ease + step).min(MAX_EASE);
        // Fixed ramp for the first two repetitions, then geometric growth.
        // The ease bump above lands before the product, so an easy third
        // review already grows at the new rate.
        let interval_days = match repetitions {
            1 => FIRST_INTERVAL_DAYS,
            2 => SECOND_INTERVAL_DAYS,
            _ => (f64::from(prev.interval_days) * ease).round() as u32,
        };
        (repetitions, interval_days, ease)
    } else {
        let ease = (prev_ease - EASE_FAIL_STEP).max(MIN_EASE);
        (0, LAPSE_INTERVAL_DAYS, ease)
    };

    SrsState {
        repetitions,
        interval_days,
        ease,
        last_reviewed_at: Some(now),
        due_at: add_days(now, interval_days),
    }
}
