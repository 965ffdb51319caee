//! Common Types and Constants
//!
//! Shared data structures used across the scheduling modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==================== Constants ====================

/// Minimum ease factor
pub const MIN_EASE: f64 = 1.3;

/// Maximum ease factor
pub const MAX_EASE: f64 = 2.8;

/// Ease factor assigned to a freshly created card
pub const INITIAL_EASE: f64 = 2.3;

/// Ease penalty applied on a failed review
pub const EASE_FAIL_STEP: f64 = 0.2;

/// Ease reward for an easy recall
pub const EASE_EASY_STEP: f64 = 0.1;

/// Ease reward for a hard but successful recall
pub const EASE_HARD_STEP: f64 = 0.02;

/// Interval after the first successful review (days)
pub const FIRST_INTERVAL_DAYS: u32 = 1;

/// Interval after the second successful review (days)
pub const SECOND_INTERVAL_DAYS: u32 = 3;

/// Interval after a failed review (days)
pub const LAPSE_INTERVAL_DAYS: u32 = 1;

// ==================== Review scores ====================

/// Score boundary errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoreError {
    /// Raw score was NaN or infinite
    #[error("review score is not a finite number")]
    NotFinite,
}

/// Review outcome on the 0-3 scale
///
/// 0 and 1 both count as a lapse; 2 is a recall that took effort; 3 is a
/// clean recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReviewScore {
    Forgot = 0,
    Wrong = 1,
    Hard = 2,
    Easy = 3,
}

impl ReviewScore {
    /// Build a score from a raw integer, saturating out-of-range values
    /// to the nearest defined branch.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            i64::MIN..=0 => Self::Forgot,
            1 => Self::Wrong,
            2 => Self::Hard,
            _ => Self::Easy,
        }
    }

    /// Validation boundary for scores arriving as floats (JSON input).
    ///
    /// Rejects non-finite values; finite values are truncated and then
    /// saturated like [`ReviewScore::from_raw`].
    pub fn try_from_f64(raw: f64) -> Result<Self, ScoreError> {
        if !raw.is_finite() {
            return Err(ScoreError::NotFinite);
        }
        Ok(Self::from_raw(raw.trunc() as i64))
    }

    /// Whether this score counts as a successful recall
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Hard | Self::Easy)
    }
}

// ==================== SRS state ====================

/// Per-card spaced-repetition state
///
/// The unit the scheduler consumes and produces. One review rating replaces
/// the whole record; there are no partial updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SrsState {
    /// Consecutive successful reviews since the last lapse
    pub repetitions: u32,
    /// Days until the next scheduled review
    pub interval_days: u32,
    /// Ease factor, kept in [MIN_EASE, MAX_EASE]
    pub ease: f64,
    /// Most recent rating time, None until first reviewed
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// The card becomes reviewable once now >= due_at
    pub due_at: DateTime<Utc>,
}

impl SrsState {
    /// State of a card created at `now`: immediately due, never reviewed.
    pub fn new_card(now: DateTime<Utc>) -> Self {
        Self {
            repetitions: 0,
            interval_days: 0,
            ease: INITIAL_EASE,
            last_reviewed_at: None,
            due_at: now,
        }
    }

    /// Whether the card has never been rated
    pub fn is_new(&self) -> bool {
        self.last_reviewed_at.is_none()
    }

    /// Due-ness predicate: eligible for review once `due_at` has elapsed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}
