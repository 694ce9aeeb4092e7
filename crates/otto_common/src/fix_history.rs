//! Immutable fix-attempt history and outcome bookkeeping.
//!
//! Every time the user reports whether a suggested fix worked, one
//! [`FixAttempt`] is appended and the case's stored confidence moves: up a
//! little on success, down harder on failure. Attempts are never edited or
//! deleted; the log is the audit trail a later consultation reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Confidence gained when a fix worked, capped at 100.
pub const SUCCESS_ADJUSTMENT: i32 = 10;

/// Confidence lost when a fix failed, floored at 0.
pub const FAILURE_ADJUSTMENT: i32 = 15;

/// Snapshot of the suggestion the user attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedFix {
    pub title: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub confidence: u8,
}

/// One user report of whether a suggested fix worked. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixAttempt {
    pub id: String,
    pub case_id: String,
    /// 1-based, monotonic per case: count of prior attempts + 1.
    pub attempt_number: u32,
    /// 0 is the primary result, 1.. the alternatives.
    pub result_index: usize,
    pub was_successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    pub steps_completed: BTreeSet<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_minutes: Option<u32>,
    pub suggested_fix: SuggestedFix,
    pub created_at: DateTime<Utc>,
}

/// New stored confidence after an outcome report.
pub fn adjusted_confidence(current: u8, was_successful: bool) -> u8 {
    let score = current as i32;
    let adjusted = if was_successful {
        (score + SUCCESS_ADJUSTMENT).min(100)
    } else {
        (score - FAILURE_ADJUSTMENT).max(0)
    };
    adjusted as u8
}

/// Apply a step toggle to a completion set. Adding an already-present index
/// or removing an absent one is a no-op. Returns whether the set changed.
pub fn toggle_step(steps: &mut BTreeSet<usize>, step_index: usize, completed: bool) -> bool {
    if completed {
        steps.insert(step_index)
    } else {
        steps.remove(&step_index)
    }
}

/// Aggregate attempt statistics for the case summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStats {
    /// Attempts including the original diagnosis round.
    pub total_attempts: u32,
    pub successful_fixes: u32,
    pub average_time_minutes: f64,
}

impl AttemptStats {
    pub fn from_history(history: &[FixAttempt]) -> Self {
        let time_total: u32 = history.iter().filter_map(|h| h.time_spent_minutes).sum();
        Self {
            total_attempts: history.len() as u32 + 1,
            successful_fixes: history.iter().filter(|h| h.was_successful).count() as u32,
            average_time_minutes: f64::from(time_total) / history.len().max(1) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(number: u32, worked: bool, minutes: Option<u32>) -> FixAttempt {
        FixAttempt {
            id: format!("a-{}", number),
            case_id: "c-1".to_string(),
            attempt_number: number,
            result_index: 0,
            was_successful: worked,
            feedback: None,
            steps_completed: BTreeSet::new(),
            time_spent_minutes: minutes,
            suggested_fix: SuggestedFix {
                title: "Brake Pad Wear".to_string(),
                description: "worn pads".to_string(),
                instructions: vec!["replace pads".to_string()],
                confidence: 98,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_success_adds_ten_capped() {
        assert_eq!(adjusted_confidence(70, true), 80);
        assert_eq!(adjusted_confidence(95, true), 100);
        assert_eq!(adjusted_confidence(100, true), 100);
    }

    #[test]
    fn test_failure_subtracts_fifteen_floored() {
        assert_eq!(adjusted_confidence(70, false), 55);
        assert_eq!(adjusted_confidence(10, false), 0);
        assert_eq!(adjusted_confidence(0, false), 0);
    }

    #[test]
    fn test_toggle_is_idempotent_round_trip() {
        let mut steps: BTreeSet<usize> = [1, 3].into_iter().collect();
        let original = steps.clone();

        assert!(toggle_step(&mut steps, 2, true));
        assert!(toggle_step(&mut steps, 2, false));
        assert_eq!(steps, original);

        // Same-direction repeats are no-ops.
        assert!(!toggle_step(&mut steps, 1, true));
        assert!(!toggle_step(&mut steps, 7, false));
        assert_eq!(steps, original);
    }

    #[test]
    fn test_attempt_stats() {
        let history = vec![
            attempt(1, false, Some(30)),
            attempt(2, true, Some(90)),
            attempt(3, false, None),
        ];
        let stats = AttemptStats::from_history(&history);
        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.successful_fixes, 1);
        assert_eq!(stats.average_time_minutes, 40.0);
    }

    #[test]
    fn test_attempt_stats_empty_history() {
        let stats = AttemptStats::from_history(&[]);
        assert_eq!(stats.total_attempts, 1);
        assert_eq!(stats.successful_fixes, 0);
        assert_eq!(stats.average_time_minutes, 0.0);
    }
}
