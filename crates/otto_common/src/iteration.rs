//! Follow-up round control.
//!
//! Decides when a case needs more information from the user and assembles
//! the inputs for re-scoring after the user supplies it. A follow-up never
//! mutates the original case: it produces a new one, linked through the
//! exclusion set built here.

use crate::case::Case;
use std::collections::HashSet;

/// Clarification stops after this many rounds.
pub const MAX_CLARIFICATION_ROUNDS: u32 = 3;

/// Confidence bar on the first round.
const FIRST_ROUND_BAR: u8 = 80;

/// Higher bar once at least one follow-up has happened.
const REPEAT_ROUND_BAR: u8 = 90;

/// True when the user should be asked clarifying questions.
pub fn needs_more_info(primary_confidence: u8, iteration_count: u32) -> bool {
    iteration_count <= MAX_CLARIFICATION_ROUNDS
        && (primary_confidence < FIRST_ROUND_BAR
            || (iteration_count > 1 && primary_confidence < REPEAT_ROUND_BAR))
}

/// Inputs for re-scoring a case after the user reports new information.
#[derive(Debug, Clone)]
pub struct FollowUpRound {
    /// Original description plus the new info, fed to the scoring engine.
    pub merged_description: String,
    /// Short description stored on the new case.
    pub display_description: String,
    /// Everything already suggested for this problem.
    pub excluded_titles: HashSet<String>,
    pub iteration_count: u32,
}

impl FollowUpRound {
    /// Build the round from the original case, the user's new text, and the
    /// ids of follow-up records already filed against the case.
    pub fn assemble(original: &Case, additional_info: &str, prior_follow_up_ids: &[String]) -> Self {
        let mut excluded_titles: HashSet<String> =
            original.suggested_titles().into_iter().collect();
        for id in prior_follow_up_ids {
            excluded_titles.insert(format!("Follow-up {}", id));
        }

        // One round for the original submission, one for this follow-up.
        let iteration_count = prior_follow_up_ids.len() as u32 + 2;

        Self {
            merged_description: format!(
                "{}\n\nAdditional info: {}",
                original.description, additional_info
            ),
            display_description: format!(
                "Follow-up #{}: {}",
                iteration_count - 1,
                additional_info
            ),
            excluded_titles,
            iteration_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{Case, ConfidenceLevel, InputKind, ScoredCandidate, Timing};
    use crate::catalog::find_by_title;
    use chrono::Utc;

    fn case_with(primary: &str, alternatives: &[&str]) -> Case {
        let snapshot = |title: &str| {
            let candidate = find_by_title(title).expect("catalog entry");
            ScoredCandidate::from_candidate(candidate, candidate.base_confidence)
        };
        Case {
            id: "case-1".to_string(),
            vehicle_info: "2012 Ford Focus".to_string(),
            description: "A squealing noise from the engine bay".to_string(),
            timing: Timing::Startup,
            audio_file: None,
            video_file: None,
            vibration_data: None,
            primary_result: snapshot(primary),
            alternative_results: alternatives.iter().map(|t| snapshot(t)).collect(),
            needs_more_info: true,
            pending_questions: vec![],
            iteration_count: 1,
            input_types: vec![InputKind::Description],
            confidence_score: 76,
            confidence_level: ConfidenceLevel::Medium,
            is_resolved: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_first_round_bar_is_80() {
        for confidence in 30..=98u8 {
            assert_eq!(
                needs_more_info(confidence, 1),
                confidence < 80,
                "confidence {}",
                confidence
            );
        }
    }

    #[test]
    fn test_repeat_rounds_use_higher_bar() {
        assert!(needs_more_info(85, 2));
        assert!(needs_more_info(89, 3));
        assert!(!needs_more_info(90, 2));
        assert!(needs_more_info(75, 3));
    }

    #[test]
    fn test_iteration_cap() {
        for confidence in 30..=98u8 {
            assert!(!needs_more_info(confidence, 4));
            assert!(!needs_more_info(confidence, 5));
        }
    }

    #[test]
    fn test_follow_up_exclusions_and_iteration() {
        let original = case_with("Belt Issues", &["Brake Pad Wear", "Engine Misfire"]);
        let round = FollowUpRound::assemble(&original, "still squealing after belt check", &[]);

        let expected: HashSet<String> = ["Belt Issues", "Brake Pad Wear", "Engine Misfire"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(round.excluded_titles, expected);
        assert_eq!(round.iteration_count, 2);
        assert_eq!(
            round.display_description,
            "Follow-up #1: still squealing after belt check"
        );
        assert!(round
            .merged_description
            .ends_with("\n\nAdditional info: still squealing after belt check"));
        assert!(round
            .merged_description
            .starts_with("A squealing noise from the engine bay"));
    }

    #[test]
    fn test_prior_follow_ups_add_tokens_and_rounds() {
        let original = case_with("Belt Issues", &["Brake Pad Wear"]);
        let prior = vec!["f-1".to_string(), "f-2".to_string()];
        let round = FollowUpRound::assemble(&original, "new rattle from underneath", &prior);

        assert_eq!(round.iteration_count, 4);
        assert!(round.excluded_titles.contains("Follow-up f-1"));
        assert!(round.excluded_titles.contains("Follow-up f-2"));
        assert_eq!(
            round.display_description,
            "Follow-up #3: new rattle from underneath"
        );
    }
}
