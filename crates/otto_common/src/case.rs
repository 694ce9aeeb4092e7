//! The diagnostic case model.
//!
//! A case is one diagnostic session: the user's inputs plus the ranked
//! results computed for them. Follow-up rounds create new cases rather than
//! mutating the original, so the history of a problem stays inspectable.

use crate::catalog::{Candidate, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// When the symptom occurs. `Unspecified` is the empty hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timing {
    Startup,
    Driving,
    Braking,
    Accelerating,
    Turning,
    Always,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Timing {
    /// Parse from the stored string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "startup" => Some(Timing::Startup),
            "driving" => Some(Timing::Driving),
            "braking" => Some(Timing::Braking),
            "accelerating" => Some(Timing::Accelerating),
            "turning" => Some(Timing::Turning),
            "always" => Some(Timing::Always),
            "" => Some(Timing::Unspecified),
            _ => None,
        }
    }

    pub fn is_specified(&self) -> bool {
        !matches!(self, Timing::Unspecified)
    }
}

impl std::fmt::Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timing::Startup => write!(f, "startup"),
            Timing::Driving => write!(f, "driving"),
            Timing::Braking => write!(f, "braking"),
            Timing::Accelerating => write!(f, "accelerating"),
            Timing::Turning => write!(f, "turning"),
            Timing::Always => write!(f, "always"),
            Timing::Unspecified => Ok(()),
        }
    }
}

/// Input modalities present on a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    Description,
    Audio,
    Video,
    Vibration,
}

/// Coarse confidence bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// high >= 80, medium >= 60, low otherwise.
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            ConfidenceLevel::High
        } else if score >= 60 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(ConfidenceLevel::Low),
            "medium" => Some(ConfidenceLevel::Medium),
            "high" => Some(ConfidenceLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "low"),
            ConfidenceLevel::Medium => write!(f, "medium"),
            ConfidenceLevel::High => write!(f, "high"),
        }
    }
}

/// A catalog candidate with its per-case computed confidence and the user's
/// repair progress against it.
///
/// `confidence` is the scoring engine's output, clamped to [30, 98]; the
/// catalog's `base_confidence` is never touched. `steps_completed` and
/// `was_successful` are the only mutable pieces of a case after scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredCandidate {
    pub id: String,
    pub title: String,
    pub description: String,
    pub confidence: u8,
    pub severity: Severity,
    pub cost: String,
    pub instructions: Vec<String>,
    pub required_tools: Vec<String>,
    pub estimated_time: String,
    #[serde(default)]
    pub steps_completed: BTreeSet<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_successful: Option<bool>,
}

impl ScoredCandidate {
    /// Snapshot a catalog entry with a computed confidence.
    pub fn from_candidate(candidate: &Candidate, confidence: u8) -> Self {
        Self {
            id: candidate.id.clone(),
            title: candidate.title.clone(),
            description: candidate.description.clone(),
            confidence,
            severity: candidate.severity,
            cost: candidate.cost.clone(),
            instructions: candidate.instructions.clone(),
            required_tools: candidate.required_tools.clone(),
            estimated_time: candidate.estimated_time.clone(),
            steps_completed: BTreeSet::new(),
            was_successful: None,
        }
    }
}

/// One diagnostic session and its computed results.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Case {
    pub id: String,
    pub vehicle_info: String,
    pub description: String,
    pub timing: Timing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_data: Option<serde_json::Value>,
    pub primary_result: ScoredCandidate,
    pub alternative_results: Vec<ScoredCandidate>,
    pub needs_more_info: bool,
    pub pending_questions: Vec<String>,
    pub iteration_count: u32,
    pub input_types: Vec<InputKind>,
    pub confidence_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Case {
    /// Result by index: 0 is the primary, 1.. are the alternatives.
    pub fn result(&self, index: usize) -> Option<&ScoredCandidate> {
        if index == 0 {
            Some(&self.primary_result)
        } else {
            self.alternative_results.get(index - 1)
        }
    }

    /// Titles this case already suggested, primary first.
    pub fn suggested_titles(&self) -> Vec<String> {
        let mut titles = vec![self.primary_result.title.clone()];
        titles.extend(self.alternative_results.iter().map(|r| r.title.clone()));
        titles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CATALOG;

    #[test]
    fn test_timing_round_trip() {
        for timing in [
            Timing::Startup,
            Timing::Driving,
            Timing::Braking,
            Timing::Accelerating,
            Timing::Turning,
            Timing::Always,
            Timing::Unspecified,
        ] {
            assert_eq!(Timing::parse(&timing.to_string()), Some(timing));
        }
        assert_eq!(Timing::parse("BRAKING"), Some(Timing::Braking));
        assert_eq!(Timing::parse("parked"), None);
    }

    #[test]
    fn test_confidence_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(98), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(80), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(79), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(60), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(59), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(0), ConfidenceLevel::Low);
    }

    #[test]
    fn test_snapshot_keeps_catalog_untouched() {
        let candidate = &CATALOG[0];
        let scored = ScoredCandidate::from_candidate(candidate, 98);
        assert_eq!(scored.confidence, 98);
        assert_eq!(candidate.base_confidence, 94);
        assert!(scored.steps_completed.is_empty());
        assert!(scored.was_successful.is_none());
    }

    #[test]
    fn test_result_indexing() {
        let primary = ScoredCandidate::from_candidate(&CATALOG[0], 98);
        let alt = ScoredCandidate::from_candidate(&CATALOG[1], 87);
        let case = Case {
            id: "c-1".to_string(),
            vehicle_info: "2015 Honda Civic".to_string(),
            description: "squealing when braking".to_string(),
            timing: Timing::Braking,
            audio_file: None,
            video_file: None,
            vibration_data: None,
            primary_result: primary.clone(),
            alternative_results: vec![alt.clone()],
            needs_more_info: false,
            pending_questions: vec![],
            iteration_count: 1,
            input_types: vec![InputKind::Description],
            confidence_score: 98,
            confidence_level: ConfidenceLevel::High,
            is_resolved: false,
            created_at: Utc::now(),
        };
        assert_eq!(case.result(0).map(|r| r.title.as_str()), Some("Brake Pad Wear"));
        assert_eq!(case.result(1).map(|r| r.title.as_str()), Some("Engine Misfire"));
        assert!(case.result(2).is_none());
        assert_eq!(case.suggested_titles(), vec!["Brake Pad Wear", "Engine Misfire"]);
    }
}
