//! Request/response contracts shared by the daemon and the CLI.
//!
//! Wire names are camelCase; validation lives here so both sides agree on
//! what a well-formed submission is before anything touches storage.

use crate::case::{Case, ConfidenceLevel, InputKind, ScoredCandidate, Timing};
use crate::error::OttoError;
use crate::fix_history::{AttemptStats, FixAttempt};
use crate::iteration::FollowUpRound;
use crate::scoring::Analysis;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Minimum length of an initial problem description.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Minimum length of follow-up additional info.
pub const MIN_ADDITIONAL_INFO_CHARS: usize = 20;

/// Body of `POST /v1/cases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCaseRequest {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vehicle_info: String,
    #[serde(default)]
    pub timing: Timing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_data: Option<serde_json::Value>,
}

impl NewCaseRequest {
    pub fn validate(&self) -> Result<(), OttoError> {
        if self.description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(OttoError::validation(
                "Description must be at least 10 characters",
            ));
        }
        if self.vehicle_info.is_empty() {
            return Err(OttoError::validation("Vehicle information is required"));
        }
        if !self.timing.is_specified() {
            return Err(OttoError::validation("Timing information is required"));
        }
        Ok(())
    }

    /// Which modalities this submission carries.
    pub fn input_types(&self) -> Vec<InputKind> {
        let mut kinds = Vec::new();
        if !self.description.trim().is_empty() {
            kinds.push(InputKind::Description);
        }
        if self.audio_file.is_some() {
            kinds.push(InputKind::Audio);
        }
        if self.video_file.is_some() {
            kinds.push(InputKind::Video);
        }
        if self.vibration_data.is_some() {
            kinds.push(InputKind::Vibration);
        }
        kinds
    }
}

/// Body of `POST /v1/cases/:id/follow-up`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollowUpRequest {
    #[serde(default)]
    pub additional_info: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vibration_data: Option<serde_json::Value>,
}

impl NewFollowUpRequest {
    pub fn validate(&self) -> Result<(), OttoError> {
        if self.additional_info.chars().count() < MIN_ADDITIONAL_INFO_CHARS {
            return Err(OttoError::validation(
                "Additional info must be at least 20 characters",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /v1/cases/:id/steps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStepRequest {
    pub result_index: usize,
    pub step_index: usize,
    pub completed: bool,
}

/// Response to a step toggle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStepResponse {
    pub success: bool,
    /// False when the toggle was a no-op (already in the requested state).
    pub changed: bool,
}

/// Body of `POST /v1/cases/:id/outcome`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcomeRequest {
    pub result_index: usize,
    pub was_successful: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_minutes: Option<u32>,
    #[serde(default)]
    pub steps_completed: BTreeSet<usize>,
}

/// Response to `GET /v1/health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub catalog_size: usize,
}

/// Response to `GET /v1/cases/:id/summary`: the whole story of a case in one
/// payload: inputs, ranked suggestions, and the fix log with statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    pub case_id: String,
    pub generated_at: DateTime<Utc>,
    pub vehicle_info: String,
    pub description: String,
    pub timing: Timing,
    pub input_types: Vec<InputKind>,
    pub primary_result: ScoredCandidate,
    pub alternative_results: Vec<ScoredCandidate>,
    pub confidence_score: u8,
    pub confidence_level: ConfidenceLevel,
    pub is_resolved: bool,
    pub fix_history: Vec<FixAttempt>,
    pub stats: AttemptStats,
}

impl CaseSummary {
    pub fn build(case: &Case, fix_history: Vec<FixAttempt>) -> Self {
        Self {
            case_id: case.id.clone(),
            generated_at: Utc::now(),
            vehicle_info: case.vehicle_info.clone(),
            description: case.description.clone(),
            timing: case.timing,
            input_types: case.input_types.clone(),
            primary_result: case.primary_result.clone(),
            alternative_results: case.alternative_results.clone(),
            confidence_score: case.confidence_score,
            confidence_level: case.confidence_level,
            is_resolved: case.is_resolved,
            stats: AttemptStats::from_history(&fix_history),
            fix_history,
        }
    }
}

/// Assemble the stored case for a first-round submission.
pub fn build_initial_case(id: String, request: NewCaseRequest, analysis: Analysis) -> Case {
    let input_types = request.input_types();
    let confidence_score = analysis.primary.confidence;
    Case {
        id,
        vehicle_info: request.vehicle_info,
        description: request.description,
        timing: request.timing,
        audio_file: request.audio_file,
        video_file: request.video_file,
        vibration_data: request.vibration_data,
        primary_result: analysis.primary,
        alternative_results: analysis.alternatives,
        needs_more_info: analysis.needs_more_info,
        pending_questions: analysis.questions,
        iteration_count: 1,
        input_types,
        confidence_score,
        confidence_level: ConfidenceLevel::from_score(confidence_score),
        is_resolved: false,
        created_at: Utc::now(),
    }
}

/// Assemble the brand-new case a follow-up round produces. The original
/// case is left untouched; vehicle and timing carry forward.
pub fn build_follow_up_case(
    id: String,
    original: &Case,
    request: NewFollowUpRequest,
    round: &FollowUpRound,
    analysis: Analysis,
) -> Case {
    let mut input_types = vec![InputKind::Description];
    if request.audio_file.is_some() {
        input_types.push(InputKind::Audio);
    }
    if request.video_file.is_some() {
        input_types.push(InputKind::Video);
    }
    if request.vibration_data.is_some() {
        input_types.push(InputKind::Vibration);
    }

    let confidence_score = analysis.primary.confidence;
    Case {
        id,
        vehicle_info: original.vehicle_info.clone(),
        description: round.display_description.clone(),
        timing: original.timing,
        audio_file: request.audio_file,
        video_file: request.video_file,
        vibration_data: request.vibration_data,
        primary_result: analysis.primary,
        alternative_results: analysis.alternatives,
        needs_more_info: analysis.needs_more_info,
        pending_questions: analysis.questions,
        iteration_count: round.iteration_count,
        input_types,
        confidence_score,
        confidence_level: ConfidenceLevel::from_score(confidence_score),
        is_resolved: false,
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(description: &str, vehicle: &str, timing: Timing) -> NewCaseRequest {
        NewCaseRequest {
            description: description.to_string(),
            vehicle_info: vehicle.to_string(),
            timing,
            audio_file: None,
            video_file: None,
            vibration_data: None,
        }
    }

    #[test]
    fn test_valid_submission() {
        let req = request(
            "My car makes a squealing noise when I brake",
            "2015 Honda Civic",
            Timing::Braking,
        );
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_short_description_rejected() {
        let req = request("squeaky", "2015 Honda Civic", Timing::Braking);
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "Description must be at least 10 characters");
    }

    #[test]
    fn test_missing_vehicle_and_timing_rejected() {
        let req = request("a long enough description", "", Timing::Braking);
        assert!(req.validate().is_err());

        let req = request("a long enough description", "2015 Honda Civic", Timing::Unspecified);
        assert_eq!(
            req.validate().unwrap_err().to_string(),
            "Timing information is required"
        );
    }

    #[test]
    fn test_short_follow_up_info_rejected() {
        let body = NewFollowUpRequest {
            additional_info: "still broken".to_string(),
            audio_file: None,
            video_file: None,
            vibration_data: None,
        };
        assert!(body.validate().is_err());

        let body = NewFollowUpRequest {
            additional_info: "the squeal is still there after replacing pads".to_string(),
            audio_file: None,
            video_file: None,
            vibration_data: None,
        };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn test_input_types_track_attachments() {
        let mut req = request(
            "My car makes a squealing noise when I brake",
            "2015 Honda Civic",
            Timing::Braking,
        );
        assert_eq!(req.input_types(), vec![InputKind::Description]);

        req.audio_file = Some("clip.m4a".to_string());
        req.vibration_data = Some(serde_json::json!({ "hz": [12, 30] }));
        assert_eq!(
            req.input_types(),
            vec![InputKind::Description, InputKind::Audio, InputKind::Vibration]
        );
    }

    #[test]
    fn test_wire_names_are_camel_case() {
        let req = request(
            "My car makes a squealing noise when I brake",
            "2015 Honda Civic",
            Timing::Braking,
        );
        let value = serde_json::to_value(&req).expect("serialize");
        assert!(value.get("vehicleInfo").is_some());
        assert_eq!(value.get("timing").and_then(|v| v.as_str()), Some("braking"));
    }
}
