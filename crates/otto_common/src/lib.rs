//! Shared domain types and the diagnosis engine for Otto components.

pub mod api;
pub mod case;
pub mod catalog;
pub mod error;
pub mod fix_history;
pub mod iteration;
pub mod questions;
pub mod scoring;

pub use api::{
    build_follow_up_case, build_initial_case, CaseSummary, HealthResponse, NewCaseRequest,
    NewFollowUpRequest, RecordOutcomeRequest, ToggleStepRequest, ToggleStepResponse,
};
pub use case::{Case, ConfidenceLevel, InputKind, ScoredCandidate, Timing};
pub use catalog::{find_by_title, Candidate, Severity, CATALOG};
pub use error::OttoError;
pub use fix_history::{AttemptStats, FixAttempt, SuggestedFix};
pub use iteration::{needs_more_info, FollowUpRound, MAX_CLARIFICATION_ROUNDS};
pub use questions::{clarifying_questions, MAX_QUESTIONS};
pub use scoring::{analyze, Analysis, AnalysisPass, MAX_CONFIDENCE, MIN_CONFIDENCE};
