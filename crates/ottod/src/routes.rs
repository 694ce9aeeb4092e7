//! API routes for ottod.

use crate::server::AppState;
use crate::storage::FollowUpRecord;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use otto_common::scoring::{analyze, AnalysisPass};
use otto_common::{
    build_follow_up_case, build_initial_case, Case, CaseSummary, FixAttempt, FollowUpRound,
    HealthResponse, NewCaseRequest, NewFollowUpRequest, OttoError, RecordOutcomeRequest,
    ToggleStepRequest, ToggleStepResponse, CATALOG,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

const DEFAULT_RECENT_LIMIT: usize = 10;

// ============================================================================
// Case Routes
// ============================================================================

pub fn case_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/cases", post(create_case).get(list_cases))
        .route("/v1/cases/recent", get(recent_cases))
        .route("/v1/cases/:id", get(get_case))
        .route("/v1/cases/:id/follow-up", post(create_follow_up))
        .route("/v1/cases/:id/steps", post(toggle_step))
        .route("/v1/cases/:id/outcome", post(record_outcome))
        .route("/v1/cases/:id/history", get(fix_history))
        .route("/v1/cases/:id/summary", get(case_summary))
}

fn reject(err: OttoError) -> (StatusCode, String) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!("  {}", err);
    }
    (status, err.to_string())
}

/// First-round scoring: iteration 1, nothing excluded.
async fn create_case(
    State(state): State<AppStateArc>,
    Json(request): Json<NewCaseRequest>,
) -> Result<Json<Case>, (StatusCode, String)> {
    request.validate().map_err(reject)?;
    info!("[C]  New case: {} ({})", request.vehicle_info, request.timing);

    let analysis = analyze(
        &request.description,
        request.timing,
        1,
        &HashSet::new(),
        AnalysisPass::Initial,
    );
    let case = build_initial_case(Uuid::new_v4().to_string(), request, analysis);
    let case = state.store.create_case(case).await.map_err(reject)?;

    info!(
        "[C]  Case {} scored: {} at {}%",
        case.id, case.primary_result.title, case.confidence_score
    );
    Ok(Json(case))
}

async fn get_case(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<Case>, (StatusCode, String)> {
    let case = state.store.get_case(&id).await.map_err(reject)?;
    Ok(Json(case))
}

async fn list_cases(
    State(state): State<AppStateArc>,
) -> Result<Json<Vec<Case>>, (StatusCode, String)> {
    let cases = state.store.list_cases().await.map_err(reject)?;
    Ok(Json(cases))
}

#[derive(Debug, Deserialize)]
struct RecentParams {
    limit: Option<usize>,
}

async fn recent_cases(
    State(state): State<AppStateArc>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<Case>>, (StatusCode, String)> {
    let limit = params.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let cases = state.store.recent_cases(limit).await.map_err(reject)?;
    Ok(Json(cases))
}

/// Re-score with everything the original round suggested excluded. The
/// original case stays as it was; the response is a brand-new case.
async fn create_follow_up(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    Json(request): Json<NewFollowUpRequest>,
) -> Result<Json<Case>, (StatusCode, String)> {
    request.validate().map_err(reject)?;

    let original = state.store.get_case(&id).await.map_err(reject)?;
    let prior_ids = state.store.follow_up_ids(&id).await.map_err(reject)?;
    let round = FollowUpRound::assemble(&original, &request.additional_info, &prior_ids);
    info!(
        "[F]  Follow-up on case {}: round {} excluding {} suggestions",
        id,
        round.iteration_count,
        round.excluded_titles.len()
    );

    let record = FollowUpRecord {
        id: Uuid::new_v4().to_string(),
        case_id: id.clone(),
        additional_info: request.additional_info.clone(),
        audio_file: request.audio_file.clone(),
        video_file: request.video_file.clone(),
        vibration_data: request.vibration_data.clone(),
        created_at: chrono::Utc::now(),
    };
    state.store.create_follow_up(record).await.map_err(reject)?;

    let analysis = analyze(
        &round.merged_description,
        original.timing,
        round.iteration_count,
        &round.excluded_titles,
        AnalysisPass::FollowUp,
    );
    let case = build_follow_up_case(
        Uuid::new_v4().to_string(),
        &original,
        request,
        &round,
        analysis,
    );
    let case = state.store.create_case(case).await.map_err(reject)?;

    info!(
        "[F]  Case {} scored: {} at {}%",
        case.id, case.primary_result.title, case.confidence_score
    );
    Ok(Json(case))
}

// ============================================================================
// Fix-Tracking Routes
// ============================================================================

async fn toggle_step(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    Json(request): Json<ToggleStepRequest>,
) -> Result<Json<ToggleStepResponse>, (StatusCode, String)> {
    let response = state.store.toggle_step(&id, request).await.map_err(reject)?;
    Ok(Json(response))
}

async fn record_outcome(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
    Json(request): Json<RecordOutcomeRequest>,
) -> Result<Json<FixAttempt>, (StatusCode, String)> {
    let worked = request.was_successful;
    let attempt = state
        .store
        .record_outcome(&id, request)
        .await
        .map_err(reject)?;
    info!(
        "[O]  Case {} attempt #{}: {}",
        id,
        attempt.attempt_number,
        if worked { "fixed" } else { "not fixed" }
    );
    Ok(Json(attempt))
}

async fn fix_history(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<Vec<FixAttempt>>, (StatusCode, String)> {
    let history = state.store.fix_history(&id).await.map_err(reject)?;
    Ok(Json(history))
}

async fn case_summary(
    State(state): State<AppStateArc>,
    Path(id): Path<String>,
) -> Result<Json<CaseSummary>, (StatusCode, String)> {
    let case = state.store.get_case(&id).await.map_err(reject)?;
    let history = state.store.fix_history(&id).await.map_err(reject)?;
    Ok(Json(CaseSummary::build(&case, history)))
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        catalog_size: CATALOG.len(),
    })
}
