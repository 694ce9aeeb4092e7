//! SQLite persistence for cases, follow-ups, and fix history.
//!
//! A single connection in WAL mode behind an async mutex; every multi-step
//! mutation runs in one transaction, so concurrent calls against the same
//! case serialize instead of racing. Step completions live in their own
//! table keyed by (case_id, result_index, step_index) rather than inside the
//! result snapshots, so toggles are row operations, not document rewrites.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use otto_common::case::{Case, ConfidenceLevel, ScoredCandidate, Timing};
use otto_common::error::OttoError;
use otto_common::fix_history::{adjusted_confidence, FixAttempt, SuggestedFix};
use otto_common::{RecordOutcomeRequest, ToggleStepRequest, ToggleStepResponse};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// A filed follow-up request against a case. One row per round; the count
/// drives the iteration number of the next round.
#[derive(Debug, Clone)]
pub struct FollowUpRecord {
    pub id: String,
    pub case_id: String,
    pub additional_info: String,
    pub audio_file: Option<String>,
    pub video_file: Option<String>,
    pub vibration_data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl FollowUpRecord {
    pub fn new(case_id: &str, additional_info: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            case_id: case_id.to_string(),
            additional_info: additional_info.to_string(),
            audio_file: None,
            video_file: None,
            vibration_data: None,
            created_at: Utc::now(),
        }
    }
}

/// Store for everything the daemon persists.
pub struct CaseStore {
    conn: Arc<Mutex<Connection>>,
}

impl CaseStore {
    /// Open or create the database at the given path.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let db_path: PathBuf = path.into();

        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create database directory")?;
        }

        info!("Opening case store at {}", db_path.display());

        let conn = tokio::task::spawn_blocking(move || -> Result<Connection> {
            let conn = Connection::open(&db_path).context("Failed to open SQLite database")?;

            conn.pragma_update(None, "journal_mode", "WAL")
                .context("Failed to enable WAL mode")?;
            conn.pragma_update(None, "synchronous", "NORMAL")
                .context("Failed to set synchronous mode")?;
            conn.pragma_update(None, "foreign_keys", "ON")
                .context("Failed to enable foreign keys")?;

            init_schema(&conn)?;
            Ok(conn)
        })
        .await??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn with_conn<T, F>(&self, f: F) -> Result<T, OttoError>
    where
        F: FnOnce(&mut Connection) -> Result<T, OttoError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.blocking_lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| OttoError::Infrastructure(e.into()))?
    }

    /// Persist a scored case atomically: the case row and its result rows
    /// commit together or not at all.
    pub async fn create_case(&self, case: Case) -> Result<Case, OttoError> {
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(infra)?;

            tx.execute(
                "INSERT INTO cases (id, vehicle_info, description, timing, audio_file,
                                    video_file, vibration_data, needs_more_info,
                                    pending_questions, iteration_count, input_types,
                                    confidence_score, confidence_level, is_resolved, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    case.id,
                    case.vehicle_info,
                    case.description,
                    case.timing.to_string(),
                    case.audio_file,
                    case.video_file,
                    json_opt(&case.vibration_data)?,
                    case.needs_more_info,
                    json(&case.pending_questions)?,
                    case.iteration_count,
                    json(&case.input_types)?,
                    case.confidence_score,
                    case.confidence_level.to_string(),
                    case.is_resolved,
                    case.created_at,
                ],
            )
            .map_err(infra)?;

            let results =
                std::iter::once(&case.primary_result).chain(case.alternative_results.iter());
            for (index, result) in results.enumerate() {
                // Snapshot without the runtime fields; those are reassembled
                // from their own storage on read.
                let mut snapshot = result.clone();
                snapshot.steps_completed.clear();
                snapshot.was_successful = None;
                tx.execute(
                    "INSERT INTO case_results (case_id, result_index, candidate, was_successful)
                     VALUES (?1, ?2, ?3, NULL)",
                    params![case.id, index as i64, json(&snapshot)?],
                )
                .map_err(infra)?;
            }

            tx.commit().map_err(infra)?;
            Ok(case)
        })
        .await
    }

    pub async fn get_case(&self, id: &str) -> Result<Case, OttoError> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            read_case(conn, &id)?.ok_or_else(|| OttoError::not_found("case", &id))
        })
        .await
    }

    /// All cases, newest first.
    pub async fn list_cases(&self) -> Result<Vec<Case>, OttoError> {
        self.with_conn(move |conn| read_cases(conn, None)).await
    }

    /// The most recent cases, newest first.
    pub async fn recent_cases(&self, limit: usize) -> Result<Vec<Case>, OttoError> {
        self.with_conn(move |conn| read_cases(conn, Some(limit)))
            .await
    }

    pub async fn create_follow_up(&self, record: FollowUpRecord) -> Result<(), OttoError> {
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO follow_ups (id, case_id, additional_info, audio_file, video_file,
                                         vibration_data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    record.id,
                    record.case_id,
                    record.additional_info,
                    record.audio_file,
                    record.video_file,
                    json_opt(&record.vibration_data)?,
                    record.created_at,
                ],
            )
            .map_err(infra)?;
            Ok(())
        })
        .await
    }

    /// Ids of follow-ups already filed against a case, oldest first.
    pub async fn follow_up_ids(&self, case_id: &str) -> Result<Vec<String>, OttoError> {
        let case_id = case_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id FROM follow_ups WHERE case_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(infra)?;
            let ids = stmt
                .query_map(params![case_id], |row| row.get::<_, String>(0))
                .map_err(infra)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(infra)?;
            Ok(ids)
        })
        .await
    }

    /// Toggle one repair step on one result, transactionally.
    pub async fn toggle_step(
        &self,
        case_id: &str,
        request: ToggleStepRequest,
    ) -> Result<ToggleStepResponse, OttoError> {
        let case_id = case_id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(infra)?;

            let case = read_case(&tx, &case_id)?
                .ok_or_else(|| OttoError::not_found("case", &case_id))?;
            let result = case.result(request.result_index).ok_or_else(|| {
                OttoError::validation(format!(
                    "result index {} out of range",
                    request.result_index
                ))
            })?;
            if request.step_index >= result.instructions.len() {
                return Err(OttoError::validation(format!(
                    "step index {} out of range",
                    request.step_index
                )));
            }

            let changed = if request.completed {
                tx.execute(
                    "INSERT OR IGNORE INTO step_completions (case_id, result_index, step_index)
                     VALUES (?1, ?2, ?3)",
                    params![case_id, request.result_index as i64, request.step_index as i64],
                )
                .map_err(infra)?
                    > 0
            } else {
                tx.execute(
                    "DELETE FROM step_completions
                     WHERE case_id = ?1 AND result_index = ?2 AND step_index = ?3",
                    params![case_id, request.result_index as i64, request.step_index as i64],
                )
                .map_err(infra)?
                    > 0
            };

            tx.commit().map_err(infra)?;
            Ok(ToggleStepResponse {
                success: true,
                changed,
            })
        })
        .await
    }

    /// Append an outcome report and adjust the case's confidence, all in one
    /// transaction. The attempt log is append-only.
    pub async fn record_outcome(
        &self,
        case_id: &str,
        request: RecordOutcomeRequest,
    ) -> Result<FixAttempt, OttoError> {
        let case_id = case_id.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction().map_err(infra)?;

            let case = read_case(&tx, &case_id)?
                .ok_or_else(|| OttoError::not_found("case", &case_id))?;
            let result = case.result(request.result_index).ok_or_else(|| {
                OttoError::validation(format!(
                    "result index {} out of range",
                    request.result_index
                ))
            })?;

            let prior: u32 = tx
                .query_row(
                    "SELECT COUNT(*) FROM fix_attempts WHERE case_id = ?1",
                    params![case_id],
                    |row| row.get(0),
                )
                .map_err(infra)?;

            let attempt = FixAttempt {
                id: Uuid::new_v4().to_string(),
                case_id: case_id.clone(),
                attempt_number: prior + 1,
                result_index: request.result_index,
                was_successful: request.was_successful,
                feedback: request.feedback.clone(),
                steps_completed: request.steps_completed.clone(),
                time_spent_minutes: request.time_spent_minutes,
                suggested_fix: SuggestedFix {
                    title: result.title.clone(),
                    description: result.description.clone(),
                    instructions: result.instructions.clone(),
                    confidence: result.confidence,
                },
                created_at: Utc::now(),
            };

            tx.execute(
                "INSERT INTO fix_attempts (id, case_id, attempt_number, result_index,
                                           was_successful, feedback, steps_completed,
                                           time_spent_minutes, suggested_fix, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    attempt.id,
                    attempt.case_id,
                    attempt.attempt_number,
                    attempt.result_index as i64,
                    attempt.was_successful,
                    attempt.feedback,
                    json(&attempt.steps_completed)?,
                    attempt.time_spent_minutes,
                    json(&attempt.suggested_fix)?,
                    attempt.created_at,
                ],
            )
            .map_err(infra)?;

            let new_score = adjusted_confidence(case.confidence_score, request.was_successful);
            tx.execute(
                "UPDATE cases SET confidence_score = ?1, confidence_level = ?2, is_resolved = ?3
                 WHERE id = ?4",
                params![
                    new_score,
                    ConfidenceLevel::from_score(new_score).to_string(),
                    request.was_successful,
                    case_id,
                ],
            )
            .map_err(infra)?;
            tx.execute(
                "UPDATE case_results SET was_successful = ?1
                 WHERE case_id = ?2 AND result_index = ?3",
                params![
                    request.was_successful,
                    case_id,
                    request.result_index as i64
                ],
            )
            .map_err(infra)?;

            tx.commit().map_err(infra)?;
            Ok(attempt)
        })
        .await
    }

    /// Fix attempts for a case, newest first.
    pub async fn fix_history(&self, case_id: &str) -> Result<Vec<FixAttempt>, OttoError> {
        let case_id = case_id.to_string();
        self.with_conn(move |conn| {
            let exists: bool = conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM cases WHERE id = ?1)",
                    params![case_id],
                    |row| row.get(0),
                )
                .map_err(infra)?;
            if !exists {
                return Err(OttoError::not_found("case", &case_id));
            }

            let mut stmt = conn
                .prepare(
                    "SELECT id, attempt_number, result_index, was_successful, feedback,
                            steps_completed, time_spent_minutes, suggested_fix, created_at
                     FROM fix_attempts WHERE case_id = ?1
                     ORDER BY attempt_number DESC",
                )
                .map_err(infra)?;
            let rows = stmt
                .query_map(params![case_id.clone()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, Option<u32>>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, DateTime<Utc>>(8)?,
                    ))
                })
                .map_err(infra)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(infra)?;

            let mut attempts = Vec::with_capacity(rows.len());
            for (id, attempt_number, result_index, was_successful, feedback, steps, minutes, fix, created_at) in rows {
                attempts.push(FixAttempt {
                    id,
                    case_id: case_id.clone(),
                    attempt_number,
                    result_index: result_index as usize,
                    was_successful,
                    feedback,
                    steps_completed: from_json(&steps)?,
                    time_spent_minutes: minutes,
                    suggested_fix: from_json(&fix)?,
                    created_at,
                });
            }
            Ok(attempts)
        })
        .await
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cases (
             id TEXT PRIMARY KEY,
             vehicle_info TEXT NOT NULL,
             description TEXT NOT NULL,
             timing TEXT NOT NULL,
             audio_file TEXT,
             video_file TEXT,
             vibration_data TEXT,
             needs_more_info INTEGER NOT NULL,
             pending_questions TEXT NOT NULL,
             iteration_count INTEGER NOT NULL,
             input_types TEXT NOT NULL,
             confidence_score INTEGER NOT NULL,
             confidence_level TEXT NOT NULL,
             is_resolved INTEGER NOT NULL,
             created_at TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_cases_created ON cases(created_at);

         CREATE TABLE IF NOT EXISTS case_results (
             case_id TEXT NOT NULL REFERENCES cases(id),
             result_index INTEGER NOT NULL,
             candidate TEXT NOT NULL,
             was_successful INTEGER,
             PRIMARY KEY (case_id, result_index)
         );

         CREATE TABLE IF NOT EXISTS step_completions (
             case_id TEXT NOT NULL,
             result_index INTEGER NOT NULL,
             step_index INTEGER NOT NULL,
             PRIMARY KEY (case_id, result_index, step_index)
         );

         CREATE TABLE IF NOT EXISTS follow_ups (
             id TEXT PRIMARY KEY,
             case_id TEXT NOT NULL,
             additional_info TEXT NOT NULL,
             audio_file TEXT,
             video_file TEXT,
             vibration_data TEXT,
             created_at TEXT NOT NULL
         );
         CREATE INDEX IF NOT EXISTS idx_follow_ups_case ON follow_ups(case_id);

         CREATE TABLE IF NOT EXISTS fix_attempts (
             id TEXT PRIMARY KEY,
             case_id TEXT NOT NULL,
             attempt_number INTEGER NOT NULL,
             result_index INTEGER NOT NULL,
             was_successful INTEGER NOT NULL,
             feedback TEXT,
             steps_completed TEXT NOT NULL,
             time_spent_minutes INTEGER,
             suggested_fix TEXT NOT NULL,
             created_at TEXT NOT NULL,
             UNIQUE (case_id, attempt_number)
         );
         CREATE INDEX IF NOT EXISTS idx_fix_attempts_case ON fix_attempts(case_id);",
    )
    .context("Failed to initialize schema")?;
    Ok(())
}

fn infra<E: Into<anyhow::Error>>(err: E) -> OttoError {
    OttoError::Infrastructure(err.into())
}

fn json<T: serde::Serialize>(value: &T) -> Result<String, OttoError> {
    serde_json::to_string(value).map_err(infra)
}

fn json_opt<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>, OttoError> {
    value.as_ref().map(|v| json(v)).transpose()
}

fn from_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, OttoError> {
    serde_json::from_str(raw).map_err(infra)
}

fn read_cases(conn: &Connection, limit: Option<usize>) -> Result<Vec<Case>, OttoError> {
    let sql = match limit {
        Some(_) => "SELECT id FROM cases ORDER BY created_at DESC, rowid DESC LIMIT ?1",
        None => "SELECT id FROM cases ORDER BY created_at DESC, rowid DESC",
    };
    let mut stmt = conn.prepare(sql).map_err(infra)?;
    let ids: Vec<String> = match limit {
        Some(n) => stmt
            .query_map(params![n as i64], |row| row.get(0))
            .map_err(infra)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(infra)?,
        None => stmt
            .query_map([], |row| row.get(0))
            .map_err(infra)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(infra)?,
    };

    let mut cases = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(case) = read_case(conn, &id)? {
            cases.push(case);
        }
    }
    Ok(cases)
}

fn read_case(conn: &Connection, id: &str) -> Result<Option<Case>, OttoError> {
    type CaseRow = (
        String,
        String,
        String,
        Option<String>,
        Option<String>,
        Option<String>,
        bool,
        String,
        u32,
        String,
        u8,
        String,
        bool,
        DateTime<Utc>,
    );

    let row: Option<CaseRow> = conn
        .query_row(
            "SELECT vehicle_info, description, timing, audio_file, video_file, vibration_data,
                    needs_more_info, pending_questions, iteration_count, input_types,
                    confidence_score, confidence_level, is_resolved, created_at
             FROM cases WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                    row.get(13)?,
                ))
            },
        )
        .optional()
        .map_err(infra)?;

    let Some((
        vehicle_info,
        description,
        timing_raw,
        audio_file,
        video_file,
        vibration_raw,
        needs_more_info,
        questions_raw,
        iteration_count,
        input_types_raw,
        confidence_score,
        level_raw,
        is_resolved,
        created_at,
    )) = row
    else {
        return Ok(None);
    };

    let timing = Timing::parse(&timing_raw)
        .ok_or_else(|| infra(anyhow::anyhow!("unknown timing '{}' on case {}", timing_raw, id)))?;
    let confidence_level = ConfidenceLevel::parse(&level_raw).ok_or_else(|| {
        infra(anyhow::anyhow!(
            "unknown confidence level '{}' on case {}",
            level_raw,
            id
        ))
    })?;

    let mut results = read_results(conn, id)?;
    if results.is_empty() {
        return Err(infra(anyhow::anyhow!("case {} has no results", id)));
    }
    let primary_result = results.remove(0);

    Ok(Some(Case {
        id: id.to_string(),
        vehicle_info,
        description,
        timing,
        audio_file,
        video_file,
        vibration_data: vibration_raw
            .as_deref()
            .map(from_json::<serde_json::Value>)
            .transpose()?,
        primary_result,
        alternative_results: results,
        needs_more_info,
        pending_questions: from_json(&questions_raw)?,
        iteration_count,
        input_types: from_json(&input_types_raw)?,
        confidence_score,
        confidence_level,
        is_resolved,
        created_at,
    }))
}

fn read_results(conn: &Connection, case_id: &str) -> Result<Vec<ScoredCandidate>, OttoError> {
    let mut stmt = conn
        .prepare(
            "SELECT result_index, candidate, was_successful FROM case_results
             WHERE case_id = ?1 ORDER BY result_index ASC",
        )
        .map_err(infra)?;
    let rows = stmt
        .query_map(params![case_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<bool>>(2)?,
            ))
        })
        .map_err(infra)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(infra)?;

    let mut results = Vec::with_capacity(rows.len());
    for (index, candidate_raw, was_successful) in rows {
        let mut candidate: ScoredCandidate = from_json(&candidate_raw)?;
        candidate.was_successful = was_successful;
        candidate.steps_completed = read_steps(conn, case_id, index)?;
        results.push(candidate);
    }
    Ok(results)
}

fn read_steps(
    conn: &Connection,
    case_id: &str,
    result_index: i64,
) -> Result<BTreeSet<usize>, OttoError> {
    let mut stmt = conn
        .prepare(
            "SELECT step_index FROM step_completions
             WHERE case_id = ?1 AND result_index = ?2",
        )
        .map_err(infra)?;
    let steps = stmt
        .query_map(params![case_id, result_index], |row| row.get::<_, i64>(0))
        .map_err(infra)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(infra)?;
    Ok(steps.into_iter().map(|s| s as usize).collect())
}
