use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ScenarioError;
use crate::exercise::{
    CreateExerciseEventRequest, CreateExerciseEventResponse, EventStatus, ExerciseApi,
    ExerciseEvent,
};
use crate::media::MediaFile;
use crate::poller::{PollOptions, poll_until};
use crate::ui::ScenarioProgress;

/// Who submits, which exercise, and the media to upload.
#[derive(Debug, Clone)]
pub struct ScenarioInput {
    pub user_id: String,
    pub exercise_id: String,
    pub file_path: PathBuf,
}

/// Structured record of one end-to-end run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub run_id: Uuid,
    pub user_id: String,
    pub exercise_id: String,
    pub exercise_event_id: String,
    /// Status seen on every poll, in order.
    pub statuses: Vec<EventStatus>,
    pub attempts: usize,
    pub final_event: ExerciseEvent,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

/// Create an exercise event, upload the media, wait for a terminal status and
/// check the scored result.
///
/// Any failure ends the run; nothing is retried apart from the status polls.
pub async fn run_scenario(
    api: &impl ExerciseApi,
    input: &ScenarioInput,
    options: &PollOptions,
    progress: &ScenarioProgress,
) -> Result<ScenarioReport, ScenarioError> {
    let started_at = Utc::now();
    let media = MediaFile::read(&input.file_path)
        .await
        .map_err(|source| ScenarioError::Media {
            path: input.file_path.clone(),
            source,
        })?;

    // 1. Create the exercise event.
    let request = CreateExerciseEventRequest::new(&input.exercise_id, &media.extension, media.len());
    let CreateExerciseEventResponse {
        exercise_event_id,
        upload_url,
    } = api.create_event(&input.user_id, &request).await?;
    if exercise_event_id.is_empty() || upload_url.as_str().is_empty() {
        return Err(ScenarioError::Assertion(
            "create response is missing exerciseEventId or uploadUrl".into(),
        ));
    }
    info!(%exercise_event_id, "created exercise event");
    progress.created(&exercise_event_id);

    // 2. Upload the media.
    let content_type = media.content_type();
    let size = media.bytes.len();
    api.upload_payload(upload_url, media.bytes, content_type)
        .await?;
    info!(bytes = size, content_type, "uploaded media");
    progress.uploaded(size, content_type);

    // 3. Poll until the event reaches a terminal status.
    let event_id = exercise_event_id.as_str();
    let mut statuses = Vec::new();
    let mut violation = None;
    let final_event = poll_until(
        options,
        || api.get_event(event_id),
        |event: &ExerciseEvent| {
            debug!(status = %event.status, "polled exercise event");
            let previous = statuses.last().copied();
            statuses.push(event.status);
            progress.status(event);
            violation = check_snapshot(previous, event);
            violation.is_some() || event.status.is_terminal()
        },
    )
    .await?;
    if let Some(err) = violation {
        return Err(err);
    }

    // 4. Check the captured final snapshot.
    verify_final_event(&final_event, event_id, &input.exercise_id, &statuses)?;

    let completed_at = Utc::now();
    Ok(ScenarioReport {
        run_id: Uuid::new_v4(),
        user_id: input.user_id.clone(),
        exercise_id: input.exercise_id.clone(),
        exercise_event_id,
        attempts: statuses.len(),
        statuses,
        final_event,
        started_at,
        completed_at,
        duration_ms: (completed_at - started_at).num_milliseconds(),
    })
}

/// Lifecycle checks applied to every polled snapshot.
///
/// The status may not move backwards from `previous`, and `score` /
/// `analysisResults` must be present exactly when the event is scored.
pub fn check_snapshot(
    previous: Option<EventStatus>,
    event: &ExerciseEvent,
) -> Option<ScenarioError> {
    if let Some(from) = previous
        && !event.status.can_follow(from)
    {
        return Some(ScenarioError::StatusRegression {
            from,
            to: event.status,
        });
    }
    if !event.is_consistent() {
        return Some(ScenarioError::InconsistentEvent {
            status: event.status,
            has_score: event.score.is_some(),
            has_results: event.analysis_results.is_some(),
        });
    }
    None
}

/// Assertions on the last polled event.
pub fn verify_final_event(
    event: &ExerciseEvent,
    exercise_event_id: &str,
    exercise_id: &str,
    statuses: &[EventStatus],
) -> Result<(), ScenarioError> {
    if let Some((from, to)) = EventStatus::first_regression(statuses) {
        return Err(ScenarioError::StatusRegression { from, to });
    }
    if event.exercise_event_id != exercise_event_id {
        return Err(ScenarioError::Assertion(format!(
            "polled event id {} does not match created id {exercise_event_id}",
            event.exercise_event_id
        )));
    }
    if event.exercise_id != exercise_id {
        return Err(ScenarioError::Assertion(format!(
            "event reports exercise {} but {exercise_id} was submitted",
            event.exercise_id
        )));
    }
    if event.status != EventStatus::Scored {
        return Err(ScenarioError::JobFailed {
            exercise_event_id: exercise_event_id.to_string(),
            status: event.status,
            event: Box::new(event.clone()),
        });
    }
    if event.score.is_none() {
        return Err(ScenarioError::Assertion("scored event has no score".into()));
    }
    if event.analysis_count() == 0 {
        return Err(ScenarioError::Assertion(
            "scored event has no analysis results".into(),
        ));
    }
    Ok(())
}
