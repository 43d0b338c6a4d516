use std::path::PathBuf;

use thiserror::Error;

use crate::exercise::{EventStatus, ExerciseError, ExerciseEvent};
use crate::poller::PollError;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to read media file {}: {source}", .path.display())]
    Media {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    #[error("{message}: timed out after {timeout_ms}ms ({attempts} attempts, last status: {})", last_status_label(.last))]
    PollTimeout {
        message: String,
        timeout_ms: u128,
        attempts: usize,
        last: Option<Box<ExerciseEvent>>,
    },

    #[error("exercise event {exercise_event_id} ended in status {status}")]
    JobFailed {
        exercise_event_id: String,
        status: EventStatus,
        event: Box<ExerciseEvent>,
    },

    #[error("event reported status {status} with score present: {has_score}, analysis results present: {has_results}")]
    InconsistentEvent {
        status: EventStatus,
        has_score: bool,
        has_results: bool,
    },

    #[error("status moved backwards from {from} to {to}")]
    StatusRegression { from: EventStatus, to: EventStatus },

    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn last_status_label(last: &Option<Box<ExerciseEvent>>) -> String {
    last.as_ref()
        .map_or_else(|| "none".to_string(), |event| event.status.to_string())
}

impl From<PollError<ExerciseEvent, ExerciseError>> for ScenarioError {
    fn from(err: PollError<ExerciseEvent, ExerciseError>) -> Self {
        match err {
            PollError::Timeout {
                message,
                timeout,
                attempts,
                last,
            } => ScenarioError::PollTimeout {
                message,
                timeout_ms: timeout.as_millis(),
                attempts,
                last: last.map(Box::new),
            },
            PollError::Fetch(e) => ScenarioError::Exercise(e),
        }
    }
}

impl ScenarioError {
    /// Last event the scenario saw before failing, when there is one.
    pub fn last_event(&self) -> Option<&ExerciseEvent> {
        match self {
            ScenarioError::PollTimeout { last, .. } => last.as_deref(),
            ScenarioError::JobFailed { event, .. } => Some(event),
            _ => None,
        }
    }
}
