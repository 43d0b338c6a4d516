//! Wire types for the exercise-event endpoints.
//!
//! Field names follow the service's camelCase JSON. Unknown fields on an
//! [`ExerciseEvent`] are kept in [`Extensions`] instead of being dropped.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::ExerciseError;

/// Body of `POST /exercise/v1/user/{userId}/exercise-event`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseEventRequest {
    pub exercise_id: String,
    /// Extension without the leading dot, e.g. `"mov"`.
    pub file_extension: String,
    /// Declared payload size in bytes.
    pub file_size: u64,
}

impl CreateExerciseEventRequest {
    pub fn new(
        exercise_id: impl Into<String>,
        file_extension: impl Into<String>,
        file_size: u64,
    ) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            file_extension: file_extension.into(),
            file_size,
        }
    }

    pub fn validate(&self) -> Result<(), ExerciseError> {
        if self.exercise_id.trim().is_empty() {
            return Err(ExerciseError::InvalidRequest(
                "exercise id must not be empty".into(),
            ));
        }
        if self.file_extension.trim().is_empty() {
            return Err(ExerciseError::InvalidRequest(
                "file extension must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Single-use upload destination handed out by the service.
///
/// Not `Clone`. Uploading consumes it, so a URL is written at most once.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UploadUrl(String);

impl UploadUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for UploadUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response of the create call: the event id plus where to put the media.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExerciseEventResponse {
    pub exercise_event_id: String,
    pub upload_url: UploadUrl,
}

/// Lifecycle of an exercise event on the service side.
///
/// Transitions only move forward: `new → processing → {scored | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    New,
    Processing,
    Scored,
    Failed,
}

impl EventStatus {
    /// Position in the lifecycle. Both terminal states share the last rank.
    pub fn rank(self) -> u8 {
        match self {
            EventStatus::New => 0,
            EventStatus::Processing => 1,
            EventStatus::Scored | EventStatus::Failed => 2,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, EventStatus::Scored | EventStatus::Failed)
    }

    /// Whether `self` may be observed right after `previous`.
    pub fn can_follow(self, previous: EventStatus) -> bool {
        if previous.is_terminal() {
            return self == previous;
        }
        self.rank() >= previous.rank()
    }

    /// First pair in `history` that moves backwards, if any.
    pub fn first_regression(history: &[EventStatus]) -> Option<(EventStatus, EventStatus)> {
        history
            .windows(2)
            .find(|w| !w[1].can_follow(w[0]))
            .map(|w| (w[0], w[1]))
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventStatus::New => write!(f, "new"),
            EventStatus::Processing => write!(f, "processing"),
            EventStatus::Scored => write!(f, "scored"),
            EventStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Additional fields the service reports beyond the known ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Extensions(BTreeMap<String, Value>);

impl Extensions {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode one extension field into `T`. `None` when the key is absent.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Result<T, serde_json::Error>> {
        self.0
            .get(key)
            .map(|value| serde_json::from_value(value.clone()))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Snapshot of an exercise event as returned by the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEvent {
    pub exercise_event_id: String,
    pub exercise_id: String,
    pub status: EventStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_results: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extensions: Extensions,
}

impl ExerciseEvent {
    /// `score` and `analysisResults` are present exactly when the event is scored.
    pub fn is_consistent(&self) -> bool {
        let scored = self.status == EventStatus::Scored;
        scored == self.score.is_some() && scored == self.analysis_results.is_some()
    }

    /// Number of analysis records, zero when absent.
    pub fn analysis_count(&self) -> usize {
        self.analysis_results.as_ref().map_or(0, Vec::len)
    }
}
