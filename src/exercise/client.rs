use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ExerciseError;
use super::types::{
    CreateExerciseEventRequest, CreateExerciseEventResponse, ExerciseEvent, UploadUrl,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// The three remote calls, each with the status code it must answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateEvent,
    UploadPayload,
    GetEvent,
}

impl Operation {
    pub fn expected_status(self) -> StatusCode {
        match self {
            Operation::CreateEvent => StatusCode::CREATED,
            Operation::UploadPayload => StatusCode::OK,
            Operation::GetEvent => StatusCode::OK,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::CreateEvent => "create exercise event",
            Operation::UploadPayload => "upload payload",
            Operation::GetEvent => "get exercise event",
        }
    }
}

/// Remote surface the scenario depends on. Lets tests swap in a fake service.
#[allow(async_fn_in_trait)]
pub trait ExerciseApi {
    async fn create_event(
        &self,
        user_id: &str,
        req: &CreateExerciseEventRequest,
    ) -> Result<CreateExerciseEventResponse, ExerciseError>;

    async fn upload_payload(
        &self,
        upload_url: UploadUrl,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ExerciseError>;

    async fn get_event(&self, exercise_event_id: &str) -> Result<ExerciseEvent, ExerciseError>;
}

/// HTTP client for the exercise scoring service.
#[derive(Debug, Clone)]
pub struct ExerciseClient {
    client: Client,
    base_url: String,
}

impl ExerciseClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ExerciseError> {
        Self::with_timeouts(base_url, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        base_url: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, ExerciseError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Wrap an already configured reqwest client.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Base URL extended with `segments`, each percent-encoded as one path segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ExerciseError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ExerciseError::InvalidRequest(format!("invalid base url {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                ExerciseError::InvalidRequest(format!(
                    "base url {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

impl ExerciseApi for ExerciseClient {
    async fn create_event(
        &self,
        user_id: &str,
        req: &CreateExerciseEventRequest,
    ) -> Result<CreateExerciseEventResponse, ExerciseError> {
        if user_id.trim().is_empty() {
            return Err(ExerciseError::InvalidRequest(
                "user id must not be empty".into(),
            ));
        }
        req.validate()?;

        let url = self.endpoint(&["exercise", "v1", "user", user_id, "exercise-event"])?;
        debug!(%url, exercise_id = %req.exercise_id, file_size = req.file_size, "creating exercise event");
        let response = self.client.post(url).json(req).send().await?;

        let response = expect_status(Operation::CreateEvent, response).await?;
        decode(response).await
    }

    async fn upload_payload(
        &self,
        upload_url: UploadUrl,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ExerciseError> {
        debug!(bytes = payload.len(), content_type, "uploading payload");
        let response = self
            .client
            .put(upload_url.into_inner())
            .header(CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await?;

        expect_status(Operation::UploadPayload, response).await?;
        Ok(())
    }

    async fn get_event(&self, exercise_event_id: &str) -> Result<ExerciseEvent, ExerciseError> {
        let url = self.endpoint(&["exercise", "v1", "exercise-event", exercise_event_id])?;
        let response = self.client.get(url).send().await?;

        let response = expect_status(Operation::GetEvent, response).await?;
        let event: ExerciseEvent = decode(response).await?;
        debug!(exercise_event_id, status = %event.status, "fetched exercise event");
        Ok(event)
    }
}

/// Passes the response through when it carries the status `operation` expects.
///
/// Otherwise consumes the body and reports observed status, reason phrase,
/// body text and the expected code.
pub async fn expect_status(
    operation: Operation,
    response: Response,
) -> Result<Response, ExerciseError> {
    let expected = operation.expected_status();
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
    Err(ExerciseError::UnexpectedStatus {
        operation: operation.name(),
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        body,
        expected: expected.as_u16(),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ExerciseError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}
