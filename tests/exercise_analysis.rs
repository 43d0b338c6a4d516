//! End-to-end exercise analysis flow against a mock scoring service.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use scorecheck::exercise::{EventStatus, ExerciseError};
use scorecheck::ui::ScenarioProgress;
use scorecheck::{
    Backoff, ExerciseClient, PollOptions, ScenarioError, ScenarioInput, run_scenario,
};

const USER_ID: &str = "test-user-123";
const EXERCISE_ID: &str = "34";
const EVENT_ID: &str = "evt-77";

/// Answers status polls with `statuses` in order, then keeps repeating the last one.
struct StatusSequence {
    statuses: Vec<&'static str>,
    calls: AtomicUsize,
}

impl StatusSequence {
    fn new(statuses: &[&'static str]) -> Self {
        Self {
            statuses: statuses.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Respond for StatusSequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let status = self.statuses[n.min(self.statuses.len() - 1)];
        let mut body = json!({
            "exerciseEventId": EVENT_ID,
            "exerciseId": EXERCISE_ID,
            "status": status,
        });
        if status == "scored" {
            body["score"] = json!(84.5);
            body["analysisResults"] = json!([
                {"metric": "range_of_motion", "value": 0.92},
                {"metric": "tempo", "value": 0.71}
            ]);
            body["modelVersion"] = json!("2024-11");
        }
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Replays raw status bodies in order, then keeps repeating the last one.
struct BodySequence {
    bodies: Vec<serde_json::Value>,
    calls: AtomicUsize,
}

impl Respond for BodySequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        ResponseTemplate::new(200).set_body_json(self.bodies[n.min(self.bodies.len() - 1)].clone())
    }
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/dummy-video.mov")
}

fn input() -> ScenarioInput {
    ScenarioInput {
        user_id: USER_ID.into(),
        exercise_id: EXERCISE_ID.into(),
        file_path: fixture(),
    }
}

fn fast_options(timeout_ms: u64) -> PollOptions {
    PollOptions::new(
        "Exercise event status should become \"scored\"",
        Duration::from_millis(timeout_ms),
        Backoff::from_millis(&[20, 40, 60]),
    )
}

async fn mount_create(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(format!("/exercise/v1/user/{USER_ID}/exercise-event")))
        .and(body_json(json!({
            "exerciseId": EXERCISE_ID,
            "fileExtension": "mov",
            "fileSize": 1024
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "exerciseEventId": EVENT_ID,
            "uploadUrl": format!("{}/uploads/{EVENT_ID}?signature=abc", server.uri()),
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_upload(server: &MockServer, times: u64) {
    Mock::given(method("PUT"))
        .and(path(format!("/uploads/{EVENT_ID}")))
        .and(header("content-type", "video/quicktime"))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, statuses: &[&'static str]) {
    Mock::given(method("GET"))
        .and(path(format!("/exercise/v1/exercise-event/{EVENT_ID}")))
        .respond_with(StatusSequence::new(statuses))
        .mount(server)
        .await;
}

#[tokio::test]
async fn uploaded_exercise_video_gets_scored() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    mount_status(&server, &["new", "processing", "scored"]).await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let report = run_scenario(&client, &input(), &fast_options(5_000), &ScenarioProgress::hidden())
        .await
        .unwrap();

    assert_eq!(report.exercise_event_id, EVENT_ID);
    assert_eq!(
        report.statuses,
        vec![EventStatus::New, EventStatus::Processing, EventStatus::Scored]
    );
    assert_eq!(report.final_event.score, Some(84.5));
    assert!(report.final_event.analysis_count() > 0);
    assert!(report.final_event.is_consistent());
    assert_eq!(
        report
            .final_event
            .extensions
            .get::<String>("modelVersion")
            .unwrap()
            .unwrap(),
        "2024-11"
    );

    // The poller stops at the first scored snapshot.
    let polls = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.method.as_str() == "GET")
        .count();
    assert_eq!(polls, 3);
}

#[tokio::test]
async fn never_scored_event_times_out_instead_of_hanging() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    mount_status(&server, &["new", "processing"]).await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = tokio::time::timeout(
        Duration::from_secs(5),
        run_scenario(&client, &input(), &fast_options(300), &ScenarioProgress::hidden()),
    )
    .await
    .expect("scenario must finish on its own deadline")
    .unwrap_err();

    match err {
        ScenarioError::PollTimeout {
            message,
            timeout_ms,
            attempts,
            last,
        } => {
            assert!(message.contains("scored"));
            assert_eq!(timeout_ms, 300);
            assert!(attempts >= 2);
            assert_eq!(last.unwrap().status, EventStatus::Processing);
        }
        other => panic!("expected PollTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn create_failure_stops_before_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .expect(1)
        .mount(&server)
        .await;
    mount_upload(&server, 0).await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(1_000), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    match err {
        ScenarioError::Exercise(e @ ExerciseError::UnexpectedStatus { .. }) => {
            assert_eq!(e.status_pair(), Some((500, 201)));
            assert!(e.to_string().contains("database unavailable"));
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_upload_fails_scenario_without_polling() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(403).set_body_string("signature expired"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(1_000), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    match err {
        ScenarioError::Exercise(e) => assert_eq!(e.status_pair(), Some((403, 200))),
        other => panic!("expected exercise error, got {other:?}"),
    }
}

#[tokio::test]
async fn status_error_during_poll_aborts_scenario() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(2_000), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    match err {
        ScenarioError::Exercise(e) => assert_eq!(e.status_pair(), Some((502, 200))),
        other => panic!("expected exercise error, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_event_is_reported_as_job_failure() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    mount_status(&server, &["processing", "failed"]).await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(2_000), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScenarioError::JobFailed {
            status: EventStatus::Failed,
            ..
        }
    ));
    assert_eq!(err.last_event().unwrap().exercise_event_id, EVENT_ID);
}

#[tokio::test]
async fn processing_snapshot_with_score_fails_scenario() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(format!("/exercise/v1/exercise-event/{EVENT_ID}")))
        .respond_with(BodySequence {
            bodies: vec![
                json!({
                    "exerciseEventId": EVENT_ID,
                    "exerciseId": EXERCISE_ID,
                    "status": "processing",
                    "score": 5.0,
                    "analysisResults": [1]
                }),
                json!({
                    "exerciseEventId": EVENT_ID,
                    "exerciseId": EXERCISE_ID,
                    "status": "scored",
                    "score": 90.0,
                    "analysisResults": [{"metric": "tempo", "value": 0.8}]
                }),
            ],
            calls: AtomicUsize::new(0),
        })
        .expect(1)
        .mount(&server)
        .await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(2_000), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScenarioError::InconsistentEvent {
            status: EventStatus::Processing,
            has_score: true,
            has_results: true,
        }
    ));
}

#[tokio::test]
async fn regressing_event_reports_regression_not_timeout() {
    let server = MockServer::start().await;
    mount_create(&server).await;
    mount_upload(&server, 1).await;
    mount_status(&server, &["processing", "new"]).await;

    let client = ExerciseClient::new(server.uri()).unwrap();
    let err = run_scenario(&client, &input(), &fast_options(300), &ScenarioProgress::hidden())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScenarioError::StatusRegression {
            from: EventStatus::Processing,
            to: EventStatus::New,
        }
    ));
}
