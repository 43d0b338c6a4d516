//! End-to-end checker for the exercise scoring service.
//!
//! Creates an exercise event, uploads the media to the returned URL and polls
//! the event until it is scored, then checks the result.

pub mod cli;
pub mod config;
pub mod error;
pub mod exercise;
pub mod media;
pub mod poller;
pub mod scenario;
pub mod ui;

pub use error::ScenarioError;
pub use exercise::{ExerciseApi, ExerciseClient, ExerciseError};
pub use poller::{Backoff, PollError, PollOptions, poll_until};
pub use scenario::{ScenarioInput, ScenarioReport, run_scenario};
