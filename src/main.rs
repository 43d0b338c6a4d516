use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use scorecheck::cli::Cli;
use scorecheck::config::ScorecheckConfig;
use scorecheck::exercise::ExerciseClient;
use scorecheck::run_scenario;
use scorecheck::ui::ScenarioProgress;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ScorecheckConfig::load()?;
    let client = ExerciseClient::with_timeouts(
        &config.base_url,
        config.connect_timeout(),
        config.request_timeout(),
    )?;

    let input = cli.into_input();
    let progress = ScenarioProgress::start(&format!(
        "exercise {} for {} against {}",
        input.exercise_id, input.user_id, config.base_url
    ));

    let outcome = run_scenario(&client, &input, &config.poll_options(), &progress).await;
    progress.complete(&outcome);

    match outcome {
        Ok(report) => {
            progress.print_report(&report);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            if let Some(event) = e.last_event() {
                progress.print_last_event(event);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
