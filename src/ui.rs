//! Interface de terminal do scorecheck: spinner e saída colorida.
//!
//! Usa `indicatif` para o spinner de progresso e `console` para estilização.
//! O [`ScenarioProgress`] mostra cada estado intermediário do cenário.

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::ScenarioError;
use crate::exercise::{EventStatus, ExerciseEvent};
use crate::scenario::ScenarioReport;

/// Indicador visual de progresso para uma execução do cenário.
pub struct ScenarioProgress {
    pb: ProgressBar,
    // Silencia toda a saída (usado nos testes).
    quiet: bool,
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
}

impl ScenarioProgress {
    /// Inicia o spinner com a descrição do cenário.
    pub fn start(description: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(description.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self::with_bar(pb, false)
    }

    /// Progresso sem nenhuma saída no terminal.
    pub fn hidden() -> Self {
        Self::with_bar(ProgressBar::hidden(), true)
    }

    fn with_bar(pb: ProgressBar, quiet: bool) -> Self {
        Self {
            pb,
            quiet,
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
        }
    }

    // Sem terminal o indicatif esconde a barra, então a linha vai direto para stdout.
    fn line(&self, msg: String) {
        if self.quiet {
            return;
        }
        if self.pb.is_hidden() {
            println!("{msg}");
        } else {
            self.pb.println(msg);
        }
    }

    pub fn created(&self, exercise_event_id: &str) {
        self.line(format!(
            "  {} Created event: {exercise_event_id}",
            self.cyan.apply_to("+")
        ));
        self.pb.set_message(format!("uploading media for {exercise_event_id}"));
    }

    pub fn uploaded(&self, bytes: usize, content_type: &str) {
        self.line(format!(
            "  {} Video uploaded successfully ({bytes} bytes, {content_type})",
            self.cyan.apply_to("↑")
        ));
        self.pb.set_message("waiting for score");
    }

    /// Exibe o status retornado por cada consulta.
    pub fn status(&self, event: &ExerciseEvent) {
        let style = match event.status {
            EventStatus::Scored => &self.green,
            EventStatus::Failed => &self.red,
            _ => &self.yellow,
        };
        self.line(format!(
            "  {} Current status: {}",
            style.apply_to("↻"),
            style.apply_to(event.status)
        ));
        self.pb.set_message(format!("status: {}", event.status));
    }

    /// Finaliza o spinner e exibe o resultado do cenário.
    pub fn complete(&self, outcome: &Result<ScenarioReport, ScenarioError>) {
        self.pb.finish_and_clear();
        match outcome {
            Ok(report) => self.line(format!(
                "  {} Exercise scored: {} ({} analysis results)",
                self.green.apply_to("✓"),
                report
                    .final_event
                    .score
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
                report.final_event.analysis_count()
            )),
            Err(e) => self.line(format!("  {} Scenario failed: {e}", self.red.apply_to("✗"))),
        }
    }

    /// Imprime o relatório em JSON com estilo colorido.
    pub fn print_report(&self, report: &ScenarioReport) {
        self.line(String::new());
        self.line(format!("{}", self.green.apply_to("─── Scenario Report ───")));
        self.line(serde_json::to_string_pretty(report).unwrap_or_default());
    }

    /// Imprime o último evento observado antes de uma falha.
    pub fn print_last_event(&self, event: &ExerciseEvent) {
        self.line(format!("{}", self.red.apply_to("─── Last Observed Event ───")));
        self.line(serde_json::to_string_pretty(event).unwrap_or_default());
    }
}
