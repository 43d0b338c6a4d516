//! Interface de linha de comando do scorecheck baseada em clap.
//!
//! Recebe apenas os três argumentos posicionais do cenário; endereço do
//! serviço e tempos de espera vêm de [`ScorecheckConfig`](crate::config::ScorecheckConfig).

use std::path::PathBuf;

use clap::Parser;

use crate::scenario::ScenarioInput;

/// scorecheck: envia um vídeo de exercício e aguarda a pontuação.
#[derive(Debug, Parser)]
#[command(name = "scorecheck", version, about)]
pub struct Cli {
    /// Identificador do usuário que envia o exercício.
    pub user_id: String,

    /// Identificador do exercício (ex.: "34").
    pub exercise_id: String,

    /// Caminho do arquivo de mídia a enviar.
    pub file: PathBuf,
}

impl Cli {
    pub fn into_input(self) -> ScenarioInput {
        ScenarioInput {
            user_id: self.user_id,
            exercise_id: self.exercise_id,
            file_path: self.file,
        }
    }
}
