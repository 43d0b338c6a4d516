//! Configuração do scorecheck carregada a partir de `scorecheck.toml`.
//!
//! A struct [`ScorecheckConfig`] contém o endereço do serviço e os parâmetros
//! de polling. Valores ausentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `SCORECHECK_BASE_URL` tem precedência sobre o arquivo.

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::poller::{Backoff, PollOptions};

/// Nome do arquivo de configuração procurado no diretório atual.
pub const CONFIG_FILE: &str = "scorecheck.toml";

/// Variável de ambiente que sobrescreve `base_url`.
pub const BASE_URL_ENV: &str = "SCORECHECK_BASE_URL";

/// Configuração de nível superior carregada de `scorecheck.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScorecheckConfig {
    /// URL base do serviço de exercícios.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Tempo máximo de espera pelo status terminal, em milissegundos.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Intervalos entre consultas de status; o último se repete.
    #[serde(default = "default_poll_intervals_ms")]
    pub poll_intervals_ms: Vec<u64>,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_poll_timeout_ms() -> u64 {
    10_000
}

fn default_poll_intervals_ms() -> Vec<u64> {
    vec![1000, 2000, 3000]
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ScorecheckConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            poll_timeout_ms: default_poll_timeout_ms(),
            poll_intervals_ms: default_poll_intervals_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ScorecheckConfig {
    /// Carrega a configuração de `scorecheck.toml` no diretório atual.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            toml::from_str::<ScorecheckConfig>(&contents)?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo.
        if let Ok(url) = std::env::var(BASE_URL_ENV)
            && !url.is_empty()
        {
            config.base_url = url;
        }

        Ok(config)
    }

    /// Opções do poller para aguardar o status `scored`.
    pub fn poll_options(&self) -> PollOptions {
        PollOptions::new(
            "Exercise event status should become \"scored\"",
            Duration::from_millis(self.poll_timeout_ms),
            Backoff::from_millis(&self.poll_intervals_ms),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
