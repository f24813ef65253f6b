//! Application configuration and sink factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use vivamark_core::model::WeightTable;
use vivamark_core::session::SessionConfig;
use vivamark_core::traits::ResultSink;

use crate::csv::CsvFileSink;
use crate::sheets::SheetSink;

/// Configuration for the result sink backend.
///
/// Note: Custom Debug impl masks the API key to prevent accidental
/// exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Csv {
        #[serde(default = "default_results_path")]
        path: PathBuf,
    },
    Sheets {
        sheet_id: String,
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
}

impl std::fmt::Debug for SinkConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkConfig::Csv { path } => f.debug_struct("Csv").field("path", path).finish(),
            SinkConfig::Sheets {
                sheet_id,
                api_key: _,
                base_url,
            } => f
                .debug_struct("Sheets")
                .field("sheet_id", sheet_id)
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig::Csv {
            path: default_results_path(),
        }
    }
}

fn default_results_path() -> PathBuf {
    PathBuf::from("./results.csv")
}

/// Top-level vivamark configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VivamarkConfig {
    /// Path to the question bank JSON file.
    #[serde(default = "default_bank_path")]
    pub bank_path: PathBuf,
    /// Questions drawn per session.
    #[serde(default = "default_questions_per_session")]
    pub questions_per_session: usize,
    /// Session duration in seconds.
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Output path for the marked results artifact.
    #[serde(default = "default_marked_output")]
    pub marked_output: PathBuf,
    /// Per-question score weights keyed by question id.
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    /// Result sink backend.
    #[serde(default)]
    pub sink: SinkConfig,
}

fn default_bank_path() -> PathBuf {
    PathBuf::from("./questions.json")
}
fn default_questions_per_session() -> usize {
    5
}
fn default_duration_secs() -> u64 {
    300
}
fn default_marked_output() -> PathBuf {
    PathBuf::from("./marked_results.csv")
}

impl Default for VivamarkConfig {
    fn default() -> Self {
        Self {
            bank_path: default_bank_path(),
            questions_per_session: default_questions_per_session(),
            duration_secs: default_duration_secs(),
            marked_output: default_marked_output(),
            weights: HashMap::new(),
            sink: SinkConfig::default(),
        }
    }
}

impl VivamarkConfig {
    /// Session parameters derived from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            questions_per_session: self.questions_per_session,
            duration: Duration::from_secs(self.duration_secs),
        }
    }

    /// Validated weight table derived from this configuration.
    pub fn weight_table(&self) -> Result<WeightTable> {
        Ok(WeightTable::new(self.weights.clone())?)
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_sink_config(config: &SinkConfig) -> SinkConfig {
    match config {
        SinkConfig::Csv { path } => SinkConfig::Csv { path: path.clone() },
        SinkConfig::Sheets {
            sheet_id,
            api_key,
            base_url,
        } => SinkConfig::Sheets {
            sheet_id: resolve_env_vars(sheet_id),
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `vivamark.toml` in the current directory
/// 2. `~/.config/vivamark/config.toml`
///
/// Environment variable override: `VIVAMARK_SHEETS_KEY`.
pub fn load_config() -> Result<VivamarkConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<VivamarkConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("vivamark.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<VivamarkConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => VivamarkConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("VIVAMARK_SHEETS_KEY") {
        if let SinkConfig::Sheets { api_key, .. } = &mut config.sink {
            *api_key = key;
        }
    }

    config.sink = resolve_sink_config(&config.sink);

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("vivamark"))
}

/// Create a result sink instance from its configuration.
pub fn create_sink(config: &SinkConfig) -> Result<Arc<dyn ResultSink>> {
    match config {
        SinkConfig::Csv { path } => Ok(Arc::new(CsvFileSink::new(path.clone()))),
        SinkConfig::Sheets {
            sheet_id,
            api_key,
            base_url,
        } => {
            if api_key.is_empty() {
                anyhow::bail!(
                    "sheets sink requires an API key (set VIVAMARK_SHEETS_KEY or the api_key field)"
                );
            }
            Ok(Arc::new(SheetSink::new(api_key, sheet_id, base_url.clone())))
        }
    }
}
