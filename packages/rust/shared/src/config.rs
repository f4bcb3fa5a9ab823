//! Application configuration for the keyness pipeline.
//!
//! User config lives at `~/.keyness/keyness.toml`.
//! CLI flags override config file values, which override defaults.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{KeynessError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "keyness.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".keyness";

/// Substitute frequency for a term absent from one side of the comparison.
pub const SMOOTHING_FLOOR: f64 = 0.1;

/// Critical value of chi-squared with one degree of freedom at p = 0.05.
pub const SIGNIFICANCE_CUTOFF: f64 = 3.84;

/// Shortest term kept by the tokenizer, in characters.
pub const MIN_TERM_CHARS: usize = 5;

// ---------------------------------------------------------------------------
// Config structs (matching keyness.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Tokenizer and scoring parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// `[analysis]` section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Terms with fewer characters are discarded.
    #[serde(default = "default_min_term_chars")]
    pub min_term_chars: usize,

    /// Frequency used in place of zero when a term is absent.
    #[serde(default = "default_smoothing_floor")]
    pub smoothing_floor: f64,

    /// Critical values below this are not significant.
    #[serde(default = "default_significance_cutoff")]
    pub significance_cutoff: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_term_chars: default_min_term_chars(),
            smoothing_floor: default_smoothing_floor(),
            significance_cutoff: default_significance_cutoff(),
        }
    }
}

fn default_min_term_chars() -> usize {
    MIN_TERM_CHARS
}
fn default_smoothing_floor() -> f64 {
    SMOOTHING_FLOOR
}
fn default_significance_cutoff() -> f64 {
    SIGNIFICANCE_CUTOFF
}

impl AnalysisConfig {
    /// Reject parameter values that make scoring undefined.
    pub fn validate(&self) -> Result<()> {
        if self.min_term_chars == 0 {
            return Err(KeynessError::config("min_term_chars must be at least 1"));
        }
        if !(self.smoothing_floor.is_finite() && self.smoothing_floor > 0.0) {
            return Err(KeynessError::config(format!(
                "smoothing_floor must be a positive finite number, got {}",
                self.smoothing_floor
            )));
        }
        if !self.significance_cutoff.is_finite() {
            return Err(KeynessError::config(format!(
                "significance_cutoff must be finite, got {}",
                self.significance_cutoff
            )));
        }
        Ok(())
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding one `<doc-id>.html` file per document.
    #[serde(default = "default_raw_dir")]
    pub raw_dir: String,

    /// Root directory that receives the artifact namespaces.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: default_raw_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_raw_dir() -> String {
    "html".into()
}
fn default_output_dir() -> String {
    "results".into()
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Directory of raw documents.
    pub raw_dir: PathBuf,
    /// Artifact store root.
    pub output_dir: PathBuf,
    /// Tokenizer and scoring parameters.
    pub analysis: AnalysisConfig,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            raw_dir: PathBuf::from(&config.paths.raw_dir),
            output_dir: PathBuf::from(&config.paths.output_dir),
            analysis: config.analysis,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Parse config text and validate the analysis parameters.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| KeynessError::config(e.to_string()))?;
        config.analysis.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML, the format `config init` writes.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| KeynessError::config(e.to_string()))
    }
}

/// `~/.keyness/keyness.toml`.
pub fn config_file_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| KeynessError::config("could not determine home directory"))
}

/// Load the user config, or defaults if there is none.
pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_file_path()?)
}

/// Load the config at `path`, or defaults if the file does not exist.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => return Err(KeynessError::io(path, e)),
    };

    AppConfig::from_toml(&content).map_err(|e| match e {
        KeynessError::Config { message } => {
            KeynessError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

/// Write the default config to the user config path and return that path.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write the default config to `path`. An existing file is left untouched
/// and reported as a config error.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| KeynessError::storage_write(dir, e))?;
    }
    let content = AppConfig::default().to_toml()?;

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::AlreadyExists => {
                KeynessError::config(format!("{} already exists", path.display()))
            }
            _ => KeynessError::storage_write(path, e),
        })?;
    file.write_all(content.as_bytes())
        .map_err(|e| KeynessError::storage_write(path, e))?;

    info!(path = %path.display(), "created default config file");
    Ok(())
}
