//! Bootstrap configuration loading and samples folder resolution
//!
//! Configuration is a TOML file whose absence is never fatal: a missing file
//! logs a warning and the compiled defaults apply.
//!
//! Samples folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. `PIANOLA_SAMPLES` environment variable
//! 3. `samples_folder` key in the TOML config
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable overriding the samples folder
pub const SAMPLES_ENV_VAR: &str = "PIANOLA_SAMPLES";

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform defaults used when nothing else is configured
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub samples_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/.local/share/pianola/samples, ~/Library/Application Support/pianola/samples,
        // %LOCALAPPDATA%\pianola\samples
        let samples_folder = dirs::data_local_dir()
            .map(|d| d.join("pianola").join("samples"))
            .unwrap_or_else(|| PathBuf::from("./pianola_data/samples"));

        Self {
            samples_folder,
            log_level: default_log_level(),
        }
    }
}

/// Default config file location for a module: `<config dir>/pianola/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pianola").join(format!("{}.toml", module_name)))
}

/// Load a TOML config file, falling back to `T::default()` when it is missing
///
/// A file that exists but does not parse is an error.
pub fn load_toml_or_default<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(T::default());
        }
        Err(e) => return Err(Error::Io(e)),
    };

    debug!("Loaded config file {}", path.display());

    toml::from_str(&text)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Resolves the folder holding sample files
pub struct SamplesFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_value: Option<PathBuf>,
}

impl SamplesFolderResolver {
    pub fn new() -> Self {
        Self {
            cli_arg: None,
            toml_value: None,
        }
    }

    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    pub fn with_toml_value(mut self, path: Option<PathBuf>) -> Self {
        self.toml_value = path;
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(SAMPLES_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_value {
            return path.clone();
        }

        CompiledDefaults::for_current_platform().samples_folder
    }
}

impl Default for SamplesFolderResolver {
    fn default() -> Self {
        Self::new()
    }
}
