//! TOML-based configuration for auditql.
//!
//! Supports a config file (auditql.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [compile]
//! dialect = "bkbase"
//!
//! [output]
//! subquery_alias = "sub_table"
//! payload_column = "event_data"
//! strategy_id_column = "strategy_id"
//!
//! [scoping]
//! column = "system_id"
//!
//! [link_tables]
//! dir = "${AUDIT_HOME}/link_tables"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub compile: CompileSettings,
    pub output: OutputSettings,
    pub scoping: ScopingSettings,
    pub link_tables: LinkTableSettings,
}

/// Compilation defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompileSettings {
    /// SQL dialect to emit.
    pub dialect: Dialect,
}

/// Names used by the wrapping query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Alias of the inner query in the outer FROM clause.
    pub subquery_alias: String,

    /// Column holding the JSON object built from the inner select list.
    pub payload_column: String,

    /// Column holding the strategy identifier.
    pub strategy_id_column: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            subquery_alias: "sub_table".to_string(),
            payload_column: "event_data".to_string(),
            strategy_id_column: "strategy_id".to_string(),
        }
    }
}

/// Scoping of event-log tables.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScopingSettings {
    /// Column matched against a scoped table's identifier list.
    pub column: String,
}

impl Default for ScopingSettings {
    fn default() -> Self {
        Self {
            column: "system_id".to_string(),
        }
    }
}

/// Where link-table configurations are read from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkTableSettings {
    /// Root directory laid out as `<dir>/<uid>/<version>.json`
    /// (supports ${ENV_VAR} expansion).
    pub dir: Option<String>,
}

impl LinkTableSettings {
    /// The link-table directory with environment variables expanded.
    pub fn resolved_dir(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.dir
            .as_deref()
            .map(|dir| expand_env_vars(dir).map(PathBuf::from))
            .transpose()
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `AUDITQL_CONFIG`
    /// 2. `./auditql.toml`
    /// 3. `~/.config/auditql/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var("AUDITQL_CONFIG") {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("auditql.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("auditql").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Reject names that would produce an empty identifier.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let names = [
            ("output.subquery_alias", &self.output.subquery_alias),
            ("output.payload_column", &self.output.payload_column),
            ("output.strategy_id_column", &self.output.strategy_id_column),
            ("scoping.column", &self.scoping.column),
        ];
        for (key, value) in names {
            if value.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!("{} must not be empty", key)));
            }
        }
        Ok(())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            // ${VAR}
            chars.by_ref().take_while(|ch| *ch != '}').collect()
        } else {
            // $VAR (ends at non-alphanumeric/underscore)
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // Just a lone $, keep it
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
