//! Configuration module for auditql.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, CompileSettings, LinkTableSettings, OutputSettings, ScopingSettings,
    Settings, SettingsError,
};
