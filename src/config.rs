//! Container configuration.
//!
//! Settings come from a [`ConfigSource`]: the process environment by default,
//! or any key/value source an application wants to plug in. With the
//! `config` feature a [`ContainerConfig`] can also be read from JSON.

use std::collections::HashMap;
use std::env;
use std::fmt;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Depth past which a resolution path is reported instead of followed.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[cfg(feature = "config")]
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A source of raw configuration strings.
pub trait ConfigSource: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads `<PREFIX>_<KEY>` from the process environment.
#[derive(Debug, Clone)]
pub struct EnvironmentConfigSource {
    prefix: String,
}

impl EnvironmentConfigSource {
    pub const DEFAULT_PREFIX: &'static str = "FERROUS_WIRE";

    pub fn new() -> Self {
        Self::with_prefix(Self::DEFAULT_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }
}

impl Default for EnvironmentConfigSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for EnvironmentConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        let var = format!("{}_{}", self.prefix.to_uppercase(), key.to_uppercase());
        env::var(var).ok()
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MapConfigSource {
    values: HashMap<String, String>,
}

impl MapConfigSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl ConfigSource for MapConfigSource {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Runtime knobs of a container.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ContainerConfig, MapConfigSource};
///
/// let source = MapConfigSource::new()
///     .set("trace", "true")
///     .set("max_depth", "64");
/// let config = ContainerConfig::load(&source).unwrap();
///
/// assert!(config.trace_resolutions);
/// assert_eq!(config.max_depth, 64);
/// assert!(!config.log_graph_on_error);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Emit the per-resolution trace line at DEBUG instead of TRACE.
    pub trace_resolutions: bool,
    /// Longest resolution path followed before `DepthExceeded` is reported.
    pub max_depth: usize,
    /// Log the dependency graph in DOT form when a build fails.
    pub log_graph_on_error: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            trace_resolutions: false,
            max_depth: DEFAULT_MAX_DEPTH,
            log_graph_on_error: false,
        }
    }
}

impl ContainerConfig {
    /// Source keys, relative to the source's prefix.
    pub const TRACE_KEY: &'static str = "trace";
    pub const MAX_DEPTH_KEY: &'static str = "max_depth";
    pub const LOG_GRAPH_KEY: &'static str = "log_graph";

    /// Reads `FERROUS_WIRE_TRACE`, `FERROUS_WIRE_MAX_DEPTH` and
    /// `FERROUS_WIRE_LOG_GRAPH`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&EnvironmentConfigSource::new())
    }

    pub fn load(source: &dyn ConfigSource) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = source.get(Self::TRACE_KEY) {
            config.trace_resolutions = parse_bool(Self::TRACE_KEY, &raw)?;
        }
        if let Some(raw) = source.get(Self::MAX_DEPTH_KEY) {
            config.max_depth = match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => depth,
                _ => return Err(invalid(Self::MAX_DEPTH_KEY, &raw, "a positive integer")),
            };
        }
        if let Some(raw) = source.get(Self::LOG_GRAPH_KEY) {
            config.log_graph_on_error = parse_bool(Self::LOG_GRAPH_KEY, &raw)?;
        }
        Ok(config)
    }

    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.max_depth == 0 {
            return Err(invalid(Self::MAX_DEPTH_KEY, "0", "a positive integer"));
        }
        Ok(config)
    }

    pub fn with_trace_resolutions(mut self, enabled: bool) -> Self {
        self.trace_resolutions = enabled;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth.max(1);
        self
    }

    pub fn with_log_graph_on_error(mut self, enabled: bool) -> Self {
        self.log_graph_on_error = enabled;
        self
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(key, raw, "a boolean")),
    }
}

fn invalid(key: &str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_source_is_empty() {
        let config = ContainerConfig::load(&MapConfigSource::new()).unwrap();
        assert_eq!(config, ContainerConfig::default());
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn parses_booleans_loosely() {
        for (raw, expected) in [("1", true), ("YES", true), ("on", true), ("off", false), ("0", false)] {
            let source = MapConfigSource::new().set("log_graph", raw);
            assert_eq!(ContainerConfig::load(&source).unwrap().log_graph_on_error, expected);
        }
    }

    #[test]
    fn rejects_bad_values() {
        let source = MapConfigSource::new().set("max_depth", "0");
        assert!(matches!(
            ContainerConfig::load(&source),
            Err(ConfigError::InvalidValue { .. })
        ));

        let source = MapConfigSource::new().set("trace", "maybe");
        let err = ContainerConfig::load(&source).unwrap_err();
        assert!(err.to_string().contains("trace"));
    }

    #[test]
    fn builder_clamps_depth() {
        let config = ContainerConfig::default().with_max_depth(0);
        assert_eq!(config.max_depth, 1);
    }

    #[cfg(feature = "config")]
    #[test]
    fn reads_json_with_defaults() {
        let config = ContainerConfig::from_json(r#"{ "max_depth": 32 }"#).unwrap();
        assert_eq!(config.max_depth, 32);
        assert!(!config.trace_resolutions);
    }
}
