// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_MAX_CONCURRENCY, DEFAULT_PRIORITY};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for the feature orchestrator.
///
/// Describes every computable feature, the alternative methods that can
/// produce it, the external services methods may depend on, and the named
/// pipelines built from those features. Usually loaded from a YAML file.
///
/// # Example
/// ```yaml
/// executor_options:
///   max_concurrency: 4
///   method_timeout_ms: 30000
///   timeout_policy: fallback
/// services: [raster_service, census_service]
/// features:
///   - name: building_area
///     strategy: building_area
///     constraints: { datatype: array, min: 0 }
///     methods:
///       - name: calculate_from_geometry
///         priority: 1
///         depends_on: [building_geo]
/// pipelines:
///   - name: building_basics
///     features: [building_area]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub executor_options: ExecutorOptions,
    #[serde(default)]
    pub services: Vec<String>,
    pub features: Vec<FeatureConfig>,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

/// Executor-specific configuration options.
///
/// # Fields
/// * `max_concurrency` - Upper bound on features running at once inside a wave
/// * `method_timeout_ms` - Ceiling for a single method invocation (no limit when absent)
/// * `timeout_policy` - What a timed-out method does to its feature
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExecutorOptions {
    pub max_concurrency: Option<usize>,
    pub method_timeout_ms: Option<u64>,
    #[serde(default)]
    pub timeout_policy: TimeoutPolicy,
}

impl ExecutorOptions {
    /// Configured concurrency, or the host's available parallelism.
    pub fn effective_concurrency(&self) -> usize {
        self.max_concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            })
            .max(1)
    }

    pub fn method_timeout(&self) -> Option<Duration> {
        self.method_timeout_ms.map(Duration::from_millis)
    }
}

/// How a method that exceeds `method_timeout_ms` is treated.
///
/// Timed-out methods are never retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// The timeout is an ordinary method failure; the next method by priority is tried.
    #[default]
    Fallback,
    /// The timeout fails the whole feature without trying lower-priority methods.
    FailFeature,
}

/// One computable feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeatureConfig {
    pub name: String,
    /// Tag looked up in the strategy factory
    pub strategy: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub constraints: ValueConstraints,
    #[serde(default)]
    pub methods: Vec<MethodConfig>,
}

/// One alternative way of computing a feature.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MethodConfig {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Feature names and/or declared service names
    #[serde(default)]
    pub depends_on: Vec<String>,
}

fn default_priority() -> u32 {
    DEFAULT_PRIORITY
}

/// Constraints a computed value must satisfy before it is accepted.
///
/// Numeric bounds apply to a number value, or to every numeric element of an
/// array value (null elements are allowed).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ValueConstraints {
    #[serde(default)]
    pub datatype: DataType,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl Default for ValueConstraints {
    fn default() -> Self {
        Self {
            datatype: DataType::Any,
            min: None,
            max: None,
            required: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    #[default]
    Any,
    Number,
    Integer,
    String,
    Boolean,
    Array,
    Object,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DataType::Any => "any",
            DataType::Number => "number",
            DataType::Integer => "integer",
            DataType::String => "string",
            DataType::Boolean => "boolean",
            DataType::Array => "array",
            DataType::Object => "object",
        };
        f.write_str(name)
    }
}

/// A named, reusable list of features.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    pub features: Vec<String>,
    /// Raw run inputs that must be supplied before the pipeline may start
    #[serde(default)]
    pub required_inputs: Vec<String>,
    #[serde(default, alias = "async")]
    pub parallel: bool,
}

fn default_version() -> String {
    "1.0".to_string()
}

/// Load a config from a YAML or TOML file, picked by extension.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    match extension.as_str() {
        "yaml" | "yml" => Ok(serde_yaml::from_str(&content)?),
        "toml" => Ok(toml::from_str(&content)?),
        _ => Err(ConfigError::UnsupportedFormat { extension }),
    }
}

/// Load and validate a config file.
///
/// Structural problems are collected in one pass and returned together.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Validation)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
services: [raster_service]
features:
  - name: building_geo
    strategy: building_geo
    methods:
      - name: calculate_from_input
  - name: building_height
    strategy: building_height
    constraints:
      datatype: array
      min: 0
    methods:
      - name: calculate_from_raster_service
        priority: 1
        depends_on: [building_geo, raster_service]
      - name: calculate_default_estimate
        priority: 3
        depends_on: [building_geo]
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.features.len(), 2);
        assert_eq!(cfg.services, vec!["raster_service"]);

        let geo = &cfg.features[0];
        assert_eq!(geo.methods[0].priority, DEFAULT_PRIORITY);
        assert!(geo.methods[0].depends_on.is_empty());
        assert_eq!(geo.constraints, ValueConstraints::default());

        let height = &cfg.features[1];
        assert_eq!(height.constraints.datatype, DataType::Array);
        assert_eq!(height.constraints.min, Some(0.0));
        assert!(height.constraints.required);
        assert_eq!(
            height.methods[0].depends_on,
            vec!["building_geo", "raster_service"]
        );
    }

    #[test]
    fn test_executor_options_defaults() {
        let cfg: Config = serde_yaml::from_str("features: []").unwrap();
        assert_eq!(cfg.executor_options.timeout_policy, TimeoutPolicy::Fallback);
        assert!(cfg.executor_options.method_timeout().is_none());
        assert!(cfg.executor_options.effective_concurrency() >= 1);
        assert!(cfg.pipelines.is_empty());
    }

    #[test]
    fn test_executor_options_custom_values() {
        let yaml = r#"
executor_options:
  max_concurrency: 0
  method_timeout_ms: 250
  timeout_policy: fail_feature
features: []
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.executor_options.effective_concurrency(), 1);
        assert_eq!(
            cfg.executor_options.method_timeout(),
            Some(Duration::from_millis(250))
        );
        assert_eq!(
            cfg.executor_options.timeout_policy,
            TimeoutPolicy::FailFeature
        );
    }

    #[test]
    fn test_pipeline_accepts_async_alias() {
        let yaml = r#"
features: []
pipelines:
  - name: init
    description: Initialize scenario
    features: [building_geo]
    required_inputs: [buildings]
    async: true
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let pipeline = &cfg.pipelines[0];
        assert!(pipeline.parallel);
        assert_eq!(pipeline.version, "1.0");
        assert_eq!(pipeline.required_inputs, vec!["buildings"]);
    }

    #[test]
    fn test_load_toml_config() {
        let toml_src = r#"
services = ["census_service"]

[[features]]
name = "census_population"
strategy = "census_population"

[[features.methods]]
name = "calculate_from_census_boundary"
priority = 1
depends_on = ["census_service"]
"#;
        let file = write_temp(".toml", toml_src);
        let cfg = load_and_validate_config(file.path()).unwrap();
        assert_eq!(cfg.features[0].name, "census_population");
        assert_eq!(cfg.features[0].methods[0].depends_on, vec!["census_service"]);
    }

    #[test]
    fn test_load_and_validate_unresolved_dependency() {
        let yaml = r#"
features:
  - name: building_volume
    strategy: building_volume
    methods:
      - name: calculate_from_height_and_area
        depends_on: [building_heigth]
"#;
        let file = write_temp(".yaml", yaml);
        let error_msg = load_and_validate_config(file.path())
            .unwrap_err()
            .to_string();
        assert!(error_msg.contains("depends on 'building_heigth'"));
    }

    #[test]
    fn test_cycles_are_not_rejected_at_load_time() {
        let yaml = r#"
features:
  - name: a
    strategy: stub
    methods: [{ name: m, depends_on: [b] }]
  - name: b
    strategy: stub
    methods: [{ name: m, depends_on: [a] }]
"#;
        let file = write_temp(".yml", yaml);
        assert!(load_and_validate_config(file.path()).is_ok());
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_temp(".json", "{}");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::UnsupportedFormat { extension }) if extension == "json"
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            load_config("does/not/exist.yaml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_invalid_yaml_is_reported() {
        let file = write_temp(".yaml", "features: [ {name: ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Yaml(_))));
    }
}
