// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use thiserror::Error;

/// Structural problems found while validating a feature configuration.
///
/// Validation accumulates every problem it can find so that a broken
/// configuration is reported in one pass rather than one error at a time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Two features share the same name
    #[error("Duplicate feature name: '{feature}'")]
    DuplicateFeature { feature: String },

    /// Two methods inside one feature share the same name
    #[error("Feature '{feature}' declares method '{method}' more than once")]
    DuplicateMethod { feature: String, method: String },

    /// A feature has nothing that could ever compute it
    #[error("Feature '{feature}' declares no calculation methods")]
    NoMethods { feature: String },

    /// A method depends on a name that is neither a feature nor a declared service
    #[error(
        "Method '{feature}.{method}' depends on '{dependency}' which is neither a feature nor a declared service"
    )]
    UnresolvedDependency {
        feature: String,
        method: String,
        dependency: String,
    },

    /// A numeric range with its bounds the wrong way round
    #[error("Feature '{feature}' has an empty value range: min {min} > max {max}")]
    InvalidRange { feature: String, min: f64, max: f64 },

    /// A service is declared more than once or collides with a feature name
    #[error("Service '{service}' is declared twice or shadows a feature")]
    DuplicateService { service: String },

    /// Two predefined pipelines share the same name
    #[error("Duplicate pipeline name: '{pipeline}'")]
    DuplicatePipeline { pipeline: String },

    /// A predefined pipeline lists a feature that does not exist
    #[error("Pipeline '{pipeline}' references unknown feature '{feature}'")]
    UnknownPipelineFeature { pipeline: String, feature: String },
}

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported configuration format '{extension}' (expected yaml, yml or toml)")]
    UnsupportedFormat { extension: String },

    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
