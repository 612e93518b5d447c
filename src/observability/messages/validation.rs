// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration loading and validation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Configuration file read and parsed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConfigLoaded<'a> {
    pub path: &'a str,
    pub feature_count: usize,
    pub pipeline_count: usize,
}

impl Display for ConfigLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded configuration '{}': {} features, {} pipelines",
            self.path, self.feature_count, self.pipeline_count
        )
    }
}

impl StructuredLog for ConfigLoaded<'_> {
    fn log(&self) {
        tracing::info!(
            path = self.path,
            feature_count = self.feature_count,
            pipeline_count = self.pipeline_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "config_loaded",
            name = name,
            path = self.path,
            feature_count = self.feature_count,
        )
    }
}

/// Configuration validation finished.
///
/// # Log Level
/// `info!` when clean, `error!` when problems were found
///
/// # Example
/// ```
/// use cim_pipeline::observability::messages::validation::ValidationCompleted;
///
/// let msg = ValidationCompleted {
///     feature_count: 11,
///     pipeline_count: 3,
///     error_count: 0,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Configuration validation completed successfully for 11 features and 3 pipelines"
/// );
/// ```
pub struct ValidationCompleted {
    pub feature_count: usize,
    pub pipeline_count: usize,
    pub error_count: usize,
}

impl Display for ValidationCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.error_count > 0 {
            write!(
                f,
                "Configuration validation failed for {} features and {} pipelines with {} errors",
                self.feature_count, self.pipeline_count, self.error_count
            )
        } else {
            write!(
                f,
                "Configuration validation completed successfully for {} features and {} pipelines",
                self.feature_count, self.pipeline_count
            )
        }
    }
}

impl StructuredLog for ValidationCompleted {
    fn log(&self) {
        if self.error_count > 0 {
            tracing::error!(
                feature_count = self.feature_count,
                pipeline_count = self.pipeline_count,
                error_count = self.error_count,
                "{}", self
            );
        } else {
            tracing::info!(
                feature_count = self.feature_count,
                pipeline_count = self.pipeline_count,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::INFO,
            "validation",
            name = name,
            feature_count = self.feature_count,
            pipeline_count = self.pipeline_count,
            error_count = self.error_count,
        )
    }
}
