// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Run-time failures that stay local to one feature.
//!
//! None of these escape a `run*` call. They are rendered into
//! `FeatureResult::failure_reason` and drive the fallback and skip logic.

use std::time::Duration;
use thiserror::Error;

/// Hard error raised by a calculator method.
///
/// Distinct from `MethodOutcome::CannotCompute`, but both trigger fallback.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculatorError {
    #[error("missing input '{0}'")]
    MissingInput(String),

    #[error("invalid input '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("service '{service}' failed: {reason}")]
    Service { service: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Failure reported by an external service handle.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("query failed: {0}")]
    Query(String),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("failed to load service fixture '{path}': {reason}")]
    Fixture { path: String, reason: String },
}

/// Why a single method attempt did not produce an accepted value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MethodFailureKind {
    #[error("raised error: {0}")]
    Error(#[from] CalculatorError),

    #[error("cannot compute: {0}")]
    CannotCompute(String),

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("missing dependency '{0}'")]
    MissingDependency(String),

    #[error("method is not implemented by the calculator")]
    UnsupportedMethod,
}

impl MethodFailureKind {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MethodFailureKind::Timeout(_))
    }
}

/// Terminal reason a feature ended up `failed` or `skipped`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureFailure {
    #[error("calculator construction failed for strategy '{strategy}': {reason}")]
    CalculatorConstruction { strategy: String, reason: String },

    #[error("method '{method}' failed: {kind}")]
    MethodFailure {
        method: String,
        kind: MethodFailureKind,
    },

    #[error("method '{method}' requires service '{service}' which is not available")]
    UnresolvedServiceDependency { method: String, service: String },

    #[error("no eligible method: every method is missing a dependency")]
    NoEligibleMethod,

    #[error("dependency '{dependency}' did not produce a value")]
    DependencyFailed { dependency: String },

    #[error("execution task aborted: {0}")]
    Aborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_failure_reason_cites_missing_dependency() {
        let failure = FeatureFailure::MethodFailure {
            method: "calculate_from_height_and_area".into(),
            kind: MethodFailureKind::MissingDependency("building_height".into()),
        };
        assert_eq!(
            failure.to_string(),
            "method 'calculate_from_height_and_area' failed: missing dependency 'building_height'"
        );
    }

    #[test]
    fn test_timeout_kind_is_detected() {
        assert!(MethodFailureKind::Timeout(Duration::from_millis(5)).is_timeout());
        assert!(!MethodFailureKind::CannotCompute("no data".into()).is_timeout());
    }
}
