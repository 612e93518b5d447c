// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for orchestrator runs.
//!
//! This module contains message types for logging events related to:
//! * Run lifecycle (start, completion, resolution failure)
//! * Wave dispatch in parallel runs
//! * Per-feature outcomes and per-method attempts

use crate::errors::{FeatureFailure, MethodFailureKind, ResolutionError};
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A run resolved its order and is about to execute.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use cim_pipeline::observability::messages::engine::RunStarted;
///
/// let msg = RunStarted {
///     mode: "automatic",
///     feature_count: 4,
///     wave_count: 3,
///     parallel: true,
///     max_concurrency: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct RunStarted<'a> {
    pub mode: &'a str,
    pub feature_count: usize,
    pub wave_count: usize,
    pub parallel: bool,
    pub max_concurrency: usize,
}

impl Display for RunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting {} run: {} features in {} waves, parallel={}, max_concurrency={}",
            self.mode, self.feature_count, self.wave_count, self.parallel, self.max_concurrency
        )
    }
}

impl StructuredLog for RunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            mode = self.mode,
            feature_count = self.feature_count,
            wave_count = self.wave_count,
            parallel = self.parallel,
            max_concurrency = self.max_concurrency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run",
            span_name = name,
            mode = self.mode,
            feature_count = self.feature_count,
            parallel = self.parallel,
        )
    }
}

/// A run finished; the report is ready.
///
/// # Log Level
/// `info!` when every requested feature succeeded, `warn!` otherwise
pub struct RunCompleted<'a> {
    pub mode: &'a str,
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub success: bool,
    pub duration: std::time::Duration,
}

impl Display for RunCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} run completed in {:?}: {} succeeded, {} failed, {} skipped",
            self.mode, self.duration, self.executed, self.failed, self.skipped
        )
    }
}

impl StructuredLog for RunCompleted<'_> {
    fn log(&self) {
        if self.success {
            tracing::info!(
                mode = self.mode,
                executed = self.executed,
                failed = self.failed,
                skipped = self.skipped,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        } else {
            tracing::warn!(
                mode = self.mode,
                executed = self.executed,
                failed = self.failed,
                skipped = self.skipped,
                duration_ms = self.duration.as_millis() as u64,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_completed",
            span_name = name,
            mode = self.mode,
            success = self.success,
            duration = ?self.duration,
        )
    }
}

/// A request could not be turned into an execution order; nothing ran.
///
/// # Log Level
/// `error!` - The whole run is rejected
pub struct ResolutionFailed<'a> {
    pub mode: &'a str,
    pub error: &'a ResolutionError,
}

impl Display for ResolutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} run rejected: {}", self.mode, self.error)
    }
}

impl StructuredLog for ResolutionFailed<'_> {
    fn log(&self) {
        tracing::error!(mode = self.mode, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("resolution_failed", span_name = name, mode = self.mode)
    }
}

/// A wave of mutually independent features is being dispatched.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct WaveStarted {
    pub wave_index: usize,
    pub feature_count: usize,
}

impl Display for WaveStarted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatching wave {} with {} features",
            self.wave_index, self.feature_count
        )
    }
}

impl StructuredLog for WaveStarted {
    fn log(&self) {
        tracing::debug!(
            wave_index = self.wave_index,
            feature_count = self.feature_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "wave",
            span_name = name,
            wave_index = self.wave_index,
            feature_count = self.feature_count,
        )
    }
}

/// The feature already had a value in the context.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct FeatureReused<'a> {
    pub feature: &'a str,
}

impl Display for FeatureReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Feature '{}' already computed, reusing value", self.feature)
    }
}

impl StructuredLog for FeatureReused<'_> {
    fn log(&self) {
        tracing::debug!(feature = self.feature, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("feature_reused", span_name = name, feature = self.feature)
    }
}

/// A method produced an accepted value.
///
/// # Log Level
/// `info!` - Important operational event
pub struct FeatureSucceeded<'a> {
    pub feature: &'a str,
    pub method: &'a str,
    pub attempts: usize,
}

impl Display for FeatureSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Feature '{}' computed by '{}' after {} attempt(s)",
            self.feature, self.method, self.attempts
        )
    }
}

impl StructuredLog for FeatureSucceeded<'_> {
    fn log(&self) {
        tracing::info!(
            feature = self.feature,
            method = self.method,
            attempts = self.attempts,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "feature",
            span_name = name,
            feature = self.feature,
            method = self.method,
        )
    }
}

/// The feature could not be computed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use cim_pipeline::errors::FeatureFailure;
/// use cim_pipeline::observability::messages::engine::FeatureFailed;
///
/// let reason = FeatureFailure::NoEligibleMethod;
/// let msg = FeatureFailed {
///     feature: "building_height",
///     reason: &reason,
/// };
///
/// assert_eq!(
///     msg.to_string(),
///     "Feature 'building_height' failed: no eligible method: every method is missing a dependency"
/// );
/// ```
pub struct FeatureFailed<'a> {
    pub feature: &'a str,
    pub reason: &'a FeatureFailure,
}

impl Display for FeatureFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Feature '{}' failed: {}", self.feature, self.reason)
    }
}

impl StructuredLog for FeatureFailed<'_> {
    fn log(&self) {
        tracing::error!(feature = self.feature, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("feature_failed", span_name = name, feature = self.feature)
    }
}

/// The feature was not attempted because a dependency failed earlier in the run.
///
/// # Log Level
/// `warn!` - Consequence of an earlier failure
pub struct FeatureSkipped<'a> {
    pub feature: &'a str,
    pub reason: &'a FeatureFailure,
}

impl Display for FeatureSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Feature '{}' skipped: {}", self.feature, self.reason)
    }
}

impl StructuredLog for FeatureSkipped<'_> {
    fn log(&self) {
        tracing::warn!(feature = self.feature, reason = %self.reason, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("feature_skipped", span_name = name, feature = self.feature)
    }
}

/// One method did not produce an accepted value; fallback may follow.
///
/// # Log Level
/// `warn!` - Recoverable
pub struct MethodAttemptFailed<'a> {
    pub feature: &'a str,
    pub method: &'a str,
    pub reason: &'a MethodFailureKind,
}

impl Display for MethodAttemptFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Method '{}.{}' failed: {}",
            self.feature, self.method, self.reason
        )
    }
}

impl StructuredLog for MethodAttemptFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            feature = self.feature,
            method = self.method,
            reason = %self.reason,
            timeout = self.reason.is_timeout(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "method_failed",
            span_name = name,
            feature = self.feature,
            method = self.method,
        )
    }
}

/// A method was passed over because a dependency is not available yet.
///
/// # Log Level
/// `debug!` - Diagnostic information
pub struct MethodIneligible<'a> {
    pub feature: &'a str,
    pub method: &'a str,
    pub missing: &'a str,
}

impl Display for MethodIneligible<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Method '{}.{}' not eligible: '{}' is not available",
            self.feature, self.method, self.missing
        )
    }
}

impl StructuredLog for MethodIneligible<'_> {
    fn log(&self) {
        tracing::debug!(
            feature = self.feature,
            method = self.method,
            missing = self.missing,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "method_ineligible",
            span_name = name,
            feature = self.feature,
            method = self.method,
        )
    }
}
