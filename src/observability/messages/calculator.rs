// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for calculator construction.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A calculator was built for a feature and cached in the run's context.
///
/// # Log Level
/// `debug!` - Happens once per feature per run
pub struct CalculatorConstructed<'a> {
    pub feature: &'a str,
    pub strategy: &'a str,
}

impl Display for CalculatorConstructed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Constructed '{}' calculator for feature '{}'",
            self.strategy, self.feature
        )
    }
}

impl StructuredLog for CalculatorConstructed<'_> {
    fn log(&self) {
        tracing::debug!(feature = self.feature, strategy = self.strategy, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "calculator",
            span_name = name,
            feature = self.feature,
            strategy = self.strategy,
        )
    }
}

/// The strategy factory could not build a calculator.
///
/// # Log Level
/// `error!` - The feature fails without any method being attempted
///
/// # Example
/// ```
/// use cim_pipeline::observability::messages::calculator::CalculatorConstructionFailed;
///
/// let msg = CalculatorConstructionFailed {
///     feature: "building_age",
///     strategy: "building_age",
///     reason: "unknown strategy 'building_age'",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct CalculatorConstructionFailed<'a> {
    pub feature: &'a str,
    pub strategy: &'a str,
    pub reason: &'a str,
}

impl Display for CalculatorConstructionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to construct '{}' calculator for feature '{}': {}",
            self.strategy, self.feature, self.reason
        )
    }
}

impl StructuredLog for CalculatorConstructionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            feature = self.feature,
            strategy = self.strategy,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "calculator_construction_failed",
            span_name = name,
            feature = self.feature,
            strategy = self.strategy,
        )
    }
}
