// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::engine::MethodContext;
use crate::errors::CalculatorError;

/// Result of a method that ran to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodOutcome {
    /// The value to store for the feature. The executor validates and commits it.
    Computed(Value),
    /// The method ran but the data it needs is not usable; try the next method.
    CannotCompute(String),
}

/// One polymorphic unit per feature strategy.
///
/// A calculator exposes one or more named methods. Methods only read through
/// the [`MethodContext`]; the executor is the single writer of feature values.
#[async_trait]
pub trait Calculator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `method` is implemented by this calculator.
    fn supports(&self, method: &str) -> bool;

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError>;
}
