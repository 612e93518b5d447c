// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scriptable calculator for orchestrator tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::engine::{MethodContext, StrategyFactory};
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

/// What a stubbed method does when invoked.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    Value(Value),
    CannotCompute(String),
    Error(String),
    /// Sleep, then return the value
    Sleep(Duration, Value),
    /// Multiply the numeric values of the named features
    Product(Vec<String>),
}

#[derive(Debug, Default)]
pub struct StubCalculator {
    behaviors: HashMap<String, StubBehavior>,
    calls: Mutex<Vec<String>>,
}

impl StubCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, method: &str, behavior: StubBehavior) -> Self {
        self.behaviors.insert(method.to_string(), behavior);
        self
    }

    /// Methods invoked so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Calculator for StubCalculator {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, method: &str) -> bool {
        self.behaviors.contains_key(method)
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(method.to_string());

        match self.behaviors.get(method) {
            Some(StubBehavior::Value(value)) => Ok(MethodOutcome::Computed(value.clone())),
            Some(StubBehavior::CannotCompute(reason)) => {
                Ok(MethodOutcome::CannotCompute(reason.clone()))
            }
            Some(StubBehavior::Error(reason)) => Err(CalculatorError::Other(reason.clone())),
            Some(StubBehavior::Sleep(duration, value)) => {
                tokio::time::sleep(*duration).await;
                Ok(MethodOutcome::Computed(value.clone()))
            }
            Some(StubBehavior::Product(features)) => {
                let mut product = 1.0;
                for feature in features {
                    product *= ctx.feature(feature)?.as_f64().ok_or_else(|| {
                        CalculatorError::InvalidInput {
                            name: feature.clone(),
                            reason: "expected a number".to_string(),
                        }
                    })?;
                }
                Ok(MethodOutcome::Computed(json!(product)))
            }
            None => Err(CalculatorError::Other(format!("no behavior for '{}'", method))),
        }
    }
}

/// Register `stub` as the calculator for `strategy`, sharing the instance so
/// tests can inspect its calls afterwards.
pub fn register_stub(
    factory: StrategyFactory,
    strategy: &str,
    stub: Arc<StubCalculator>,
) -> StrategyFactory {
    factory.register(strategy, move |_| Ok(stub.clone() as Arc<dyn Calculator>))
}
