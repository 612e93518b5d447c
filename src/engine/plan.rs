// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

/// One step of an explicit plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub feature: String,
    /// Pinned method, or `None` for priority selection with fallback
    pub method: Option<String>,
}

/// Ordered `(feature, method)` steps executed as given.
///
/// The caller is responsible for ordering: no dependency resolution runs for
/// an explicit plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub steps: Vec<PlanStep>,
}

impl ExecutionPlan {
    pub fn builder() -> ExecutionPlanBuilder {
        ExecutionPlanBuilder::default()
    }

    pub fn features(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.feature.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Parse `feature.method` or bare `feature` tokens, as accepted on the command line.
    pub fn parse(steps: &str) -> Self {
        let mut builder = Self::builder();
        for token in steps.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            builder = match token.split_once('.') {
                Some((feature, method)) => builder.step(feature, method),
                None => builder.auto(token),
            };
        }
        builder.build()
    }
}

#[derive(Debug, Default)]
pub struct ExecutionPlanBuilder {
    steps: Vec<PlanStep>,
}

impl ExecutionPlanBuilder {
    /// Pin `method` for `feature`; no fallback is attempted.
    pub fn step(mut self, feature: impl Into<String>, method: impl Into<String>) -> Self {
        self.steps.push(PlanStep {
            feature: feature.into(),
            method: Some(method.into()),
        });
        self
    }

    /// Let the executor pick the method by priority.
    pub fn auto(mut self, feature: impl Into<String>) -> Self {
        self.steps.push(PlanStep {
            feature: feature.into(),
            method: None,
        });
        self
    }

    pub fn build(self) -> ExecutionPlan {
        ExecutionPlan { steps: self.steps }
    }
}
