// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::building_height::FLOOR_HEIGHT_M;
use crate::calculators::{ensure_aligned, number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

/// Floor count for residential buildings; `null` for everything else.
#[derive(Debug, Default)]
pub struct BuildingFloorsCalculator;

impl BuildingFloorsCalculator {
    fn estimate_by_height(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let heights = number_series(ctx, "building_height")?;
        let residential = match ctx.feature("filter_res")? {
            Value::Array(flags) => flags,
            other => {
                return Err(CalculatorError::InvalidInput {
                    name: "filter_res".to_string(),
                    reason: format!("expected an array but got {}", other),
                })
            }
        };
        ensure_aligned(heights.len(), "filter_res", residential.len())?;

        let floors = heights
            .iter()
            .zip(&residential)
            .map(|(height, flag)| match (height, flag.as_bool()) {
                (Some(h), Some(true)) => json!((h / FLOOR_HEIGHT_M).floor() as u64),
                _ => Value::Null,
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(floors)))
    }
}

#[async_trait]
impl Calculator for BuildingFloorsCalculator {
    fn name(&self) -> &'static str {
        "building_n_floors"
    }

    fn supports(&self, method: &str) -> bool {
        method == "estimate_by_height"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "estimate_by_height" => self.estimate_by_height(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
