// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::{number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry::round_to;

/// Census population distributed over buildings by share of total volume.
#[derive(Debug, Default)]
pub struct BuildingPopulationCalculator;

impl BuildingPopulationCalculator {
    fn calculate_from_volume_distribution(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let volumes = number_series(ctx, "building_volume")?;
        let population = ctx
            .feature("census_population")?
            .as_f64()
            .ok_or_else(|| CalculatorError::InvalidInput {
                name: "census_population".to_string(),
                reason: "expected a number".to_string(),
            })?;

        let total_volume: f64 = volumes.iter().flatten().sum();
        if total_volume <= 0.0 {
            return Ok(MethodOutcome::CannotCompute(
                "total building volume is zero".to_string(),
            ));
        }

        let shares = volumes
            .iter()
            .map(|volume| match volume {
                Some(v) => json!(round_to(v / total_volume * population, 1)),
                None => Value::Null,
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(shares)))
    }
}

#[async_trait]
impl Calculator for BuildingPopulationCalculator {
    fn name(&self) -> &'static str {
        "building_population"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_volume_distribution"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_volume_distribution" => self.calculate_from_volume_distribution(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
