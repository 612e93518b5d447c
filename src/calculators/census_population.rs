// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::unsupported;
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

/// Total census population inside the scenario.
#[derive(Debug, Default)]
pub struct CensusPopulationCalculator;

impl CensusPopulationCalculator {
    fn calculate_from_census_boundary(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let boundary = ctx.feature("scenario_census_boundary")?;

        if let Some(total) = boundary.get("total_population").and_then(Value::as_f64) {
            return Ok(MethodOutcome::Computed(json!(total)));
        }

        // Older boundary values only carry the zones.
        let summed = boundary
            .get("census_zones")
            .and_then(Value::as_array)
            .map(|zones| {
                zones
                    .iter()
                    .filter_map(|z| z.get("population").and_then(Value::as_f64))
                    .sum::<f64>()
            });

        Ok(match summed {
            Some(total) => MethodOutcome::Computed(json!(total)),
            None => MethodOutcome::CannotCompute(
                "census boundary carries neither a total nor zones".to_string(),
            ),
        })
    }
}

#[async_trait]
impl Calculator for CensusPopulationCalculator {
    fn name(&self) -> &'static str {
        "census_population"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_census_boundary"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_census_boundary" => self.calculate_from_census_boundary(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
