// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::{number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

/// Average household size used to turn residents into families
pub const PERSONS_PER_FAMILY: f64 = 2.5;

#[derive(Debug, Default)]
pub struct BuildingFamiliesCalculator;

impl BuildingFamiliesCalculator {
    fn calculate_from_population(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let families = number_series(ctx, "building_population")?
            .into_iter()
            .map(|population| match population {
                Some(p) => json!((p / PERSONS_PER_FAMILY).ceil() as u64),
                None => Value::Null,
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(families)))
    }
}

#[async_trait]
impl Calculator for BuildingFamiliesCalculator {
    fn name(&self) -> &'static str {
        "building_n_families"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_population"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_population" => self.calculate_from_population(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
