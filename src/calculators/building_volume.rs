// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::{ensure_aligned, number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry::round_to;

/// Height times footprint area per building.
#[derive(Debug, Default)]
pub struct BuildingVolumeCalculator;

impl BuildingVolumeCalculator {
    fn calculate_from_height_and_area(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let heights = number_series(ctx, "building_height")?;
        let areas = number_series(ctx, "building_area")?;
        ensure_aligned(areas.len(), "building_height", heights.len())?;

        let volumes = heights
            .iter()
            .zip(&areas)
            .map(|pair| match pair {
                (Some(height), Some(area)) => json!(round_to(height * area, 2)),
                _ => Value::Null,
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(volumes)))
    }
}

#[async_trait]
impl Calculator for BuildingVolumeCalculator {
    fn name(&self) -> &'static str {
        "building_volume"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_height_and_area"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_height_and_area" => self.calculate_from_height_and_area(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
