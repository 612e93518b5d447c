// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::{buildings, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry::{planar_area, round_to};

/// Footprint area per building in square meters.
#[derive(Debug, Default)]
pub struct BuildingAreaCalculator;

impl BuildingAreaCalculator {
    fn calculate_from_geometry(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let areas = buildings(ctx)?
            .iter()
            .map(|building| {
                let geometry = building.get("geometry").unwrap_or(&Value::Null);
                planar_area(geometry)
                    .map(|area| json!(round_to(area, 2)))
                    .map_err(|reason| CalculatorError::InvalidInput {
                        name: "building_geo".to_string(),
                        reason: format!("building '{}': {}", building["building_id"], reason),
                    })
            })
            .collect::<Result<Vec<Value>, _>>()?;

        Ok(MethodOutcome::Computed(Value::Array(areas)))
    }
}

#[async_trait]
impl Calculator for BuildingAreaCalculator {
    fn name(&self) -> &'static str {
        "building_area"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_geometry"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_geometry" => self.calculate_from_geometry(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::{building_geo, view};
    use crate::engine::ExecutionContext;

    #[tokio::test]
    async fn test_area_per_building() {
        let ctx = view(ExecutionContext::builder().feature("building_geo", building_geo(&[10.0, 12.5])));
        let outcome = BuildingAreaCalculator
            .invoke("calculate_from_geometry", &ctx)
            .await
            .unwrap();
        assert_eq!(outcome, MethodOutcome::Computed(json!([100.0, 156.25])));
    }

    #[tokio::test]
    async fn test_missing_geo_is_missing_input() {
        let ctx = view(ExecutionContext::builder());
        assert_eq!(
            BuildingAreaCalculator
                .invoke("calculate_from_geometry", &ctx)
                .await,
            Err(CalculatorError::MissingInput("building_geo".into()))
        );
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let ctx = view(ExecutionContext::builder());
        assert!(!BuildingAreaCalculator.supports("calculate_from_lidar"));
        assert!(BuildingAreaCalculator
            .invoke("calculate_from_lidar", &ctx)
            .await
            .is_err());
    }
}
