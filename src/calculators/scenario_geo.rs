// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::calculators::{buildings, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry;

/// Raw run input holding an explicit scenario boundary
pub const SCENARIO_GEOMETRY_INPUT: &str = "scenario_geometry";

/// Scenario boundary polygon, supplied directly or derived from the buildings.
#[derive(Debug, Default)]
pub struct ScenarioGeoCalculator;

impl ScenarioGeoCalculator {
    fn calculate_from_input(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let Some(boundary) = ctx.input(SCENARIO_GEOMETRY_INPUT) else {
            return Ok(MethodOutcome::CannotCompute(format!(
                "no '{}' input supplied",
                SCENARIO_GEOMETRY_INPUT
            )));
        };
        geometry::polygons(boundary).map_err(|reason| CalculatorError::InvalidInput {
            name: SCENARIO_GEOMETRY_INPUT.to_string(),
            reason,
        })?;
        Ok(MethodOutcome::Computed(boundary.clone()))
    }

    fn calculate_from_building_geo(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let buildings = buildings(ctx)?;
        let bounds = geometry::merge_bounds(
            buildings
                .iter()
                .filter_map(|b| b.get("geometry").and_then(geometry::bounds)),
        );

        Ok(match bounds {
            Some(bounds) => MethodOutcome::Computed(geometry::bounds_polygon(&bounds)),
            None => MethodOutcome::CannotCompute("no building geometry to bound".to_string()),
        })
    }
}

#[async_trait]
impl Calculator for ScenarioGeoCalculator {
    fn name(&self) -> &'static str {
        "scenario_geo"
    }

    fn supports(&self, method: &str) -> bool {
        matches!(method, "calculate_from_input" | "calculate_from_building_geo")
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_input" => self.calculate_from_input(ctx),
            "calculate_from_building_geo" => self.calculate_from_building_geo(ctx),
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
    async fn test_boundary_from_input() {
        let boundary = geometry::bounds_polygon(&[0.0, 0.0, 1.0, 1.0]);
        let ctx = view(ExecutionContext::builder().input("scenario_geometry", boundary.clone()));
        assert_eq!(
            ScenarioGeoCalculator
                .invoke("calculate_from_input", &ctx)
                .await
                .unwrap(),
            MethodOutcome::Computed(boundary)
        );
    }

    #[tokio::test]
    async fn test_boundary_from_buildings() {
        let ctx = view(ExecutionContext::builder().feature("building_geo", building_geo(&[10.0, 20.0])));
        let outcome = ScenarioGeoCalculator
            .invoke("calculate_from_building_geo", &ctx)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            MethodOutcome::Computed(geometry::bounds_polygon(&[1000.0, 1000.0, 1120.0, 1020.0]))
        );
    }

    #[tokio::test]
    async fn test_no_buildings_cannot_compute() {
        let ctx = view(ExecutionContext::builder().feature("building_geo", building_geo(&[])));
        let outcome = ScenarioGeoCalculator
            .invoke("calculate_from_building_geo", &ctx)
            .await
            .unwrap();
        assert!(matches!(outcome, MethodOutcome::CannotCompute(_)));

        let ctx = view(ExecutionContext::builder());
        assert!(matches!(
            ScenarioGeoCalculator.invoke("calculate_from_input", &ctx).await,
            Ok(MethodOutcome::CannotCompute(_))
        ));
    }
}
