// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::json;

use crate::calculators::unsupported;
use crate::config::consts::CENSUS_SERVICE;
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

/// Census zones intersecting the scenario boundary, with their summed population.
///
/// Produces `{ "census_zones": [...], "total_population": <number> }`.
#[derive(Debug, Default)]
pub struct CensusBoundaryCalculator;

impl CensusBoundaryCalculator {
    async fn calculate_from_census_service(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let boundary = ctx.feature("scenario_geo")?;
        let service = ctx
            .spatial_query_service(CENSUS_SERVICE)
            .ok_or_else(|| CalculatorError::Service {
                service: CENSUS_SERVICE.to_string(),
                reason: "no spatial query service registered under this name".to_string(),
            })?;

        let zones = service
            .zones_intersecting(&boundary)
            .await
            .map_err(|e| CalculatorError::Service {
                service: CENSUS_SERVICE.to_string(),
                reason: e.to_string(),
            })?;

        if zones.is_empty() {
            return Ok(MethodOutcome::CannotCompute(
                "no census zone intersects the scenario boundary".to_string(),
            ));
        }

        let total_population: f64 = zones.iter().map(|zone| zone.population).sum();
        let zones = serde_json::to_value(&zones)
            .map_err(|e| CalculatorError::Other(format!("failed to encode census zones: {}", e)))?;

        Ok(MethodOutcome::Computed(json!({
            "census_zones": zones,
            "total_population": total_population,
        })))
    }
}

#[async_trait]
impl Calculator for CensusBoundaryCalculator {
    fn name(&self) -> &'static str {
        "scenario_census_boundary"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_census_service"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_census_service" => self.calculate_from_census_service(ctx).await,
            other => Err(unsupported(self.name(), other)),
        }
    }
}
