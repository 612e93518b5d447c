// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Building height estimation.
//!
//! Three methods of decreasing fidelity:
//! * `calculate_from_raster_service` - DSM minus DTM means from the elevation
//!   service, clamped to a plausible range
//! * `calculate_from_osm_height` - the OSM `height` tag, or `building:levels`
//!   times a nominal floor height
//! * `calculate_default_estimate` - a flat estimate for every building
//!
//! Buildings a method cannot cover individually fall back to the tag-based
//! height and then to the flat estimate, so the series never has holes.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::{buildings, unsupported};
use crate::config::consts::RASTER_SERVICE;
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry::round_to;

pub const DEFAULT_HEIGHT_M: f64 = 12.0;
pub const FLOOR_HEIGHT_M: f64 = 3.0;
pub const MIN_RASTER_HEIGHT_M: f64 = 3.0;
pub const MAX_RASTER_HEIGHT_M: f64 = 150.0;

#[derive(Debug, Default)]
pub struct BuildingHeightCalculator;

impl BuildingHeightCalculator {
    async fn calculate_from_raster_service(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let service = ctx
            .elevation_service(RASTER_SERVICE)
            .ok_or_else(|| CalculatorError::Service {
                service: RASTER_SERVICE.to_string(),
                reason: "no elevation service registered under this name".to_string(),
            })?;

        let buildings = buildings(ctx)?;
        let mut covered = 0;
        let mut heights = Vec::with_capacity(buildings.len());

        for building in &buildings {
            let geometry = building.get("geometry").unwrap_or(&Value::Null);
            let stats = service
                .elevation_stats(geometry)
                .await
                .map_err(|e| CalculatorError::Service {
                    service: RASTER_SERVICE.to_string(),
                    reason: e.to_string(),
                })?;

            let height = match stats.relative_height() {
                Some(h) if stats.pixel_count > 0 => {
                    covered += 1;
                    round_to(h.clamp(MIN_RASTER_HEIGHT_M, MAX_RASTER_HEIGHT_M), 2)
                }
                _ => tagged_height(building).unwrap_or(DEFAULT_HEIGHT_M),
            };
            heights.push(json!(height));
        }

        if covered == 0 && !buildings.is_empty() {
            return Ok(MethodOutcome::CannotCompute(
                "elevation service has no coverage for any building".to_string(),
            ));
        }
        Ok(MethodOutcome::Computed(Value::Array(heights)))
    }

    fn calculate_from_osm_height(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let buildings = buildings(ctx)?;
        let tagged: Vec<Option<f64>> = buildings.iter().map(tagged_height).collect();

        if !buildings.is_empty() && tagged.iter().all(Option::is_none) {
            return Ok(MethodOutcome::CannotCompute(
                "no building carries a 'height' or 'building:levels' tag".to_string(),
            ));
        }

        Ok(MethodOutcome::Computed(Value::Array(
            tagged
                .into_iter()
                .map(|h| json!(h.unwrap_or(DEFAULT_HEIGHT_M)))
                .collect(),
        )))
    }

    fn calculate_default_estimate(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let count = buildings(ctx)?.len();
        Ok(MethodOutcome::Computed(Value::Array(vec![
            json!(DEFAULT_HEIGHT_M);
            count
        ])))
    }
}

/// Height from OSM tags: explicit `height`, else `building:levels` floors.
fn tagged_height(building: &Value) -> Option<f64> {
    let properties = building.get("properties")?;
    if let Some(height) = properties.get("height").and_then(numeric_tag) {
        return Some(round_to(height, 2));
    }
    properties
        .get("building:levels")
        .and_then(numeric_tag)
        .map(|levels| round_to(levels * FLOOR_HEIGHT_M, 2))
}

/// Accepts numbers and strings such as `"12"` or `"12.5 m"`.
fn numeric_tag(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_end_matches('m')
            .trim()
            .parse::<f64>()
            .ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}

#[async_trait]
impl Calculator for BuildingHeightCalculator {
    fn name(&self) -> &'static str {
        "building_height"
    }

    fn supports(&self, method: &str) -> bool {
        matches!(
            method,
            "calculate_from_raster_service" | "calculate_from_osm_height" | "calculate_default_estimate"
        )
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_raster_service" => self.calculate_from_raster_service(ctx).await,
            "calculate_from_osm_height" => self.calculate_from_osm_height(ctx),
            "calculate_default_estimate" => self.calculate_default_estimate(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
