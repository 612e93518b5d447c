// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::calculators::unsupported;
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};
use crate::utils::geometry;

/// Raw run input holding the building footprints
pub const BUILDINGS_INPUT: &str = "buildings";

/// Building footprints and identifiers, taken from a GeoJSON FeatureCollection.
#[derive(Debug, Default)]
pub struct BuildingGeoCalculator;

impl BuildingGeoCalculator {
    fn calculate_from_input(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let Some(collection) = ctx.input(BUILDINGS_INPUT) else {
            return Ok(MethodOutcome::CannotCompute(format!(
                "no '{}' input supplied",
                BUILDINGS_INPUT
            )));
        };

        let features = collection
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("expected a GeoJSON FeatureCollection"))?;

        let mut buildings = Vec::with_capacity(features.len());
        for (index, feature) in features.iter().enumerate() {
            let geometry = feature
                .get("geometry")
                .filter(|g| !g.is_null())
                .ok_or_else(|| invalid(&format!("feature {} has no geometry", index)))?;
            geometry::polygons(geometry)
                .map_err(|e| invalid(&format!("feature {}: {}", index, e)))?;

            let properties = feature
                .get("properties")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            buildings.push(json!({
                "building_id": building_id(feature, &properties, index),
                "geometry": geometry,
                "properties": properties,
            }));
        }

        Ok(MethodOutcome::Computed(json!({
            "project_id": ctx.project_id(),
            "scenario_id": ctx.scenario_id(),
            "buildings": buildings,
        })))
    }
}

fn invalid(reason: &str) -> CalculatorError {
    CalculatorError::InvalidInput {
        name: BUILDINGS_INPUT.to_string(),
        reason: reason.to_string(),
    }
}

/// Feature `id`, then `properties.building_id`, then a positional id.
fn building_id(feature: &Value, properties: &Map<String, Value>, index: usize) -> String {
    let explicit = feature
        .get("id")
        .or_else(|| properties.get("building_id"));
    match explicit {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => format!("building_{}", index + 1),
    }
}

#[async_trait]
impl Calculator for BuildingGeoCalculator {
    fn name(&self) -> &'static str {
        "building_geo"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_input"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_input" => self.calculate_from_input(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
