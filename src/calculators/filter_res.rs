// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Residential classification per building.
//!
//! A building is residential unless its footprint is too small, it is too low
//! to hold a dwelling, or its OSM tags mark it as something else.

use async_trait::async_trait;
use serde_json::Value;

use crate::calculators::{buildings, ensure_aligned, number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

pub const MIN_RESIDENTIAL_AREA_M2: f64 = 90.0;
pub const MIN_RESIDENTIAL_HEIGHT_M: f64 = 4.0;

/// `building=*` values that are never residential
pub const NON_RESIDENTIAL_BUILDING_TAGS: &[&str] = &[
    "school",
    "hospital",
    "church",
    "mosque",
    "synagogue",
    "temple",
    "chapel",
    "cathedral",
    "commercial",
    "retail",
    "office",
    "industrial",
    "warehouse",
    "factory",
    "civic",
    "public",
    "government",
    "fire_station",
    "police",
    "prison",
];

/// `amenity=*` values that are never residential
pub const NON_RESIDENTIAL_AMENITY_TAGS: &[&str] = &[
    "school",
    "hospital",
    "clinic",
    "pharmacy",
    "dentist",
    "veterinary",
    "place_of_worship",
    "bank",
    "atm",
    "post_office",
    "library",
    "museum",
    "theatre",
    "cinema",
    "community_centre",
    "fire_station",
    "police",
    "prison",
    "courthouse",
    "townhall",
    "embassy",
];

#[derive(Debug, Default)]
pub struct ResidentialFilterCalculator;

impl ResidentialFilterCalculator {
    fn calculate_filter_res(&self, ctx: &MethodContext) -> Result<MethodOutcome, CalculatorError> {
        let buildings = buildings(ctx)?;
        let areas = number_series(ctx, "building_area")?;
        let heights = number_series(ctx, "building_height")?;
        ensure_aligned(buildings.len(), "building_area", areas.len())?;
        ensure_aligned(buildings.len(), "building_height", heights.len())?;

        let flags = buildings
            .iter()
            .zip(areas.iter().zip(&heights))
            .map(|(building, (area, height))| {
                Value::Bool(is_residential(building, *area, *height))
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(flags)))
    }
}

pub fn is_residential(building: &Value, area: Option<f64>, height: Option<f64>) -> bool {
    if area.is_some_and(|a| a < MIN_RESIDENTIAL_AREA_M2) {
        return false;
    }
    if height.is_some_and(|h| h < MIN_RESIDENTIAL_HEIGHT_M) {
        return false;
    }
    !has_non_residential_tags(building)
}

/// Whether the building's OSM `building` or `amenity` tag rules out dwellings.
pub fn has_non_residential_tags(building: &Value) -> bool {
    let tag = |key: &str| {
        building
            .get("properties")
            .and_then(|p| p.get(key))
            .and_then(Value::as_str)
    };
    tag("building").is_some_and(|t| NON_RESIDENTIAL_BUILDING_TAGS.contains(&t))
        || tag("amenity").is_some_and(|t| NON_RESIDENTIAL_AMENITY_TAGS.contains(&t))
}

#[async_trait]
impl Calculator for ResidentialFilterCalculator {
    fn name(&self) -> &'static str {
        "filter_res"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_filter_res"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_filter_res" => self.calculate_filter_res(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::{building_geo, view};
    use crate::engine::ExecutionContext;
    use serde_json::json;

    #[tokio::test]
    async fn test_classification() {
        let mut geo = building_geo(&[10.0, 10.0, 10.0, 10.0, 10.0]);
        geo["buildings"][3]["properties"] = json!({"building": "warehouse"});
        geo["buildings"][4]["properties"] = json!({"building": "yes", "amenity": "library"});

        let ctx = view(
            ExecutionContext::builder()
                .feature("building_geo", geo)
                .feature("building_area", json!([120.0, 60.0, 120.0, 500.0, 500.0]))
                .feature("building_height", json!([9.0, 9.0, 3.0, 9.0, 9.0])),
        );

        assert_eq!(
            ResidentialFilterCalculator
                .invoke("calculate_filter_res", &ctx)
                .await
                .unwrap(),
            MethodOutcome::Computed(json!([true, false, false, false, false]))
        );
    }

    #[test]
    fn test_unknown_measurements_do_not_exclude() {
        assert!(is_residential(&json!({"properties": {}}), None, None));
        assert!(is_residential(&json!({}), Some(90.0), Some(4.0)));
    }
}
