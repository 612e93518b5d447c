// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Residential or non-residential label per building.
//!
//! Stricter than `filter_res`: after the OSM tag exclusion a building must be
//! both taller than [`MIN_TYPED_RESIDENTIAL_HEIGHT_M`] and larger than
//! [`MIN_TYPED_RESIDENTIAL_AREA_M2`]. Unknown measurements never qualify.

use async_trait::async_trait;
use serde_json::Value;

use crate::calculators::filter_res::has_non_residential_tags;
use crate::calculators::{buildings, ensure_aligned, number_series, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{Calculator, MethodOutcome};

pub const MIN_TYPED_RESIDENTIAL_HEIGHT_M: f64 = 8.0;
pub const MIN_TYPED_RESIDENTIAL_AREA_M2: f64 = 100.0;

pub const RESIDENTIAL: &str = "residential";
pub const NON_RESIDENTIAL: &str = "non_residential";

#[derive(Debug, Default)]
pub struct BuildingTypeCalculator;

impl BuildingTypeCalculator {
    fn calculate_from_osm_and_size(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let buildings = buildings(ctx)?;
        let areas = number_series(ctx, "building_area")?;
        let heights = number_series(ctx, "building_height")?;
        ensure_aligned(buildings.len(), "building_area", areas.len())?;
        ensure_aligned(buildings.len(), "building_height", heights.len())?;

        let types = buildings
            .iter()
            .zip(areas.iter().zip(&heights))
            .map(|(building, (area, height))| {
                Value::from(building_type(building, *area, *height))
            })
            .collect();

        Ok(MethodOutcome::Computed(Value::Array(types)))
    }
}

pub fn building_type(building: &Value, area: Option<f64>, height: Option<f64>) -> &'static str {
    if has_non_residential_tags(building) {
        return NON_RESIDENTIAL;
    }
    let tall = height.is_some_and(|h| h > MIN_TYPED_RESIDENTIAL_HEIGHT_M);
    let large = area.is_some_and(|a| a > MIN_TYPED_RESIDENTIAL_AREA_M2);
    if tall && large {
        RESIDENTIAL
    } else {
        NON_RESIDENTIAL
    }
}

#[async_trait]
impl Calculator for BuildingTypeCalculator {
    fn name(&self) -> &'static str {
        "building_type"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_osm_and_size"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_osm_and_size" => self.calculate_from_osm_and_size(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}
