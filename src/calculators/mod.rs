// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in calculator strategies for building and scenario features.
//!
//! Per-building values are JSON arrays aligned index-for-index with
//! `building_geo.buildings`. A building whose value cannot be derived holds
//! `null` at its index.

pub mod building_area;
pub mod building_construction_year;
pub mod building_families;
pub mod building_floors;
pub mod building_geo;
pub mod building_height;
pub mod building_population;
pub mod building_type;
pub mod building_volume;
pub mod census_boundary;
pub mod census_population;
pub mod filter_res;
pub mod scenario_geo;

#[cfg(test)]
pub mod stub;

pub use building_area::*;
pub use building_construction_year::*;
pub use building_families::*;
pub use building_floors::*;
pub use building_geo::*;
pub use building_height::*;
pub use building_population::*;
pub use building_type::*;
pub use building_volume::*;
pub use census_boundary::*;
pub use census_population::*;
pub use filter_res::*;
pub use scenario_geo::*;

use serde_json::Value;

use crate::engine::MethodContext;
use crate::errors::CalculatorError;

/// Buildings carried by the `building_geo` feature.
pub(crate) fn buildings(ctx: &MethodContext) -> Result<Vec<Value>, CalculatorError> {
    match ctx.feature("building_geo")?.get("buildings") {
        Some(Value::Array(items)) => Ok(items.clone()),
        _ => Err(CalculatorError::InvalidInput {
            name: "building_geo".to_string(),
            reason: "expected a 'buildings' array".to_string(),
        }),
    }
}

/// Per-building numeric series of `feature`; non-numeric entries are `None`.
pub(crate) fn number_series(
    ctx: &MethodContext,
    feature: &str,
) -> Result<Vec<Option<f64>>, CalculatorError> {
    match ctx.feature(feature)? {
        Value::Array(items) => Ok(items.iter().map(Value::as_f64).collect()),
        other => Err(CalculatorError::InvalidInput {
            name: feature.to_string(),
            reason: format!("expected an array but got {}", other),
        }),
    }
}

/// Fail when two per-building series disagree on the building count.
pub(crate) fn ensure_aligned(
    expected: usize,
    feature: &str,
    actual: usize,
) -> Result<(), CalculatorError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CalculatorError::InvalidInput {
            name: feature.to_string(),
            reason: format!("holds {} entries for {} buildings", actual, expected),
        })
    }
}

pub(crate) fn unsupported(calculator: &str, method: &str) -> CalculatorError {
    CalculatorError::Other(format!(
        "calculator '{}' does not implement method '{}'",
        calculator, method
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use serde_json::{json, Value};

    use crate::engine::{ExecutionContextBuilder, MethodContext};
    use crate::utils::geometry::bounds_polygon;

    /// A `building_geo` value with one square footprint per entry of `sizes`,
    /// spaced along the x axis in planar meters.
    pub fn building_geo(sizes: &[f64]) -> Value {
        let buildings: Vec<Value> = sizes
            .iter()
            .enumerate()
            .map(|(i, size)| {
                let x = 1000.0 + i as f64 * 100.0;
                json!({
                    "building_id": format!("b{}", i + 1),
                    "geometry": bounds_polygon(&[x, 1000.0, x + size, 1000.0 + size]),
                    "properties": {}
                })
            })
            .collect();
        json!({ "project_id": "p-1", "scenario_id": "s-1", "buildings": buildings })
    }

    pub fn view(builder: ExecutionContextBuilder) -> MethodContext {
        MethodContext::new(builder.build())
    }
}
