// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Construction period per residential building, distributed from census
//! counts.
//!
//! Each census zone carries building counts per construction period in its
//! attributes (`E8` .. `E16`). The zone's residential buildings receive
//! periods in the same proportions: periods are handed out in chronological
//! order, buildings in `building_geo` order, so a run is reproducible. Each
//! assigned building gets the period code, the period's middle year and the
//! TABULA period of that year. Non-residential buildings and buildings
//! outside every zone hold `null`.

use std::cmp::Reverse;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::calculators::building_type::RESIDENTIAL;
use crate::calculators::{buildings, ensure_aligned, unsupported};
use crate::engine::MethodContext;
use crate::errors::CalculatorError;
use crate::traits::{CensusZone, Calculator, MethodOutcome};
use crate::utils::geometry::{bounds, bounds_center, bounds_contain};

/// Census period code with the first and last construction year it covers.
pub const CENSUS_PERIODS: &[(&str, i64, i64)] = &[
    ("E8", 1800, 1918),
    ("E9", 1919, 1945),
    ("E10", 1946, 1960),
    ("E11", 1961, 1970),
    ("E12", 1971, 1980),
    ("E13", 1981, 1990),
    ("E14", 1991, 2000),
    ("E15", 2001, 2005),
    ("E16", 2006, 2023),
];

/// Used for a zone that reports no period counts at all
pub const DEFAULT_PERIOD: &str = "E12";

pub const TABULA_PERIODS: &[(i64, i64, &str)] = &[
    (0, 1900, "TABULA_1"),
    (1901, 1920, "TABULA_2"),
    (1921, 1945, "TABULA_3"),
    (1946, 1960, "TABULA_4"),
    (1961, 1975, "TABULA_5"),
    (1976, 1990, "TABULA_6"),
    (1991, 2005, "TABULA_7"),
];

pub const LATEST_TABULA_PERIOD: &str = "TABULA_7";

#[derive(Debug, Default)]
pub struct BuildingConstructionYearCalculator;

impl BuildingConstructionYearCalculator {
    fn calculate_from_census_distribution(
        &self,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        let buildings = buildings(ctx)?;
        let types = match ctx.feature("building_type")? {
            Value::Array(items) => items,
            other => {
                return Err(CalculatorError::InvalidInput {
                    name: "building_type".to_string(),
                    reason: format!("expected an array but got {}", other),
                })
            }
        };
        ensure_aligned(buildings.len(), "building_type", types.len())?;
        let zones = census_zones(&ctx.feature("scenario_census_boundary")?)?;

        // Residential building indices per zone, in building order
        let zone_bounds: Vec<_> = zones.iter().map(|zone| bounds(&zone.geometry)).collect();
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); zones.len()];
        for (index, (building, kind)) in buildings.iter().zip(&types).enumerate() {
            if kind.as_str() != Some(RESIDENTIAL) {
                continue;
            }
            let Some(center) = building.get("geometry").and_then(bounds).map(|b| bounds_center(&b))
            else {
                continue;
            };
            let zone = zone_bounds
                .iter()
                .position(|b| b.is_some_and(|b| bounds_contain(&b, center)));
            if let Some(zone) = zone {
                members[zone].push(index);
            }
        }

        if members.iter().all(Vec::is_empty) {
            return Ok(MethodOutcome::CannotCompute(
                "no residential building lies inside a census zone".to_string(),
            ));
        }

        let mut years = vec![Value::Null; buildings.len()];
        for (zone, indices) in zones.iter().zip(&members) {
            if indices.is_empty() {
                continue;
            }
            let allocation = allocate_periods(&period_counts(zone), indices.len());
            let periods = allocation
                .iter()
                .enumerate()
                .flat_map(|(period, count)| std::iter::repeat(period).take(*count));
            for (&building, period) in indices.iter().zip(periods) {
                years[building] = construction(period);
            }
        }

        Ok(MethodOutcome::Computed(Value::Array(years)))
    }
}

fn census_zones(boundary: &Value) -> Result<Vec<CensusZone>, CalculatorError> {
    let zones = boundary
        .get("census_zones")
        .cloned()
        .unwrap_or(Value::Array(Vec::new()));
    serde_json::from_value(zones).map_err(|e| CalculatorError::InvalidInput {
        name: "scenario_census_boundary".to_string(),
        reason: format!("malformed census zones: {}", e),
    })
}

/// Building counts per census period; missing or non-numeric attributes count as zero.
fn period_counts(zone: &CensusZone) -> Vec<f64> {
    CENSUS_PERIODS
        .iter()
        .map(|(code, ..)| {
            zone.attributes
                .get(*code)
                .and_then(Value::as_f64)
                .unwrap_or(0.0)
                .max(0.0)
        })
        .collect()
}

/// Split `buildings` over the periods in proportion to `counts`.
///
/// Rounding drift is settled on the periods holding the most buildings,
/// earlier periods first on ties.
pub fn allocate_periods(counts: &[f64], buildings: usize) -> Vec<usize> {
    let total: f64 = counts.iter().sum();
    let shares: Vec<f64> = if total > 0.0 {
        counts.iter().map(|count| count / total).collect()
    } else {
        CENSUS_PERIODS
            .iter()
            .map(|(code, ..)| if *code == DEFAULT_PERIOD { 1.0 } else { 0.0 })
            .collect()
    };

    let mut allocated: Vec<usize> = shares
        .iter()
        .map(|share| (share * buildings as f64).round() as usize)
        .collect();
    let mut ranked: Vec<usize> = (0..shares.len()).filter(|&i| shares[i] > 0.0).collect();
    ranked.sort_by_key(|&i| Reverse(allocated[i]));

    let mut assigned: usize = allocated.iter().sum();
    let mut next = 0;
    while assigned < buildings && !ranked.is_empty() {
        allocated[ranked[next % ranked.len()]] += 1;
        assigned += 1;
        next += 1;
    }
    while assigned > buildings {
        let Some(largest) = ranked
            .iter()
            .copied()
            .filter(|&i| allocated[i] > 0)
            .min_by_key(|&i| Reverse(allocated[i]))
        else {
            break;
        };
        allocated[largest] -= 1;
        assigned -= 1;
    }
    allocated
}

fn construction(period: usize) -> Value {
    let (code, first, last) = CENSUS_PERIODS[period];
    let year = (first + last) / 2;
    json!({
        "period": code,
        "year": year,
        "tabula": tabula_period(year)
    })
}

pub fn tabula_period(year: i64) -> &'static str {
    TABULA_PERIODS
        .iter()
        .find(|(first, last, _)| (*first..=*last).contains(&year))
        .map(|(_, _, period)| *period)
        .unwrap_or(LATEST_TABULA_PERIOD)
}

#[async_trait]
impl Calculator for BuildingConstructionYearCalculator {
    fn name(&self) -> &'static str {
        "building_construction_year"
    }

    fn supports(&self, method: &str) -> bool {
        method == "calculate_from_census_distribution"
    }

    async fn invoke(
        &self,
        method: &str,
        ctx: &MethodContext,
    ) -> Result<MethodOutcome, CalculatorError> {
        match method {
            "calculate_from_census_distribution" => self.calculate_from_census_distribution(ctx),
            other => Err(unsupported(self.name(), other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculators::test_support::{building_geo, view};
    use crate::engine::ExecutionContext;
    use crate::utils::geometry::bounds_polygon;

    fn boundary(attributes: Value) -> Value {
        json!({
            "census_zones": [
                {
                    "zone_id": "z1",
                    "population": 100.0,
                    "geometry": bounds_polygon(&[900.0, 900.0, 1250.0, 1100.0]),
                    "attributes": attributes
                },
                {
                    "zone_id": "z2",
                    "population": 50.0,
                    "geometry": bounds_polygon(&[1250.0, 900.0, 2000.0, 1100.0]),
                    "attributes": {"E16": 4},
                }
            ],
            "total_population": 150.0
        })
    }

    fn context(types: Value, attributes: Value) -> MethodContext {
        // Buildings b1..b3 fall in z1, b4 in z2
        view(
            ExecutionContext::builder()
                .feature("building_geo", building_geo(&[10.0, 10.0, 10.0, 10.0]))
                .feature("building_type", types)
                .feature("scenario_census_boundary", boundary(attributes)),
        )
    }

    #[tokio::test]
    async fn test_periods_follow_zone_proportions() {
        let ctx = context(
            json!(["residential", "residential", "non_residential", "residential"]),
            json!({"E9": 1, "E12": 3}),
        );

        let MethodOutcome::Computed(value) = BuildingConstructionYearCalculator
            .invoke("calculate_from_census_distribution", &ctx)
            .await
            .unwrap()
        else {
            panic!("expected a value");
        };

        assert_eq!(
            value,
            json!([
                {"period": "E9", "year": 1932, "tabula": "TABULA_3"},
                {"period": "E12", "year": 1975, "tabula": "TABULA_5"},
                null,
                {"period": "E16", "year": 2014, "tabula": "TABULA_7"}
            ])
        );
    }

    #[tokio::test]
    async fn test_zone_without_counts_uses_default_period() {
        let ctx = context(
            json!(["residential", "non_residential", "non_residential", "non_residential"]),
            json!({"households": 12}),
        );

        let MethodOutcome::Computed(value) = BuildingConstructionYearCalculator
            .invoke("calculate_from_census_distribution", &ctx)
            .await
            .unwrap()
        else {
            panic!("expected a value");
        };
        assert_eq!(value[0]["period"], "E12");
        assert!(value[1].is_null());
    }

    #[tokio::test]
    async fn test_no_residential_building_cannot_compute() {
        let ctx = context(
            json!(["non_residential", "non_residential", "non_residential", "non_residential"]),
            json!({"E9": 1}),
        );
        assert!(matches!(
            BuildingConstructionYearCalculator
                .invoke("calculate_from_census_distribution", &ctx)
                .await,
            Ok(MethodOutcome::CannotCompute(_))
        ));
    }

    #[test]
    fn test_allocation_settles_rounding_drift() {
        // 0.5 and 1.5 both round up; the larger period gives one back
        let mut counts = vec![0.0; CENSUS_PERIODS.len()];
        counts[1] = 1.0;
        counts[4] = 3.0;
        assert_eq!(allocate_periods(&counts, 2), vec![0, 1, 0, 0, 1, 0, 0, 0, 0]);

        // Nine equal shares of four buildings all round to zero
        let even = vec![1.0; CENSUS_PERIODS.len()];
        assert_eq!(allocate_periods(&even, 4), vec![1, 1, 1, 1, 0, 0, 0, 0, 0]);

        let allocated = allocate_periods(&[5.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 7.0], 11);
        assert_eq!(allocated.iter().sum::<usize>(), 11);
    }

    #[test]
    fn test_tabula_periods() {
        assert_eq!(tabula_period(1850), "TABULA_1");
        assert_eq!(tabula_period(1932), "TABULA_3");
        assert_eq!(tabula_period(1975), "TABULA_5");
        assert_eq!(tabula_period(2014), LATEST_TABULA_PERIOD);
    }
}
