// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::calculators::*;
use crate::config::FeatureDefinition;
use crate::engine::ExecutionContext;
use crate::errors::FeatureFailure;
use crate::observability::messages::calculator::{
    CalculatorConstructed, CalculatorConstructionFailed,
};
use crate::observability::messages::StructuredLog;
use crate::traits::Calculator;

/// Builds a calculator for a feature definition.
pub type CalculatorConstructor =
    Arc<dyn Fn(&FeatureDefinition) -> Result<Arc<dyn Calculator>, String> + Send + Sync>;

/// Closed map from strategy tag to calculator constructor.
///
/// The `strategy` field of a feature selects the constructor:
/// - "building_geo" -> BuildingGeoCalculator
/// - "scenario_geo" -> ScenarioGeoCalculator
/// - "building_area" -> BuildingAreaCalculator
/// - "building_height" -> BuildingHeightCalculator
/// - "building_volume" -> BuildingVolumeCalculator
/// - "filter_res" -> ResidentialFilterCalculator
/// - "building_n_floors" -> BuildingFloorsCalculator
/// - "scenario_census_boundary" -> CensusBoundaryCalculator
/// - "census_population" -> CensusPopulationCalculator
/// - "building_population" -> BuildingPopulationCalculator
/// - "building_n_families" -> BuildingFamiliesCalculator
/// - "building_type" -> BuildingTypeCalculator
/// - "building_construction_year" -> BuildingConstructionYearCalculator
#[derive(Clone, Default)]
pub struct StrategyFactory {
    constructors: BTreeMap<String, CalculatorConstructor>,
}

fn construct<C: Calculator + Default + 'static>(
    _definition: &FeatureDefinition,
) -> Result<Arc<dyn Calculator>, String> {
    Ok(Arc::new(C::default()))
}

impl StrategyFactory {
    /// An empty factory; every lookup fails until strategies are registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory with every built-in building and scenario calculator.
    pub fn with_builtin() -> Self {
        Self::new()
            .register("building_geo", construct::<BuildingGeoCalculator>)
            .register("scenario_geo", construct::<ScenarioGeoCalculator>)
            .register("building_area", construct::<BuildingAreaCalculator>)
            .register("building_height", construct::<BuildingHeightCalculator>)
            .register("building_volume", construct::<BuildingVolumeCalculator>)
            .register("filter_res", construct::<ResidentialFilterCalculator>)
            .register("building_n_floors", construct::<BuildingFloorsCalculator>)
            .register(
                "scenario_census_boundary",
                construct::<CensusBoundaryCalculator>,
            )
            .register("census_population", construct::<CensusPopulationCalculator>)
            .register(
                "building_population",
                construct::<BuildingPopulationCalculator>,
            )
            .register("building_n_families", construct::<BuildingFamiliesCalculator>)
            .register("building_type", construct::<BuildingTypeCalculator>)
            .register(
                "building_construction_year",
                construct::<BuildingConstructionYearCalculator>,
            )
    }

    /// Add or replace the constructor for `strategy`.
    pub fn register<F>(mut self, strategy: &str, constructor: F) -> Self
    where
        F: Fn(&FeatureDefinition) -> Result<Arc<dyn Calculator>, String> + Send + Sync + 'static,
    {
        self.constructors
            .insert(strategy.to_string(), Arc::new(constructor));
        self
    }

    pub fn is_strategy_available(&self, strategy: &str) -> bool {
        self.constructors.contains_key(strategy)
    }

    /// Registered strategy tags, sorted.
    pub fn list_strategies(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// The calculator for `definition`, constructed once per context.
    pub fn get_calculator(
        &self,
        definition: &FeatureDefinition,
        ctx: &ExecutionContext,
    ) -> Result<Arc<dyn Calculator>, FeatureFailure> {
        if let Some(calculator) = ctx.cached_calculator(&definition.name) {
            return Ok(calculator);
        }

        let result = match self.constructors.get(&definition.strategy) {
            Some(constructor) => constructor(definition),
            None => Err(format!("unknown strategy '{}'", definition.strategy)),
        };

        match result {
            Ok(calculator) => {
                CalculatorConstructed {
                    feature: &definition.name,
                    strategy: &definition.strategy,
                }
                .log();
                ctx.cache_calculator(&definition.name, calculator.clone());
                Ok(calculator)
            }
            Err(reason) => {
                CalculatorConstructionFailed {
                    feature: &definition.name,
                    strategy: &definition.strategy,
                    reason: &reason,
                }
                .log();
                Err(FeatureFailure::CalculatorConstruction {
                    strategy: definition.strategy.clone(),
                    reason,
                })
            }
        }
    }
}

impl std::fmt::Debug for StrategyFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyFactory")
            .field("strategies", &self.list_strategies())
            .finish()
    }
}
