// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Per-run store of feature values, service handles and raw inputs.
//!
//! An [`ExecutionContext`] is created for one run and dropped with it. It is a
//! cheap handle over shared state so wave members can read it from separate
//! tasks, while only the executor writes feature values.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{Map, Value};

use crate::errors::CalculatorError;
use crate::traits::{
    Calculator, ElevationService, ServiceHandle, ServiceHandles, SpatialQueryService,
};

/// Raw run inputs as supplied by the caller.
pub type RunInputs = Map<String, Value>;

#[derive(Clone, Default)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

#[derive(Default)]
struct ContextInner {
    features: RwLock<HashMap<String, Value>>,
    services: ServiceHandles,
    inputs: RunInputs,
    calculators: Mutex<HashMap<String, Arc<dyn Calculator>>>,
}

impl ExecutionContext {
    pub fn builder() -> ExecutionContextBuilder {
        ExecutionContextBuilder::default()
    }

    pub fn get(&self, feature: &str) -> Option<Value> {
        self.read_features().get(feature).cloned()
    }

    pub fn set(&self, feature: &str, value: Value) {
        self.inner
            .features
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feature.to_string(), value);
    }

    pub fn has(&self, feature: &str) -> bool {
        self.read_features().contains_key(feature)
    }

    pub fn get_service(&self, name: &str) -> Option<&ServiceHandle> {
        self.inner.services.get(name)
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.inner.services.contains_key(name)
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inner.inputs.get(name)
    }

    pub fn inputs(&self) -> &RunInputs {
        &self.inner.inputs
    }

    pub fn project_id(&self) -> Option<&str> {
        self.input("project_id").and_then(Value::as_str)
    }

    pub fn scenario_id(&self) -> Option<&str> {
        self.input("scenario_id").and_then(Value::as_str)
    }

    pub fn building_id(&self) -> Option<&str> {
        self.input("building_id").and_then(Value::as_str)
    }

    /// Copy of every feature value currently stored.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.read_features().clone()
    }

    pub(crate) fn cached_calculator(&self, feature: &str) -> Option<Arc<dyn Calculator>> {
        self.inner
            .calculators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(feature)
            .cloned()
    }

    pub(crate) fn cache_calculator(&self, feature: &str, calculator: Arc<dyn Calculator>) {
        self.inner
            .calculators
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(feature.to_string(), calculator);
    }

    fn read_features(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Value>> {
        self.inner
            .features
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut features: Vec<String> = self.read_features().keys().cloned().collect();
        features.sort();
        let mut services: Vec<&String> = self.inner.services.keys().collect();
        services.sort();
        f.debug_struct("ExecutionContext")
            .field("features", &features)
            .field("services", &services)
            .field("inputs", &self.inner.inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct ExecutionContextBuilder {
    features: HashMap<String, Value>,
    services: ServiceHandles,
    inputs: RunInputs,
}

impl ExecutionContextBuilder {
    /// Seed an already-known feature value.
    pub fn feature(mut self, name: impl Into<String>, value: Value) -> Self {
        self.features.insert(name.into(), value);
        self
    }

    pub fn service(mut self, name: impl Into<String>, handle: ServiceHandle) -> Self {
        self.services.insert(name.into(), handle);
        self
    }

    pub fn services(mut self, services: &ServiceHandles) -> Self {
        self.services
            .extend(services.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn input(mut self, name: impl Into<String>, value: Value) -> Self {
        self.inputs.insert(name.into(), value);
        self
    }

    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            inner: Arc::new(ContextInner {
                features: RwLock::new(self.features),
                services: self.services,
                inputs: self.inputs,
                calculators: Mutex::new(HashMap::new()),
            }),
        }
    }
}

/// Read-only view of the context handed to calculator methods.
#[derive(Clone, Debug)]
pub struct MethodContext {
    ctx: ExecutionContext,
}

impl MethodContext {
    pub(crate) fn new(ctx: ExecutionContext) -> Self {
        Self { ctx }
    }

    /// Value of a dependency feature, or `MissingInput` when absent.
    pub fn feature(&self, name: &str) -> Result<Value, CalculatorError> {
        self.ctx
            .get(name)
            .ok_or_else(|| CalculatorError::MissingInput(name.to_string()))
    }

    pub fn input(&self, name: &str) -> Option<&Value> {
        self.ctx.input(name)
    }

    pub fn project_id(&self) -> Option<&str> {
        self.ctx.project_id()
    }

    pub fn scenario_id(&self) -> Option<&str> {
        self.ctx.scenario_id()
    }

    pub fn elevation_service(&self, name: &str) -> Option<Arc<dyn ElevationService>> {
        match self.ctx.get_service(name) {
            Some(ServiceHandle::Elevation(service)) => Some(service.clone()),
            _ => None,
        }
    }

    pub fn spatial_query_service(&self, name: &str) -> Option<Arc<dyn SpatialQueryService>> {
        match self.ctx.get_service(name) {
            Some(ServiceHandle::SpatialQuery(service)) => Some(service.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_set_has() {
        let ctx = ExecutionContext::builder()
            .feature("building_area", json!([100.0]))
            .build();

        assert!(ctx.has("building_area"));
        assert!(!ctx.has("building_height"));
        assert_eq!(ctx.get("building_height"), None);

        ctx.set("building_height", json!([12.0]));
        assert_eq!(ctx.get("building_height"), Some(json!([12.0])));
        assert_eq!(ctx.snapshot().len(), 2);
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = ExecutionContext::default();
        let other = ctx.clone();
        other.set("census_population", json!(42.0));
        assert_eq!(ctx.get("census_population"), Some(json!(42.0)));
    }

    #[test]
    fn test_separate_contexts_do_not_leak() {
        let first = ExecutionContext::default();
        first.set("building_area", json!([1.0]));
        let second = ExecutionContext::default();
        assert!(!second.has("building_area"));
    }

    #[test]
    fn test_inputs_and_identifiers() {
        let ctx = ExecutionContext::builder()
            .input("project_id", json!("p-1"))
            .input("scenario_id", json!("s-1"))
            .input("buildings", json!({"type": "FeatureCollection", "features": []}))
            .build();

        assert_eq!(ctx.project_id(), Some("p-1"));
        assert_eq!(ctx.scenario_id(), Some("s-1"));
        assert_eq!(ctx.building_id(), None);
        assert!(ctx.input("buildings").is_some());
        assert!(!ctx.has("buildings"));
        assert!(!ctx.has_service("raster_service"));
        assert!(ctx.get_service("raster_service").is_none());
    }

    #[test]
    fn test_method_context_reports_missing_feature() {
        let view = MethodContext::new(ExecutionContext::default());
        assert_eq!(
            view.feature("building_geo"),
            Err(CalculatorError::MissingInput("building_geo".into()))
        );
        assert!(view.elevation_service("raster_service").is_none());
    }
}
