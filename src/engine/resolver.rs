// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dependency resolution for requested features.
//!
//! The graph is implicit in the registry: a feature depends on the union of
//! the feature-typed dependencies of all its methods. Service names are not
//! nodes; their availability is checked when a method is selected.
//!
//! # Algorithm: DFS post-order with three colours
//!
//! - **White**: not yet visited
//! - **Gray**: on the current DFS path
//! - **Black**: finished and already placed in the order
//!
//! Reaching a gray node means the current path loops back on itself, and the
//! path segment from that node onwards is the reported cycle.
//!
//! # Determinism
//!
//! Requested features are visited in caller order and each feature's
//! dependencies in registry declaration order, so identical requests against
//! identical registry and context state always give identical orders.

use std::collections::{HashMap, HashSet};

use crate::config::FeatureRegistry;
use crate::engine::ExecutionContext;
use crate::errors::ResolutionError;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    Gray,
    Black,
}

/// Compute an execution order for `requested`.
///
/// Every feature in the result appears after all feature dependencies of all
/// its methods, except dependencies that already have a value in `ctx`, which
/// are neither traversed nor included. Requested features are always
/// included, even when `ctx` already holds them, but then their own
/// dependencies are not traversed.
pub fn resolve_order(
    registry: &FeatureRegistry,
    requested: &[String],
    ctx: &ExecutionContext,
) -> Result<Vec<String>, ResolutionError> {
    for name in requested {
        registry.get_definition(name)?;
    }

    let requested_set: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut resolver = Resolver {
        registry,
        ctx,
        requested: &requested_set,
        colours: HashMap::new(),
        path: Vec::new(),
        order: Vec::new(),
    };

    for name in requested {
        resolver.visit(name)?;
    }

    Ok(resolver.order)
}

struct Resolver<'a> {
    registry: &'a FeatureRegistry,
    ctx: &'a ExecutionContext,
    requested: &'a HashSet<&'a str>,
    colours: HashMap<String, Colour>,
    path: Vec<String>,
    order: Vec<String>,
}

impl Resolver<'_> {
    fn visit(&mut self, name: &str) -> Result<(), ResolutionError> {
        match self.colours.get(name) {
            Some(Colour::Black) => return Ok(()),
            Some(Colour::Gray) => {
                let start = self.path.iter().position(|n| n == name).unwrap_or(0);
                let mut cycle = self.path[start..].to_vec();
                cycle.push(name.to_string());
                return Err(ResolutionError::CyclicDependency { cycle });
            }
            None => {}
        }

        // A value in the context ends the walk: it is reported as reused and
        // nothing it depends on runs.
        if self.ctx.has(name) {
            self.colours.insert(name.to_string(), Colour::Black);
            self.order.push(name.to_string());
            return Ok(());
        }

        self.colours.insert(name.to_string(), Colour::Gray);
        self.path.push(name.to_string());

        for dependency in self.feature_dependencies(name)? {
            let satisfied = self.ctx.has(&dependency) && !self.requested.contains(dependency.as_str());
            if !satisfied {
                self.visit(&dependency)?;
            }
        }

        self.path.pop();
        self.colours.insert(name.to_string(), Colour::Black);
        self.order.push(name.to_string());
        Ok(())
    }

    /// Feature-typed dependencies of `name`, in registry declaration order.
    fn feature_dependencies(&self, name: &str) -> Result<Vec<String>, ResolutionError> {
        let definition = self.registry.get_definition(name)?;
        let mut features = Vec::new();

        for dependency in definition.all_dependencies() {
            if self.registry.contains(dependency) {
                features.push(dependency.to_string());
            } else if !self.registry.is_service(dependency) {
                return Err(ResolutionError::UnresolvedDependency {
                    feature: name.to_string(),
                    dependency: dependency.to_string(),
                });
            }
        }

        features.sort_by_key(|f| self.registry.declaration_index(f));
        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use serde_json::json;

    fn registry(yaml: &str) -> FeatureRegistry {
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        FeatureRegistry::from_config(&config).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    const BUILDINGS: &str = r#"
services: [raster_service]
features:
  - name: building_geo
    strategy: stub
    methods: [{ name: from_input }]
  - name: building_area
    strategy: stub
    methods: [{ name: from_geometry, depends_on: [building_geo] }]
  - name: building_height
    strategy: stub
    methods:
      - { name: from_raster, priority: 1, depends_on: [building_geo, raster_service] }
      - { name: default_estimate, priority: 2, depends_on: [building_geo] }
  - name: building_volume
    strategy: stub
    methods: [{ name: from_height_and_area, depends_on: [building_height, building_area] }]
  - name: census_population
    strategy: stub
    methods: [{ name: from_census }]
"#;

    fn assert_topological(registry: &FeatureRegistry, order: &[String]) {
        for (i, feature) in order.iter().enumerate() {
            let definition = registry.get_definition(feature).unwrap();
            for dep in definition.all_dependencies() {
                if registry.contains(dep) {
                    let pos = order.iter().position(|f| f == dep).unwrap();
                    assert!(pos < i, "{} must precede {}", dep, feature);
                }
            }
        }
    }

    #[test]
    fn test_dependencies_precede_dependents() {
        let registry = registry(BUILDINGS);
        let order = resolve_order(
            &registry,
            &names(&["building_volume"]),
            &ExecutionContext::default(),
        )
        .unwrap();

        // building_volume declares height before area, registry order puts area first
        assert_eq!(
            order,
            names(&["building_geo", "building_area", "building_height", "building_volume"])
        );
        assert_topological(&registry, &order);
    }

    #[test]
    fn test_requested_order_is_respected_for_independent_features() {
        let registry = registry(BUILDINGS);
        let order = resolve_order(
            &registry,
            &names(&["census_population", "building_area"]),
            &ExecutionContext::default(),
        )
        .unwrap();
        assert_eq!(
            order,
            names(&["census_population", "building_geo", "building_area"])
        );
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let registry = registry(BUILDINGS);
        let request = names(&["building_volume", "census_population", "building_height"]);
        let first = resolve_order(&registry, &request, &ExecutionContext::default()).unwrap();
        for _ in 0..10 {
            let again = resolve_order(&registry, &request, &ExecutionContext::default()).unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_dependencies_in_context_are_not_traversed() {
        let registry = registry(BUILDINGS);
        let ctx = ExecutionContext::builder()
            .feature("building_area", json!([10.0]))
            .feature("building_height", json!([3.0]))
            .build();

        let order = resolve_order(&registry, &names(&["building_volume"]), &ctx).unwrap();
        assert_eq!(order, names(&["building_volume"]));
    }

    #[test]
    fn test_requested_feature_in_context_is_still_ordered() {
        let registry = registry(BUILDINGS);
        let ctx = ExecutionContext::builder()
            .feature("building_geo", json!({}))
            .build();

        let order = resolve_order(
            &registry,
            &names(&["building_geo", "building_area"]),
            &ctx,
        )
        .unwrap();
        assert_eq!(order, names(&["building_geo", "building_area"]));
    }

    #[test]
    fn test_requested_feature_in_context_stops_traversal() {
        let registry = registry(BUILDINGS);
        let ctx = ExecutionContext::builder()
            .feature("building_area", json!([10.0]))
            .build();

        let order = resolve_order(&registry, &names(&["building_area"]), &ctx).unwrap();
        assert_eq!(order, names(&["building_area"]));

        let order = resolve_order(
            &registry,
            &names(&["building_area", "building_volume"]),
            &ctx,
        )
        .unwrap();
        assert_eq!(
            order,
            names(&["building_area", "building_geo", "building_height", "building_volume"])
        );
    }

    #[test]
    fn test_duplicate_requests_appear_once() {
        let registry = registry(BUILDINGS);
        let order = resolve_order(
            &registry,
            &names(&["building_area", "building_geo", "building_area"]),
            &ExecutionContext::default(),
        )
        .unwrap();
        assert_eq!(order, names(&["building_geo", "building_area"]));
    }

    #[test]
    fn test_unknown_requested_feature() {
        let registry = registry(BUILDINGS);
        assert_eq!(
            resolve_order(
                &registry,
                &names(&["building_area", "building_age"]),
                &ExecutionContext::default()
            ),
            Err(ResolutionError::UnknownFeature("building_age".into()))
        );
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let registry = registry(
            r#"
features:
  - name: a
    strategy: stub
    methods: [{ name: m, depends_on: [b] }]
  - name: b
    strategy: stub
    methods: [{ name: m, depends_on: [c] }]
  - name: c
    strategy: stub
    methods:
      - { name: m1, depends_on: [] }
      - { name: m2, depends_on: [b] }
"#,
        );

        let result = resolve_order(&registry, &names(&["a"]), &ExecutionContext::default());
        assert_eq!(
            result,
            Err(ResolutionError::CyclicDependency {
                cycle: names(&["b", "c", "b"])
            })
        );
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let registry = registry(
            r#"
features:
  - name: a
    strategy: stub
    methods: [{ name: m, depends_on: [a] }]
"#,
        );
        let result = resolve_order(&registry, &names(&["a"]), &ExecutionContext::default());
        assert!(matches!(
            result,
            Err(ResolutionError::CyclicDependency { cycle }) if cycle == names(&["a", "a"])
        ));
    }

    #[test]
    fn test_cycle_outside_request_is_ignored() {
        let registry = registry(
            r#"
features:
  - name: a
    strategy: stub
    methods: [{ name: m, depends_on: [b] }]
  - name: b
    strategy: stub
    methods: [{ name: m, depends_on: [a] }]
  - name: c
    strategy: stub
    methods: [{ name: m }]
"#,
        );
        let order = resolve_order(&registry, &names(&["c"]), &ExecutionContext::default()).unwrap();
        assert_eq!(order, names(&["c"]));
    }

    #[test]
    fn test_acyclic_graphs_always_resolve() {
        // A layered graph where every feature depends on all features declared before it
        let mut yaml = String::from("features:\n");
        for i in 0..8 {
            let deps: Vec<String> = (0..i).map(|j| format!("f{}", j)).collect();
            yaml.push_str(&format!(
                "  - name: f{}\n    strategy: stub\n    methods: [{{ name: m, depends_on: [{}] }}]\n",
                i,
                deps.join(", ")
            ));
        }
        let registry = registry(&yaml);

        for i in 0..8 {
            let order = resolve_order(
                &registry,
                &names(&[&format!("f{}", i)]),
                &ExecutionContext::default(),
            )
            .unwrap();
            assert_eq!(order.len(), i + 1);
            assert_topological(&registry, &order);
        }
    }
}
