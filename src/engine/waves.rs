// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::FeatureRegistry;

/// Group a resolved order into waves (topological levels).
///
/// A feature's wave is one past the highest wave of any feature dependency
/// that appears earlier in `order`; dependencies outside `order` are already
/// satisfied and do not count. Within a wave features keep their order, so
/// flattening the waves gives back a valid execution order.
///
/// - Wave 0: features with no dependency inside the order
/// - Wave N: features whose in-order dependencies all sit in waves 0..N-1
///
/// `order` must be topological, which is what the resolver returns.
pub fn compute_waves(registry: &FeatureRegistry, order: &[String]) -> Vec<Vec<String>> {
    let mut level_of: HashMap<&str, usize> = HashMap::new();
    let mut waves: Vec<Vec<String>> = Vec::new();

    for feature in order {
        let level = registry
            .get_definition(feature)
            .map(|definition| {
                definition
                    .all_dependencies()
                    .into_iter()
                    .filter_map(|dep| level_of.get(dep).map(|l| l + 1))
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0);

        level_of.insert(feature.as_str(), level);
        if waves.len() <= level {
            waves.resize_with(level + 1, Vec::new);
        }
        waves[level].push(feature.clone());
    }

    waves
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry() -> FeatureRegistry {
        let yaml = r#"
services: [raster_service]
features:
  - name: building_geo
    strategy: stub
    methods: [{ name: m }]
  - name: building_area
    strategy: stub
    methods: [{ name: m, depends_on: [building_geo] }]
  - name: building_height
    strategy: stub
    methods: [{ name: m, depends_on: [building_geo, raster_service] }]
  - name: building_volume
    strategy: stub
    methods: [{ name: m, depends_on: [building_height, building_area] }]
  - name: census_population
    strategy: stub
    methods: [{ name: m }]
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        FeatureRegistry::from_config(&config).unwrap()
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_diamond_levels() {
        let order = names(&[
            "building_geo",
            "building_area",
            "building_height",
            "building_volume",
        ]);
        let waves = compute_waves(&registry(), &order);
        assert_eq!(
            waves,
            vec![
                names(&["building_geo"]),
                names(&["building_area", "building_height"]),
                names(&["building_volume"]),
            ]
        );
    }

    #[test]
    fn test_independent_features_share_wave_zero() {
        let order = names(&["census_population", "building_geo"]);
        let waves = compute_waves(&registry(), &order);
        assert_eq!(waves, vec![order]);
    }

    #[test]
    fn test_satisfied_dependencies_do_not_raise_level() {
        // geo is already in the context, so it is not part of the order
        let order = names(&["building_area", "building_height", "building_volume"]);
        let waves = compute_waves(&registry(), &order);
        assert_eq!(
            waves,
            vec![
                names(&["building_area", "building_height"]),
                names(&["building_volume"]),
            ]
        );
    }

    #[test]
    fn test_empty_order() {
        assert!(compute_waves(&registry(), &[]).is_empty());
    }
}
