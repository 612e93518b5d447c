// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Load-time validation of feature configurations.
//!
//! Every check runs and every problem is collected, so a broken configuration
//! is reported in one pass. The checks are:
//!
//! 1. **Uniqueness**: feature names, method names within a feature, service
//!    names (which also may not shadow a feature) and pipeline names
//! 2. **Shape**: each feature declares at least one method and a non-empty
//!    numeric range
//! 3. **References**: every method dependency names a feature or a declared
//!    service, and every pipeline lists only known features
//!
//! Dependency cycles are deliberately not checked here. They only matter for
//! the features a caller actually requests and are reported by the resolver
//! with the offending path.
//!
//! Priority ties inside a feature are allowed; declaration order breaks them.

use std::collections::HashSet;

use crate::config::Config;
use crate::errors::ValidationError;
use crate::observability::messages::validation::ValidationCompleted;
use crate::observability::messages::StructuredLog;

/// Validates a configuration for structural integrity.
///
/// # Returns
///
/// * `Ok(())` - Configuration can be turned into a registry
/// * `Err(Vec<ValidationError>)` - Every problem found, in check order
///
/// # Examples
///
/// ```rust
/// use cim_pipeline::config::{validate_config, Config, FeatureConfig, MethodConfig, ValueConstraints};
///
/// let config = Config {
///     executor_options: Default::default(),
///     services: vec![],
///     features: vec![FeatureConfig {
///         name: "building_geo".to_string(),
///         strategy: "building_geo".to_string(),
///         description: None,
///         constraints: ValueConstraints::default(),
///         methods: vec![MethodConfig {
///             name: "calculate_from_input".to_string(),
///             priority: 1,
///             depends_on: vec![],
///         }],
///     }],
///     pipelines: vec![],
/// };
///
/// assert!(validate_config(&config).is_ok());
/// ```
pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    errors.extend(validate_unique_feature_names(config));
    errors.extend(validate_feature_shapes(config));
    errors.extend(validate_services(config));
    errors.extend(validate_dependency_references(config));
    errors.extend(validate_pipelines(config));

    ValidationCompleted {
        feature_count: config.features.len(),
        pipeline_count: config.pipelines.len(),
        error_count: errors.len(),
    }
    .log();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_feature_names(config: &Config) -> Vec<ValidationError> {
    let mut seen = HashSet::new();
    config
        .features
        .iter()
        .filter(|f| !seen.insert(f.name.as_str()))
        .map(|f| ValidationError::DuplicateFeature {
            feature: f.name.clone(),
        })
        .collect()
}

fn validate_feature_shapes(config: &Config) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for feature in &config.features {
        if feature.methods.is_empty() {
            errors.push(ValidationError::NoMethods {
                feature: feature.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        for method in &feature.methods {
            if !seen.insert(method.name.as_str()) {
                errors.push(ValidationError::DuplicateMethod {
                    feature: feature.name.clone(),
                    method: method.name.clone(),
                });
            }
        }

        if let (Some(min), Some(max)) = (feature.constraints.min, feature.constraints.max) {
            if min > max {
                errors.push(ValidationError::InvalidRange {
                    feature: feature.name.clone(),
                    min,
                    max,
                });
            }
        }
    }

    errors
}

fn validate_services(config: &Config) -> Vec<ValidationError> {
    let feature_names: HashSet<&str> = config.features.iter().map(|f| f.name.as_str()).collect();
    let mut seen = HashSet::new();

    config
        .services
        .iter()
        .filter(|s| !seen.insert(s.as_str()) || feature_names.contains(s.as_str()))
        .map(|s| ValidationError::DuplicateService { service: s.clone() })
        .collect()
}

/// Every dependency must name either a feature or a declared service.
///
/// Service availability itself is checked lazily against the execution
/// context when a method is selected.
fn validate_dependency_references(config: &Config) -> Vec<ValidationError> {
    let known: HashSet<&str> = config
        .features
        .iter()
        .map(|f| f.name.as_str())
        .chain(config.services.iter().map(String::as_str))
        .collect();

    let mut errors = Vec::new();
    for feature in &config.features {
        for method in &feature.methods {
            for dependency in &method.depends_on {
                if !known.contains(dependency.as_str()) {
                    errors.push(ValidationError::UnresolvedDependency {
                        feature: feature.name.clone(),
                        method: method.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
    }
    errors
}

fn validate_pipelines(config: &Config) -> Vec<ValidationError> {
    let feature_names: HashSet<&str> = config.features.iter().map(|f| f.name.as_str()).collect();
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for pipeline in &config.pipelines {
        if !seen.insert(pipeline.name.as_str()) {
            errors.push(ValidationError::DuplicatePipeline {
                pipeline: pipeline.name.clone(),
            });
        }
        for feature in &pipeline.features {
            if !feature_names.contains(feature.as_str()) {
                errors.push(ValidationError::UnknownPipelineFeature {
                    pipeline: pipeline.name.clone(),
                    feature: feature.clone(),
                });
            }
        }
    }
    errors
}
