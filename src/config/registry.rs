// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::{validate_config, Config, PipelineConfig, ValueConstraints};
use crate::errors::{ConfigError, ResolutionError};

/// A named, versioned workflow loaded from configuration.
pub type PredefinedPipeline = PipelineConfig;

/// Immutable description of one computable feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureDefinition {
    pub name: String,
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub constraints: ValueConstraints,
    /// In declaration order
    pub methods: Vec<MethodDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodDefinition {
    pub name: String,
    pub priority: u32,
    pub depends_on: Vec<String>,
}

impl FeatureDefinition {
    /// Methods ordered by ascending priority; ties keep declaration order.
    pub fn methods_by_priority(&self) -> Vec<&MethodDefinition> {
        let mut methods: Vec<&MethodDefinition> = self.methods.iter().collect();
        methods.sort_by_key(|m| m.priority);
        methods
    }

    pub fn method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Union of every method's dependencies, first occurrence wins.
    pub fn all_dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        for dep in self.methods.iter().flat_map(|m| m.depends_on.iter()) {
            if !deps.contains(&dep.as_str()) {
                deps.push(dep);
            }
        }
        deps
    }
}

/// Read-only catalog of features, services and pipelines.
///
/// Built once from a validated [`Config`] and shared across runs.
#[derive(Debug)]
pub struct FeatureRegistry {
    features: Vec<Arc<FeatureDefinition>>,
    index: HashMap<String, usize>,
    services: Vec<String>,
    pipelines: Vec<PredefinedPipeline>,
}

impl FeatureRegistry {
    /// Validate `config` and build the registry from it.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let features: Vec<Arc<FeatureDefinition>> = config
            .features
            .iter()
            .map(|f| {
                Arc::new(FeatureDefinition {
                    name: f.name.clone(),
                    strategy: f.strategy.clone(),
                    description: f.description.clone(),
                    constraints: f.constraints.clone(),
                    methods: f
                        .methods
                        .iter()
                        .map(|m| MethodDefinition {
                            name: m.name.clone(),
                            priority: m.priority,
                            depends_on: m.depends_on.clone(),
                        })
                        .collect(),
                })
            })
            .collect();

        let index = features
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();

        Ok(Self {
            features,
            index,
            services: config.services.clone(),
            pipelines: config.pipelines.clone(),
        })
    }

    pub fn get_definition(&self, name: &str) -> Result<&Arc<FeatureDefinition>, ResolutionError> {
        self.index
            .get(name)
            .map(|&i| &self.features[i])
            .ok_or_else(|| ResolutionError::UnknownFeature(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn is_service(&self, name: &str) -> bool {
        self.services.iter().any(|s| s == name)
    }

    /// Position of the feature in the configuration, used for tie-breaking.
    pub fn declaration_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Feature names in declaration order.
    pub fn list_features(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn list_services(&self) -> &[String] {
        &self.services
    }

    pub fn pipeline(&self, name: &str) -> Result<&PredefinedPipeline, ResolutionError> {
        self.pipelines
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ResolutionError::UnknownPipeline(name.to_string()))
    }

    pub fn list_pipelines(&self) -> &[PredefinedPipeline] {
        &self.pipelines
    }
}
