// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod registry;
mod validation;

pub mod consts;

pub use loader::{
    load_and_validate_config, load_config, Config, DataType, ExecutorOptions, FeatureConfig,
    MethodConfig, PipelineConfig, TimeoutPolicy, ValueConstraints,
};
pub use registry::{FeatureDefinition, FeatureRegistry, MethodDefinition, PredefinedPipeline};
pub use validation::validate_config;
