// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod resolution;

pub use config::{ConfigError, ValidationError};
pub use execution::{CalculatorError, FeatureFailure, MethodFailureKind, ServiceError};
pub use resolution::ResolutionError;
