// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors that abort a whole run before any feature is executed.
///
/// Anything in this enum is detected while turning a request (feature list,
/// explicit plan or pipeline name) into an execution order. Nothing has been
/// written to the execution context when one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("Unknown feature: '{0}'")]
    UnknownFeature(String),

    #[error("Feature '{feature}' has no method named '{method}'")]
    UnknownMethod { feature: String, method: String },

    #[error("Unknown pipeline: '{0}'")]
    UnknownPipeline(String),

    #[error("Cyclic dependency detected: {}", .cycle.join(" -> "))]
    CyclicDependency { cycle: Vec<String> },

    #[error("Feature '{feature}' depends on '{dependency}' which is neither a feature nor a known service")]
    UnresolvedDependency { feature: String, dependency: String },

    #[error("Pipeline '{pipeline}' requires run input '{input}'")]
    MissingRunInput { pipeline: String, input: String },

    #[error("Feature '{0}' appears more than once in the plan")]
    DuplicatePlanStep(String),
}
