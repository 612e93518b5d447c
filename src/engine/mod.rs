// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod constraints;
pub mod context;
pub mod executor;
pub mod factory;
pub mod plan;
pub mod report;
pub mod resolver;
pub mod waves;

pub use context::{ExecutionContext, ExecutionContextBuilder, MethodContext, RunInputs};
pub use executor::Orchestrator;
pub use factory::{CalculatorConstructor, StrategyFactory};
pub use plan::{ExecutionPlan, ExecutionPlanBuilder, PlanStep};
pub use report::{FeatureResult, FeatureStatus, MethodAttempt, PipelineInfo, RunReport};
pub use resolver::resolve_order;
pub use waves::compute_waves;
