// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::config::{
    Config, ExecutorOptions, FeatureDefinition, FeatureRegistry, MethodDefinition, TimeoutPolicy,
};
use crate::engine::constraints::check_value;
use crate::engine::context::{ExecutionContext, MethodContext, RunInputs};
use crate::engine::factory::StrategyFactory;
use crate::engine::plan::ExecutionPlan;
use crate::engine::report::{FeatureResult, MethodAttempt, PipelineInfo, RunReport};
use crate::engine::resolver::resolve_order;
use crate::engine::waves::compute_waves;
use crate::errors::{ConfigError, FeatureFailure, MethodFailureKind, ResolutionError};
use crate::observability::messages::engine::{
    FeatureFailed, FeatureReused, FeatureSkipped, FeatureSucceeded, MethodAttemptFailed,
    MethodIneligible, ResolutionFailed, RunCompleted, RunStarted, WaveStarted,
};
use crate::observability::messages::StructuredLog;
use crate::traits::{Calculator, MethodOutcome, ServiceHandles};

/// Orchestrates feature calculation runs.
///
/// An orchestrator is built once from a registry and a strategy factory and
/// is shared across runs. Each run gets its own [`ExecutionContext`]; nothing
/// computed in one run is visible to another unless the caller explicitly
/// reuses a context through [`Orchestrator::run_with_context`].
///
/// ## Invocation modes
///
/// - **Automatic** ([`run`](Self::run)): resolve dependencies, then try each
///   feature's methods by priority with fallback. A feature that cannot be
///   computed is `failed`; features that needed it are `skipped`.
/// - **Explicit** ([`run_explicit`](Self::run_explicit)): execute a caller
///   supplied plan in order. Pinned methods run once with no fallback and
///   dependents of failed steps are still attempted.
/// - **Predefined pipeline** ([`run_pipeline`](Self::run_pipeline)): look up a
///   named feature list and run it in automatic mode.
///
/// ## Concurrency
///
/// With `parallel = true` the resolved order is grouped into waves. Each
/// wave's features run as tokio tasks bounded by a semaphore of
/// `max_concurrency` permits; the wave's values are committed to the context
/// in order once every task has finished, so the executor stays the single
/// writer. Waves never overlap. Sequential runs commit after every feature.
/// Both produce the same report apart from timing.
pub struct Orchestrator {
    runner: FeatureRunner,
    services: ServiceHandles,
    max_concurrency: usize,
}

#[derive(Clone)]
struct FeatureRunner {
    registry: Arc<FeatureRegistry>,
    factory: Arc<StrategyFactory>,
    method_timeout: Option<Duration>,
    timeout_policy: TimeoutPolicy,
}

impl Orchestrator {
    pub fn new(registry: FeatureRegistry, factory: StrategyFactory, options: &ExecutorOptions) -> Self {
        Self {
            runner: FeatureRunner {
                registry: Arc::new(registry),
                factory: Arc::new(factory),
                method_timeout: options.method_timeout(),
                timeout_policy: options.timeout_policy,
            },
            services: ServiceHandles::new(),
            max_concurrency: options.effective_concurrency(),
        }
    }

    /// Validate `config` and build an orchestrator over it.
    pub fn from_config(config: &Config, factory: StrategyFactory) -> Result<Self, ConfigError> {
        let registry = FeatureRegistry::from_config(config)?;
        Ok(Self::new(registry, factory, &config.executor_options))
    }

    /// Service handles placed in every context this orchestrator creates.
    pub fn with_services(mut self, services: ServiceHandles) -> Self {
        self.services = services;
        self
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.runner.registry
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Introspection: the full definition of one feature.
    pub fn describe_feature(&self, name: &str) -> Result<&FeatureDefinition, ResolutionError> {
        self.runner.registry.get_definition(name).map(Arc::as_ref)
    }

    /// A fresh context for one run.
    ///
    /// Inputs named after a registered feature seed that feature's value;
    /// everything else is kept as a raw input.
    pub fn new_context(&self, inputs: RunInputs) -> ExecutionContext {
        let mut builder = ExecutionContext::builder().services(&self.services);
        for (name, value) in inputs {
            builder = if self.runner.registry.contains(&name) {
                builder.feature(name, value)
            } else {
                builder.input(name, value)
            };
        }
        builder.build()
    }

    /// Automatic mode on a fresh context.
    pub async fn run<S: AsRef<str>>(
        &self,
        requested: &[S],
        inputs: RunInputs,
        parallel: bool,
    ) -> Result<RunReport, ResolutionError> {
        let ctx = self.new_context(inputs);
        self.run_with_context(requested, &ctx, parallel).await
    }

    /// Automatic mode on a caller-owned context.
    ///
    /// Requested features already present in `ctx` are reported as reused and
    /// no method is invoked for them.
    pub async fn run_with_context<S: AsRef<str>>(
        &self,
        requested: &[S],
        ctx: &ExecutionContext,
        parallel: bool,
    ) -> Result<RunReport, ResolutionError> {
        let started = Instant::now();
        let requested = dedup(requested);

        let order = resolve_order(&self.runner.registry, &requested, ctx).map_err(|e| {
            ResolutionFailed { mode: "automatic", error: &e }.log();
            e
        })?;
        let waves = compute_waves(&self.runner.registry, &order);

        let start = RunStarted {
            mode: "automatic",
            feature_count: order.len(),
            wave_count: waves.len(),
            parallel,
            max_concurrency: self.max_concurrency,
        };
        let span = start.span("automatic_run");
        span.in_scope(|| start.log());

        let mut results = if parallel {
            self.execute_waves(&waves, ctx).instrument(span).await
        } else {
            self.execute_sequential(&order, ctx).instrument(span).await
        };
        results.sort_by_key(|r| order.iter().position(|f| *f == r.feature));

        Ok(self.finish("automatic", requested, order, waves, results, parallel, started))
    }

    /// Explicit mode on a fresh context.
    pub async fn run_explicit(
        &self,
        plan: &ExecutionPlan,
        inputs: RunInputs,
    ) -> Result<RunReport, ResolutionError> {
        let ctx = self.new_context(inputs);
        self.run_explicit_with_context(plan, &ctx).await
    }

    /// Explicit mode on a caller-owned context.
    ///
    /// Steps run sequentially in plan order. Every step is validated before
    /// anything runs; an unknown feature or method, or a feature listed
    /// twice, aborts the whole run.
    pub async fn run_explicit_with_context(
        &self,
        plan: &ExecutionPlan,
        ctx: &ExecutionContext,
    ) -> Result<RunReport, ResolutionError> {
        let started = Instant::now();

        let steps = self.validate_plan(plan).map_err(|e| {
            ResolutionFailed { mode: "explicit", error: &e }.log();
            e
        })?;
        let order = plan.features();
        let waves = compute_waves(&self.runner.registry, &order);

        let start = RunStarted {
            mode: "explicit",
            feature_count: order.len(),
            wave_count: waves.len(),
            parallel: false,
            max_concurrency: 1,
        };
        let span = start.span("explicit_run");
        span.in_scope(|| start.log());

        let results = async {
            // Explicit runs never skip: dependents of a failed step are still attempted.
            let nothing_unavailable = HashSet::new();
            let mut results = Vec::with_capacity(steps.len());
            for (definition, method) in steps {
                let result = match method {
                    Some(method) => self.runner.execute_pinned(&definition, method, ctx).await,
                    None => self.runner.execute(&definition, ctx, &nothing_unavailable).await,
                };
                commit(ctx, &result);
                results.push(result);
            }
            results
        }
        .instrument(span)
        .await;

        Ok(self.finish("explicit", order.clone(), order, waves, results, false, started))
    }

    /// Predefined-pipeline mode: check required inputs, then run the
    /// pipeline's features in automatic mode.
    pub async fn run_pipeline(
        &self,
        name: &str,
        inputs: RunInputs,
    ) -> Result<RunReport, ResolutionError> {
        let pipeline = self.runner.registry.pipeline(name)?;

        if let Some(missing) = pipeline
            .required_inputs
            .iter()
            .find(|input| !inputs.contains_key(input.as_str()))
        {
            let error = ResolutionError::MissingRunInput {
                pipeline: pipeline.name.clone(),
                input: missing.clone(),
            };
            ResolutionFailed { mode: "pipeline", error: &error }.log();
            return Err(error);
        }

        let ctx = self.new_context(inputs);
        let mut report = self
            .run_with_context(pipeline.features.as_slice(), &ctx, pipeline.parallel)
            .await?;
        report.pipeline = Some(PipelineInfo::from(pipeline));
        Ok(report)
    }

    async fn execute_sequential(&self, order: &[String], ctx: &ExecutionContext) -> Vec<FeatureResult> {
        let mut unavailable = HashSet::new();
        let mut results = Vec::with_capacity(order.len());

        for feature in order {
            let result = match self.runner.registry.get_definition(feature) {
                Ok(definition) => self.runner.execute(definition, ctx, &unavailable).await,
                Err(e) => FeatureResult::failed(feature, FeatureFailure::Aborted(e.to_string()), vec![]),
            };
            commit(ctx, &result);
            if !result.is_success() {
                unavailable.insert(feature.clone());
            }
            results.push(result);
        }
        results
    }

    async fn execute_waves(&self, waves: &[Vec<String>], ctx: &ExecutionContext) -> Vec<FeatureResult> {
        let mut unavailable = HashSet::new();
        let mut results = Vec::new();

        for (index, wave) in waves.iter().enumerate() {
            let wave_started = WaveStarted {
                wave_index: index,
                feature_count: wave.len(),
            };
            let wave_span = wave_started.span("wave");
            wave_span.in_scope(|| wave_started.log());

            let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
            let snapshot = Arc::new(unavailable.clone());
            let mut tasks = Vec::with_capacity(wave.len());

            for feature in wave {
                let definition = match self.runner.registry.get_definition(feature) {
                    Ok(definition) => definition.clone(),
                    Err(e) => {
                        tasks.push((feature.clone(), Err(e.to_string())));
                        continue;
                    }
                };
                let runner = self.runner.clone();
                let ctx = ctx.clone();
                let snapshot = snapshot.clone();
                let semaphore = semaphore.clone();

                let handle = tokio::spawn(
                    async move {
                        // A closed semaphore only means no limit is enforced any more.
                        let _permit = semaphore.acquire_owned().await.ok();
                        runner.execute(&definition, &ctx, &snapshot).await
                    }
                    .instrument(wave_span.clone()),
                );
                tasks.push((feature.clone(), Ok(handle)));
            }

            // Barrier: wait for the whole wave, then commit in wave order.
            for (feature, task) in tasks {
                let result = match task {
                    Ok(handle) => match handle.await {
                        Ok(result) => result,
                        Err(join_error) => FeatureResult::failed(
                            &feature,
                            FeatureFailure::Aborted(join_error.to_string()),
                            vec![],
                        ),
                    },
                    Err(reason) => {
                        FeatureResult::failed(&feature, FeatureFailure::Aborted(reason), vec![])
                    }
                };
                commit(ctx, &result);
                if !result.is_success() {
                    unavailable.insert(feature);
                }
                results.push(result);
            }
        }
        results
    }

    /// Every step must name a known feature, at most once, and a method that
    /// feature declares.
    fn validate_plan<'p>(
        &self,
        plan: &'p ExecutionPlan,
    ) -> Result<Vec<(Arc<FeatureDefinition>, Option<&'p str>)>, ResolutionError> {
        let mut seen = HashSet::new();
        plan.steps
            .iter()
            .map(|step| {
                let definition = self.runner.registry.get_definition(&step.feature)?;
                if !seen.insert(step.feature.as_str()) {
                    return Err(ResolutionError::DuplicatePlanStep(step.feature.clone()));
                }
                if let Some(method) = &step.method {
                    if definition.method(method).is_none() {
                        return Err(ResolutionError::UnknownMethod {
                            feature: step.feature.clone(),
                            method: method.clone(),
                        });
                    }
                }
                Ok((definition.clone(), step.method.as_deref()))
            })
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn finish(
        &self,
        mode: &str,
        requested: Vec<String>,
        order: Vec<String>,
        waves: Vec<Vec<String>>,
        results: Vec<FeatureResult>,
        parallel: bool,
        started: Instant,
    ) -> RunReport {
        let elapsed = started.elapsed();
        let report = RunReport::new(
            requested,
            order,
            waves,
            results,
            parallel,
            elapsed.as_millis() as u64,
        );

        RunCompleted {
            mode,
            executed: report.executed_features.len(),
            failed: report.failed_features.len(),
            skipped: report.skipped_features.len(),
            success: report.success,
            duration: elapsed,
        }
        .log();

        report
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("features", &self.runner.registry.list_features())
            .field("factory", &self.runner.factory)
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

/// Single writer: only the executor stores feature values.
fn commit(ctx: &ExecutionContext, result: &FeatureResult) {
    if result.reused {
        return;
    }
    if let Some(value) = &result.value {
        ctx.set(&result.feature, value.clone());
    }
}

fn dedup<S: AsRef<str>>(requested: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    requested
        .iter()
        .map(|s| s.as_ref().to_string())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

impl FeatureRunner {
    /// Priority selection with fallback.
    ///
    /// `unavailable` holds the features of this run that ended failed or
    /// skipped; a feature whose only obstacle is one of them is skipped.
    async fn execute(
        &self,
        definition: &FeatureDefinition,
        ctx: &ExecutionContext,
        unavailable: &HashSet<String>,
    ) -> FeatureResult {
        let feature = definition.name.as_str();
        if let Some(value) = ctx.get(feature) {
            FeatureReused { feature }.log();
            return FeatureResult::reused(feature, value);
        }

        let mut calculator: Option<Arc<dyn Calculator>> = None;
        let mut attempts = Vec::new();
        let mut last_failure = None;
        let mut first_missing: Option<(&MethodDefinition, &str)> = None;

        for method in definition.methods_by_priority() {
            if let Some(missing) = self.missing_dependency(method, ctx) {
                MethodIneligible {
                    feature,
                    method: &method.name,
                    missing,
                }
                .log();
                first_missing.get_or_insert((method, missing));
                continue;
            }

            let calc = match &calculator {
                Some(calc) => calc.clone(),
                None => match self.factory.get_calculator(definition, ctx) {
                    Ok(calc) => {
                        calculator = Some(calc.clone());
                        calc
                    }
                    Err(failure) => return self.fail(feature, failure, attempts),
                },
            };

            match self.attempt(definition, calc.as_ref(), &method.name, ctx).await {
                Ok(value) => {
                    attempts.push(MethodAttempt {
                        method: method.name.clone(),
                        error: None,
                    });
                    FeatureSucceeded {
                        feature,
                        method: &method.name,
                        attempts: attempts.len(),
                    }
                    .log();
                    return FeatureResult::success(feature, value, &method.name, attempts);
                }
                Err(kind) => {
                    MethodAttemptFailed {
                        feature,
                        method: &method.name,
                        reason: &kind,
                    }
                    .log();
                    attempts.push(MethodAttempt {
                        method: method.name.clone(),
                        error: Some(kind.to_string()),
                    });
                    let stop = kind.is_timeout() && self.timeout_policy == TimeoutPolicy::FailFeature;
                    last_failure = Some(FeatureFailure::MethodFailure {
                        method: method.name.clone(),
                        kind,
                    });
                    if stop {
                        break;
                    }
                }
            }
        }

        if let Some(failure) = last_failure {
            return self.fail(feature, failure, attempts);
        }

        // Nothing was eligible
        if let Some(dependency) = definition
            .all_dependencies()
            .into_iter()
            .find(|d| unavailable.contains(*d))
        {
            let failure = FeatureFailure::DependencyFailed {
                dependency: dependency.to_string(),
            };
            FeatureSkipped {
                feature,
                reason: &failure,
            }
            .log();
            return FeatureResult::skipped(feature, failure);
        }

        let failure = match first_missing {
            Some((method, missing)) if self.registry.is_service(missing) => {
                FeatureFailure::UnresolvedServiceDependency {
                    method: method.name.clone(),
                    service: missing.to_string(),
                }
            }
            _ => FeatureFailure::NoEligibleMethod,
        };
        self.fail(feature, failure, attempts)
    }

    /// Run exactly `method`, once, with no fallback.
    async fn execute_pinned(
        &self,
        definition: &FeatureDefinition,
        method: &str,
        ctx: &ExecutionContext,
    ) -> FeatureResult {
        let feature = definition.name.as_str();
        if let Some(value) = ctx.get(feature) {
            FeatureReused { feature }.log();
            return FeatureResult::reused(feature, value);
        }

        let Some(method_definition) = definition.method(method) else {
            let failure = FeatureFailure::MethodFailure {
                method: method.to_string(),
                kind: MethodFailureKind::UnsupportedMethod,
            };
            return self.fail(feature, failure, vec![]);
        };

        if let Some(missing) = self.missing_dependency(method_definition, ctx) {
            let failure = if self.registry.is_service(missing) {
                FeatureFailure::UnresolvedServiceDependency {
                    method: method.to_string(),
                    service: missing.to_string(),
                }
            } else {
                FeatureFailure::MethodFailure {
                    method: method.to_string(),
                    kind: MethodFailureKind::MissingDependency(missing.to_string()),
                }
            };
            return self.fail(feature, failure, vec![]);
        }

        let calculator = match self.factory.get_calculator(definition, ctx) {
            Ok(calculator) => calculator,
            Err(failure) => return self.fail(feature, failure, vec![]),
        };

        match self.attempt(definition, calculator.as_ref(), method, ctx).await {
            Ok(value) => {
                let attempts = vec![MethodAttempt {
                    method: method.to_string(),
                    error: None,
                }];
                FeatureSucceeded {
                    feature,
                    method,
                    attempts: 1,
                }
                .log();
                FeatureResult::success(feature, value, method, attempts)
            }
            Err(kind) => {
                let attempts = vec![MethodAttempt {
                    method: method.to_string(),
                    error: Some(kind.to_string()),
                }];
                let failure = FeatureFailure::MethodFailure {
                    method: method.to_string(),
                    kind,
                };
                self.fail(feature, failure, attempts)
            }
        }
    }

    /// Invoke one method and validate what it returns.
    async fn attempt(
        &self,
        definition: &FeatureDefinition,
        calculator: &dyn Calculator,
        method: &str,
        ctx: &ExecutionContext,
    ) -> Result<Value, MethodFailureKind> {
        if !calculator.supports(method) {
            return Err(MethodFailureKind::UnsupportedMethod);
        }

        let view = MethodContext::new(ctx.clone());
        let invocation = calculator.invoke(method, &view);
        let outcome = match self.method_timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| MethodFailureKind::Timeout(limit))?,
            None => invocation.await,
        };

        match outcome {
            Ok(MethodOutcome::Computed(value)) => check_value(&definition.constraints, &value)
                .map(|_| value)
                .map_err(MethodFailureKind::ConstraintViolation),
            Ok(MethodOutcome::CannotCompute(reason)) => Err(MethodFailureKind::CannotCompute(reason)),
            Err(error) => Err(MethodFailureKind::Error(error)),
        }
    }

    /// First dependency of `method` that is neither computed nor an available service.
    fn missing_dependency<'m>(
        &self,
        method: &'m MethodDefinition,
        ctx: &ExecutionContext,
    ) -> Option<&'m str> {
        method
            .depends_on
            .iter()
            .map(String::as_str)
            .find(|dep| {
                if self.registry.is_service(dep) {
                    !ctx.has_service(dep)
                } else {
                    !ctx.has(dep)
                }
            })
    }

    fn fail(&self, feature: &str, failure: FeatureFailure, attempts: Vec<MethodAttempt>) -> FeatureResult {
        FeatureFailed {
            feature,
            reason: &failure,
        }
        .log();
        FeatureResult::failed(feature, failure, attempts)
    }
}
