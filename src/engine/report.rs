// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use serde_json::Value;

use crate::config::PredefinedPipeline;
use crate::errors::FeatureFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStatus {
    Success,
    Failed,
    Skipped,
}

/// One invoked method and, when it did not produce the value, why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodAttempt {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome for one feature of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureResult {
    pub feature: String,
    pub status: FeatureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip)]
    pub failure: Option<FeatureFailure>,
    /// Methods invoked, in order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<MethodAttempt>,
    /// The value was already in the context; nothing was invoked
    pub reused: bool,
}

impl FeatureResult {
    pub fn success(feature: &str, value: Value, method: &str, attempts: Vec<MethodAttempt>) -> Self {
        Self {
            feature: feature.to_string(),
            status: FeatureStatus::Success,
            value: Some(value),
            method: Some(method.to_string()),
            failure_reason: None,
            failure: None,
            attempts,
            reused: false,
        }
    }

    pub fn reused(feature: &str, value: Value) -> Self {
        Self {
            feature: feature.to_string(),
            status: FeatureStatus::Success,
            value: Some(value),
            method: None,
            failure_reason: None,
            failure: None,
            attempts: Vec::new(),
            reused: true,
        }
    }

    pub fn failed(feature: &str, failure: FeatureFailure, attempts: Vec<MethodAttempt>) -> Self {
        Self::unsuccessful(feature, FeatureStatus::Failed, failure, attempts)
    }

    pub fn skipped(feature: &str, failure: FeatureFailure) -> Self {
        Self::unsuccessful(feature, FeatureStatus::Skipped, failure, Vec::new())
    }

    fn unsuccessful(
        feature: &str,
        status: FeatureStatus,
        failure: FeatureFailure,
        attempts: Vec<MethodAttempt>,
    ) -> Self {
        Self {
            feature: feature.to_string(),
            status,
            value: None,
            method: None,
            failure_reason: Some(failure.to_string()),
            failure: Some(failure),
            attempts,
            reused: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == FeatureStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineInfo {
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&PredefinedPipeline> for PipelineInfo {
    fn from(pipeline: &PredefinedPipeline) -> Self {
        Self {
            name: pipeline.name.clone(),
            version: pipeline.version.clone(),
            description: pipeline.description.clone(),
        }
    }
}

/// Everything a caller needs to know about one run.
///
/// Every feature in `execution_order` has exactly one entry in `results` and
/// appears in exactly one of the executed, failed or skipped lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub requested_features: Vec<String>,
    pub execution_order: Vec<String>,
    pub waves: Vec<Vec<String>>,
    pub executed_features: Vec<String>,
    pub failed_features: Vec<String>,
    pub skipped_features: Vec<String>,
    /// In execution order
    pub results: Vec<FeatureResult>,
    /// True when every requested feature succeeded
    pub success: bool,
    pub parallel: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<PipelineInfo>,
    pub elapsed_ms: u64,
}

impl RunReport {
    pub(crate) fn new(
        requested_features: Vec<String>,
        execution_order: Vec<String>,
        waves: Vec<Vec<String>>,
        results: Vec<FeatureResult>,
        parallel: bool,
        elapsed_ms: u64,
    ) -> Self {
        let names_with = |status: FeatureStatus| -> Vec<String> {
            results
                .iter()
                .filter(|r| r.status == status)
                .map(|r| r.feature.clone())
                .collect()
        };
        let executed_features = names_with(FeatureStatus::Success);
        let failed_features = names_with(FeatureStatus::Failed);
        let skipped_features = names_with(FeatureStatus::Skipped);

        let success = requested_features.iter().all(|feature| {
            results
                .iter()
                .any(|r| &r.feature == feature && r.is_success())
        });

        Self {
            requested_features,
            execution_order,
            waves,
            executed_features,
            failed_features,
            skipped_features,
            results,
            success,
            parallel,
            pipeline: None,
            elapsed_ms,
        }
    }

    pub fn result(&self, feature: &str) -> Option<&FeatureResult> {
        self.results.iter().find(|r| r.feature == feature)
    }

    pub fn status(&self, feature: &str) -> Option<FeatureStatus> {
        self.result(feature).map(|r| r.status)
    }

    pub fn value(&self, feature: &str) -> Option<&Value> {
        self.result(feature).and_then(|r| r.value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_report_partitions_results() {
        let results = vec![
            FeatureResult::success("area", json!([1.0]), "from_geometry", vec![]),
            FeatureResult::failed("height", FeatureFailure::NoEligibleMethod, vec![]),
            FeatureResult::skipped(
                "volume",
                FeatureFailure::DependencyFailed {
                    dependency: "height".into(),
                },
            ),
        ];
        let order = vec!["area".to_string(), "height".to_string(), "volume".to_string()];
        let report = RunReport::new(
            vec!["volume".to_string()],
            order.clone(),
            vec![order.clone()],
            results,
            false,
            3,
        );

        assert_eq!(report.executed_features, vec!["area"]);
        assert_eq!(report.failed_features, vec!["height"]);
        assert_eq!(report.skipped_features, vec!["volume"]);
        assert!(!report.success);
        assert_eq!(report.status("volume"), Some(FeatureStatus::Skipped));
        assert_eq!(
            report.result("volume").unwrap().failure_reason.as_deref(),
            Some("dependency 'height' did not produce a value")
        );
        assert_eq!(report.value("area"), Some(&json!([1.0])));
    }

    #[test]
    fn test_report_serializes_statuses_in_snake_case() {
        let report = RunReport::new(
            vec!["area".to_string()],
            vec!["area".to_string()],
            vec![vec!["area".to_string()]],
            vec![FeatureResult::reused("area", json!([2.0]))],
            true,
            0,
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["results"][0]["status"], json!("success"));
        assert_eq!(value["results"][0]["reused"], json!(true));
        assert!(value.get("pipeline").is_none());
    }
}
