use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::actuation::{actuation_for, ActuationCommand, SeverityTier};
use crate::classifier::ProbabilityDistribution;

/// Label reported when the pipeline could not reach a decision.
pub const UNKNOWN_LABEL: &str = "unknown";

/// Outcome of one classification request.
///
/// Built once by the orchestrator and handed to the caller; there are no
/// setters. `requires_treatment` and `spray_command` always agree with
/// `severity_level`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionResult {
    disease_type: String,
    severity_level: SeverityTier,
    confidence: f32,
    requires_treatment: bool,
    spray_command: ActuationCommand,
    timestamp: DateTime<Utc>,
    model_version: String,
    processing_time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    probabilities: Option<ProbabilityDistribution>,
    #[serde(rename = "error", skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl DecisionResult {
    pub(crate) fn decided(
        label: &str,
        tier: SeverityTier,
        confidence: f32,
        probabilities: ProbabilityDistribution,
        model_version: &str,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            disease_type: label.to_string(),
            severity_level: tier,
            confidence: confidence.clamp(0.0, 1.0),
            requires_treatment: tier.requires_treatment(),
            spray_command: actuation_for(tier),
            timestamp: Utc::now(),
            model_version: model_version.to_string(),
            processing_time_ms,
            probabilities: Some(probabilities),
            error_detail: None,
        }
    }

    /// Safe result: no treatment, idle command, and the cause attached.
    pub fn degraded(cause: impl Into<String>, model_version: &str, processing_time_ms: f64) -> Self {
        Self {
            disease_type: UNKNOWN_LABEL.to_string(),
            severity_level: SeverityTier::None,
            confidence: 0.0,
            requires_treatment: false,
            spray_command: actuation_for(SeverityTier::None),
            timestamp: Utc::now(),
            model_version: model_version.to_string(),
            processing_time_ms,
            probabilities: None,
            error_detail: Some(cause.into()),
        }
    }

    pub fn disease_type(&self) -> &str {
        &self.disease_type
    }

    pub fn severity(&self) -> SeverityTier {
        self.severity_level
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn requires_treatment(&self) -> bool {
        self.requires_treatment
    }

    pub fn spray_command(&self) -> &ActuationCommand {
        &self.spray_command
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    pub fn processing_time_ms(&self) -> f64 {
        self.processing_time_ms
    }

    pub fn probabilities(&self) -> Option<&ProbabilityDistribution> {
        self.probabilities.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn is_degraded(&self) -> bool {
        self.error_detail.is_some()
    }
}
