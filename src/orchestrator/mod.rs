//! Decision Orchestrator
//!
//! Composes normalize → predict → severity → actuation into one call that
//! always yields a well-formed [`DecisionResult`]. This is the outermost
//! failure boundary of the pipeline: errors and panics from any stage are
//! turned into a degraded result here and never reach the caller.

mod decision;

pub use decision::{DecisionResult, UNKNOWN_LABEL};

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info};

use crate::actuation::SeverityTable;
use crate::capability::CapabilityFlags;
use crate::classifier::{ClassifierAdapter, ClassifierError};
use crate::vision::{ImageInput, ImageNormalizer};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    #[error("predicted class index {index} is outside the {labels}-label set")]
    LabelOutOfRange { index: usize, labels: usize },
    #[error("pipeline panicked: {0}")]
    Panicked(String),
}

pub struct DecisionOrchestrator {
    flags: CapabilityFlags,
    normalizer: ImageNormalizer,
    classifier: Arc<ClassifierAdapter>,
    severity: SeverityTable,
    model_version: String,
}

impl DecisionOrchestrator {
    pub fn new(
        flags: CapabilityFlags,
        classifier: Arc<ClassifierAdapter>,
        severity: SeverityTable,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            flags,
            normalizer: ImageNormalizer::new(flags),
            classifier,
            severity,
            model_version: model_version.into(),
        }
    }

    pub fn capabilities(&self) -> CapabilityFlags {
        self.flags
    }

    pub fn classifier(&self) -> &Arc<ClassifierAdapter> {
        &self.classifier
    }

    pub fn severity_table(&self) -> &SeverityTable {
        &self.severity
    }

    pub fn model_version(&self) -> &str {
        &self.model_version
    }

    /// Classify a leaf image and derive the spray command. Never fails.
    pub fn classify_and_act(&self, input: &ImageInput) -> DecisionResult {
        let started = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| self.run_pipeline(input, started)))
            .unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(panic.as_ref()))));

        match outcome {
            Ok(result) => {
                info!(
                    "Prediction: {} (severity: {}, confidence: {:.3})",
                    result.disease_type(),
                    result.severity().level(),
                    result.confidence()
                );
                result
            }
            Err(e) => {
                error!("Error in disease prediction: {}", e);
                DecisionResult::degraded(e.to_string(), &self.model_version, elapsed_ms(started))
            }
        }
    }

    fn run_pipeline(&self, input: &ImageInput, started: Instant) -> Result<DecisionResult, PipelineError> {
        let tensor = self.normalizer.normalize(input);
        let distribution = self.classifier.predict(&tensor)?;

        let (index, confidence) = distribution.argmax();
        let labels = self.classifier.labels();
        let label = labels.get(index).ok_or(PipelineError::LabelOutOfRange {
            index,
            labels: labels.len(),
        })?;
        let tier = self.severity.severity_of(label);

        Ok(DecisionResult::decided(
            label,
            tier,
            confidence,
            distribution,
            &self.model_version,
            elapsed_ms(started),
        ))
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
