//! Classifier Adapter
//!
//! A single `predict(tensor) -> distribution` contract over whichever backing
//! is active: a real model, or the synthetic substitute when no model could
//! be loaded. The backing can be hot-swapped while requests are in flight;
//! each prediction keeps the backing it started with.

pub mod distribution;
mod labels;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod synthetic;

pub use distribution::ProbabilityDistribution;
pub use labels::{LabelSet, DEFAULT_LABELS};

use serde::Serialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::capability::CapabilityFlags;
use crate::vision::ImageTensor;

pub const SYNTHETIC_FRAMEWORK: &str = "synthetic";

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("model load failed: {0}")]
    Load(String),
    #[error("classification framework is not available")]
    FrameworkUnavailable,
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("model returned {found} scores for {expected} labels")]
    OutputShape { expected: usize, found: usize },
    #[error("invalid label set: {0}")]
    InvalidLabels(String),
}

/// A loaded classification model.
///
/// Implementations receive a conformant 224×224×3 tensor and return one score
/// per label, in label order.
pub trait ClassificationModel: Send + Sync {
    fn predict(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError>;

    fn framework(&self) -> &str;

    /// Trainable parameter count, when the backend exposes it.
    fn parameter_count(&self) -> u64 {
        0
    }
}

/// What currently answers `predict`.
pub enum ClassifierBacking {
    Real {
        model: Arc<dyn ClassificationModel>,
        source: Option<PathBuf>,
    },
    Synthetic,
}

impl ClassifierBacking {
    pub fn is_real(&self) -> bool {
        matches!(self, ClassifierBacking::Real { .. })
    }

    pub fn framework(&self) -> &str {
        match self {
            ClassifierBacking::Real { model, .. } => model.framework(),
            ClassifierBacking::Synthetic => SYNTHETIC_FRAMEWORK,
        }
    }
}

/// Snapshot of the active backing, as reported over the API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub model_loaded: bool,
    pub framework: String,
    pub total_parameters: u64,
    pub model_path: Option<PathBuf>,
}

pub struct ClassifierAdapter {
    labels: LabelSet,
    flags: CapabilityFlags,
    backing: RwLock<Arc<ClassifierBacking>>,
}

impl ClassifierAdapter {
    /// Adapter backed by the synthetic substitute until a model is loaded.
    pub fn new(labels: LabelSet, flags: CapabilityFlags) -> Self {
        Self {
            labels,
            flags,
            backing: RwLock::new(Arc::new(ClassifierBacking::Synthetic)),
        }
    }

    /// Adapter backed by an already-constructed model.
    pub fn with_model(labels: LabelSet, flags: CapabilityFlags, model: Arc<dyn ClassificationModel>) -> Self {
        let adapter = Self::new(labels, flags);
        adapter.swap(ClassifierBacking::Real { model, source: None });
        adapter
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    /// The backing in effect right now. Holding the `Arc` pins it across swaps.
    pub fn backing(&self) -> Arc<ClassifierBacking> {
        self.backing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Atomically replace the backing. In-flight predictions are unaffected.
    pub fn swap(&self, backing: ClassifierBacking) {
        let mut slot = self.backing.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Arc::new(backing);
    }

    /// Load (or reload) a model from `path` and swap it in.
    ///
    /// Never fails: a missing path, a missing framework or a load error all
    /// leave the synthetic substitute active. Safe to call repeatedly.
    pub fn load_model(&self, path: Option<&Path>) -> ModelStatus {
        let backing = match path {
            Some(path) if path.exists() && self.flags.classifier_framework_available => {
                match load_guarded(path, self.labels.len()) {
                    Ok(model) => {
                        info!("✅ Model loaded successfully from {}", path.display());
                        ClassifierBacking::Real {
                            model,
                            source: Some(path.to_path_buf()),
                        }
                    }
                    Err(e) => {
                        error!("Error loading model: {}", e);
                        ClassifierBacking::Synthetic
                    }
                }
            }
            Some(path) if !path.exists() => {
                warn!("Model file {} not found, using synthetic classifier", path.display());
                ClassifierBacking::Synthetic
            }
            Some(path) => {
                warn!(
                    "Found model file {} but no classification framework is available, using synthetic classifier",
                    path.display()
                );
                ClassifierBacking::Synthetic
            }
            None => {
                info!("Using synthetic classifier for demonstration");
                ClassifierBacking::Synthetic
            }
        };

        self.swap(backing);
        self.status()
    }

    pub fn predict(&self, tensor: &ImageTensor) -> Result<ProbabilityDistribution, ClassifierError> {
        let backing = self.backing();
        match backing.as_ref() {
            ClassifierBacking::Real { model, .. } => {
                let scores = model.predict(tensor)?;
                ProbabilityDistribution::from_scores(scores, self.labels.len())
            }
            ClassifierBacking::Synthetic => Ok(synthetic::sample(self.labels.len())),
        }
    }

    pub fn status(&self) -> ModelStatus {
        let backing = self.backing();
        match backing.as_ref() {
            ClassifierBacking::Real { model, source } => ModelStatus {
                model_loaded: true,
                framework: model.framework().to_string(),
                total_parameters: model.parameter_count(),
                model_path: source.clone(),
            },
            ClassifierBacking::Synthetic => ModelStatus {
                model_loaded: false,
                framework: SYNTHETIC_FRAMEWORK.to_string(),
                total_parameters: 0,
                model_path: None,
            },
        }
    }
}

/// Backend loaders may panic (missing shared library, corrupt graph); treat that as a load error.
fn load_guarded(path: &Path, classes: usize) -> Result<Arc<dyn ClassificationModel>, ClassifierError> {
    catch_unwind(AssertUnwindSafe(|| load_backend(path, classes)))
        .unwrap_or_else(|_| Err(ClassifierError::Load("model loader panicked".into())))
}

#[cfg(feature = "onnx")]
fn load_backend(path: &Path, classes: usize) -> Result<Arc<dyn ClassificationModel>, ClassifierError> {
    Ok(Arc::new(onnx::OnnxModel::load(path, classes)?))
}

#[cfg(not(feature = "onnx"))]
fn load_backend(_path: &Path, _classes: usize) -> Result<Arc<dyn ClassificationModel>, ClassifierError> {
    Err(ClassifierError::FrameworkUnavailable)
}
