//! ONNX Runtime backing.
//!
//! Expects a single-input graph taking a `[1, 224, 224, 3]` f32 NHWC tensor
//! and producing one score per label in its first output.

use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

use super::{ClassificationModel, ClassifierError};
use crate::vision::{ImageTensor, INPUT_CHANNELS, INPUT_HEIGHT, INPUT_WIDTH};

pub const ONNX_FRAMEWORK: &str = "ONNX Runtime";

pub struct OnnxModel {
    // `Session::run` needs exclusive access.
    session: Mutex<Session>,
    input_name: String,
}

impl OnnxModel {
    pub fn load(path: &Path, classes: usize) -> Result<Self, ClassifierError> {
        let session = Session::builder()
            .map_err(|e| ClassifierError::Load(e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| ClassifierError::Load(e.to_string()))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.to_string())
            .ok_or_else(|| ClassifierError::Load("model declares no inputs".into()))?;
        if session.outputs.is_empty() {
            return Err(ClassifierError::Load("model declares no outputs".into()));
        }

        debug!("ONNX model {} ready: input '{}', {} classes", path.display(), input_name, classes);
        Ok(Self {
            session: Mutex::new(session),
            input_name,
        })
    }
}

impl ClassificationModel for OnnxModel {
    fn predict(&self, tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        let shape = [1usize, INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS];
        let input = Tensor::from_array((shape, tensor.to_vec()))
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let mut session = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input])
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::Inference(e.to_string()))?;
        Ok(scores.to_vec())
    }

    fn framework(&self) -> &str {
        ONNX_FRAMEWORK
    }
}
