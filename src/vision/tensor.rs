use ndarray::{s, Array3, ArrayView3};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use super::NormalizeError;

pub const INPUT_HEIGHT: usize = 224;
pub const INPUT_WIDTH: usize = 224;
pub const INPUT_CHANNELS: usize = 3;

/// Forest-green patch painted into the placeholder and test images.
pub(crate) const PATCH_START: usize = 50;
pub(crate) const PATCH_END: usize = 174;

/// A single HWC image, 224×224×3, every value in [0, 1].
///
/// The only way to obtain one is through a constructor that checks both the
/// shape and the value range, so the classifier never sees malformed input.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array3<f32>,
}

impl ImageTensor {
    pub const SHAPE: [usize; 3] = [INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS];

    pub fn try_from_array(data: Array3<f32>) -> Result<Self, NormalizeError> {
        if data.shape() != Self::SHAPE {
            return Err(NormalizeError::InvalidShape {
                found: data.shape().to_vec(),
            });
        }
        if let Some(bad) = data.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(NormalizeError::OutOfRange(*bad));
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Ok(Self { data })
    }

    /// Deterministic plant-like stand-in used when no codec is available.
    pub fn placeholder() -> Self {
        let mut data = Array3::<f32>::zeros((INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS));
        data.slice_mut(s![.., .., 1]).fill(0.5);

        let patch = [0.13f32, 0.55, 0.13];
        for (channel, value) in patch.iter().enumerate() {
            data.slice_mut(s![PATCH_START..PATCH_END, PATCH_START..PATCH_END, channel])
                .fill(*value);
        }
        Self { data }
    }

    /// Uniform noise in [0, 1), used when decoding failed.
    pub fn random() -> Self {
        let data = Array3::random(
            (INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS),
            Uniform::new(0.0f32, 1.0),
        );
        Self { data }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Row-major (HWC) copy of the values.
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.iter().copied().collect()
    }

    pub fn into_inner(self) -> Array3<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_conformant(t: &ImageTensor) {
        assert_eq!(t.shape(), &ImageTensor::SHAPE);
        assert!(t.view().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_placeholder_is_deterministic_and_green() {
        let a = ImageTensor::placeholder();
        let b = ImageTensor::placeholder();
        assert_eq!(a, b);
        assert_conformant(&a);

        let v = a.view();
        assert_eq!(v[[0, 0, 1]], 0.5);
        assert_eq!(v[[0, 0, 0]], 0.0);
        assert_eq!(v[[100, 100, 0]], 0.13);
        assert_eq!(v[[100, 100, 1]], 0.55);
        assert_eq!(v[[173, 173, 2]], 0.13);
        assert_eq!(v[[174, 174, 2]], 0.0);
    }

    #[test]
    fn test_random_is_conformant() {
        assert_conformant(&ImageTensor::random());
    }

    #[test]
    fn test_rejects_wrong_shape() {
        let err = ImageTensor::try_from_array(Array3::zeros((10, 10, 3))).unwrap_err();
        assert!(matches!(err, NormalizeError::InvalidShape { .. }));
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut data = Array3::<f32>::zeros((INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS));
        data[[3, 4, 0]] = 1.5;
        assert!(matches!(
            ImageTensor::try_from_array(data),
            Err(NormalizeError::OutOfRange(_))
        ));

        let mut data = Array3::<f32>::zeros((INPUT_HEIGHT, INPUT_WIDTH, INPUT_CHANNELS));
        data[[0, 0, 2]] = f32::NAN;
        assert!(ImageTensor::try_from_array(data).is_err());
    }

    #[test]
    fn test_to_vec_is_hwc() {
        let t = ImageTensor::placeholder();
        let flat = t.to_vec();
        assert_eq!(flat.len(), INPUT_HEIGHT * INPUT_WIDTH * INPUT_CHANNELS);
        // pixel (0, 0) is [0, 0.5, 0]
        assert_eq!(&flat[..3], &[0.0, 0.5, 0.0]);
    }
}
