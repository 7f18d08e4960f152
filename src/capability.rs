//! Capability Probe
//!
//! Detects, once at start-up, which optional capabilities this process can
//! use. The result is a plain value injected into the normalizer and the
//! classifier adapter; nothing re-probes afterwards.

use serde::Serialize;
use tracing::{info, warn};

/// Optional runtime capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapabilityFlags {
    /// Image decoding (PNG/JPEG/... → RGB) is compiled in and enabled.
    pub codec_available: bool,
    /// A real classification backend can be loaded.
    pub classifier_framework_available: bool,
}

impl CapabilityFlags {
    /// Everything present. Mostly useful in tests.
    pub fn all() -> Self {
        Self {
            codec_available: true,
            classifier_framework_available: true,
        }
    }

    /// Nothing present: placeholder tensors and the synthetic classifier.
    pub fn none() -> Self {
        Self {
            codec_available: false,
            classifier_framework_available: false,
        }
    }
}

/// Operator overrides that force a capability off even when compiled in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOverrides {
    pub disable_codec: bool,
    pub disable_classifier: bool,
}

/// Detect capabilities. Absence is a normal outcome and only logged.
pub fn probe(overrides: ProbeOverrides) -> CapabilityFlags {
    let codec_available = cfg!(feature = "codec") && !overrides.disable_codec;
    let classifier_framework_available = cfg!(feature = "onnx") && !overrides.disable_classifier;

    if !codec_available {
        warn!("⚠️  Image codec unavailable: encoded images will be replaced by a placeholder tensor");
    }
    if !classifier_framework_available {
        warn!("⚠️  Classification framework unavailable: using the synthetic classifier");
    }

    let flags = CapabilityFlags {
        codec_available,
        classifier_framework_available,
    };
    info!("Capabilities probed: {:?}", flags);
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_disable_everything() {
        let flags = probe(ProbeOverrides {
            disable_codec: true,
            disable_classifier: true,
        });
        assert_eq!(flags, CapabilityFlags::none());
    }

    #[test]
    fn test_probe_follows_compiled_features() {
        let flags = probe(ProbeOverrides::default());
        assert_eq!(flags.codec_available, cfg!(feature = "codec"));
        assert_eq!(flags.classifier_framework_available, cfg!(feature = "onnx"));
    }

    #[test]
    fn test_probe_is_stable() {
        let a = probe(ProbeOverrides::default());
        let b = probe(ProbeOverrides::default());
        assert_eq!(a, b);
    }
}
