//! End-to-end properties of the decision pipeline.

use std::sync::Arc;
use std::thread;

use leaf_bridge::actuation::{actuation_for, SeverityTier};
use leaf_bridge::classifier::{ClassificationModel, ClassifierBacking, ClassifierError, ProbabilityDistribution};
use leaf_bridge::vision::{canonical_test_image_base64, NormalizePath};
use leaf_bridge::{
    CapabilityFlags, ClassifierAdapter, DecisionOrchestrator, ImageInput, ImageNormalizer, ImageTensor, LabelSet,
    SeverityTable,
};

struct Constant(Vec<f32>);

impl ClassificationModel for Constant {
    fn predict(&self, _tensor: &ImageTensor) -> Result<Vec<f32>, ClassifierError> {
        Ok(self.0.clone())
    }

    fn framework(&self) -> &str {
        "constant"
    }
}

fn synthetic_orchestrator(flags: CapabilityFlags) -> DecisionOrchestrator {
    let classifier = Arc::new(ClassifierAdapter::new(LabelSet::reference(), flags));
    DecisionOrchestrator::new(flags, classifier, SeverityTable::reference(), "1.0")
}

fn assert_conformant(tensor: &ImageTensor) {
    assert_eq!(tensor.shape(), &[224, 224, 3]);
    assert!(tensor.view().iter().all(|v| (0.0..=1.0).contains(v)));
}

#[test]
fn test_every_normalizer_path_yields_conformant_tensor() {
    let inputs = [
        ImageInput::from("####"),
        ImageInput::from(""),
        ImageInput::from("data:image/png;base64,"),
        ImageInput::Raw { width: 0, height: 0, pixels: vec![] },
        ImageInput::Raw { width: 3, height: 2, pixels: vec![7; 18] },
        ImageInput::Encoded(canonical_test_image_base64(&CapabilityFlags::all()).unwrap_or_default()),
    ];

    for flags in [CapabilityFlags::none(), CapabilityFlags::all()] {
        let normalizer = ImageNormalizer::new(flags);
        for input in &inputs {
            let (tensor, path) = normalizer.normalize_traced(input);
            assert_conformant(&tensor);
            if !flags.codec_available {
                assert_eq!(path, NormalizePath::Placeholder);
            }
        }
    }
}

#[test]
fn test_synthetic_predictions_are_distributions() {
    let adapter = ClassifierAdapter::new(LabelSet::reference(), CapabilityFlags::none());
    for _ in 0..100 {
        let d: ProbabilityDistribution = adapter.predict(&ImageTensor::random()).unwrap();
        assert_eq!(d.len(), 6);
        assert!((d.sum() - 1.0).abs() < 1e-3);
        assert!(d.values().iter().all(|p| *p >= 0.0));
    }
}

#[test]
fn test_malformed_input_never_raises() {
    for flags in [CapabilityFlags::none(), CapabilityFlags::all()] {
        let orchestrator = synthetic_orchestrator(flags);
        let result = orchestrator.classify_and_act(&ImageInput::from("####"));
        assert!(SeverityTier::ALL.contains(&result.severity()));
        assert!((0.0..=1.0).contains(&result.confidence()));
        assert_eq!(*result.spray_command(), actuation_for(result.severity()));
    }
}

#[test]
fn test_canonical_test_image_with_substitute() {
    let flags = CapabilityFlags::none();
    let orchestrator = synthetic_orchestrator(flags);
    let encoded = canonical_test_image_base64(&flags).unwrap();
    let result = orchestrator.classify_and_act(&ImageInput::Encoded(encoded));

    assert!(LabelSet::reference().index_of(result.disease_type()).is_some());
    assert!(result.severity().level() <= 2);
    assert!([0, 10, 15].contains(&result.spray_command().duration));
}

#[test]
fn test_configured_severity_table_is_honoured() {
    let labels = LabelSet::new(vec!["clean".into(), "scab".into()]).unwrap();
    let table = SeverityTable::new(&labels, vec![("scab".to_string(), SeverityTier::Moderate)]).unwrap();
    let flags = CapabilityFlags::all();
    let classifier = Arc::new(ClassifierAdapter::with_model(labels, flags, Arc::new(Constant(vec![0.3, 0.7]))));
    let orchestrator = DecisionOrchestrator::new(flags, classifier, table, "test");

    let result = orchestrator.classify_and_act(&ImageInput::from("####"));
    assert_eq!(result.disease_type(), "scab");
    assert_eq!(result.severity(), SeverityTier::Moderate);
    assert_eq!(result.spray_command().duration, 10);
    assert_eq!(result.model_version(), "test");
}

#[test]
fn test_hot_swap_under_concurrent_predictions() {
    let flags = CapabilityFlags::all();
    let healthy = Arc::new(Constant(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]));
    let classifier = Arc::new(ClassifierAdapter::with_model(LabelSet::reference(), flags, healthy));
    let orchestrator = Arc::new(DecisionOrchestrator::new(
        flags,
        classifier.clone(),
        SeverityTable::reference(),
        "1.0",
    ));

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let orchestrator = orchestrator.clone();
            thread::spawn(move || {
                (0..25)
                    .map(|_| orchestrator.classify_and_act(&ImageInput::from("####")))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for _ in 0..10 {
        classifier.swap(ClassifierBacking::Synthetic);
        classifier.swap(ClassifierBacking::Real {
            model: Arc::new(Constant(vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0])),
            source: None,
        });
    }

    for worker in workers {
        for result in worker.join().unwrap() {
            assert!(!result.is_degraded());
            assert!(LabelSet::reference().index_of(result.disease_type()).is_some());
        }
    }

    let last = orchestrator.classify_and_act(&ImageInput::from("####"));
    assert_eq!(last.disease_type(), "pest_infestation");
}
