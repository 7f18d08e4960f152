use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::ClassifierError;

/// Rice-leaf classes of the reference deployment, in model output order.
pub const DEFAULT_LABELS: [&str; 6] = [
    "healthy",
    "bacterial_blight",
    "brown_spot",
    "leaf_blast",
    "tungro",
    "pest_infestation",
];

/// Ordered, immutable set of class labels. Index `i` names output position `i`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LabelSet {
    labels: Arc<[String]>,
}

impl LabelSet {
    pub fn new(labels: Vec<String>) -> Result<Self, ClassifierError> {
        if labels.is_empty() {
            return Err(ClassifierError::InvalidLabels("label set is empty".into()));
        }
        let mut seen = HashSet::new();
        for label in &labels {
            if label.trim().is_empty() {
                return Err(ClassifierError::InvalidLabels("blank label".into()));
            }
            if !seen.insert(label.as_str()) {
                return Err(ClassifierError::InvalidLabels(format!("duplicate label '{}'", label)));
            }
        }
        Ok(Self { labels: labels.into() })
    }

    pub fn reference() -> Self {
        Self {
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::reference()
    }
}
