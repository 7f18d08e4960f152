//! Label → severity lookup table.
//!
//! The table is configuration data: it is validated once against the label
//! set and never mutated afterwards.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use super::SeverityTier;
use crate::classifier::LabelSet;

#[derive(Debug, Error, PartialEq)]
pub enum TableError {
    #[error("severity entry for '{0}' does not name a label in the label set")]
    UnknownLabel(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SeverityTable {
    tiers: BTreeMap<String, SeverityTier>,
}

impl SeverityTable {
    /// Build a table for `labels`. Labels without an entry map to NONE.
    pub fn new(
        labels: &LabelSet,
        entries: impl IntoIterator<Item = (String, SeverityTier)>,
    ) -> Result<Self, TableError> {
        let mut tiers: BTreeMap<String, SeverityTier> = labels
            .iter()
            .map(|label| (label.to_string(), SeverityTier::None))
            .collect();

        for (label, tier) in entries {
            match tiers.get_mut(&label) {
                Some(slot) => *slot = tier,
                None => return Err(TableError::UnknownLabel(label)),
            }
        }

        Ok(Self { tiers })
    }

    /// Reference deployment: rice-leaf classes.
    pub fn reference() -> Self {
        let tiers = [
            ("healthy", SeverityTier::None),
            ("bacterial_blight", SeverityTier::Severe),
            ("brown_spot", SeverityTier::Moderate),
            ("leaf_blast", SeverityTier::Severe),
            ("tungro", SeverityTier::Moderate),
            ("pest_infestation", SeverityTier::Severe),
        ]
        .into_iter()
        .map(|(label, tier)| (label.to_string(), tier))
        .collect();

        Self { tiers }
    }

    pub fn severity_of(&self, label: &str) -> SeverityTier {
        self.tiers.get(label).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self::reference()
    }
}
