//! Leaf Bridge
//!
//! Turns a photographed plant leaf into a spray instruction for a field
//! controller:
//! - Capability probing (image codec, classification backend)
//! - Fallback-aware image normalization to a 224×224×3 tensor
//! - Classification through a real model or a synthetic substitute
//! - Severity tiers and canonical spray profiles
//! - A never-failing decision orchestrator behind a small HTTP API

pub mod actuation;
pub mod capability;
pub mod classifier;
pub mod config;
pub mod orchestrator;
pub mod server;
pub mod utils;
pub mod vision;

// Re-exports for convenience
pub use actuation::{actuation_for, ActuationCommand, SeverityTable, SeverityTier};
pub use capability::{probe, CapabilityFlags};
pub use classifier::{ClassifierAdapter, LabelSet};
pub use config::BridgeConfig;
pub use orchestrator::{DecisionOrchestrator, DecisionResult};
pub use vision::{ImageInput, ImageNormalizer, ImageTensor};
