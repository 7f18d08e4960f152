//! Severity & Actuation Mapping
//!
//! Pure lookups from a disease label to a severity tier, and from a severity
//! tier to the spray profile consumed by the field controller.

pub mod table;

pub use table::{SeverityTable, TableError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete treatment bucket derived from a disease label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(into = "u8", try_from = "u8")]
pub enum SeverityTier {
    #[default]
    None,
    Moderate,
    Severe,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 3] = [SeverityTier::None, SeverityTier::Moderate, SeverityTier::Severe];

    pub fn level(self) -> u8 {
        match self {
            SeverityTier::None => 0,
            SeverityTier::Moderate => 1,
            SeverityTier::Severe => 2,
        }
    }

    /// Lenient conversion used on the actuation side: unknown levels are NONE.
    pub fn from_level(level: u8) -> Self {
        SeverityTier::try_from(level).unwrap_or_default()
    }

    pub fn requires_treatment(self) -> bool {
        self != SeverityTier::None
    }
}

impl From<SeverityTier> for u8 {
    fn from(tier: SeverityTier) -> Self {
        tier.level()
    }
}

impl TryFrom<u8> for SeverityTier {
    type Error = String;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(SeverityTier::None),
            1 => Ok(SeverityTier::Moderate),
            2 => Ok(SeverityTier::Severe),
            other => Err(format!("severity level {} is outside 0..=2", other)),
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SeverityTier::None => "none",
            SeverityTier::Moderate => "moderate",
            SeverityTier::Severe => "severe",
        };
        f.write_str(name)
    }
}

/// Nozzle pattern understood by the sprayer firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SprayPattern {
    None,
    SprayMedium,
    SprayIntensive,
}

/// One spray instruction for the external controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActuationCommand {
    /// Spray duration in seconds
    pub duration: u32,
    /// Pump PWM duty (0-255)
    pub intensity: u8,
    /// Nozzle servo angle in degrees
    pub servo_angle: u16,
    pub pattern: SprayPattern,
}

const IDLE: ActuationCommand = ActuationCommand {
    duration: 0,
    intensity: 0,
    servo_angle: 0,
    pattern: SprayPattern::None,
};

const SPRAY_MEDIUM: ActuationCommand = ActuationCommand {
    duration: 10,
    intensity: 200,
    servo_angle: 90,
    pattern: SprayPattern::SprayMedium,
};

const SPRAY_INTENSIVE: ActuationCommand = ActuationCommand {
    duration: 15,
    intensity: 255,
    servo_angle: 180,
    pattern: SprayPattern::SprayIntensive,
};

/// Canonical command for a tier. Total and deterministic.
pub fn actuation_for(tier: SeverityTier) -> ActuationCommand {
    match tier {
        SeverityTier::None => IDLE,
        SeverityTier::Moderate => SPRAY_MEDIUM,
        SeverityTier::Severe => SPRAY_INTENSIVE,
    }
}

/// Same lookup keyed by raw level; anything outside 0..=2 gets the idle row.
pub fn actuation_for_level(level: u8) -> ActuationCommand {
    actuation_for(SeverityTier::from_level(level))
}
