//! Tightening policy options.

use serde::{Deserialize, Serialize};

use crate::constants;

/// How aggressively evidence is converted into schema tightening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PolicyMode {
    /// Never tighten; report what evidence would allow.
    Cautious,
    /// Tighten only what the profile explicitly witnesses.
    #[default]
    EvidenceGated,
    /// Tighten witnessed properties plus composite unique candidates.
    Aggressive,
}

impl PolicyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::EvidenceGated => "EvidenceGated",
            Self::Aggressive => "Aggressive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "cautious" => Some(Self::Cautious),
            "evidencegated" => Some(Self::EvidenceGated),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }
}

/// Options for the tightening policy engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TighteningOptions {
    /// Active policy mode.
    pub mode: PolicyMode,
    /// Maximum remediation-requiring nullability proposals per entity.
    pub null_budget: u32,
    /// Enforce composite unique candidates. Default: only in Aggressive.
    pub enforce_composite_unique: Option<bool>,
}

impl Default for TighteningOptions {
    fn default() -> Self {
        Self {
            mode: PolicyMode::default(),
            null_budget: constants::DEFAULT_NULL_BUDGET,
            enforce_composite_unique: None,
        }
    }
}

impl TighteningOptions {
    /// Effective composite-unique enforcement, defaulting by mode.
    pub fn effective_enforce_composite_unique(&self) -> bool {
        self.enforce_composite_unique
            .unwrap_or(self.mode == PolicyMode::Aggressive)
    }
}
