//! Schema/data apply options.

use serde::{Deserialize, Serialize};

use super::emission::SynchronizationMode;
use crate::constants;

/// Authentication used when connecting to the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AuthenticationMethod {
    #[default]
    Integrated,
    SqlPassword,
}

impl AuthenticationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integrated => "Integrated",
            Self::SqlPassword => "SqlPassword",
        }
    }
}

/// Options for applying the safe bundle and seeds against a target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaApplyOptions {
    /// Whether the apply stage runs at all.
    pub enabled: bool,
    /// Target connection string. Required when enabled.
    pub connection_string: Option<String>,
    /// Authentication method.
    pub authentication: AuthenticationMethod,
    /// Per-batch command timeout.
    pub command_timeout_seconds: u32,
    /// Execute the safe opportunity bundle.
    pub apply_safe_script: bool,
    /// Execute the static seed scripts.
    pub apply_static_seeds: bool,
    /// Seed synchronization override. None = emission mode.
    pub static_seed_synchronization_mode: Option<SynchronizationMode>,
}

impl Default for SchemaApplyOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            connection_string: None,
            authentication: AuthenticationMethod::default(),
            command_timeout_seconds: constants::DEFAULT_COMMAND_TIMEOUT_SECONDS,
            apply_safe_script: true,
            apply_static_seeds: true,
            static_seed_synchronization_mode: None,
        }
    }
}

impl SchemaApplyOptions {
    /// Effective seed synchronization mode given the emission default.
    pub fn effective_seed_mode(&self, emission_mode: SynchronizationMode) -> SynchronizationMode {
        self.static_seed_synchronization_mode.unwrap_or(emission_mode)
    }
}
