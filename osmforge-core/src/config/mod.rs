//! Configuration — typed option structs, TOML overlay, toggle precedence.
//!
//! On-disk file discovery belongs to the CLI collaborator; this module only
//! parses overlay strings and computes effective values. Precedence is
//! `default < configuration < override`, recorded per knob in the snapshot.

pub mod apply;
pub mod cache;
pub mod emission;
pub mod naming;
pub mod overlay;
pub mod policy;
pub mod selection;
pub mod toggles;

pub use apply::{AuthenticationMethod, SchemaApplyOptions};
pub use cache::EvidenceCacheOptions;
pub use emission::{DynamicInsertOutputMode, EmissionOptions, SynchronizationMode};
pub use naming::{NamingOverrideOptions, NamingOverrideRule};
pub use overlay::{ConfigOverlay, PipelineConfig};
pub use policy::{PolicyMode, TighteningOptions};
pub use selection::ModuleSelection;
pub use toggles::{TighteningToggleSnapshot, Toggle, ToggleSource};
