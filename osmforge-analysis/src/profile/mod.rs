//! Profiling — snapshot types, fixture loading, insight derivation.

pub mod insights;
pub mod load;
pub mod types;

pub use insights::{derive_insights, InsightCategory, InsightSeverity, ProfilingInsight};
pub use load::{DataProfiler, ProfileCaptureResult};
pub use types::{
    ColumnProfile, CompositeUniqueCandidate, ForeignKeyReality, ProbeStatus, ProfileSnapshot,
    UniqueCandidate,
};
