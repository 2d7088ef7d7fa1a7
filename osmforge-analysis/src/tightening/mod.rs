//! Tightening policy — evidence into decisions and opportunities.
//!
//! Subsystems:
//! - `types` — decision records, decision set, diagnostics
//! - `opportunities` — opportunity records, histograms, script partitioning
//! - `sqlgen` — SQL snippets for safe and remediation bundles
//! - `engine` — the decision rules
//! - `report` — decision log model

pub mod engine;
pub mod opportunities;
pub mod report;
pub mod sqlgen;
pub mod types;

pub use engine::TighteningPolicyEngine;
pub use opportunities::{
    OpportunitiesReport, Opportunity, OpportunityCategory, OpportunityDisposition, RiskLevel,
};
pub use report::PolicyDecisionReport;
pub use types::{
    DiagnosticSeverity, ForeignKeyAction, ForeignKeyDecision, NullabilityDecision,
    PolicyDecisionSet, TighteningDiagnostic, UniqueIndexDecision,
};
