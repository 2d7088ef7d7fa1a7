//! Opportunities — the authoritative split between safe and remediation SQL.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityCategory {
    /// Logical model and physical evidence disagree.
    Contradiction,
    /// Evidence allows tightening the physical schema.
    Tightening,
    /// Evidence is missing or unusable.
    Coverage,
}

impl OpportunityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contradiction => "Contradiction",
            Self::Tightening => "Tightening",
            Self::Coverage => "Coverage",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpportunityDisposition {
    Safe,
    NeedsRemediation,
    Informational,
}

impl OpportunityDisposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::NeedsRemediation => "NeedsRemediation",
            Self::Informational => "Informational",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

/// One actionable observation with its SQL, when any.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub category: OpportunityCategory,
    #[serde(rename = "type")]
    pub kind: String,
    pub disposition: OpportunityDisposition,
    pub risk: RiskLevel,
    pub target: String,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation_sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_sql: Option<String>,
}

/// Histogram block of the opportunities report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityHistograms {
    pub by_disposition: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_risk: BTreeMap<String, usize>,
}

/// Aggregated opportunities with histograms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunitiesReport {
    pub generated_at_utc: DateTime<Utc>,
    pub opportunities: Vec<Opportunity>,
    pub histograms: OpportunityHistograms,
}

impl OpportunitiesReport {
    /// Assemble the report, assigning stable sequential ids.
    pub fn assemble(mut opportunities: Vec<Opportunity>, generated_at_utc: DateTime<Utc>) -> Self {
        for (index, opportunity) in opportunities.iter_mut().enumerate() {
            opportunity.id = format!("OPP-{:04}", index + 1);
        }

        let mut histograms = OpportunityHistograms::default();
        for o in &opportunities {
            *histograms
                .by_disposition
                .entry(o.disposition.as_str().to_string())
                .or_default() += 1;
            *histograms
                .by_category
                .entry(o.category.as_str().to_string())
                .or_default() += 1;
            *histograms.by_type.entry(o.kind.clone()).or_default() += 1;
            *histograms
                .by_risk
                .entry(o.risk.as_str().to_string())
                .or_default() += 1;
        }

        Self {
            generated_at_utc,
            opportunities,
            histograms,
        }
    }

    /// Concatenated safe bundle, batches separated by `GO`.
    pub fn safe_script(&self) -> String {
        concat_script(self.opportunities.iter().filter_map(|o| {
            (o.disposition == OpportunityDisposition::Safe)
                .then(|| o.safe_sql.as_deref())
                .flatten()
        }))
    }

    /// Concatenated remediation bundle, batches separated by `GO`.
    pub fn remediation_script(&self) -> String {
        concat_script(self.opportunities.iter().filter_map(|o| {
            (o.disposition == OpportunityDisposition::NeedsRemediation)
                .then(|| o.remediation_sql.as_deref())
                .flatten()
        }))
    }

    pub fn pending_remediation_count(&self) -> usize {
        self.opportunities
            .iter()
            .filter(|o| o.disposition == OpportunityDisposition::NeedsRemediation)
            .count()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn concat_script<'a>(blocks: impl Iterator<Item = &'a str>) -> String {
    let mut script = String::new();
    for block in blocks {
        script.push_str(block.trim_end());
        script.push_str("\nGO\n");
    }
    script
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opportunity(
        disposition: OpportunityDisposition,
        safe: Option<&str>,
        remediation: Option<&str>,
    ) -> Opportunity {
        Opportunity {
            id: String::new(),
            category: OpportunityCategory::Tightening,
            kind: "nullability.tighten".to_string(),
            disposition,
            risk: RiskLevel::Low,
            target: "dbo.T.C".to_string(),
            rationale: "test".to_string(),
            remediation_sql: remediation.map(str::to_string),
            safe_sql: safe.map(str::to_string),
        }
    }

    #[test]
    fn safe_and_remediation_scripts_are_disjoint() {
        let report = OpportunitiesReport::assemble(
            vec![
                opportunity(OpportunityDisposition::Safe, Some("ALTER TABLE A"), None),
                opportunity(
                    OpportunityDisposition::NeedsRemediation,
                    None,
                    Some("UPDATE B"),
                ),
                opportunity(OpportunityDisposition::Informational, Some("-- note"), None),
            ],
            DateTime::UNIX_EPOCH,
        );

        let safe = report.safe_script();
        let remediation = report.remediation_script();
        assert!(safe.contains("ALTER TABLE A"));
        assert!(!safe.contains("UPDATE B"));
        assert!(!safe.contains("-- note"));
        assert!(remediation.contains("UPDATE B"));
        assert!(!remediation.contains("ALTER TABLE A"));
        assert!(!remediation.contains("-- note"));
        assert_eq!(report.pending_remediation_count(), 1);
    }

    #[test]
    fn histograms_count_every_axis() {
        let report = OpportunitiesReport::assemble(
            vec![
                opportunity(OpportunityDisposition::Safe, Some("A"), None),
                opportunity(OpportunityDisposition::Safe, Some("B"), None),
            ],
            DateTime::UNIX_EPOCH,
        );
        assert_eq!(report.histograms.by_disposition["Safe"], 2);
        assert_eq!(report.histograms.by_category["Tightening"], 2);
        assert_eq!(report.histograms.by_type["nullability.tighten"], 2);
        assert_eq!(report.opportunities[0].id, "OPP-0001");
        assert_eq!(report.opportunities[1].id, "OPP-0002");
    }
}
