//! Naming overrides — ordered first-match rules producing effective table names.

use serde::{Deserialize, Serialize};

use crate::types::{EntityName, ModuleName, SchemaName, TableName};

/// One override rule. Every non-null selector must match for the rule to apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingOverrideRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<ModuleName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<EntityName>,
    /// Effective table name when the rule matches.
    pub target: TableName,
}

impl NamingOverrideRule {
    fn matches(
        &self,
        schema: &SchemaName,
        table: &TableName,
        module: &ModuleName,
        logical_name: &EntityName,
    ) -> bool {
        self.schema.as_ref().map_or(true, |s| s == schema)
            && self.table.as_ref().map_or(true, |t| t == table)
            && self.module.as_ref().map_or(true, |m| m == module)
            && self.logical_name.as_ref().map_or(true, |l| l == logical_name)
    }
}

/// Ordered rule set. The first matching rule wins.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NamingOverrideOptions {
    pub rules: Vec<NamingOverrideRule>,
}

impl NamingOverrideOptions {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Effective table name for an entity: the first matching rule's target,
    /// or the physical table name unchanged.
    pub fn effective_table_name(
        &self,
        schema: &SchemaName,
        table: &TableName,
        module: &ModuleName,
        logical_name: &EntityName,
    ) -> TableName {
        self.rules
            .iter()
            .find(|r| r.matches(schema, table, module, logical_name))
            .map(|r| r.target.clone())
            .unwrap_or_else(|| table.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(table: Option<&str>, module: Option<&str>, target: &str) -> NamingOverrideRule {
        NamingOverrideRule {
            schema: None,
            table: table.map(|t| TableName::new(t).unwrap()),
            module: module.map(|m| ModuleName::new(m).unwrap()),
            logical_name: None,
            target: TableName::new(target).unwrap(),
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let overrides = NamingOverrideOptions {
            rules: vec![
                rule(Some("OSUSR_ABC_CUSTOMER"), None, "Customer"),
                rule(None, Some("Sales"), "SalesTable"),
            ],
        };
        let effective = overrides.effective_table_name(
            &SchemaName::dbo(),
            &TableName::new("osusr_abc_customer").unwrap(),
            &ModuleName::new("Sales").unwrap(),
            &EntityName::new("Customer").unwrap(),
        );
        assert_eq!(effective.as_str(), "Customer");
    }

    #[test]
    fn no_match_keeps_physical_name() {
        let overrides = NamingOverrideOptions::default();
        let effective = overrides.effective_table_name(
            &SchemaName::dbo(),
            &TableName::new("OSUSR_ABC_ORDER").unwrap(),
            &ModuleName::new("Sales").unwrap(),
            &EntityName::new("Order").unwrap(),
        );
        assert_eq!(effective.as_str(), "OSUSR_ABC_ORDER");
    }
}
