//! Module selection filter.

use serde::{Deserialize, Serialize};

use crate::types::ModuleName;

/// Which modules participate in a run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ModuleSelection {
    /// Include system modules.
    pub include_system: bool,
    /// Include inactive modules and entities.
    pub include_inactive: bool,
    /// Explicit module allow-list. Empty = all modules.
    pub modules: Vec<ModuleName>,
}

impl ModuleSelection {
    /// Whether a module with the given flags and name passes the filter.
    pub fn admits(&self, name: &ModuleName, is_system: bool, is_active: bool) -> bool {
        if is_system && !self.include_system {
            return false;
        }
        if !is_active && !self.include_inactive {
            return false;
        }
        self.modules.is_empty() || self.modules.iter().any(|m| m == name)
    }

    /// Module names sorted case-insensitively, for stable hashing and display.
    pub fn sorted_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.iter().map(|m| m.as_str().to_string()).collect();
        names.sort_by_key(|n| n.to_ascii_lowercase());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ModuleName {
        ModuleName::new(s).unwrap()
    }

    #[test]
    fn empty_selection_admits_active_user_modules_only() {
        let sel = ModuleSelection::default();
        assert!(sel.admits(&name("Sales"), false, true));
        assert!(!sel.admits(&name("System"), true, true));
        assert!(!sel.admits(&name("Legacy"), false, false));
    }

    #[test]
    fn allow_list_matches_case_insensitively() {
        let sel = ModuleSelection {
            modules: vec![name("Sales")],
            ..Default::default()
        };
        assert!(sel.admits(&name("SALES"), false, true));
        assert!(!sel.admits(&name("Billing"), false, true));
    }
}
