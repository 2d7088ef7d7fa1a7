//! Module folder sanitization and collision disambiguation.

use osmforge_core::types::FxHashSet;

/// Folder assignment for one module, in model order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFolder {
    pub original_name: String,
    pub sanitized_name: String,
    /// Folder actually used. Differs from `sanitized_name` on collision.
    pub disambiguated_name: String,
}

impl ModuleFolder {
    pub fn was_remapped(&self) -> bool {
        self.sanitized_name != self.disambiguated_name
    }
}

/// Replace filesystem-hostile characters with underscores.
/// Runs of replaced characters collapse to a single underscore.
pub fn sanitize_module_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_replacement = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
            last_was_replacement = ch == '_';
        } else if !last_was_replacement {
            out.push('_');
            last_was_replacement = true;
        }
    }
    if out.is_empty() {
        out.push_str("Module");
    }
    out
}

/// Assign folders to modules in order. When two distinct module names
/// sanitize to the same folder, later occurrences get `_2`, `_3`, … suffixes.
pub fn assign_module_folders<'a>(names: impl Iterator<Item = &'a str>) -> Vec<ModuleFolder> {
    let mut taken: FxHashSet<String> = FxHashSet::default();
    let mut folders = Vec::new();

    for name in names {
        let sanitized = sanitize_module_name(name);
        let mut disambiguated = sanitized.clone();
        let mut suffix = 2usize;
        while !taken.insert(disambiguated.to_ascii_lowercase()) {
            disambiguated = format!("{sanitized}_{suffix}");
            suffix += 1;
        }
        folders.push(ModuleFolder {
            original_name: name.to_string(),
            sanitized_name: sanitized,
            disambiguated_name: disambiguated,
        });
    }

    folders
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitization_collapses_replacement_runs() {
        assert_eq!(sanitize_module_name("Module Alpha"), "Module_Alpha");
        assert_eq!(sanitize_module_name("Module#Alpha"), "Module_Alpha");
        assert_eq!(sanitize_module_name("Module - Alpha"), "Module_Alpha");
        assert_eq!(sanitize_module_name("###"), "_");
    }

    #[test]
    fn colliding_modules_get_numeric_suffixes() {
        let names = ["Module Alpha", "Module#Alpha", "Module@Alpha"];
        let folders = assign_module_folders(names.iter().copied());

        assert_eq!(folders[0].disambiguated_name, "Module_Alpha");
        assert!(!folders[0].was_remapped());
        assert_eq!(folders[1].disambiguated_name, "Module_Alpha_2");
        assert!(folders[1].was_remapped());
        assert_eq!(folders[2].disambiguated_name, "Module_Alpha_3");
    }

    #[test]
    fn collision_detection_is_case_insensitive() {
        let names = ["Sales", "SALES"];
        let folders = assign_module_folders(names.iter().copied());
        assert_eq!(folders[1].disambiguated_name, "SALES_2");
    }
}
