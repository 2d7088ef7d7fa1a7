//! Layered configuration resolution.
//!
//! Three layers per knob: compiled default, configuration overlay, CLI
//! override. Every knob's effective value and source land in the
//! `TighteningToggleSnapshot`. Overlay booleans are tri-state: `None`
//! defers to the layer below.

use serde::Deserialize;

use super::apply::SchemaApplyOptions;
use super::cache::EvidenceCacheOptions;
use super::emission::{DynamicInsertOutputMode, EmissionOptions, SynchronizationMode};
use super::naming::NamingOverrideOptions;
use super::policy::{PolicyMode, TighteningOptions};
use super::selection::ModuleSelection;
use super::toggles::{self, TighteningToggleSnapshot, Toggle, ToggleSource};
use crate::errors::{codes, ValidationError};

/// Partial configuration parsed from a TOML overlay string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub policy: PolicyOverlay,
    pub emission: EmissionOverlay,
    pub cache: CacheOverlay,
    pub apply: ApplyOverlay,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyOverlay {
    pub mode: Option<String>,
    pub null_budget: Option<u32>,
    pub enforce_composite_unique: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmissionOverlay {
    pub per_table_files: Option<bool>,
    pub module_parallelism: Option<usize>,
    pub sanitize_module_names: Option<bool>,
    pub group_by_module: Option<bool>,
    pub emit_master_file: Option<bool>,
    pub synchronization_mode: Option<String>,
    pub dynamic_insert_mode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CacheOverlay {
    pub refresh: Option<bool>,
    pub ttl_seconds: Option<u64>,
    pub max_age_seconds: Option<u64>,
    pub max_entries: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApplyOverlay {
    pub enabled: Option<bool>,
    pub connection_string: Option<String>,
    pub command_timeout_seconds: Option<u32>,
    pub apply_safe_script: Option<bool>,
    pub apply_static_seeds: Option<bool>,
    pub static_seed_synchronization_mode: Option<String>,
}

impl ConfigOverlay {
    /// Parse an overlay from TOML text. File discovery is the caller's job.
    pub fn from_toml_str(text: &str) -> Result<Self, ValidationError> {
        toml::from_str(text)
            .map_err(|e| ValidationError::new(codes::CONFIG_OVERLAY_PARSE, e.to_string()))
    }
}

/// Fully resolved configuration for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub tightening: TighteningOptions,
    pub emission: EmissionOptions,
    pub cache: EvidenceCacheOptions,
    pub apply: SchemaApplyOptions,
    pub selection: ModuleSelection,
    pub naming: NamingOverrideOptions,
}

impl PipelineConfig {
    /// Resolve defaults + configuration + overrides into effective options
    /// and the toggle snapshot recording each knob's provenance.
    pub fn resolve(
        configuration: Option<&ConfigOverlay>,
        overrides: Option<&ConfigOverlay>,
    ) -> Result<(Self, TighteningToggleSnapshot), Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut snapshot = TighteningToggleSnapshot::default();
        let defaults = Self::default();

        let cfg = configuration.cloned().unwrap_or_default();
        let ovr = overrides.cloned().unwrap_or_default();

        let mode = pick_parsed(
            toggles::TOGGLE_POLICY_MODE,
            defaults.tightening.mode,
            cfg.policy.mode.as_deref(),
            ovr.policy.mode.as_deref(),
            PolicyMode::parse,
            PolicyMode::as_str,
            &mut snapshot,
            &mut errors,
        );
        let null_budget = pick(
            toggles::TOGGLE_POLICY_NULL_BUDGET,
            defaults.tightening.null_budget,
            cfg.policy.null_budget,
            ovr.policy.null_budget,
            |v| v.to_string(),
            &mut snapshot,
        );
        let composite = pick_optional(
            toggles::TOGGLE_POLICY_COMPOSITE_UNIQUE,
            defaults.tightening.enforce_composite_unique,
            cfg.policy.enforce_composite_unique,
            ovr.policy.enforce_composite_unique,
            &mut snapshot,
        );

        let per_table_files = pick(
            toggles::TOGGLE_EMISSION_PER_TABLE_FILES,
            defaults.emission.per_table_files,
            cfg.emission.per_table_files,
            ovr.emission.per_table_files,
            |v| v.to_string(),
            &mut snapshot,
        );
        let module_parallelism = pick(
            toggles::TOGGLE_EMISSION_MODULE_PARALLELISM,
            defaults.emission.module_parallelism,
            cfg.emission.module_parallelism,
            ovr.emission.module_parallelism,
            |v| v.to_string(),
            &mut snapshot,
        );
        let group_by_module = pick(
            toggles::TOGGLE_EMISSION_GROUP_BY_MODULE,
            defaults.emission.group_by_module,
            cfg.emission.group_by_module,
            ovr.emission.group_by_module,
            |v| v.to_string(),
            &mut snapshot,
        );
        let emit_master_file = pick(
            toggles::TOGGLE_EMISSION_MASTER_FILE,
            defaults.emission.emit_master_file,
            cfg.emission.emit_master_file,
            ovr.emission.emit_master_file,
            |v| v.to_string(),
            &mut snapshot,
        );
        let sync_mode = pick_parsed(
            toggles::TOGGLE_EMISSION_SYNC_MODE,
            defaults.emission.synchronization_mode,
            cfg.emission.synchronization_mode.as_deref(),
            ovr.emission.synchronization_mode.as_deref(),
            SynchronizationMode::parse,
            SynchronizationMode::as_str,
            &mut snapshot,
            &mut errors,
        );
        let dynamic_mode = pick_parsed(
            toggles::TOGGLE_EMISSION_DYNAMIC_MODE,
            defaults.emission.dynamic_insert_mode,
            cfg.emission.dynamic_insert_mode.as_deref(),
            ovr.emission.dynamic_insert_mode.as_deref(),
            parse_dynamic_mode,
            DynamicInsertOutputMode::as_str,
            &mut snapshot,
            &mut errors,
        );

        let refresh = pick(
            toggles::TOGGLE_CACHE_REFRESH,
            defaults.cache.refresh,
            cfg.cache.refresh,
            ovr.cache.refresh,
            |v| v.to_string(),
            &mut snapshot,
        );
        let ttl_seconds = pick_optional(
            toggles::TOGGLE_CACHE_TTL_SECONDS,
            defaults.cache.ttl_seconds,
            cfg.cache.ttl_seconds,
            ovr.cache.ttl_seconds,
            &mut snapshot,
        );

        let apply_enabled = pick(
            toggles::TOGGLE_APPLY_ENABLED,
            defaults.apply.enabled,
            cfg.apply.enabled,
            ovr.apply.enabled,
            |v| v.to_string(),
            &mut snapshot,
        );

        if !errors.is_empty() {
            return Err(errors);
        }

        let seed_mode = layer_string(
            cfg.apply.static_seed_synchronization_mode.as_deref(),
            ovr.apply.static_seed_synchronization_mode.as_deref(),
        )
        .map(|(raw, _)| {
            SynchronizationMode::parse(raw).ok_or_else(|| {
                ValidationError::new(
                    codes::CONFIG_OVERLAY_INVALID_VALUE,
                    format!("invalid synchronization mode '{raw}'"),
                )
            })
        })
        .transpose()
        .map_err(|e| vec![e])?;

        let config = Self {
            tightening: TighteningOptions {
                mode,
                null_budget,
                enforce_composite_unique: composite,
            },
            emission: EmissionOptions {
                per_table_files,
                module_parallelism,
                sanitize_module_names: defaults.emission.sanitize_module_names,
                group_by_module,
                emit_master_file,
                synchronization_mode: sync_mode,
                dynamic_insert_mode: dynamic_mode,
            },
            cache: EvidenceCacheOptions {
                root: defaults.cache.root,
                refresh,
                ttl_seconds,
                max_age_seconds: layer(cfg.cache.max_age_seconds, ovr.cache.max_age_seconds),
                max_entries: layer(cfg.cache.max_entries, ovr.cache.max_entries),
            },
            apply: SchemaApplyOptions {
                enabled: apply_enabled,
                connection_string: layer(
                    cfg.apply.connection_string.clone(),
                    ovr.apply.connection_string.clone(),
                ),
                authentication: defaults.apply.authentication,
                command_timeout_seconds: layer(
                    cfg.apply.command_timeout_seconds,
                    ovr.apply.command_timeout_seconds,
                )
                .unwrap_or(defaults.apply.command_timeout_seconds),
                apply_safe_script: layer(cfg.apply.apply_safe_script, ovr.apply.apply_safe_script)
                    .unwrap_or(defaults.apply.apply_safe_script),
                apply_static_seeds: layer(
                    cfg.apply.apply_static_seeds,
                    ovr.apply.apply_static_seeds,
                )
                .unwrap_or(defaults.apply.apply_static_seeds),
                static_seed_synchronization_mode: seed_mode,
            },
            selection: defaults.selection,
            naming: defaults.naming,
        };

        Ok((config, snapshot))
    }
}

fn parse_dynamic_mode(value: &str) -> Option<DynamicInsertOutputMode> {
    match value.to_ascii_lowercase().as_str() {
        "disabled" => Some(DynamicInsertOutputMode::Disabled),
        "perentity" => Some(DynamicInsertOutputMode::PerEntity),
        "singlefile" => Some(DynamicInsertOutputMode::SingleFile),
        _ => None,
    }
}

/// Override beats configuration beats default.
fn layer<T>(cfg: Option<T>, ovr: Option<T>) -> Option<T> {
    ovr.or(cfg)
}

fn layer_string<'a>(
    cfg: Option<&'a str>,
    ovr: Option<&'a str>,
) -> Option<(&'a str, ToggleSource)> {
    match (cfg, ovr) {
        (_, Some(o)) => Some((o, ToggleSource::Override)),
        (Some(c), None) => Some((c, ToggleSource::Configuration)),
        (None, None) => None,
    }
}

fn pick<T: Clone>(
    key: &'static str,
    default: T,
    cfg: Option<T>,
    ovr: Option<T>,
    render: impl Fn(&T) -> String,
    snapshot: &mut TighteningToggleSnapshot,
) -> T {
    let (value, source) = match (cfg, ovr) {
        (_, Some(o)) => (o, ToggleSource::Override),
        (Some(c), None) => (c, ToggleSource::Configuration),
        (None, None) => (default, ToggleSource::Default),
    };
    snapshot
        .entries
        .push(Toggle::new(key, render(&value), source));
    value
}

fn pick_optional<T: Clone + ToString>(
    key: &'static str,
    default: Option<T>,
    cfg: Option<T>,
    ovr: Option<T>,
    snapshot: &mut TighteningToggleSnapshot,
) -> Option<T> {
    let (value, source) = match (cfg, ovr) {
        (_, Some(o)) => (Some(o), ToggleSource::Override),
        (Some(c), None) => (Some(c), ToggleSource::Configuration),
        (None, None) => (default, ToggleSource::Default),
    };
    let rendered = value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unset".to_string());
    snapshot.entries.push(Toggle::new(key, rendered, source));
    value
}

#[allow(clippy::too_many_arguments)]
fn pick_parsed<T: Copy>(
    key: &'static str,
    default: T,
    cfg: Option<&str>,
    ovr: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
    render: impl Fn(&T) -> &'static str,
    snapshot: &mut TighteningToggleSnapshot,
    errors: &mut Vec<ValidationError>,
) -> T {
    let (value, source) = match layer_string(cfg, ovr) {
        Some((raw, source)) => match parse(raw) {
            Some(parsed) => (parsed, source),
            None => {
                errors.push(
                    ValidationError::new(
                        codes::CONFIG_OVERLAY_INVALID_VALUE,
                        format!("invalid value '{raw}' for {key}"),
                    )
                    .with_context(key),
                );
                (default, ToggleSource::Default)
            }
        },
        None => (default, ToggleSource::Default),
    };
    snapshot
        .entries
        .push(Toggle::new(key, render(&value), source));
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_beats_configuration_beats_default() {
        let cfg = ConfigOverlay::from_toml_str(
            r#"
            [policy]
            mode = "Aggressive"
            null_budget = 5
            "#,
        )
        .unwrap();
        let ovr = ConfigOverlay::from_toml_str(
            r#"
            [policy]
            mode = "EvidenceGated"
            "#,
        )
        .unwrap();

        let (resolved, snapshot) = PipelineConfig::resolve(Some(&cfg), Some(&ovr)).unwrap();
        assert_eq!(resolved.tightening.mode, PolicyMode::EvidenceGated);
        assert_eq!(resolved.tightening.null_budget, 5);

        let mode = snapshot.get(toggles::TOGGLE_POLICY_MODE).unwrap();
        assert_eq!(mode.source, ToggleSource::Override);
        let budget = snapshot.get(toggles::TOGGLE_POLICY_NULL_BUDGET).unwrap();
        assert_eq!(budget.source, ToggleSource::Configuration);
        let master = snapshot.get(toggles::TOGGLE_EMISSION_MASTER_FILE).unwrap();
        assert_eq!(master.source, ToggleSource::Default);
    }

    #[test]
    fn invalid_enum_value_is_reported_with_key_context() {
        let cfg = ConfigOverlay::from_toml_str("[policy]\nmode = \"Reckless\"\n").unwrap();
        let errors = PipelineConfig::resolve(Some(&cfg), None).unwrap_err();
        assert_eq!(errors[0].code, codes::CONFIG_OVERLAY_INVALID_VALUE);
        assert_eq!(errors[0].context.as_deref(), Some("policy.mode"));
    }

    #[test]
    fn defaults_resolve_without_layers() {
        let (resolved, snapshot) = PipelineConfig::resolve(None, None).unwrap();
        assert_eq!(resolved.tightening.mode, PolicyMode::EvidenceGated);
        assert!(snapshot
            .entries
            .iter()
            .all(|t| t.source == ToggleSource::Default));
    }
}
