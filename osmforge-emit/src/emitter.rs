//! File materialization with bounded fan-out.
//!
//! Script rendering may fan out across a bounded pool; the manifest and
//! every serialized artifact are assembled in sorted order afterwards, so
//! output bytes never depend on completion order.

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;

use osmforge_analysis::model::type_map::map_logical_type;
use osmforge_analysis::model::OsmModel;
use osmforge_analysis::naming::{EffectiveNameResolver, ModuleFolder};
use osmforge_analysis::profile::ProfileSnapshot;
use osmforge_analysis::tightening::{
    OpportunitiesReport, PolicyDecisionReport, PolicyDecisionSet,
};
use osmforge_core::cancel::Context;
use osmforge_core::config::EmissionOptions;
use osmforge_core::errors::{EmitError, ErrorCode, StepResult};
use osmforge_core::events::steps;

use crate::manifest::{
    compute_emission_digest, content_sha256, emission_block, CoverageBlock,
    PredicateCoverageBlock, SsdtManifest, TableManifestEntry,
};
use crate::scripts::render_table_script;
use crate::smo::{build_smo_model, SmoModel, SmoTable};

/// What emission produced, for downstream steps.
#[derive(Debug, Clone)]
pub struct EmissionResult {
    pub manifest: SsdtManifest,
    /// `(relative_path, content)` sorted by path.
    pub table_files: Vec<(String, String)>,
    pub folders: Vec<ModuleFolder>,
    pub smo: SmoModel,
}

/// Materializes the SSDT artifact set under one output directory.
pub struct Emitter {
    options: EmissionOptions,
}

impl Emitter {
    pub fn new(options: EmissionOptions) -> Self {
        Self { options }
    }

    /// Emit table scripts, manifest, decision log, and opportunity bundles.
    #[allow(clippy::too_many_arguments)]
    pub fn emit(
        &self,
        model: &OsmModel,
        decisions: &PolicyDecisionSet,
        decision_report: &PolicyDecisionReport,
        opportunities: &OpportunitiesReport,
        profile: &ProfileSnapshot,
        resolver: &EffectiveNameResolver,
        output_dir: &Path,
        ctx: &Context,
    ) -> StepResult<EmissionResult> {
        ctx.checkpoint(steps::SSDT_EMISSION_COMPLETED)
            .map_err(|e| vec![e])?;

        let (smo, folders) =
            build_smo_model(model, decisions, resolver, self.options.sanitize_module_names);

        let mut table_files = self.render_tables(&smo.tables);
        table_files.sort_by(|a, b| a.0.cmp(&b.0));

        ctx.checkpoint(steps::SSDT_EMISSION_COMPLETED)
            .map_err(|e| vec![e])?;

        for (relative_path, content) in &table_files {
            write_artifact(output_dir, relative_path, content).map_err(|e| vec![e.to_validation()])?;
        }

        let manifest = self.build_manifest(model, decisions, opportunities, profile, &smo, &table_files);
        write_artifact(
            output_dir,
            "manifest.json",
            &manifest.to_json().map_err(|e| serialize_error("manifest.json", e))?,
        )
        .map_err(|e| vec![e.to_validation()])?;

        write_artifact(
            output_dir,
            "decision-log.json",
            &decision_report
                .to_json()
                .map_err(|e| serialize_error("decision-log.json", e))?,
        )
        .map_err(|e| vec![e.to_validation()])?;

        write_artifact(
            output_dir,
            "opportunities.json",
            &opportunities
                .to_json()
                .map_err(|e| serialize_error("opportunities.json", e))?,
        )
        .map_err(|e| vec![e.to_validation()])?;
        write_artifact(output_dir, "Opportunities/safe.sql", &opportunities.safe_script())
            .map_err(|e| vec![e.to_validation()])?;
        write_artifact(
            output_dir,
            "Opportunities/needs-remediation.sql",
            &opportunities.remediation_script(),
        )
        .map_err(|e| vec![e.to_validation()])?;

        tracing::debug!(
            tables = table_files.len(),
            digest = %manifest.emission.digest,
            "emission complete"
        );
        Ok(EmissionResult {
            manifest,
            table_files,
            folders,
            smo,
        })
    }

    fn render_tables(&self, tables: &[SmoTable]) -> Vec<(String, String)> {
        let render = |table: &SmoTable| (self.table_path(table), render_table_script(table));
        match self.options.effective_parallelism() {
            Some(1) => tables.iter().map(render).collect(),
            Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
                Ok(pool) => pool.install(|| tables.par_iter().map(render).collect()),
                Err(_) => tables.par_iter().map(render).collect(),
            },
            None => tables.par_iter().map(render).collect(),
        }
    }

    fn table_path(&self, table: &SmoTable) -> String {
        if self.options.per_table_files {
            format!(
                "Tables/{}/{}.sql",
                table.schema.as_str(),
                table.effective_name.as_str()
            )
        } else {
            format!(
                "Modules/{}.{}.sql",
                table.module_folder,
                table.logical_name.as_str()
            )
        }
    }

    fn build_manifest(
        &self,
        model: &OsmModel,
        decisions: &PolicyDecisionSet,
        opportunities: &OpportunitiesReport,
        profile: &ProfileSnapshot,
        smo: &SmoModel,
        table_files: &[(String, String)],
    ) -> SsdtManifest {
        let digest_pairs: Vec<(String, String)> = table_files
            .iter()
            .map(|(path, content)| (path.clone(), content_sha256(content)))
            .collect();

        let mut entries: Vec<TableManifestEntry> = smo
            .tables
            .iter()
            .map(|table| TableManifestEntry {
                module: table.module.as_str().to_string(),
                schema: table.schema.as_str().to_string(),
                logical_name: table.logical_name.as_str().to_string(),
                table_file: self.table_path(table),
                pre_remediation_files: Vec::new(),
                post_remediation_files: Vec::new(),
                is_external: table.is_external,
            })
            .collect();
        entries.sort_by(|a, b| a.table_file.cmp(&b.table_file));

        let mut options = BTreeMap::new();
        options.insert(
            "perTableFiles".to_string(),
            self.options.per_table_files.to_string(),
        );
        options.insert(
            "moduleParallelism".to_string(),
            self.options.module_parallelism.to_string(),
        );
        options.insert(
            "groupByModule".to_string(),
            self.options.group_by_module.to_string(),
        );
        options.insert(
            "emitMasterFile".to_string(),
            self.options.emit_master_file.to_string(),
        );
        options.insert(
            "synchronizationMode".to_string(),
            self.options.synchronization_mode.as_str().to_string(),
        );
        options.insert(
            "dynamicInsertMode".to_string(),
            self.options.dynamic_insert_mode.as_str().to_string(),
        );

        let pre_remediation = if opportunities.pending_remediation_count() > 0 {
            vec!["Opportunities/needs-remediation.sql".to_string()]
        } else {
            Vec::new()
        };

        let mut unsupported: Vec<String> = Vec::new();
        for entity in model.entities() {
            for attribute in &entity.attributes {
                if attribute.observed_type.is_some() {
                    continue;
                }
                let mapped = map_logical_type(&attribute.data_type, attribute.length);
                if mapped == attribute.data_type {
                    unsupported.push(format!(
                        "{}.{}.{}: {}",
                        entity.module,
                        entity.logical_name,
                        attribute.logical_name,
                        attribute.data_type
                    ));
                }
            }
        }
        unsupported.sort();

        let coverage = CoverageBlock {
            modules: model.modules.len(),
            entities: model.entities().count(),
            attributes: model.entities().map(|e| e.attributes.len()).sum(),
        };
        let predicate_coverage = PredicateCoverageBlock {
            profiled_columns: profile.columns.len(),
            decided_columns: decisions.nullability.len()
                + decisions.uniqueness.len()
                + decisions.foreign_keys.len(),
        };

        SsdtManifest {
            options,
            policy_summary: Some(decisions.summary()),
            emission: emission_block(compute_emission_digest(&digest_pairs)),
            tables: entries,
            pre_remediation,
            coverage,
            predicate_coverage,
            unsupported,
        }
    }
}

/// Write one artifact, creating parent directories.
pub fn write_artifact(
    output_dir: &Path,
    relative_path: &str,
    content: &str,
) -> Result<(), EmitError> {
    let path = output_dir.join(relative_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| EmitError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&path, content).map_err(|source| EmitError::Io { path, source })
}

fn serialize_error(
    artifact: &'static str,
    error: serde_json::Error,
) -> Vec<osmforge_core::errors::ValidationError> {
    vec![EmitError::Serialize {
        artifact,
        reason: error.to_string(),
    }
    .to_validation()]
}
