use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span, warn};

use psi_ingest::{
    CsvColumnScanner, ImportAuditResult, ImportReport, audit_file, import_file, load_dataset,
    read_csv_headers, read_csv_table, save_dataset, source_columns,
};
use psi_map::{
    AutoMapOptions, AutoMapSummary, AutoMapThresholds, AutoMapper, MappingDocument,
    OrphanDetector, OrphanReport, load_document, save_document,
};
use psi_model::{Dataset, ScenarioStatistics, SchemaRegistry, builtin_registry};

use crate::cli::{AuditArgs, AutomapArgs, ImportCommandArgs, OrphanArgs, ScenarioArgs};

fn registry() -> Result<SchemaRegistry> {
    builtin_registry().context("build data type registry")
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("project")
        .to_string()
}

pub fn run_automap(args: &AutomapArgs) -> Result<AutoMapSummary> {
    let registry = registry()?;
    let schema = registry.require(&args.data_type)?;
    let thresholds = AutoMapThresholds::new(args.accept, args.floor)?;
    let span = info_span!("automap", data_type = %schema.name());
    let _guard = span.enter();

    let mut document = match &args.mapping {
        Some(path) if path.exists() => load_document(path)?,
        _ => MappingDocument::new(
            args.project
                .clone()
                .unwrap_or_else(|| file_stem(&args.csv)),
        ),
    };

    let table = read_csv_table(&args.csv)?;
    let columns = source_columns(&table, &file_stem(&args.csv));
    let options = AutoMapOptions {
        reevaluate: args.reevaluate,
        ..AutoMapOptions::default()
    };
    let summary = AutoMapper::new(thresholds)
        .with_mode(args.mode.into())
        .auto_map(&mut document, &columns, schema.catalog(), &options);

    if args.save
        && let Some(path) = &args.mapping
    {
        save_document(path, &document)?;
        info!(path = %path.display(), "mapping saved");
    }
    Ok(summary)
}

fn load_mapping(path: &Path) -> Result<MappingDocument> {
    load_document(path).with_context(|| format!("load mapping {}", path.display()))
}

pub fn run_audit(args: &AuditArgs) -> Result<ImportAuditResult> {
    let registry = registry()?;
    let document = load_mapping(&args.mapping)?;
    let dataset = match &args.dataset {
        Some(path) => load_dataset(path, &registry)?,
        None => Dataset::from_registry(&registry),
    };
    let span = info_span!("audit", file = %args.csv.display());
    let _guard = span.enter();
    audit_file(
        &args.csv,
        &document,
        &registry,
        &dataset,
        &args.import.to_options(),
    )
}

pub fn run_import(args: &ImportCommandArgs) -> Result<ImportReport> {
    let registry = registry()?;
    let document = load_mapping(&args.mapping)?;
    let mut dataset = load_dataset(&args.dataset, &registry)?;
    let span = info_span!("import", file = %args.csv.display());
    let _guard = span.enter();

    let report = import_file(
        &args.csv,
        &document,
        &registry,
        &mut dataset,
        &args.import.to_options(),
    )?;
    if report.aborted {
        warn!("import aborted; dataset not written");
    } else {
        save_dataset(&args.dataset, &dataset)?;
    }
    Ok(report)
}

/// Orphan scan outcome; `removed` is set when the removal was committed.
pub struct OrphanOutcome {
    pub report: OrphanReport,
    pub removed: Option<usize>,
}

pub fn run_orphans(args: &OrphanArgs) -> Result<OrphanOutcome> {
    let mut document = load_mapping(&args.mapping)?;
    let scanner = CsvColumnScanner;

    let mut detector = OrphanDetector::new();
    for path in &args.retain {
        let headers = read_csv_headers(path)
            .with_context(|| format!("read retained file {}", path.display()))?;
        detector = detector.retaining(headers);
    }
    let file_id = args.file.to_string_lossy();
    let report = detector.detect(document.associations(), &file_id, &scanner);

    let removed = if args.commit && !report.is_empty() {
        let removed = document.remove_associations(&report.orphaned);
        save_document(&args.mapping, &document)?;
        info!(removed, "orphaned mappings removed");
        Some(removed)
    } else {
        None
    };
    Ok(OrphanOutcome { report, removed })
}

/// Scenario counts and the uniformity of each scenario kind.
pub struct ScenarioView {
    pub statistics: ScenarioStatistics,
    pub uniform: BTreeMap<String, bool>,
    pub collisions: Vec<Vec<String>>,
}

pub fn run_scenarios(args: &ScenarioArgs) -> Result<ScenarioView> {
    let registry = registry()?;
    if !args.dataset.exists() {
        return Err(anyhow!("dataset not found: {}", args.dataset.display()));
    }
    let dataset = load_dataset(&args.dataset, &registry)?;
    let statistics = match &args.scenario {
        Some(scenario) => dataset
            .statistics_for_scenario(scenario)
            .into_iter()
            .map(|(kind, count)| (kind, BTreeMap::from([(scenario.clone(), count)])))
            .collect(),
        None => dataset.statistics_by_scenario(),
    };
    let uniform = dataset
        .kinds()
        .filter(|kind| kind.has_scenarios())
        .map(|kind| (kind.name().to_string(), dataset.is_uniform(kind.name())))
        .collect();
    Ok(ScenarioView {
        statistics,
        uniform,
        collisions: dataset.scenario_case_collisions(),
    })
}
