//! Table rendering for command results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use psi_ingest::{ImportAuditResult, ImportReport, OutcomeStatus};
use psi_map::{AutoMapSummary, ConfidenceBand, PropertyProposal};
use psi_model::{ImportIssue, SchemaRegistry, Severity};

use crate::commands::{OrphanOutcome, ScenarioView};

pub fn print_automap(summary: &AutoMapSummary) {
    println!("Data type: {}", summary.data_type);
    println!("{}", automap_table(summary));
    println!(
        "{} accepted, {} suggested, {} unmatched, {} kept",
        summary.accepted.len(),
        summary.suggested.len(),
        summary.unmatched.len(),
        summary.skipped.len()
    );
    for previous in &summary.replaced {
        println!(
            "Replaced {}.{} (was '{}')",
            previous.target_data_type, previous.property_name, previous.column_header
        );
    }
}

pub fn automap_table(summary: &AutoMapSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Property"),
        header_cell("Required"),
        header_cell("Column"),
        header_cell("Score"),
        header_cell("Reason"),
        header_cell("Result"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);

    let proposals = summary
        .accepted
        .iter()
        .chain(&summary.suggested)
        .chain(&summary.unmatched);
    for proposal in proposals {
        table.add_row(proposal_row(proposal));
    }
    for property in &summary.skipped {
        table.add_row(vec![
            Cell::new(property),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("already mapped"),
        ]);
    }
    table
}

fn proposal_row(proposal: &PropertyProposal) -> Vec<Cell> {
    let (column, score, reason) = match &proposal.best {
        Some(candidate) => (
            Cell::new(&candidate.column.name),
            Cell::new(format!("{:.2}", candidate.result.score)),
            Cell::new(candidate.result.reason),
        ),
        None => (dim_cell("-"), dim_cell("-"), dim_cell("-")),
    };
    let band = match proposal.band {
        ConfidenceBand::AutoAccept => Cell::new("accepted").fg(Color::Green),
        ConfidenceBand::Suggest => Cell::new("suggested").fg(Color::Yellow),
        ConfidenceBand::NoMatch => dim_cell("no match"),
    };
    vec![
        Cell::new(&proposal.property.name),
        required_cell(proposal.property.required),
        column,
        score,
        reason,
        band,
    ]
}

pub fn print_audit(audit: &ImportAuditResult) {
    println!("{}", audit_table(audit));
    println!(
        "Rows: {} total, {} valid. Import {}.",
        audit.total_rows,
        audit.valid_rows,
        if audit.can_import() {
            "possible"
        } else {
            "blocked"
        }
    );
    print_issues(audit.errors.iter().chain(&audit.warnings));
}

pub fn audit_table(audit: &ImportAuditResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data type"),
        header_cell("Scenario"),
        header_cell("Rows"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for kind in &audit.detected_data_types {
        match audit.per_scenario_counts.get(kind) {
            Some(scenarios) => {
                for (scenario, count) in scenarios {
                    table.add_row(vec![kind_cell(kind), Cell::new(scenario), Cell::new(count)]);
                }
            }
            None => {
                let count = audit.per_data_type_counts.get(kind).copied().unwrap_or(0);
                table.add_row(vec![kind_cell(kind), dim_cell("-"), Cell::new(count)]);
            }
        }
    }
    table
}

pub fn print_import(report: &ImportReport) {
    if report.aborted {
        println!("Import aborted; no changes were made.");
    } else {
        println!("{}", import_table(report));
        println!(
            "Rows: {} read, {} blank, {} not selected. {} inserted, {} removed.",
            report.total_rows,
            report.blank_rows,
            report.filtered_rows,
            report.inserted(),
            report.removed()
        );
    }
    print_issues(report.errors.iter().chain(&report.warnings));
}

pub fn import_table(report: &ImportReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data type"),
        header_cell("Scenario"),
        header_cell("Strategy"),
        header_cell("Status"),
        header_cell("Incoming"),
        header_cell("Inserted"),
        header_cell("Removed"),
        header_cell("Kept"),
        header_cell("Rejected"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 4..9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for outcome in &report.outcomes {
        let status = match outcome.status {
            OutcomeStatus::Applied => Cell::new(outcome.status.as_str()).fg(Color::Green),
            OutcomeStatus::SkippedExisting => Cell::new(outcome.status.as_str()).fg(Color::Yellow),
            OutcomeStatus::NothingToImport => dim_cell(outcome.status.as_str()),
        };
        table.add_row(vec![
            kind_cell(&outcome.kind),
            outcome
                .scenario
                .as_deref()
                .map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(outcome.strategy),
            status,
            Cell::new(outcome.incoming),
            Cell::new(outcome.inserted),
            count_cell(outcome.removed, Color::Yellow),
            Cell::new(outcome.kept_existing),
            count_cell(outcome.rejected_rows, Color::Red),
        ]);
    }
    table
}

pub fn print_orphans(outcome: &OrphanOutcome) {
    let report = &outcome.report;
    if report.scan_failed {
        println!(
            "Could not read columns of {}; no mappings were flagged.",
            report.file_id
        );
        return;
    }
    if report.is_empty() {
        println!("No mappings depend on {}.", report.file_id);
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data type"),
        header_cell("Property"),
        header_cell("Column"),
        header_cell("Required"),
    ]);
    apply_table_style(&mut table);
    for (kind, associations) in report.grouped() {
        for association in associations {
            table.add_row(vec![
                kind_cell(&kind),
                Cell::new(&association.property_name),
                Cell::new(&association.column_header),
                required_cell(association.required),
            ]);
        }
    }
    println!("{table}");
    match outcome.removed {
        Some(count) => println!("Removed {count} mapping(s)."),
        None => println!(
            "{} mapping(s) would be removed; rerun with --commit to remove them.",
            report.len()
        ),
    }
}

pub fn print_scenarios(view: &ScenarioView) {
    println!("{}", scenario_table(view));
    for group in &view.collisions {
        println!(
            "warning: scenarios differ only by case: {}",
            group.join(", ")
        );
    }
}

pub fn scenario_table(view: &ScenarioView) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data type"),
        header_cell("Scenario"),
        header_cell("Records"),
        header_cell("Uniform"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Center);
    for (kind, scenarios) in &view.statistics {
        let uniform = match view.uniform.get(kind) {
            Some(true) => Cell::new("yes").fg(Color::Green),
            Some(false) => Cell::new("no").fg(Color::Yellow),
            None => dim_cell("-"),
        };
        for (scenario, count) in scenarios {
            table.add_row(vec![
                kind_cell(kind),
                Cell::new(scenario),
                Cell::new(count),
                uniform.clone(),
            ]);
        }
    }
    table
}

pub fn print_data_types(registry: &SchemaRegistry) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Data type"),
        header_cell("Key"),
        header_cell("Property"),
        header_cell("Kind"),
        header_cell("Required"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 4, CellAlignment::Center);
    for schema in registry.iter() {
        let key = schema.kind().key_properties().join(" + ");
        for property in schema.catalog().properties() {
            table.add_row(vec![
                kind_cell(schema.name()),
                dim_cell(&key),
                Cell::new(&property.name),
                Cell::new(property.value_kind),
                required_cell(property.required),
            ]);
        }
    }
    println!("{table}");
}

fn print_issues<'a>(issues: impl Iterator<Item = &'a ImportIssue>) {
    let issues: Vec<&ImportIssue> = issues.collect();
    if issues.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Data type"),
        header_cell("Scenario"),
        header_cell("Line"),
        header_cell("Property"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            optional_cell(issue.kind.as_deref()),
            optional_cell(issue.scenario.as_deref()),
            issue.row.map_or_else(|| dim_cell("-"), Cell::new),
            optional_cell(issue.property.as_deref()),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => Cell::new("INFO").fg(Color::Blue),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn required_cell(required: bool) -> Cell {
    if required {
        Cell::new("✓").fg(Color::Green)
    } else {
        dim_cell("-")
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn kind_cell(kind: &str) -> Cell {
    Cell::new(kind)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
