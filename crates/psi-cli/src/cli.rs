//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use psi_map::MatchMode;
use psi_model::{ImportOptions, MergeStrategy};

#[derive(Parser)]
#[command(
    name = "psi",
    version,
    about = "Map, audit and import power study CSV exports",
    long_about = "Map vendor CSV column headers onto power study properties and \
                  import the rows into a scenario-partitioned dataset.\n\n\
                  Supports buses, low-voltage breakers, arc-flash and short-circuit results."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match the columns of a CSV file against one data type.
    Automap(AutomapArgs),

    /// Preview an import without changing the dataset.
    Audit(AuditArgs),

    /// Import a CSV file into a dataset.
    Import(ImportCommandArgs),

    /// List mappings that removing a file would leave dangling.
    Orphans(OrphanArgs),

    /// Show record counts per scenario.
    Scenarios(ScenarioArgs),

    /// List the built-in data types and their properties.
    DataTypes,
}

#[derive(Args)]
pub struct AutomapArgs {
    /// CSV file whose headers are matched.
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Data type to map (Bus, LVCB, ArcFlash, ShortCircuit).
    #[arg(long = "data-type", value_name = "KIND")]
    pub data_type: String,

    /// Mapping document to update (created when missing).
    #[arg(long = "mapping", value_name = "FILE")]
    pub mapping: Option<PathBuf>,

    /// Project name for a new mapping document (default: CSV file stem).
    #[arg(long = "project")]
    pub project: Option<String>,

    /// Score at or above which a match is accepted automatically.
    #[arg(long = "accept", default_value_t = 0.60)]
    pub accept: f64,

    /// Score at or above which a match is suggested.
    #[arg(long = "floor", default_value_t = 0.40)]
    pub floor: f64,

    #[arg(long = "mode", value_enum, default_value = "hybrid")]
    pub mode: MatchModeArg,

    /// Re-score properties that are already mapped, including manual mappings.
    #[arg(long = "reevaluate")]
    pub reevaluate: bool,

    /// Write the updated mapping document back to --mapping.
    #[arg(long = "save", requires = "mapping")]
    pub save: bool,
}

/// Options shared by audit and import.
#[derive(Args, Clone, Default)]
pub struct ImportArgs {
    /// How incoming scenarios combine with existing data.
    #[arg(long = "strategy", value_enum, default_value = "merge")]
    pub strategy: StrategyArg,

    /// Import only these scenarios (repeatable).
    #[arg(long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Rename a scenario on import (repeatable).
    #[arg(long = "rename", value_name = "FROM=TO", value_parser = parse_rename)]
    pub renames: Vec<(String, String)>,

    /// Keep rows whose mapped values are all empty.
    #[arg(long = "keep-blank-rows")]
    pub keep_blank_rows: bool,

    /// Keep surrounding whitespace in values.
    #[arg(long = "no-trim")]
    pub no_trim: bool,

    /// Abort the import on the first row error.
    #[arg(long = "stop-on-first-error")]
    pub stop_on_first_error: bool,
}

impl ImportArgs {
    pub fn to_options(&self) -> ImportOptions {
        let mut options = ImportOptions::new()
            .with_strategy(self.strategy.into())
            .skip_blank_rows(!self.keep_blank_rows)
            .trim_whitespace(!self.no_trim)
            .stop_on_first_error(self.stop_on_first_error);
        if !self.scenarios.is_empty() {
            options = options.with_selected(self.scenarios.iter().cloned());
        }
        for (from, to) in &self.renames {
            options = options.with_rename(from.as_str(), to.as_str());
        }
        options
    }
}

/// Parses `FROM=TO`.
pub fn parse_rename(raw: &str) -> Result<(String, String), String> {
    let (from, to) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FROM=TO, got '{raw}'"))?;
    let (from, to) = (from.trim(), to.trim());
    if from.is_empty() || to.is_empty() {
        return Err(format!("scenario names must not be empty in '{raw}'"));
    }
    Ok((from.to_string(), to.to_string()))
}

#[derive(Args)]
pub struct AuditArgs {
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Mapping document with the column associations.
    #[arg(long = "mapping", value_name = "FILE")]
    pub mapping: PathBuf,

    /// Existing dataset to compare against.
    #[arg(long = "dataset", value_name = "FILE")]
    pub dataset: Option<PathBuf>,

    #[command(flatten)]
    pub import: ImportArgs,
}

#[derive(Args)]
pub struct ImportCommandArgs {
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    /// Mapping document with the column associations.
    #[arg(long = "mapping", value_name = "FILE")]
    pub mapping: PathBuf,

    /// Dataset file to update (created when missing).
    #[arg(long = "dataset", value_name = "FILE")]
    pub dataset: PathBuf,

    #[command(flatten)]
    pub import: ImportArgs,
}

#[derive(Args)]
pub struct OrphanArgs {
    /// CSV file, or directory of CSV sheets, slated for removal.
    #[arg(value_name = "CSV")]
    pub file: PathBuf,

    #[arg(long = "mapping", value_name = "FILE")]
    pub mapping: PathBuf,

    /// Files that stay in the project; their headers are never orphaned.
    #[arg(long = "retain", value_name = "CSV")]
    pub retain: Vec<PathBuf>,

    /// Remove the orphaned mappings and save the document.
    #[arg(long = "commit")]
    pub commit: bool,
}

#[derive(Args)]
pub struct ScenarioArgs {
    #[arg(long = "dataset", value_name = "FILE")]
    pub dataset: PathBuf,

    /// Restrict counts to one scenario.
    #[arg(long = "scenario", value_name = "NAME")]
    pub scenario: Option<String>,
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum StrategyArg {
    Replace,
    SkipExisting,
    #[default]
    Merge,
}

impl From<StrategyArg> for MergeStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Replace => Self::Replace,
            StrategyArg::SkipExisting => Self::SkipExisting,
            StrategyArg::Merge => Self::Merge,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MatchModeArg {
    Tiered,
    Hybrid,
}

impl From<MatchModeArg> for MatchMode {
    fn from(value: MatchModeArg) -> Self {
        match value {
            MatchModeArg::Tiered => Self::Tiered,
            MatchModeArg::Hybrid => Self::Hybrid,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
