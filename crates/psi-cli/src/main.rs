//! psi command-line interface.

use std::io::{self, IsTerminal};

use anyhow::Result;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

use psi_cli::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use psi_cli::commands::{run_audit, run_automap, run_import, run_orphans, run_scenarios};
use psi_cli::logging::{LogConfig, LogFormat, init_logging};
use psi_cli::summary::{
    print_audit, print_automap, print_data_types, print_import, print_orphans, print_scenarios,
};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: Command) -> Result<i32> {
    match command {
        Command::Automap(args) => {
            let summary = run_automap(&args)?;
            print_automap(&summary);
            Ok(0)
        }
        Command::Audit(args) => {
            let audit = run_audit(&args)?;
            print_audit(&audit);
            Ok(if audit.can_import() { 0 } else { 1 })
        }
        Command::Import(args) => {
            let report = run_import(&args)?;
            print_import(&report);
            Ok(if report.is_clean() { 0 } else { 1 })
        }
        Command::Orphans(args) => {
            let outcome = run_orphans(&args)?;
            print_orphans(&outcome);
            Ok(0)
        }
        Command::Scenarios(args) => {
            let view = run_scenarios(&args)?;
            print_scenarios(&view);
            Ok(0)
        }
        Command::DataTypes => {
            print_data_types(&psi_model::builtin_registry()?);
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
