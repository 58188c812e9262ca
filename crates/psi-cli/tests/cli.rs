//! Integration tests for argument handling and command runners.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;

use psi_cli::cli::{
    AutomapArgs, Cli, Command, ImportArgs, ImportCommandArgs, MatchModeArg, OrphanArgs,
    ScenarioArgs, StrategyArg, parse_rename,
};
use psi_cli::commands::{run_automap, run_import, run_orphans, run_scenarios};
use psi_cli::summary::{automap_table, import_table, scenario_table};
use psi_map::load_document;
use psi_model::MergeStrategy;

const ARC_FLASH_CSV: &str = "Id,Scenario,IncidentEnergy,PPECategory\n\
B1,Max,4.2,2\n\
B2,Max,1.5,1\n\
B1,Min,1.1,1\n";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write file");
    path
}

fn automap_args(csv: &Path, mapping: &Path) -> AutomapArgs {
    AutomapArgs {
        csv: csv.to_path_buf(),
        data_type: "ArcFlash".to_string(),
        mapping: Some(mapping.to_path_buf()),
        project: Some("Plant A".to_string()),
        accept: 0.95,
        floor: 0.40,
        mode: MatchModeArg::Hybrid,
        reevaluate: false,
        save: true,
    }
}

#[test]
fn parse_rename_splits_and_trims() {
    assert_eq!(
        parse_rename("Max = Main-Max").unwrap(),
        ("Max".to_string(), "Main-Max".to_string())
    );
    assert_eq!(
        parse_rename("a=b=c").unwrap(),
        ("a".to_string(), "b=c".to_string())
    );
}

#[test]
fn parse_rename_rejects_malformed_values() {
    assert!(parse_rename("Max").is_err());
    assert!(parse_rename("=Main").is_err());
    assert!(parse_rename("Max= ").is_err());
}

#[test]
fn import_args_build_options() {
    let args = ImportArgs {
        strategy: StrategyArg::Replace,
        scenarios: vec!["Max".to_string()],
        renames: vec![("Max".to_string(), "Main-Max".to_string())],
        keep_blank_rows: true,
        no_trim: false,
        stop_on_first_error: true,
    };
    let options = args.to_options();
    assert_eq!(options.merge_strategy, MergeStrategy::Replace);
    assert!(options.is_selected("Max"));
    assert!(!options.is_selected("Min"));
    assert_eq!(options.renamed("Max"), "Main-Max");
    assert!(!options.skip_blank_rows);
    assert!(options.trim_whitespace);
    assert!(options.stop_on_first_error);
}

#[test]
fn default_import_args_select_everything() {
    let options = ImportArgs::default().to_options();
    assert_eq!(options.merge_strategy, MergeStrategy::Merge);
    assert!(options.is_selected("anything"));
    assert!(options.skip_blank_rows);
}

#[test]
fn import_command_parses_flags() {
    let cli = Cli::try_parse_from([
        "psi",
        "import",
        "x.csv",
        "--mapping",
        "m.json",
        "--dataset",
        "d.json",
        "--strategy",
        "skip-existing",
        "--rename",
        "Max=Main-Max",
        "--scenario",
        "Max",
    ])
    .expect("parse");
    let Command::Import(args) = cli.command else {
        panic!("expected import command");
    };
    assert_eq!(args.csv, PathBuf::from("x.csv"));
    assert_eq!(args.dataset, PathBuf::from("d.json"));
    let options = args.import.to_options();
    assert_eq!(options.merge_strategy, MergeStrategy::SkipExisting);
    assert_eq!(options.renamed("Max"), "Main-Max");
    assert!(options.is_selected("Max"));
}

#[test]
fn save_requires_mapping() {
    let result = Cli::try_parse_from(["psi", "automap", "x.csv", "--data-type", "Bus", "--save"]);
    assert!(result.is_err());
}

#[test]
fn rename_without_separator_is_rejected() {
    let result = Cli::try_parse_from([
        "psi",
        "audit",
        "x.csv",
        "--mapping",
        "m.json",
        "--rename",
        "Max",
    ]);
    assert!(result.is_err());
}

#[test]
fn automap_import_and_scenarios_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let csv = write(dir.path(), "arcflash.csv", ARC_FLASH_CSV);
    let mapping = dir.path().join("mapping.json");
    let dataset = dir.path().join("data").join("dataset.json");

    let summary = run_automap(&automap_args(&csv, &mapping)).expect("automap");
    assert_eq!(summary.accepted.len(), 4);
    assert!(automap_table(&summary).to_string().contains("IncidentEnergy"));
    let document = load_document(&mapping).expect("saved mapping");
    assert_eq!(document.project, "Plant A");
    assert_eq!(document.associations().len(), 4);

    let report = run_import(&ImportCommandArgs {
        csv: csv.clone(),
        mapping: mapping.clone(),
        dataset: dataset.clone(),
        import: ImportArgs {
            renames: vec![("Max".to_string(), "Main-Max".to_string())],
            ..ImportArgs::default()
        },
    })
    .expect("import");
    assert!(report.is_clean(), "{:?}", report.errors);
    assert_eq!(report.inserted(), 3);
    assert!(import_table(&report).to_string().contains("Main-Max"));
    assert!(dataset.exists());

    let view = run_scenarios(&ScenarioArgs {
        dataset: dataset.clone(),
        scenario: None,
    })
    .expect("scenarios");
    assert_eq!(view.statistics["ArcFlash"]["Main-Max"], 2);
    assert_eq!(view.statistics["ArcFlash"]["Min"], 1);
    assert_eq!(view.uniform.get("ArcFlash"), Some(&false));
    assert!(scenario_table(&view).to_string().contains("Min"));

    let only_min = run_scenarios(&ScenarioArgs {
        dataset,
        scenario: Some("Min".to_string()),
    })
    .expect("scenario filter");
    assert_eq!(only_min.statistics["ArcFlash"]["Min"], 1);
    assert!(!only_min.statistics["ArcFlash"].contains_key("Main-Max"));
}

#[test]
fn scenarios_require_existing_dataset() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = run_scenarios(&ScenarioArgs {
        dataset: dir.path().join("missing.json"),
        scenario: None,
    });
    assert!(result.is_err());
}

#[test]
fn orphans_commit_removes_dangling_mappings() {
    let dir = tempfile::tempdir().expect("temp dir");
    let csv = write(dir.path(), "arcflash.csv", ARC_FLASH_CSV);
    let mapping = dir.path().join("mapping.json");
    run_automap(&automap_args(&csv, &mapping)).expect("automap");

    let retained = write(dir.path(), "ids.csv", "Id,Scenario\nB1,Max\n");
    let preview = run_orphans(&OrphanArgs {
        file: csv.clone(),
        mapping: mapping.clone(),
        retain: vec![retained.clone()],
        commit: false,
    })
    .expect("preview");
    assert_eq!(preview.report.orphaned.len(), 2);
    assert_eq!(preview.removed, None);
    assert_eq!(load_document(&mapping).unwrap().associations().len(), 4);

    let committed = run_orphans(&OrphanArgs {
        file: csv,
        mapping: mapping.clone(),
        retain: vec![retained],
        commit: true,
    })
    .expect("commit");
    assert_eq!(committed.removed, Some(2));
    let document = load_document(&mapping).unwrap();
    assert_eq!(document.associations().len(), 2);
    assert!(document.updated_at.is_some());
}
