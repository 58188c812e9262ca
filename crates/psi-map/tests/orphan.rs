use std::collections::BTreeMap;

use anyhow::anyhow;

use psi_map::{ColumnScanner, OrphanDetector, commit_removal};
use psi_model::{AssociationSet, ColumnPropertyAssociation};

struct FakeScanner {
    files: BTreeMap<String, Vec<String>>,
}

impl FakeScanner {
    fn with(files: &[(&str, &[&str])]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(id, cols)| {
                    (
                        (*id).to_string(),
                        cols.iter().map(|c| (*c).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }
}

impl ColumnScanner for FakeScanner {
    fn scan_columns(&self, file_id: &str) -> anyhow::Result<Vec<String>> {
        self.files
            .get(file_id)
            .cloned()
            .ok_or_else(|| anyhow!("cannot open {file_id}"))
    }
}

fn associations() -> AssociationSet {
    [
        ColumnPropertyAssociation::new("Bus", "Name", "BusName", true),
        ColumnPropertyAssociation::new("LVCB", "Manufacturer", "Mfr", false),
        ColumnPropertyAssociation::new("LVCB", "Bus", "busname", false),
    ]
    .into_iter()
    .collect()
}

#[test]
fn flags_associations_whose_header_is_removed() {
    let mut set = AssociationSet::new();
    set.replace(ColumnPropertyAssociation::new("Bus", "Name", "BusName", true));
    set.replace(ColumnPropertyAssociation::new("LVCB", "Manufacturer", "Mfr", false));

    let report =
        OrphanDetector::new().detect_in_columns(&set, "buses.csv", &["BusName", "Voltage"]);

    assert_eq!(report.len(), 1);
    assert_eq!(report.orphaned[0].target_data_type, "Bus");
    assert_eq!(report.orphaned[0].property_name, "Name");
}

#[test]
fn header_match_ignores_case_but_not_spelling() {
    let report =
        OrphanDetector::new().detect_in_columns(&associations(), "buses.csv", &[" BUSNAME "]);
    assert_eq!(report.len(), 2);

    let report =
        OrphanDetector::new().detect_in_columns(&associations(), "buses.csv", &["Bus Name"]);
    assert!(report.is_empty());
}

#[test]
fn report_groups_by_data_type() {
    let report =
        OrphanDetector::new().detect_in_columns(&associations(), "all.csv", &["busname", "MFR"]);
    let grouped = report.grouped();
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped["Bus"].len(), 1);
    assert_eq!(grouped["LVCB"].len(), 2);
}

#[test]
fn retained_headers_are_not_orphaned() {
    let report = OrphanDetector::new()
        .retaining(["BusName"])
        .detect_in_columns(&associations(), "buses.csv", &["BusName", "Mfr"]);
    assert_eq!(report.len(), 1);
    assert_eq!(report.orphaned[0].column_header, "Mfr");
}

#[test]
fn unreadable_file_contributes_no_columns() {
    let scanner = FakeScanner::with(&[("buses.csv", &["BusName"])]);
    let detector = OrphanDetector::new();

    let report = detector.detect(&associations(), "missing.csv", &scanner);
    assert!(report.scan_failed);
    assert!(report.is_empty());

    let report = detector.detect(&associations(), "buses.csv", &scanner);
    assert!(!report.scan_failed);
    assert_eq!(report.len(), 2);
}

#[test]
fn commit_removes_only_confirmed_and_unchanged_associations() {
    let mut set = associations();
    let report = OrphanDetector::new().detect_in_columns(&set, "buses.csv", &["BusName"]);
    let confirmed: Vec<_> = report
        .orphaned
        .iter()
        .filter(|a| a.target_data_type == "Bus")
        .cloned()
        .collect();

    assert_eq!(commit_removal(&mut set, &confirmed), 1);
    assert!(!set.contains("Bus", "Name"));
    assert!(set.contains("LVCB", "Bus"));
    assert_eq!(commit_removal(&mut set, &confirmed), 0);

    set.replace(ColumnPropertyAssociation::new("Bus", "Name", "Bus ID", true));
    assert_eq!(commit_removal(&mut set, &confirmed), 0);
    assert!(set.contains("Bus", "Name"));
}
