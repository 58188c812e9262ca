use std::fs;

use psi_ingest::{CsvColumnScanner, read_csv_headers, read_csv_table, source_columns};
use psi_map::{ColumnScanner, OrphanDetector};
use psi_model::{AssociationSet, ColumnPropertyAssociation};

#[test]
fn reads_table_with_line_numbers() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("buses.csv");
    fs::write(&path, "\u{feff}Bus  Name,kV\nB1, 13.8\nB2\n").expect("write");

    let table = read_csv_table(&path).expect("read csv");
    assert_eq!(table.headers, ["Bus Name", "kV"]);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].line, 2);
    assert_eq!(table.rows[0].values, ["B1", " 13.8"]);
    assert_eq!(table.rows[1].values, ["B2", ""]);

    let columns = source_columns(&table, "buses.csv");
    assert_eq!(columns[0].name, "Bus Name");
    assert_eq!(columns[0].sample_non_empty_count, 2);
    assert_eq!(columns[1].sample_non_empty_count, 1);
}

#[test]
fn scanner_reads_every_sheet_of_a_workbook_directory() {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("buses.csv"), "BusName,Voltage\n").expect("write");
    fs::write(dir.path().join("breakers.CSV"), "Id,Mfr\n").expect("write");
    fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

    let file_id = dir.path().to_string_lossy().to_string();
    let headers = CsvColumnScanner.scan_columns(&file_id).expect("scan");
    assert_eq!(headers, ["BusName", "Id", "Mfr", "Voltage"]);

    let single = dir.path().join("buses.csv");
    assert_eq!(read_csv_headers(&single).unwrap(), ["BusName", "Voltage"]);
}

#[test]
fn orphans_from_a_file_on_disk() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("buses.csv");
    fs::write(&path, "BusName,Voltage\nB1,13.8\n").expect("write");

    let associations: AssociationSet = [
        ColumnPropertyAssociation::new("Bus", "Name", "BusName", true),
        ColumnPropertyAssociation::new("LVCB", "Manufacturer", "Mfr", false),
    ]
    .into_iter()
    .collect();

    let detector = OrphanDetector::new();
    let report = detector.detect(&associations, &path.to_string_lossy(), &CsvColumnScanner);
    assert_eq!(report.len(), 1);
    assert_eq!(report.orphaned[0].property_name, "Name");

    let missing = dir.path().join("gone.csv");
    let report = detector.detect(&associations, &missing.to_string_lossy(), &CsvColumnScanner);
    assert!(report.scan_failed);
}
