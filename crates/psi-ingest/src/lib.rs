//! Loading, auditing and importing power study CSV exports.

pub mod audit;
pub mod batch;
pub mod csv_table;
pub mod discovery;
pub mod error;
pub mod reconcile;
pub mod store;
pub mod validate;

pub use audit::{
    ImportAuditResult, MappedFile, audit_batch, audit_file, import_file, map_table,
};
pub use batch::{ImportBatch, ParsedRow, SubBatch, batch_from_table};
pub use csv_table::{
    CsvColumnScanner, CsvRow, CsvTable, normalize_header, read_csv_headers, read_csv_table,
    source_columns,
};
pub use discovery::{Workbook, list_csv_files};
pub use error::{IngestError, Result};
pub use reconcile::{ImportReport, OutcomeStatus, ScenarioOutcome, reconcile};
pub use store::{load_dataset, save_dataset};
pub use validate::{PreparedBatch, PreparedGroup, prepare_batch};
