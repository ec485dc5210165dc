//! Delimited file import

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use wxstore_core::TableSchema;
use wxstore_db::{DataStore, StatementKind};

use crate::IngestResult;

/// How to read the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

/// A source row that could not be inserted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// 1-based line in the source file (the header is line 1)
    pub line: u64,
    pub error: String,
}

/// Outcome of one import run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub rows_read: usize,
    pub rows_inserted: usize,
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.rows_inserted == self.rows_read
    }
}

/// Load every row of the file at `path` into the table described by `schema`
#[instrument(skip(store, schema, options), fields(table = %schema.name))]
pub fn import_csv(
    store: &mut DataStore,
    schema: &TableSchema,
    path: &Path,
    options: &CsvOptions,
) -> IngestResult<ImportReport> {
    info!(path = %path.display(), "importing file");
    let file = File::open(path)?;
    import_reader(store, schema, file, options)
}

/// Same as [`import_csv`] for any reader.
///
/// The whole input is parsed before the first insert, so a malformed file
/// leaves the table untouched. Once inserting starts, a failing row is
/// recorded in the report and the remaining rows are still attempted.
pub fn import_reader<R: Read>(
    store: &mut DataStore,
    schema: &TableSchema,
    reader: R,
    options: &CsvOptions,
) -> IngestResult<ImportReport> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let binding = schema.bind_headers(&headers)?;
    debug!(headers = headers.len(), columns = binding.width(), "headers bound");

    let records = reader.records().collect::<Result<Vec<_>, _>>()?;

    let insert = schema.insert_statement();
    let mut report = ImportReport {
        rows_read: records.len(),
        ..ImportReport::default()
    };

    for record in &records {
        let fields: Vec<&str> = record.iter().collect();
        let row = binding.project(&fields);
        match store.execute_one(StatementKind::Insert, &insert, &row) {
            Ok(_) => report.rows_inserted += 1,
            Err(e) => {
                let line = record.position().map_or(0, |p| p.line());
                warn!(line, error = %e, "row not imported");
                report.failures.push(RowFailure {
                    line,
                    error: e.to_string(),
                });
            }
        }
    }

    if report.is_complete() {
        info!(rows = report.rows_inserted, "import finished");
    } else {
        warn!(
            rows_read = report.rows_read,
            rows_inserted = report.rows_inserted,
            failed = report.failures.len(),
            "import finished with failures"
        );
    }
    Ok(report)
}
