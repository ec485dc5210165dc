//! Frame to CSV export

use std::io::Write;

use tracing::debug;
use wxstore_core::Frame;

use crate::{CsvOptions, IngestResult};

/// Write `frame` as CSV: one header row of column names, then one line per row.
///
/// Null cells are written empty.
pub fn export_csv<W: Write>(frame: &Frame, writer: W, options: &CsvOptions) -> IngestResult<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    out.write_record(frame.columns())?;
    for row in frame.rows() {
        out.write_record(row.iter().map(ToString::to_string))?;
    }
    out.flush()?;

    debug!(rows = frame.len(), "exported frame");
    Ok(())
}
