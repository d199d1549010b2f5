//! Writing metrics records for plotting and analysis.
//!
//! CSV columns follow [`MetricsRecord::FIELDS`]. Absent spectral values are
//! written as empty CSV fields and as JSON `null`, never as zero.

use percolate_core::error::{PercolateError, Result};
use percolate_core::types::MetricsRecord;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

fn csv_error(e: csv::Error) -> PercolateError {
    PercolateError::Serialization(e.to_string())
}

/// Write records as CSV with a header row (also when there are no records).
pub fn write_csv<W: Write>(records: &[MetricsRecord], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if records.is_empty() {
        wtr.write_record(MetricsRecord::FIELDS).map_err(csv_error)?;
    }
    for record in records {
        wtr.serialize(record).map_err(csv_error)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write records to `path`, creating parent directories as needed.
pub fn write_csv_file(records: &[MetricsRecord], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    write_csv(records, File::create(path)?)
}

/// Read records back from CSV. Empty spectral fields become `None`.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<MetricsRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .map(|row| row.map_err(csv_error))
        .collect()
}

/// Write records as a pretty-printed JSON array.
pub fn write_json<W: Write>(records: &[MetricsRecord], writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}
