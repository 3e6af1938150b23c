use std::fs;
use std::path::{Path, PathBuf};

use harvest_core::Record;
use harvest_logging::harvest_info;

use crate::persist::{write_with_fallback, PersistError};

/// UTF-8 byte-order mark; spreadsheet tools use it to detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub row_count: usize,
    pub output_path: PathBuf,
    /// Set when the requested path was busy and a fallback was used.
    pub substituted_for: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Render records as BOM-prefixed CSV: header row, then one row per record.
pub fn records_to_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(UTF8_BOM.to_vec());
    writer.write_record(Record::COLUMNS)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Io(err.into_error()))
}

/// Write `records` to `path`, falling back to a timestamped sibling when the
/// path is busy. Returns where the file actually landed.
pub fn export_records(records: &[Record], path: &Path) -> Result<ExportSummary, ExportError> {
    let bytes = records_to_csv(records)?;
    let outcome = write_with_fallback(path, &bytes)?;
    harvest_info!("wrote {} rows to {:?}", records.len(), outcome.path);
    Ok(ExportSummary {
        row_count: records.len(),
        output_path: outcome.path,
        substituted_for: outcome.substituted_for,
    })
}

/// Load an exported file back into records.
pub fn read_records(path: &Path) -> Result<Vec<Record>, ExportError> {
    let bytes = fs::read(path)?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    let mut reader = csv::ReaderBuilder::new().from_reader(body);
    reader
        .deserialize()
        .collect::<Result<Vec<Record>, csv::Error>>()
        .map_err(ExportError::from)
}
