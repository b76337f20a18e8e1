//! Upload ingestion: turn uploaded bytes into header-ordered rows.
//!
//! DESIGN
//! ======
//! Both endpoints share this reader. CSV cells are always strings; workbook
//! cells keep their native JSON type (numbers, booleans) and dates become ISO
//! strings. Each row is a [`RawData`] map whose key order follows the header
//! row, so downstream tables show columns in file order.
//!
//! ERROR HANDLING
//! ==============
//! Only structural problems are errors here (wrong extension, undecodable
//! bytes, empty workbook). Missing or malformed cell values are left for the
//! validators, which report them per row.

use std::io::Cursor;

use calamine::{Data, Reader};
use records::RawData;
use serde_json::{Number, Value};
use sha2::{Digest, Sha256};
use time::Date;

use super::ErrorCode;

/// Julian day number of 1899-12-30, day zero of Excel's 1900 date system.
const EXCEL_EPOCH_JULIAN_DAY: i32 = 2_415_019;
const SECONDS_PER_DAY: i64 = 86_400;
/// Largest integer an `f64` represents exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
    Xls,
}

impl FileKind {
    /// Detect the kind from a filename's extension, case-insensitively.
    #[must_use]
    pub fn from_filename(filename: &str) -> Option<Self> {
        let lower = filename.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(Self::Xlsx)
        } else if lower.ends_with(".xls") {
            Some(Self::Xls)
        } else {
            None
        }
    }
}

/// Parsed upload: header names plus one map per data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<RawData>,
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unsupported file type")]
    UnsupportedFileType,
    #[error("Empty XLSX file")]
    EmptyWorkbook,
    #[error("file is not valid UTF-8")]
    Encoding,
    #[error("unreadable CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unreadable workbook: {0}")]
    Workbook(String),
}

impl ErrorCode for IngestError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnsupportedFileType => "E_UNSUPPORTED_FILE_TYPE",
            Self::EmptyWorkbook => "E_EMPTY_WORKBOOK",
            Self::Encoding => "E_ENCODING",
            Self::Csv(_) => "E_CSV",
            Self::Workbook(_) => "E_WORKBOOK",
        }
    }
}

// =============================================================================
// READERS
// =============================================================================

/// Read an upload of any kind in `accepted`.
///
/// # Errors
///
/// [`IngestError::UnsupportedFileType`] when the extension is unknown or not
/// accepted; otherwise whatever the matching reader reports.
pub fn read_upload(filename: &str, bytes: &[u8], accepted: &[FileKind]) -> Result<Table, IngestError> {
    let kind = FileKind::from_filename(filename)
        .filter(|kind| accepted.contains(kind))
        .ok_or(IngestError::UnsupportedFileType)?;
    match kind {
        FileKind::Csv => read_csv(bytes),
        FileKind::Xlsx | FileKind::Xls => read_workbook(bytes),
    }
}

/// Parse UTF-8 CSV (optional BOM). Short rows fill missing cells with `null`;
/// cells beyond the header are dropped.
///
/// # Errors
///
/// [`IngestError::Encoding`] for non-UTF-8 input, [`IngestError::Csv`] for
/// malformed records.
pub fn read_csv(bytes: &[u8]) -> Result<Table, IngestError> {
    let text = std::str::from_utf8(bytes).map_err(|_| IngestError::Encoding)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: RawData = headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let value = record
                    .get(i)
                    .map_or(Value::Null, |cell| Value::String(cell.to_owned()));
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(Table { headers, rows })
}

/// Parse the first worksheet of an Excel workbook. Rows whose cells are all
/// empty are skipped.
///
/// # Errors
///
/// [`IngestError::Workbook`] when the bytes are not a readable workbook,
/// [`IngestError::EmptyWorkbook`] when the first sheet has no header row.
pub fn read_workbook(bytes: &[u8]) -> Result<Table, IngestError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(IngestError::EmptyWorkbook)?
        .map_err(|e| IngestError::Workbook(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let header_cells = sheet_rows.next().ok_or(IngestError::EmptyWorkbook)?;
    let headers: Vec<String> = header_cells
        .iter()
        .enumerate()
        .map(|(i, cell)| header_name(i, cell))
        .collect();

    let rows = sheet_rows
        .filter(|cells| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|cells| {
            headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), cells.get(i).map_or(Value::Null, cell_value)))
                .collect()
        })
        .collect();

    Ok(Table { headers, rows })
}

/// SHA-256 of the uploaded bytes as lowercase hex.
#[must_use]
pub fn checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect::<String>()
}

// =============================================================================
// CELL CONVERSION
// =============================================================================

fn header_name(index: usize, cell: &Data) -> String {
    let name = match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_owned(),
        other => value_text(&cell_value(other)),
    };
    if name.is_empty() { format!("column_{}", index + 1) } else { name }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// JSON form of one workbook cell.
pub(crate) fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(text) | Data::DateTimeIso(text) | Data::DurationIso(text) => Value::String(text.clone()),
        Data::Bool(flag) => Value::Bool(*flag),
        Data::Int(n) => Value::Number((*n).into()),
        Data::Float(f) => float_value(*f),
        Data::DateTime(dt) => excel_serial_to_iso(dt.as_f64()).map_or(Value::Null, Value::String),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn float_value(f: f64) -> Value {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_SAFE_INTEGER {
        return Value::Number((f as i64).into());
    }
    Number::from_f64(f).map_or(Value::Null, Value::Number)
}

/// Convert an Excel 1900-system serial to `YYYY-MM-DD`, adding `THH:MM:SS`
/// when the serial carries a time of day.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub(crate) fn excel_serial_to_iso(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let total_seconds = (serial * SECONDS_PER_DAY as f64).round() as i64;
    let days = i32::try_from(total_seconds.div_euclid(SECONDS_PER_DAY)).ok()?;
    let seconds = total_seconds.rem_euclid(SECONDS_PER_DAY);

    let date = Date::from_julian_day(EXCEL_EPOCH_JULIAN_DAY.checked_add(days)?).ok()?;
    let mut iso = format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day());
    if seconds > 0 {
        iso.push_str(&format!(
            "T{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        ));
    }
    Some(iso)
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
