//! Import pipeline: delimited file to remote create calls.
//!
//! ```text
//! file ─▶ gate (extension, binary, size) ─▶ decode ─▶ row bound
//!      ─▶ header mapping ─▶ validate ─▶ defaults ─▶ POST one by one ─▶ report
//! ```
//!
//! Only outer failures abort (see [`ImportError`]). Row problems, whether
//! validation or server rejections, are collected into the [`ImportReport`]
//! as `Row {n}: {reason}` and never stop later rows.
//!
//! # Example
//!
//! ```rust,ignore
//! use campusdesk::import::import_file;
//!
//! let report = import_file(&api, EntityKind::Student, Path::new("students.csv"), limits).await?;
//! println!("{} imported, {} failed", report.success_count, report.error_count);
//! ```

pub mod defaults;

use serde::Serialize;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::api::RecordSink;
use crate::codec::{self, encode_table, Table};
use crate::config::ImportLimits;
use crate::error::{CodecResult, ImportError, ImportResult, ValidationError};
use crate::logs::{log_info, log_success, log_warning, log_warning_indent};
use crate::models::{EntityKind, Record};
use crate::validation::validate_record;

pub use defaults::apply_defaults;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Data rows are numbered from the second line of the file.
const FIRST_ROW_NUMBER: usize = 2;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// One normalized data row and whatever was wrong with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    /// Display row number (header is row 1).
    pub row_number: usize,
    pub record: Record,
    pub errors: Vec<ValidationError>,
}

impl ImportRow {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn describe_errors(&self) -> String {
        let reasons: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        format!("Row {}: {}", self.row_number, reasons.join("; "))
    }
}

/// Decoded, mapped and validated rows ready for submission.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub headers: Vec<String>,
    pub rows: Vec<ImportRow>,
    pub encoding: String,
    pub delimiter: char,
}

/// Outcome of an import.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_rows: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// `Row {n}: {reason}` for every failed row, in row order.
    pub errors: Vec<String>,
}

impl ImportReport {
    /// Whether the listing behind this import should be re-fetched.
    pub fn needs_refresh(&self) -> bool {
        self.success_count > 0
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Lower-cased extension of a file name.
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
}

/// Reject files the pipeline cannot read before decoding anything.
pub fn check_file(file_name: &str, bytes: &[u8], limits: ImportLimits) -> ImportResult<()> {
    let ext = file_extension(file_name).unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ImportError::UnsupportedExtension(file_name.to_string()));
    }
    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        return Err(ImportError::BinarySpreadsheet(file_name.to_string()));
    }
    if bytes.len() > limits.max_bytes {
        return Err(ImportError::TooLarge {
            size: bytes.len(),
            limit: limits.max_bytes,
        });
    }
    Ok(())
}

// =============================================================================
// Normalization
// =============================================================================

/// Build a record from header/cell pairs. Headers go through the kind's
/// mapping table; blank cells are left out.
pub fn normalize_row(kind: EntityKind, pairs: &[(&str, &str)]) -> Record {
    let schema = kind.schema();
    let mut record = Record::new();
    for (header, cell) in pairs {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        let field = schema.canonical_header(header);
        if field.is_empty() {
            continue;
        }
        record.insert(field, cell);
    }
    record
}

/// Map and validate every data row of a decoded table.
pub fn prepare_table(kind: EntityKind, table: &Table) -> Vec<ImportRow> {
    (0..table.rows.len())
        .map(|i| {
            let record = normalize_row(kind, &table.row_pairs(i));
            let errors = validate_record(kind, &record);
            ImportRow {
                row_number: i + FIRST_ROW_NUMBER,
                record,
                errors,
            }
        })
        .collect()
}

/// Gate, decode and validate a file without submitting anything.
pub fn prepare_rows(
    kind: EntityKind,
    file_name: &str,
    bytes: &[u8],
    limits: ImportLimits,
) -> ImportResult<PreparedImport> {
    check_file(file_name, bytes, limits)?;

    let parsed = codec::parse_bytes_auto(bytes)?;
    log_info(format!(
        "Read {} rows from {} (encoding {}, delimiter '{}')",
        parsed.table.rows.len(),
        file_name,
        parsed.encoding,
        format_delimiter(parsed.delimiter)
    ));

    if parsed.table.rows.is_empty() {
        return Err(ImportError::NoRows);
    }
    if parsed.table.rows.len() > limits.max_rows {
        return Err(ImportError::TooManyRows {
            rows: parsed.table.rows.len(),
            limit: limits.max_rows,
        });
    }

    let schema = kind.schema();
    let headers = parsed
        .table
        .headers
        .iter()
        .map(|h| schema.canonical_header(h))
        .collect();

    Ok(PreparedImport {
        headers,
        rows: prepare_table(kind, &parsed.table),
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
    })
}

fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        '\t' => "TAB",
        '|' => "|",
        _ => ",",
    }
}

// =============================================================================
// Submission
// =============================================================================

/// Submit valid rows strictly one after another. Invalid rows are counted
/// as errors without being sent.
pub async fn submit_rows<S>(sink: &S, kind: EntityKind, rows: Vec<ImportRow>) -> ImportReport
where
    S: RecordSink + ?Sized,
{
    let path = kind.create_path();
    let mut report = ImportReport {
        total_rows: rows.len(),
        ..ImportReport::default()
    };

    for mut row in rows {
        if !row.is_valid() {
            let line = row.describe_errors();
            log_warning_indent(line.clone(), 1);
            report.errors.push(line);
            report.error_count += 1;
            continue;
        }

        apply_defaults(kind, &mut row.record);

        match sink.create(path, &row.record).await {
            Ok(_) => {
                log::debug!("{}: row {} created", kind, row.row_number);
                report.success_count += 1;
            }
            Err(e) => {
                let line = format!("Row {}: {}", row.row_number, e.diagnostic());
                log_warning_indent(line.clone(), 1);
                report.errors.push(line);
                report.error_count += 1;
            }
        }
    }

    report
}

/// Run the whole pipeline over in-memory file contents.
pub async fn import_bytes<S>(
    sink: &S,
    kind: EntityKind,
    file_name: &str,
    bytes: &[u8],
    limits: ImportLimits,
) -> ImportResult<ImportReport>
where
    S: RecordSink + ?Sized,
{
    let prepared = prepare_rows(kind, file_name, bytes, limits)?;
    let invalid = prepared.rows.iter().filter(|r| !r.is_valid()).count();
    log_info(format!(
        "Importing {} {} rows ({} failed validation)",
        prepared.rows.len(),
        kind,
        invalid
    ));

    let report = submit_rows(sink, kind, prepared.rows).await;

    if report.error_count == 0 {
        log_success(format!("Imported {} {} records", report.success_count, kind));
    } else {
        log_warning(format!(
            "Imported {} {} records, {} failed",
            report.success_count, kind, report.error_count
        ));
    }
    Ok(report)
}

/// Read a file from disk and import it.
pub async fn import_file<S>(
    sink: &S,
    kind: EntityKind,
    path: &Path,
    limits: ImportLimits,
) -> ImportResult<ImportReport>
where
    S: RecordSink + ?Sized,
{
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    check_file(&file_name, &[], limits)?;

    let file = tokio::fs::File::open(path).await?;
    let size = file.metadata().await?.len();
    if size > limits.max_bytes as u64 {
        return Err(ImportError::TooLarge {
            size: usize::try_from(size).unwrap_or(usize::MAX),
            limit: limits.max_bytes,
        });
    }
    let bytes = read_capped(file, limits.max_bytes).await?;
    import_bytes(sink, kind, &file_name, &bytes, limits).await
}

/// Read at most `limit + 1` bytes; anything past `limit` is `TooLarge`.
async fn read_capped<R>(reader: R, limit: usize) -> ImportResult<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut bytes = Vec::new();
    reader
        .take(limit as u64 + 1)
        .read_to_end(&mut bytes)
        .await?;
    if bytes.len() > limit {
        return Err(ImportError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(bytes)
}

/// Header-only CSV a user can fill in for `kind`.
pub fn template(kind: EntityKind) -> CodecResult<String> {
    let labels: Vec<&str> = kind
        .schema()
        .export_columns
        .iter()
        .map(|(_, label)| *label)
        .collect();
    encode_table(&labels, Vec::<Vec<&str>>::new())
}
