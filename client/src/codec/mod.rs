//! Delimited-text codec with encoding and delimiter auto-detection.
//!
//! Decoding follows the usual CSV rules: one line per record, fields split on
//! the delimiter, quoted ranges may contain the delimiter, and `""` inside a
//! quoted field is a literal quote. Encoding quotes every cell.

use crate::error::{CodecError, CodecResult};

/// A decoded table: the header row plus data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Pair each cell with its header. Missing trailing cells yield `""`,
    /// extra cells are dropped.
    pub fn row_pairs(&self, index: usize) -> Vec<(&str, &str)> {
        let row = match self.rows.get(index) {
            Some(row) => row,
            None => return Vec::new(),
        };
        self.headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), row.get(i).map(String::as_str).unwrap_or("")))
            .collect()
    }
}

/// Result of decoding raw bytes, with what was detected.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub table: Table,
    pub encoding: String,
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "utf-8-sig" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to text using the given encoding. Unknown encodings fall
/// back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            // chardet guessed wrong; latin text saved by a spreadsheet is the usual culprit
            Err(_) => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        },
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };
    text.trim_start_matches('\u{feff}').to_string()
}

/// Pick the delimiter occurring most often in the header line, ignoring
/// quoted cells. Comma wins ties.
pub fn detect_delimiter(content: &str) -> char {
    let header = content.lines().next().unwrap_or("");

    let mut best = (',', count_unquoted(header, ','));
    for sep in [';', '\t', '|'] {
        let count = count_unquoted(header, sep);
        if count > best.1 {
            best = (sep, count);
        }
    }
    best.0
}

/// `""` inside a quoted cell flips the flag twice, so escapes need no special case.
fn count_unquoted(line: &str, sep: char) -> usize {
    let mut quoted = false;
    line.chars()
        .filter(|&c| {
            if c == '"' {
                quoted = !quoted;
            }
            !quoted && c == sep
        })
        .count()
}

/// Decode a table from text, treating the first row as headers.
///
/// Cells are trimmed; rows where every cell is blank are skipped.
pub fn decode_table(text: &str, delimiter: char) -> CodecResult<Table> {
    let text = text.trim_start_matches('\u{feff}');
    if text.trim().is_empty() {
        return Err(CodecError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(String::is_empty) {
        return Err(CodecError::NoHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

/// Decode raw file bytes with encoding and delimiter detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> CodecResult<ParsedTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = decode_table(&content, delimiter)?;

    Ok(ParsedTable {
        table,
        encoding,
        delimiter,
    })
}

/// Encode a header row and data rows, quoting every cell.
pub fn encode_table<H, R, C>(headers: &[H], rows: R) -> CodecResult<String>
where
    H: AsRef<str>,
    R: IntoIterator<Item = Vec<C>>,
    C: AsRef<str>,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer.write_record(headers.iter().map(|h| h.as_ref()))?;
    for row in rows {
        writer.write_record(row.iter().map(|c| c.as_ref()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CodecError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::Write(e.to_string()))
}
