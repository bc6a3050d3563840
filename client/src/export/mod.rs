//! Export pipeline: visible rows to a date-stamped delimited file.
//!
//! Rows are read through the kind's field registry, so aliased values
//! (`personalEmail` standing in for `email`) land in the right column.

use chrono::{Local, NaiveDate};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::codec::encode_table;
use crate::error::{ExportError, ExportResult};
use crate::logs::log_success;
use crate::models::{ColumnSpec, EntityKind, Record};

/// Extension written on export files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportExtension {
    #[default]
    Csv,
    /// Delimited text under a `.xlsx` name, for consumers that expect the
    /// historic naming. The payload is still CSV.
    LegacyXlsx,
}

impl ExportExtension {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportExtension::Csv => "csv",
            ExportExtension::LegacyXlsx => "xlsx",
        }
    }
}

/// Encode rows under the given columns: a header row of labels, then one
/// line per row with every cell quoted.
pub fn render(rows: &[Record], kind: EntityKind, columns: &[ColumnSpec]) -> ExportResult<String> {
    if columns.is_empty() {
        return Err(ExportError::NoColumns);
    }

    let labels: Vec<&str> = columns.iter().map(|c| c.label.as_str()).collect();
    let lines = rows.iter().map(|row| {
        columns
            .iter()
            .map(|c| kind.resolve(row, &c.key).unwrap_or_default())
            .collect::<Vec<String>>()
    });

    Ok(encode_table(&labels, lines)?)
}

/// `{prefix}_{YYYY-MM-DD}.{ext}`
pub fn export_filename(kind: EntityKind, date: NaiveDate, extension: ExportExtension) -> String {
    format!(
        "{}_{}.{}",
        kind.schema().file_prefix,
        date.format("%Y-%m-%d"),
        extension.as_str()
    )
}

/// Rows to export: everything when nothing is selected, otherwise only the
/// selected natural keys, keeping view order.
pub fn rows_for_export(rows: &[Record], kind: EntityKind, selection: &HashSet<String>) -> Vec<Record> {
    if selection.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|r| kind.key_of(r).is_some_and(|key| selection.contains(&key)))
        .cloned()
        .collect()
}

/// Render and write an export into `dir` under today's date. Returns the
/// written path.
pub async fn write_export(
    dir: &Path,
    rows: &[Record],
    kind: EntityKind,
    columns: &[ColumnSpec],
    extension: ExportExtension,
) -> ExportResult<PathBuf> {
    let today = Local::now().date_naive();
    write_export_dated(dir, rows, kind, columns, extension, today).await
}

/// [`write_export`] with an explicit date.
pub async fn write_export_dated(
    dir: &Path,
    rows: &[Record],
    kind: EntityKind,
    columns: &[ColumnSpec],
    extension: ExportExtension,
    date: NaiveDate,
) -> ExportResult<PathBuf> {
    let content = render(rows, kind, columns)?;
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(export_filename(kind, date, extension));
    tokio::fs::write(&path, content).await?;

    log_success(format!("Exported {} {} rows to {}", rows.len(), kind, path.display()));
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportLimits;
    use crate::import::import_bytes;
    use crate::test_support::{FakeApi, Shape};
    use serde_json::json;

    fn students() -> Vec<Record> {
        [
            json!({ "admissionNumber": "A1", "name": "Jane \"JJ\" Smith", "email": "jane@x.org", "grade": 7 }),
            json!({ "admissionNumber": "A2", "name": "Lee, Ann", "personalEmail": "ann@home.org" }),
            json!({ "admissionNumber": "A3", "name": "Bob", "email": "bob@x.org" }),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
    }

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("admissionNumber", "Admission Number"),
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("email", "Email"),
        ]
    }

    #[test]
    fn test_render_quotes_every_cell() {
        let out = render(&students()[..2], EntityKind::Student, &columns()).unwrap();
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], r#""Admission Number","Name","Email""#);
        assert_eq!(lines[1], r#""A1","Jane ""JJ"" Smith","jane@x.org""#);
        assert_eq!(lines[2], r#""A2","Lee, Ann","ann@home.org""#);
    }

    #[test]
    fn test_missing_values_are_empty_cells() {
        let out = render(&students(), EntityKind::Student, &[ColumnSpec::new("grade", "Grade")]).unwrap();
        assert_eq!(out, "\"Grade\"\n\"7\"\n\"\"\n\"\"\n");
    }

    #[test]
    fn test_no_columns() {
        assert!(matches!(
            render(&students(), EntityKind::Student, &[]),
            Err(ExportError::NoColumns)
        ));
    }

    #[test]
    fn test_filename() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        assert_eq!(
            export_filename(EntityKind::Student, date, ExportExtension::Csv),
            "students_2025-01-15.csv"
        );
        assert_eq!(
            export_filename(EntityKind::Student, date, ExportExtension::LegacyXlsx),
            "students_2025-01-15.xlsx"
        );
        assert_eq!(
            export_filename(EntityKind::Administrator, date, ExportExtension::default()),
            "administrators_2025-01-15.csv"
        );
    }

    #[test]
    fn test_selection_keeps_view_order() {
        let rows = students();
        let selection: HashSet<String> = ["A3".to_string(), "A1".to_string()].into_iter().collect();

        let picked = rows_for_export(&rows, EntityKind::Student, &selection);
        let keys: Vec<_> = picked.iter().filter_map(|r| r.text("admissionNumber")).collect();
        assert_eq!(keys, vec!["A1", "A3"]);

        let all = rows_for_export(&rows, EntityKind::Student, &HashSet::new());
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();

        let path = write_export_dated(
            dir.path(),
            &students(),
            EntityKind::Student,
            &columns(),
            ExportExtension::Csv,
            date,
        )
        .await
        .unwrap();

        assert_eq!(path.file_name().unwrap(), "students_2025-01-15.csv");
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_export_then_import_round_trip() {
        let rows = students();
        let columns = EntityKind::Student.schema().default_columns();
        let exported = render(&rows, EntityKind::Student, &columns).unwrap();

        let api = FakeApi::new(Vec::new(), Shape::Bare);
        let report = import_bytes(
            &api,
            EntityKind::Student,
            "students_2025-01-15.csv",
            exported.as_bytes(),
            ImportLimits::default(),
        )
        .await
        .unwrap();

        assert_eq!(report.success_count, rows.len());
        assert_eq!(report.error_count, 0);

        let created = api.created();
        for (original, (_, imported)) in rows.iter().zip(created.iter()) {
            for field in ["admissionNumber", "name", "email"] {
                assert_eq!(
                    EntityKind::Student.resolve(original, field),
                    imported.text(field),
                    "{}",
                    field
                );
            }
        }
    }
}
