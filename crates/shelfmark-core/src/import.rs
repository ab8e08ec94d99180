//! Bulk schedule ingestion with per-row partial-failure semantics.
//!
//! CSV and JSON rows deserialize into the same `Row` type before
//! processing, so behavior is identical regardless of input format. Each
//! row is one allocator call under its own lock cycle; a bad row is
//! recorded and the batch continues.

use crate::allocator::{self, AllocatorError, ScheduleRequest};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One flat schedule row. Every field is optional on the wire.
///
/// Canonical CSV columns: title, book_id, scheduled_date, isbn, imprint,
/// publisher, format, priority, notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Row {
    pub title: String,
    pub book_id: String,
    pub scheduled_date: String,
    pub isbn: String,
    pub imprint: String,
    pub publisher: String,
    pub format: String,
    pub priority: Option<i32>,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowFormat {
    Csv,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("line {0}: csv error: {1}")]
    Csv(usize, String),

    #[error("json error: {0}")]
    Json(String),
}

/// One failed row: its 1-based position, title, and the failure text.
#[derive(Debug, Clone, Serialize)]
pub struct RowError {
    pub row: usize,
    pub title: String,
    pub message: String,
}

/// Structured summary of one bulk import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportResult {
    pub processed: usize,
    pub assigned_manual: usize,
    pub assigned_auto: usize,
    pub updated: usize,
    pub errors: Vec<RowError>,
}

impl ImportResult {
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse rows from a file, deciding the format from the extension with a
/// content sniff as fallback.
pub fn parse_rows_from_path(
    path: impl AsRef<Path>,
    format: Option<RowFormat>,
) -> Result<Vec<Row>, ImportError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .map_err(|e| ImportError::Io(format!("{}: {e}", path.display())))?;
    let format = format
        .or_else(|| format_from_extension(path))
        .unwrap_or_else(|| sniff_format(&text));
    parse_rows(&text, format)
}

/// Parse rows from text in the given format.
pub fn parse_rows(text: &str, format: RowFormat) -> Result<Vec<Row>, ImportError> {
    match format {
        RowFormat::Csv => parse_csv_rows(text),
        RowFormat::Json => {
            serde_json::from_str::<Vec<Row>>(text).map_err(|e| ImportError::Json(e.to_string()))
        }
    }
}

/// Process rows sequentially, one allocator call per row.
///
/// Validation, conflict, and capacity failures are recorded per row and
/// the batch continues; lock and store failures abort immediately.
pub fn import(
    store_path: impl AsRef<Path>,
    rows: &[Row],
    now: DateTime<Utc>,
) -> Result<ImportResult, AllocatorError> {
    let store_path = store_path.as_ref();
    let mut result = ImportResult::default();

    for (index, row) in rows.iter().enumerate() {
        let row_no = index + 1;
        let record_error = |result: &mut ImportResult, message: String| {
            result.errors.push(RowError {
                row: row_no,
                title: row.title.clone(),
                message,
            });
        };

        let scheduled_date = match parse_row_date(&row.scheduled_date) {
            Ok(date) => date,
            Err(message) => {
                record_error(&mut result, message);
                continue;
            }
        };

        let mut request = ScheduleRequest::new(row.book_id.clone(), row.title.clone());
        request.scheduled_date = scheduled_date;
        request.imprint = row.imprint.clone();
        request.publisher = row.publisher.clone();
        request.format = row.format.clone();
        request.notes = row.notes.clone();
        request.now = now;
        if let Some(priority) = row.priority {
            request.priority = priority;
        }
        if !row.isbn.trim().is_empty() {
            request.manual_isbn = Some(row.isbn.trim().to_string());
        }

        match allocator::schedule(store_path, request) {
            Ok(outcome) => {
                result.processed += 1;
                if outcome.updated {
                    result.updated += 1;
                } else if outcome.auto_allocated {
                    result.assigned_auto += 1;
                } else {
                    result.assigned_manual += 1;
                }
            }
            Err(err) if err.is_infrastructure() => return Err(err),
            Err(err) => record_error(&mut result, err.to_string()),
        }
    }

    Ok(result)
}

fn parse_row_date(value: &str) -> Result<Option<NaiveDate>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("invalid scheduled_date `{value}`; expected YYYY-MM-DD"))
}

fn format_from_extension(path: &Path) -> Option<RowFormat> {
    match path.extension()?.to_str()? {
        "csv" => Some(RowFormat::Csv),
        "json" => Some(RowFormat::Json),
        _ => None,
    }
}

fn sniff_format(text: &str) -> RowFormat {
    match text.trim_start().chars().next() {
        Some('[') | Some('{') => RowFormat::Json,
        _ => RowFormat::Csv,
    }
}

// ── CSV ──

fn parse_csv_rows(text: &str) -> Result<Vec<Row>, ImportError> {
    let records = parse_csv_records(text)?;
    let mut lines = records.into_iter();
    let Some((_, header)) = lines.next() else {
        return Ok(Vec::new());
    };

    let columns: Vec<String> = header
        .iter()
        .map(|name| name.trim().to_ascii_lowercase())
        .collect();

    let mut rows = Vec::new();
    for (line_no, fields) in lines {
        let mut row = Row::default();
        for (column, value) in columns.iter().zip(fields.iter()) {
            let value = value.trim();
            match column.as_str() {
                "title" => row.title = value.to_string(),
                "book_id" => row.book_id = value.to_string(),
                "scheduled_date" => row.scheduled_date = value.to_string(),
                "isbn" => row.isbn = value.to_string(),
                "imprint" => row.imprint = value.to_string(),
                "publisher" => row.publisher = value.to_string(),
                "format" => row.format = value.to_string(),
                "priority" => {
                    if !value.is_empty() {
                        let parsed = value.parse::<i32>().map_err(|_| {
                            ImportError::Csv(
                                line_no,
                                format!("priority `{value}` is not an integer"),
                            )
                        })?;
                        row.priority = Some(parsed);
                    }
                }
                "notes" => row.notes = value.to_string(),
                _ => {}
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Minimal quoted-field CSV reader: double quotes escape, fields split on
/// commas, records on line breaks outside quotes. Returns each record
/// with its 1-based line number; blank records are skipped.
fn parse_csv_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, ImportError> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line_no = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            match ch {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                '\n' => {
                    line_no += 1;
                    field.push(ch);
                }
                _ => field.push(ch),
            }
            continue;
        }

        match ch {
            '"' => {
                if field.is_empty() {
                    in_quotes = true;
                } else {
                    return Err(ImportError::Csv(
                        line_no,
                        "unexpected quote inside unquoted field".to_string(),
                    ));
                }
            }
            ',' => {
                fields.push(std::mem::take(&mut field));
            }
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_record(&mut records, &mut fields, &mut field, record_line);
                line_no += 1;
                record_line = line_no;
            }
            '\n' => {
                finish_record(&mut records, &mut fields, &mut field, record_line);
                line_no += 1;
                record_line = line_no;
            }
            _ => field.push(ch),
        }
    }

    if in_quotes {
        return Err(ImportError::Csv(
            record_line,
            "unterminated quoted field".to_string(),
        ));
    }
    finish_record(&mut records, &mut fields, &mut field, record_line);
    Ok(records)
}

fn finish_record(
    records: &mut Vec<(usize, Vec<String>)>,
    fields: &mut Vec<String>,
    field: &mut String,
    line_no: usize,
) {
    if fields.is_empty() && field.trim().is_empty() {
        field.clear();
        return;
    }
    fields.push(std::mem::take(field));
    records.push((line_no, std::mem::take(fields)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::{AddBlockRequest, add_block};
    use crate::assignment::Status;
    use crate::registry::Registry;
    use chrono::TimeZone;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "shelfmark-import-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("temp dir should be created");
        root.join("registry.json")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0)
            .single()
            .expect("fixed time")
    }

    fn store_with_block(prefix: &str) -> PathBuf {
        let path = temp_store_path(prefix);
        add_block(
            &path,
            AddBlockRequest {
                id: Some("blk-1".to_string()),
                prefix: "978".to_string(),
                publisher_code: "123456".to_string(),
                range_start: 100,
                range_end: 109,
                publisher: "test-press".to_string(),
                now: fixed_now(),
            },
        )
        .expect("block should register");
        path
    }

    fn auto_row(book_id: &str, title: &str) -> Row {
        Row {
            title: title.to_string(),
            book_id: book_id.to_string(),
            scheduled_date: "2026-09-01".to_string(),
            ..Row::default()
        }
    }

    #[test]
    fn csv_rows_parse_with_quotes_and_missing_columns() {
        let text = "title,book_id,scheduled_date,isbn,priority\n\
                    \"Comma, Inc.\",book-a,2026-09-01,,1\n\
                    Plain Title,book-b,,9781234561000,\n";
        let rows = parse_rows(text, RowFormat::Csv).expect("csv should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Comma, Inc.");
        assert_eq!(rows[0].priority, Some(1));
        assert_eq!(rows[1].isbn, "9781234561000");
        assert!(rows[1].scheduled_date.is_empty());
        assert_eq!(rows[1].priority, None);
    }

    #[test]
    fn csv_rejects_bad_priority_and_unterminated_quotes() {
        let bad_priority = "title,priority\nBook,high\n";
        assert!(matches!(
            parse_rows(bad_priority, RowFormat::Csv),
            Err(ImportError::Csv(2, _))
        ));

        let unterminated = "title\n\"no closing quote\n";
        assert!(matches!(
            parse_rows(unterminated, RowFormat::Csv),
            Err(ImportError::Csv(_, _))
        ));
    }

    #[test]
    fn json_and_csv_rows_behave_identically() {
        let csv_text = "title,book_id,scheduled_date\nBook A,book-a,2026-09-01\n";
        let json_text = r#"[{"title":"Book A","book_id":"book-a","scheduled_date":"2026-09-01"}]"#;

        let csv_path = store_with_block("csv-parity");
        let json_path = store_with_block("json-parity");

        let csv_rows = parse_rows(csv_text, RowFormat::Csv).expect("csv should parse");
        let json_rows = parse_rows(json_text, RowFormat::Json).expect("json should parse");

        let csv_result = import(&csv_path, &csv_rows, fixed_now()).expect("csv import");
        let json_result = import(&json_path, &json_rows, fixed_now()).expect("json import");

        assert_eq!(csv_result.processed, 1);
        assert_eq!(json_result.processed, 1);
        assert_eq!(csv_result.assigned_auto, json_result.assigned_auto);

        let csv_registry = Registry::load(&csv_path).expect("registry should load");
        let json_registry = Registry::load(&json_path).expect("registry should load");
        assert_eq!(
            csv_registry
                .active_for_book("book-a")
                .map(|record| record.isbn.clone()),
            json_registry
                .active_for_book("book-a")
                .map(|record| record.isbn.clone())
        );
    }

    #[test]
    fn bad_rows_are_recorded_and_the_batch_continues() {
        let path = store_with_block("partial");

        let mut rows = vec![
            auto_row("book-1", "One"),
            auto_row("book-2", "Two"),
            auto_row("book-3", "Three"),
            auto_row("book-4", "Four"),
            auto_row("book-5", "Five"),
        ];
        rows[1].isbn = "978-bogus".to_string();
        rows[3].isbn = "9781234561001".to_string(); // wrong check digit

        let result = import(&path, &rows, fixed_now()).expect("import should finish");
        assert_eq!(result.processed, 3);
        assert_eq!(result.assigned_auto, 3);
        assert_eq!(
            result.errors.iter().map(|e| e.row).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert!(!result.ok());

        let registry = Registry::load(&path).expect("registry should load");
        for book in ["book-1", "book-3", "book-5"] {
            let record = registry
                .active_for_book(book)
                .unwrap_or_else(|| panic!("{book} should be scheduled"));
            assert_eq!(record.status, Status::Scheduled);
        }
        assert!(registry.active_for_book("book-2").is_none());
        assert!(registry.active_for_book("book-4").is_none());
    }

    #[test]
    fn reimporting_a_known_book_counts_as_updated() {
        let path = store_with_block("update-count");
        let rows = vec![auto_row("book-1", "One")];
        let first = import(&path, &rows, fixed_now()).expect("first import");
        assert_eq!(first.assigned_auto, 1);

        let second = import(&path, &rows, fixed_now()).expect("second import");
        assert_eq!(second.processed, 1);
        assert_eq!(second.updated, 1);
        assert_eq!(second.assigned_auto, 0);
    }

    #[test]
    fn invalid_dates_are_row_local_failures() {
        let path = store_with_block("bad-date");
        let mut rows = vec![auto_row("book-1", "One"), auto_row("book-2", "Two")];
        rows[0].scheduled_date = "next tuesday".to_string();

        let result = import(&path, &rows, fixed_now()).expect("import should finish");
        assert_eq!(result.processed, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 1);
        assert!(result.errors[0].message.contains("scheduled_date"));
    }

    #[test]
    fn parse_rows_from_path_uses_extension_then_sniffs() {
        let dir = std::env::temp_dir().join(format!(
            "shelfmark-import-sniff-{}-{}",
            std::process::id(),
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos()
        ));
        fs::create_dir_all(&dir).expect("temp dir should be created");

        let csv_path = dir.join("rows.csv");
        fs::write(&csv_path, "title,book_id\nBook,book-a\n").expect("csv fixture");
        let rows = parse_rows_from_path(&csv_path, None).expect("csv path should parse");
        assert_eq!(rows[0].book_id, "book-a");

        let dat_path = dir.join("rows.dat");
        fs::write(&dat_path, r#"[{"title":"Book","book_id":"book-b"}]"#).expect("json fixture");
        let rows = parse_rows_from_path(&dat_path, None).expect("sniffed json should parse");
        assert_eq!(rows[0].book_id, "book-b");

        let _ = fs::remove_dir_all(dir);
    }
}
