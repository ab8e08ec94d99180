use chrono::NaiveDate;
use serde_json::{Value, json};
use shelfmark_core::{AllocatorError, Assignment, Registry, Status};
use std::path::PathBuf;

/// Exit code taxonomy: 1 for request-local failures (validation,
/// conflict, capacity), 2 for lock/store infrastructure failures.
pub fn exit_code(err: &AllocatorError) -> i32 {
    if err.is_infrastructure() { 2 } else { 1 }
}

pub fn fail(err: AllocatorError) -> ! {
    let code = exit_code(&err);
    eprintln!("error: {err}");
    std::process::exit(code);
}

/// Load a read-only snapshot of the registry. A missing store reads as
/// empty; a corrupt one is an I/O failure.
pub fn load_registry_or_exit(store: &str) -> (Registry, PathBuf) {
    let path = PathBuf::from(store);
    let registry = Registry::load(&path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        std::process::exit(2);
    });
    (registry, path)
}

pub fn parse_date_or_exit(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|_| {
        eprintln!("error: invalid date `{value}`; expected YYYY-MM-DD");
        std::process::exit(1);
    })
}

pub fn parse_status_or_exit(value: &str) -> Status {
    value.parse().unwrap_or_else(|e: String| {
        eprintln!("error: {e}");
        std::process::exit(1);
    })
}

pub fn assignment_json(record: &Assignment) -> Value {
    json!({
        "isbn": record.isbn,
        "bookId": record.book_id,
        "title": record.title,
        "status": record.status.as_str(),
        "priority": record.priority,
        "imprint": record.imprint,
        "publisher": record.publisher,
        "format": record.format,
        "notes": record.notes,
        "scheduledDate": record.scheduled_date.map(|d| d.to_string()),
        "assignedDate": record.assigned_date.map(|d| d.to_string()),
        "external": record.external
    })
}
