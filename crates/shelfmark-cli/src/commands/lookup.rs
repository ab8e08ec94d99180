use crate::support;
use serde_json::json;

pub fn run(book_id: Option<String>, isbn: Option<String>, store: String, json_output: bool) {
    let (registry, path) = support::load_registry_or_exit(&store);

    let record = match (&book_id, &isbn) {
        (Some(book), None) => registry.active_for_book(book).cloned(),
        (None, Some(raw)) => {
            shelfmark_core::canonicalize(raw).and_then(|c| registry.assignment(&c).cloned())
        }
        _ => {
            eprintln!("error: exactly one of --book-id or --isbn is required");
            std::process::exit(1);
        }
    };
    let key = book_id.or(isbn).unwrap_or_default();

    match record {
        Some(record) => {
            if json_output {
                let payload = json!({
                    "action": "lookup",
                    "storePath": path.display().to_string(),
                    "found": true,
                    "assignment": support::assignment_json(&record)
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&payload).expect("json serialization")
                );
            } else {
                println!(
                    "shelfmark lookup\n  Found: {} -> {} [{}]\n  Title: {}\n  Path: {}",
                    record.isbn,
                    record.book_id,
                    record.status,
                    record.title,
                    path.display()
                );
            }
        }
        None => {
            if json_output {
                let payload = json!({
                    "action": "lookup",
                    "storePath": path.display().to_string(),
                    "found": false,
                    "key": key
                });
                println!(
                    "{}",
                    serde_json::to_string_pretty(&payload).expect("json serialization")
                );
            } else {
                eprintln!("error: not found: {key}");
            }
            std::process::exit(1);
        }
    }
}
