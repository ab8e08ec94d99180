use crate::cli::ImportFormatArg;
use crate::support;
use chrono::Utc;
use serde_json::json;
use shelfmark_core::{ImportError, RowFormat, import, parse_rows_from_path};

pub fn run(
    file: String,
    format: Option<ImportFormatArg>,
    show_errors: bool,
    store: String,
    json_output: bool,
) {
    let format = format.map(|arg| match arg {
        ImportFormatArg::Csv => RowFormat::Csv,
        ImportFormatArg::Json => RowFormat::Json,
    });

    let rows = parse_rows_from_path(&file, format).unwrap_or_else(|e| {
        let code = match e {
            ImportError::Io(_) => 2,
            _ => 1,
        };
        eprintln!("error: {e}");
        std::process::exit(code);
    });

    let result = import(&store, &rows, Utc::now()).unwrap_or_else(|e| support::fail(e));

    if show_errors {
        for error in &result.errors {
            eprintln!("row {}: {} ({})", error.row, error.message, error.title);
        }
    }

    if json_output {
        let payload = json!({
            "action": "import-schedule",
            "storePath": store,
            "file": file,
            "rows": rows.len(),
            "result": serde_json::to_value(&result).expect("json serialization")
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "shelfmark import-schedule\n  File: {file}\n  Rows: {}\n  Processed: {}\n  Auto: {}\n  Manual: {}\n  Updated: {}\n  Errors: {}\n  Path: {store}",
            rows.len(),
            result.processed,
            result.assigned_auto,
            result.assigned_manual,
            result.updated,
            result.errors.len(),
        );
    }

    if !result.ok() {
        std::process::exit(1);
    }
}
