use crate::support;
use chrono::Utc;
use serde_json::json;

pub fn run(isbn: String, store: String, json_output: bool) {
    let record =
        shelfmark_core::release(&store, &isbn, Utc::now()).unwrap_or_else(|e| support::fail(e));

    if json_output {
        let payload = json!({
            "action": "release",
            "storePath": store,
            "assignment": support::assignment_json(&record)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "shelfmark release\n  Released: {} [{}]\n  Path: {store}",
            record.isbn, record.status
        );
    }
}
