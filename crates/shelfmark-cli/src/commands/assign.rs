use crate::support;
use chrono::Utc;
use serde_json::json;

pub fn run(key: String, date: Option<String>, store: String, json_output: bool) {
    let assigned_date = date.as_deref().map(support::parse_date_or_exit);
    let record = shelfmark_core::assign(&store, &key, assigned_date, Utc::now())
        .unwrap_or_else(|e| support::fail(e));

    if json_output {
        let payload = json!({
            "action": "assign",
            "storePath": store,
            "assignment": support::assignment_json(&record)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "shelfmark assign\n  Assigned: {} -> {} [{}]\n  Path: {store}",
            record.isbn, record.book_id, record.status
        );
    }
}
