use crate::support;
use chrono::Utc;
use serde_json::json;
use shelfmark_core::ScheduleRequest;

pub struct Args {
    pub book_id: String,
    pub title: String,
    pub date: Option<String>,
    pub isbn: Option<String>,
    pub block: Option<String>,
    pub imprint: String,
    pub publisher: String,
    pub format: String,
    pub store: String,
    pub json: bool,
}

pub fn run(args: Args) {
    let scheduled_date = args.date.as_deref().map(support::parse_date_or_exit);

    let mut request = ScheduleRequest::new(args.book_id, args.title);
    request.scheduled_date = scheduled_date;
    request.manual_isbn = args.isbn;
    request.block_id = args.block;
    request.imprint = args.imprint;
    request.publisher = args.publisher;
    request.format = args.format;
    request.now = Utc::now();

    let outcome =
        shelfmark_core::get_or_assign(&args.store, request).unwrap_or_else(|e| support::fail(e));

    if args.json {
        let payload = json!({
            "action": "get-or-assign",
            "storePath": args.store,
            "isbn": outcome.isbn,
            "reused": outcome.reused,
            "assignment": support::assignment_json(&outcome.assignment)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        let verb = if outcome.reused { "Reused" } else { "Assigned" };
        println!(
            "shelfmark get-or-assign\n  {verb}: {} -> {} [{}]\n  Path: {}",
            outcome.isbn, outcome.assignment.book_id, outcome.assignment.status, args.store
        );
    }
}
