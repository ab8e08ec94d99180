use crate::support;
use chrono::Utc;
use serde_json::json;
use shelfmark_core::ScheduleRequest;

pub struct Args {
    pub title: String,
    pub book_id: String,
    pub date: Option<String>,
    pub isbn: Option<String>,
    pub block: Option<String>,
    pub imprint: String,
    pub publisher: String,
    pub format: String,
    pub priority: i32,
    pub notes: String,
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
    request.priority = args.priority;
    request.notes = args.notes;
    request.now = Utc::now();

    let outcome =
        shelfmark_core::schedule(&args.store, request).unwrap_or_else(|e| support::fail(e));

    if args.json {
        let payload = json!({
            "action": "schedule",
            "storePath": args.store,
            "updated": outcome.updated,
            "autoAllocated": outcome.auto_allocated,
            "assignment": support::assignment_json(&outcome.assignment)
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        let verb = if outcome.updated {
            "Updated"
        } else {
            "Scheduled"
        };
        println!(
            "shelfmark schedule\n  {verb}: {} -> {} [{}]\n  Path: {}",
            outcome.assignment.isbn,
            outcome.assignment.book_id,
            outcome.assignment.status,
            args.store
        );
    }
}
