use crate::support;
use chrono::Utc;
use serde_json::json;
use shelfmark_core::Assignment;

pub struct Args {
    pub upcoming: Option<usize>,
    pub status: Option<String>,
    pub block: Option<String>,
    pub store: String,
    pub json: bool,
}

pub fn run(args: Args) {
    let (registry, path) = support::load_registry_or_exit(&args.store);

    let status = args
        .status
        .as_deref()
        .map(support::parse_status_or_exit);
    let block = args.block.as_deref().map(|id| {
        registry.block(id).cloned().unwrap_or_else(|| {
            eprintln!("error: unknown block: {id}");
            std::process::exit(1);
        })
    });

    let mut rows: Vec<&Assignment> = registry
        .assignments()
        .filter(|record| status.is_none_or(|s| record.status == s))
        .filter(|record| {
            block
                .as_ref()
                .is_none_or(|b| b.contains_isbn(&record.isbn))
        })
        .collect();

    if let Some(limit) = args.upcoming {
        let today = Utc::now().date_naive();
        rows.retain(|record| record.scheduled_date.is_some_and(|date| date >= today));
        rows.sort_by_key(|record| record.scheduled_date);
        rows.truncate(limit);
    }

    if args.json {
        let items = rows
            .iter()
            .map(|record| support::assignment_json(record))
            .collect::<Vec<_>>();
        let payload = json!({
            "action": "list",
            "storePath": path.display().to_string(),
            "count": items.len(),
            "items": items
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "shelfmark list\n  Path: {}\n  Count: {}",
            path.display(),
            rows.len()
        );
        for record in rows {
            let date = record
                .scheduled_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  - {} [{} p{}] {} {} (sched {date})",
                record.isbn, record.status, record.priority, record.book_id, record.title
            );
        }
    }
}
