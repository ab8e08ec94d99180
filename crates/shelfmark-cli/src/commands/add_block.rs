use crate::support;
use chrono::Utc;
use serde_json::json;
use shelfmark_core::{AddBlockRequest, add_block};

#[allow(clippy::too_many_arguments)]
pub fn run(
    prefix: String,
    publisher_code: String,
    start: u64,
    end: u64,
    id: Option<String>,
    publisher: String,
    store: String,
    json_output: bool,
) {
    let block = add_block(
        &store,
        AddBlockRequest {
            id,
            prefix,
            publisher_code,
            range_start: start,
            range_end: end,
            publisher,
            now: Utc::now(),
        },
    )
    .unwrap_or_else(|e| support::fail(e));

    if json_output {
        let payload = json!({
            "action": "add-block",
            "storePath": store,
            "block": {
                "id": block.id,
                "prefix": block.prefix,
                "publisherCode": block.publisher_code,
                "rangeStart": block.range_start,
                "rangeEnd": block.range_end,
                "capacity": block.capacity(),
                "publisher": block.publisher
            }
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        println!(
            "shelfmark add-block\n  Added: {} ({}-{} slots {}..{}, {} identifiers)\n  Path: {store}",
            block.id,
            block.prefix,
            block.publisher_code,
            block.range_start,
            block.range_end,
            block.capacity(),
        );
    }
}
