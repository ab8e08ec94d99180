use serde_json::json;
use shelfmark_core::Registry;
use std::path::PathBuf;

pub fn run(store: String, json_output: bool) {
    let path = PathBuf::from(store);
    let existed = path.exists();
    if !existed {
        Registry::default().save(&path).unwrap_or_else(|e| {
            eprintln!("error: failed to initialize {}: {e}", path.display());
            std::process::exit(2);
        });
    }

    if json_output {
        let payload = json!({
            "action": "init",
            "storePath": path.display().to_string(),
            "created": !existed
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    } else {
        let verb = if existed {
            "Already initialized"
        } else {
            "Initialized"
        };
        println!("shelfmark init\n  {verb}: {}", path.display());
    }
}
