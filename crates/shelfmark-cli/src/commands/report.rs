use crate::cli::ReportFormatArg;
use crate::support;
use shelfmark_core::{ExportFormat, availability_report, render_report};

pub fn run(format: ReportFormatArg, store: String) {
    let (registry, path) = support::load_registry_or_exit(&store);
    let report = availability_report(&registry);

    match format {
        ReportFormatArg::Text => {
            println!(
                "shelfmark report\n  Path: {}\n  Blocks: {}",
                path.display(),
                report.per_block.len()
            );
            for block in &report.per_block {
                println!(
                    "  - {} {}-{}: {}/{} available ({} scheduled, {} assigned, {} reserved)",
                    block.block_id,
                    block.prefix,
                    block.publisher_code,
                    block.available,
                    block.capacity,
                    block.scheduled,
                    block.assigned,
                    block.reserved,
                );
            }
            println!(
                "  Totals: {} available, {} reserved, {} scheduled, {} assigned ({} external)",
                report.totals.available,
                report.totals.reserved,
                report.totals.scheduled,
                report.totals.assigned,
                report.totals.external,
            );
        }
        ReportFormatArg::Json => {
            let rendered = render_report(&report, ExportFormat::Json).unwrap_or_else(|e| {
                eprintln!("error: {e}");
                std::process::exit(2);
            });
            println!("{rendered}");
        }
        ReportFormatArg::Csv => {
            let rendered = render_report(&report, ExportFormat::Csv).unwrap_or_else(|e| {
                eprintln!("error: {e}");
                std::process::exit(2);
            });
            print!("{rendered}");
        }
    }
}
