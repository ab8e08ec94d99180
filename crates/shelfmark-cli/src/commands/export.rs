use crate::cli::ExportFormatArg;
use crate::support;
use shelfmark_core::{ExportFormat, export_assignments};

pub fn run(format: ExportFormatArg, store: String) {
    let (registry, _path) = support::load_registry_or_exit(&store);

    let format = match format {
        ExportFormatArg::Json => ExportFormat::Json,
        ExportFormatArg::Csv => ExportFormat::Csv,
    };
    let rendered = export_assignments(&registry, format).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(2);
    });

    match format {
        ExportFormat::Json => println!("{rendered}"),
        ExportFormat::Csv => print!("{rendered}"),
    }
}
