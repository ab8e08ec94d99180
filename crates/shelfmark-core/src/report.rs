//! Availability reporting and full-table export.
//!
//! Pure reads over a loaded registry snapshot; no lock is taken here.

use crate::assignment::{Assignment, Status};
use crate::registry::{BlockUtilization, Registry};
use crate::store::StoreError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportTotals {
    pub available: u64,
    pub reserved: u64,
    pub scheduled: u64,
    pub assigned: u64,
    pub external: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub per_block: Vec<BlockUtilization>,
    pub totals: ReportTotals,
}

/// Derive per-block utilization and registry-wide totals.
///
/// Totals count records (block-backed and external alike); per-block rows
/// count identifiers, so block `available` includes never-touched slots.
pub fn availability_report(registry: &Registry) -> AvailabilityReport {
    let per_block: Vec<BlockUtilization> = registry
        .blocks()
        .filter_map(|block| registry.utilization(&block.id))
        .collect();

    let mut totals = ReportTotals::default();
    for block in &per_block {
        totals.available += block.available;
    }
    for record in registry.assignments() {
        match record.status {
            // Block-backed Available slots are already counted above;
            // only released external identifiers add to the pool.
            Status::Available => {
                if record.external {
                    totals.available += 1;
                }
            }
            Status::Reserved => totals.reserved += 1,
            Status::Scheduled => totals.scheduled += 1,
            Status::Assigned => totals.assigned += 1,
        }
        if record.external && record.status.is_active() {
            totals.external += 1;
        }
    }

    AvailabilityReport { per_block, totals }
}

/// Render the availability report as JSON or CSV.
pub fn render_report(
    report: &AvailabilityReport,
    format: ExportFormat,
) -> Result<String, StoreError> {
    match format {
        ExportFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| StoreError::Serialize(e.to_string())),
        ExportFormat::Csv => {
            let mut out = String::new();
            out.push_str(
                "block_id,prefix,publisher_code,capacity,available,reserved,scheduled,assigned\n",
            );
            for block in &report.per_block {
                out.push_str(&format!(
                    "{},{},{},{},{},{},{},{}\n",
                    csv_field(&block.block_id),
                    csv_field(&block.prefix),
                    csv_field(&block.publisher_code),
                    block.capacity,
                    block.available,
                    block.reserved,
                    block.scheduled,
                    block.assigned,
                ));
            }
            Ok(out)
        }
    }
}

/// Serialize the full assignment table.
pub fn export_assignments(
    registry: &Registry,
    format: ExportFormat,
) -> Result<String, StoreError> {
    match format {
        ExportFormat::Json => {
            let records: Vec<&Assignment> = registry.assignments().collect();
            serde_json::to_string_pretty(&records)
                .map_err(|e| StoreError::Serialize(e.to_string()))
        }
        ExportFormat::Csv => {
            let mut out = String::new();
            out.push_str(
                "isbn,status,book_id,title,scheduled_date,assigned_date,imprint,publisher,format,priority,notes,external\n",
            );
            for record in registry.assignments() {
                out.push_str(&format!(
                    "{},{},{},{},{},{},{},{},{},{},{},{}\n",
                    csv_field(&record.isbn),
                    record.status,
                    csv_field(&record.book_id),
                    csv_field(&record.title),
                    date_field(record.scheduled_date),
                    date_field(record.assigned_date),
                    csv_field(&record.imprint),
                    csv_field(&record.publisher),
                    csv_field(&record.format),
                    record.priority,
                    csv_field(&record.notes),
                    record.external,
                ));
            }
            Ok(out)
        }
    }
}

fn date_field(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

/// Quote a CSV field when it contains a comma, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
