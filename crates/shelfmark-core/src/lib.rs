//! # shelfmark-core
//!
//! ISBN block and schedule assignment engine.
//!
//! This crate provides:
//! - the ISBN-13 codec (canonical form, check digits)
//! - `Block` and `Assignment` types and the `Registry` aggregate
//! - a JSON document store with atomic replace and advisory locking
//! - the allocator: schedule, get-or-assign, assign, reserve, release
//! - bulk import with per-row partial-failure semantics
//! - availability reporting and full-table export
//!
//! It intentionally does not validate bibliographic metadata, talk to
//! registration authorities, or render anything; those concerns live with
//! the callers.
//!
//! ## Data model
//!
//! ```text
//! JSON document (on disk, one file per registry)
//!     load / save, atomic replace, lock-scoped mutation
//! Registry (deterministic in-memory projection)
//!     blocks + assignments keyed by canonical ISBN
//! ```

pub mod allocator;
pub mod assignment;
pub mod atomic;
pub mod block;
pub mod import;
pub mod isbn;
pub mod registry;
pub mod report;
pub mod store;

pub use allocator::{
    AddBlockRequest, AllocatorError, GetOrAssignOutcome, ScheduleOutcome, ScheduleRequest,
    add_block, assign, get_or_assign, release, reserve, schedule,
};
pub use assignment::{Assignment, Status};
pub use atomic::{
    AtomicMutationError, DEFAULT_LOCK_TIMEOUT_MS, MAX_LOCK_TIMEOUT_MS, MIN_LOCK_TIMEOUT_MS,
    mutate_registry, mutate_registry_with_timeout, registry_lock_path,
};
pub use block::Block;
pub use import::{
    ImportError, ImportResult, Row, RowError, RowFormat, import, parse_rows, parse_rows_from_path,
};
pub use isbn::{canonicalize, check_digit, complete, is_valid, is_well_formed};
pub use registry::{BlockUtilization, Registry, RegistryError};
pub use report::{
    AvailabilityReport, ExportFormat, ReportTotals, availability_report, export_assignments,
    render_report,
};
pub use store::{RegistryDocument, SCHEMA_VERSION, StoreError};
