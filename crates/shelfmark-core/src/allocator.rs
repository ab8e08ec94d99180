//! Allocation operations over the persisted registry.
//!
//! Every operation here is one canonical lock-scoped mutation path:
//! acquire the store lock, load the registry, decide, save, release. Each
//! is atomic from the caller's perspective, which is what upholds the
//! global-uniqueness invariant under concurrent callers.

use crate::assignment::{Assignment, Status};
use crate::atomic::{AtomicMutationError, mutate_registry};
use crate::block::Block;
use crate::isbn;
use crate::registry::{Registry, RegistryError};
use chrono::{DateTime, NaiveDate, Utc};
use std::convert::Infallible;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum AllocatorError {
    #[error("book_id is required")]
    MissingBookId,

    #[error("invalid isbn: {candidate}")]
    InvalidIsbn { candidate: String },

    #[error("isbn {isbn} is already {status} (book_id={book_id})")]
    IsbnInUse {
        isbn: String,
        book_id: String,
        status: Status,
    },

    #[error("nothing to assign for `{key}`: no scheduled or reserved record")]
    NotAssignable { key: String },

    #[error("nothing to release: {isbn} has no active assignment")]
    NotReleasable { isbn: String },

    #[error("no blocks registered; add a block or supply a manual isbn")]
    NoBlocks,

    #[error("multiple blocks registered ({candidates}); select one explicitly")]
    BlockAmbiguous { candidates: String },

    #[error("unknown block: {block_id}")]
    UnknownBlock { block_id: String },

    #[error("block {block_id} is exhausted: no available identifiers left")]
    BlockExhausted { block_id: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Atomic(#[from] AtomicMutationError<Infallible>),
}

impl AllocatorError {
    /// Store or lock failure rather than a problem with the request itself.
    /// These abort batches; request-local failures are recorded per row.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::Atomic(_))
    }
}

/// One scheduling (or get-or-assign) request.
///
/// `now` is explicit so callers and tests control every timestamp.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub book_id: String,
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub manual_isbn: Option<String>,
    pub block_id: Option<String>,
    pub imprint: String,
    pub publisher: String,
    pub format: String,
    pub priority: i32,
    pub notes: String,
    pub now: DateTime<Utc>,
}

impl ScheduleRequest {
    pub fn new(book_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            title: title.into(),
            scheduled_date: None,
            manual_isbn: None,
            block_id: None,
            imprint: String::new(),
            publisher: String::new(),
            format: String::new(),
            priority: 2,
            notes: String::new(),
            now: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub assignment: Assignment,
    /// The book already held an active identifier; its record was updated
    /// (or moved) instead of a second one being created.
    pub updated: bool,
    /// The identifier came out of a block scan rather than a manual field.
    pub auto_allocated: bool,
}

#[derive(Debug, Clone)]
pub struct GetOrAssignOutcome {
    pub isbn: String,
    pub assignment: Assignment,
    /// An active record for the book already existed; its identifier was
    /// returned unchanged. This is what keeps rebuilds stable.
    pub reused: bool,
}

/// Request to register a purchased range.
#[derive(Debug, Clone)]
pub struct AddBlockRequest {
    pub id: Option<String>,
    pub prefix: String,
    pub publisher_code: String,
    pub range_start: u64,
    pub range_end: u64,
    pub publisher: String,
    pub now: DateTime<Utc>,
}

/// Register a purchased range under the store lock.
pub fn add_block(
    path: impl AsRef<Path>,
    request: AddBlockRequest,
) -> Result<Block, AllocatorError> {
    run_mutation(path.as_ref(), |registry| {
        let id = match request.id.clone() {
            Some(id) => id,
            None => next_block_id(registry),
        };
        let block = Block {
            id,
            prefix: request.prefix.clone(),
            publisher_code: request.publisher_code.clone(),
            range_start: request.range_start,
            range_end: request.range_end,
            publisher: request.publisher.clone(),
            created_at: request.now,
        };
        registry.add_block(block.clone())?;
        Ok((block, true))
    })
}

/// Schedule one book, allocating or updating its identifier.
///
/// Manual identifiers are checksum-validated and conflict-checked; auto
/// allocation takes the lowest free identifier of the selected block. A
/// book that already holds an active identifier is updated in place, and
/// a differing manual identifier moves the booking rather than creating
/// a duplicate.
pub fn schedule(
    path: impl AsRef<Path>,
    request: ScheduleRequest,
) -> Result<ScheduleOutcome, AllocatorError> {
    let request = normalize(request)?;
    run_mutation(path.as_ref(), |registry| {
        let manual = resolve_manual(&request)?;
        let existing = registry.active_for_book(&request.book_id).cloned();

        let (target, updated, auto_allocated) = match (&existing, &manual) {
            (Some(active), Some(canonical)) => {
                if *canonical != active.isbn {
                    ensure_free_for(registry, canonical, &request.book_id)?;
                    if let Some(old) = registry.assignment_mut(&active.isbn) {
                        old.clear_booking(request.now);
                    }
                }
                (canonical.clone(), true, false)
            }
            (Some(active), None) => (active.isbn.clone(), true, false),
            (None, Some(canonical)) => {
                ensure_free_for(registry, canonical, &request.book_id)?;
                (canonical.clone(), false, false)
            }
            (None, None) => (auto_allocate(registry, &request)?, false, true),
        };

        let assignment = write_booking(registry, &target, &request, Status::Scheduled, None);
        Ok((
            ScheduleOutcome {
                assignment,
                updated,
                auto_allocated,
            },
            true,
        ))
    })
}

/// Idempotent allocate-or-reuse: the integration point for rebuilds.
///
/// An existing active record for the book returns its identifier
/// unchanged with the metadata refreshed. Otherwise this allocates like
/// `schedule` but lands directly on Assigned.
pub fn get_or_assign(
    path: impl AsRef<Path>,
    request: ScheduleRequest,
) -> Result<GetOrAssignOutcome, AllocatorError> {
    let request = normalize(request)?;
    run_mutation(path.as_ref(), |registry| {
        if let Some(active) = registry.active_for_book(&request.book_id).cloned() {
            let (assignment, changed) = refresh_metadata(registry, active, &request);
            return Ok((
                GetOrAssignOutcome {
                    isbn: assignment.isbn.clone(),
                    assignment,
                    reused: true,
                },
                changed,
            ));
        }

        let manual = resolve_manual(&request)?;
        let target = match manual {
            Some(canonical) => {
                ensure_free_for(registry, &canonical, &request.book_id)?;
                canonical
            }
            None => auto_allocate(registry, &request)?,
        };
        let assigned_date = Some(request.now.date_naive());
        let assignment = write_booking(registry, &target, &request, Status::Assigned, assigned_date);
        Ok((
            GetOrAssignOutcome {
                isbn: assignment.isbn.clone(),
                assignment,
                reused: false,
            },
            true,
        ))
    })
}

/// Confirm a Scheduled or Reserved identifier as final.
///
/// `key` is an identifier or a book id. Confirming an already Assigned
/// record is a no-op; a missing or Available record is a conflict.
pub fn assign(
    path: impl AsRef<Path>,
    key: &str,
    assigned_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> Result<Assignment, AllocatorError> {
    let key = key.trim().to_string();
    run_mutation(path.as_ref(), |registry| {
        let found = match isbn::canonicalize(&key) {
            Some(canonical) => registry.assignment(&canonical).cloned(),
            None => None,
        }
        .or_else(|| registry.active_for_book(&key).cloned());

        let Some(record) = found.filter(|record| record.status.is_active()) else {
            return Err(AllocatorError::NotAssignable { key: key.clone() });
        };
        if record.status == Status::Assigned {
            return Ok((record, false));
        }

        let date = assigned_date.unwrap_or_else(|| now.date_naive());
        let updated = {
            let live = registry
                .assignment_mut(&record.isbn)
                .ok_or_else(|| AllocatorError::NotAssignable { key: key.clone() })?;
            live.assigned_date = Some(date);
            live.set_status(Status::Assigned, now);
            live.clone()
        };
        Ok((updated, true))
    })
}

/// Protect an identifier for a future, not-yet-named project.
pub fn reserve(
    path: impl AsRef<Path>,
    raw_isbn: &str,
    now: DateTime<Utc>,
) -> Result<Assignment, AllocatorError> {
    run_mutation(path.as_ref(), |registry| {
        let canonical = valid_or_reject(raw_isbn)?;
        if let Some(record) = registry.assignment(&canonical)
            && record.status.is_active()
        {
            return Err(AllocatorError::IsbnInUse {
                isbn: canonical,
                book_id: record.book_id.clone(),
                status: record.status,
            });
        }

        let external = registry.block_containing(&canonical).is_none();
        let mut record = registry
            .assignment(&canonical)
            .cloned()
            .unwrap_or_else(|| Assignment::new(canonical.clone(), now));
        record.external = external;
        record.set_status(Status::Reserved, now);
        registry.upsert_assignment(record.clone());
        Ok((record, true))
    })
}

/// Return an identifier to the Available pool.
///
/// Clears the booking (book id and dates); the record itself is kept,
/// never physically deleted.
pub fn release(
    path: impl AsRef<Path>,
    raw_isbn: &str,
    now: DateTime<Utc>,
) -> Result<Assignment, AllocatorError> {
    run_mutation(path.as_ref(), |registry| {
        let canonical = isbn::canonicalize(raw_isbn).ok_or_else(|| {
            AllocatorError::InvalidIsbn {
                candidate: raw_isbn.to_string(),
            }
        })?;
        let releasable = registry
            .assignment(&canonical)
            .is_some_and(|record| record.status.is_active());
        if !releasable {
            return Err(AllocatorError::NotReleasable { isbn: canonical });
        }

        let cleared = {
            let live = registry
                .assignment_mut(&canonical)
                .ok_or_else(|| AllocatorError::NotReleasable {
                    isbn: canonical.clone(),
                })?;
            live.clear_booking(now);
            live.clone()
        };
        Ok((cleared, true))
    })
}

// ── Internals ──

fn run_mutation<T>(
    path: &Path,
    mutator: impl FnOnce(&mut Registry) -> Result<(T, bool), AllocatorError>,
) -> Result<T, AllocatorError> {
    match mutate_registry(path, mutator) {
        Ok(value) => Ok(value),
        Err(AtomicMutationError::Mutation(err)) => Err(err),
        Err(AtomicMutationError::LockTimeout {
            lock_path,
            waited_ms,
        }) => Err(AllocatorError::Atomic(AtomicMutationError::LockTimeout {
            lock_path,
            waited_ms,
        })),
        Err(AtomicMutationError::LockIo { lock_path, message }) => Err(AllocatorError::Atomic(
            AtomicMutationError::LockIo { lock_path, message },
        )),
        Err(AtomicMutationError::Store(source)) => {
            Err(AllocatorError::Atomic(AtomicMutationError::Store(source)))
        }
    }
}

fn normalize(mut request: ScheduleRequest) -> Result<ScheduleRequest, AllocatorError> {
    request.book_id = request.book_id.trim().to_string();
    if request.book_id.is_empty() {
        return Err(AllocatorError::MissingBookId);
    }
    Ok(request)
}

fn valid_or_reject(raw: &str) -> Result<String, AllocatorError> {
    match isbn::canonicalize(raw) {
        Some(canonical) if isbn::is_valid(&canonical) => Ok(canonical),
        _ => Err(AllocatorError::InvalidIsbn {
            candidate: raw.to_string(),
        }),
    }
}

fn resolve_manual(request: &ScheduleRequest) -> Result<Option<String>, AllocatorError> {
    match request.manual_isbn.as_deref() {
        Some(raw) if !raw.trim().is_empty() => Ok(Some(valid_or_reject(raw.trim())?)),
        _ => Ok(None),
    }
}

fn ensure_free_for(
    registry: &Registry,
    canonical: &str,
    book_id: &str,
) -> Result<(), AllocatorError> {
    if let Some(record) = registry.assignment(canonical)
        && record.status.is_active()
        && record.book_id != book_id
    {
        return Err(AllocatorError::IsbnInUse {
            isbn: canonical.to_string(),
            book_id: record.book_id.clone(),
            status: record.status,
        });
    }
    Ok(())
}

/// Block selection for auto allocation: an explicit block id wins, then a
/// sole registered block, then a sole block owned by the request's
/// publisher. Anything else needs an explicit choice.
fn auto_allocate(
    registry: &Registry,
    request: &ScheduleRequest,
) -> Result<String, AllocatorError> {
    let block_id = match request.block_id.as_deref() {
        Some(id) => {
            if registry.block(id).is_none() {
                return Err(AllocatorError::UnknownBlock {
                    block_id: id.to_string(),
                });
            }
            id.to_string()
        }
        None => {
            if registry.block_count() == 0 {
                return Err(AllocatorError::NoBlocks);
            }
            if registry.block_count() == 1 {
                registry
                    .blocks()
                    .next()
                    .map(|block| block.id.clone())
                    .ok_or(AllocatorError::NoBlocks)?
            } else {
                let owned: Vec<&Block> = registry
                    .blocks()
                    .filter(|block| {
                        !request.publisher.is_empty() && block.publisher == request.publisher
                    })
                    .collect();
                match owned.as_slice() {
                    [only] => only.id.clone(),
                    _ => {
                        let candidates = registry
                            .blocks()
                            .map(|block| block.id.as_str())
                            .collect::<Vec<_>>()
                            .join(", ");
                        return Err(AllocatorError::BlockAmbiguous { candidates });
                    }
                }
            }
        }
    };

    registry
        .next_available_in(&block_id)
        .ok_or(AllocatorError::BlockExhausted { block_id })
}

fn write_booking(
    registry: &mut Registry,
    target: &str,
    request: &ScheduleRequest,
    status: Status,
    assigned_date: Option<NaiveDate>,
) -> Assignment {
    let external = registry.block_containing(target).is_none();
    let mut record = registry
        .assignment(target)
        .cloned()
        .unwrap_or_else(|| Assignment::new(target, request.now));
    record.book_id = request.book_id.clone();
    record.title = request.title.clone();
    record.imprint = request.imprint.clone();
    record.publisher = request.publisher.clone();
    record.format = request.format.clone();
    record.notes = request.notes.clone();
    record.priority = request.priority;
    record.scheduled_date = request.scheduled_date;
    record.assigned_date = assigned_date;
    record.external = external;
    record.set_status(status, request.now);
    registry.upsert_assignment(record.clone());
    record
}

/// Refresh metadata on an existing active record without touching its
/// identifier or status. Only non-empty request fields overwrite.
fn refresh_metadata(
    registry: &mut Registry,
    active: Assignment,
    request: &ScheduleRequest,
) -> (Assignment, bool) {
    let mut record = active;
    let mut changed = false;

    if !request.title.is_empty() && record.title != request.title {
        record.title = request.title.clone();
        changed = true;
    }
    if !request.imprint.is_empty() && record.imprint != request.imprint {
        record.imprint = request.imprint.clone();
        changed = true;
    }
    if !request.publisher.is_empty() && record.publisher != request.publisher {
        record.publisher = request.publisher.clone();
        changed = true;
    }
    if !request.format.is_empty() && record.format != request.format {
        record.format = request.format.clone();
        changed = true;
    }
    if !request.notes.is_empty() && record.notes != request.notes {
        record.notes = request.notes.clone();
        changed = true;
    }
    if request.scheduled_date.is_some() && record.scheduled_date != request.scheduled_date {
        record.scheduled_date = request.scheduled_date;
        changed = true;
    }

    if changed {
        record.touch_updated_at(request.now);
        registry.upsert_assignment(record.clone());
    }
    (record, changed)
}

fn next_block_id(registry: &Registry) -> String {
    let mut seq = 1usize;
    loop {
        let candidate = format!("blk-{seq}");
        if registry.block(&candidate).is_none() {
            return candidate;
        }
        seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "shelfmark-alloc-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("temp dir should be created");
        root.join("registry.json")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 7, 12, 0, 0)
            .single()
            .expect("fixed time")
    }

    fn store_with_block(prefix: &str, start: u64, end: u64) -> PathBuf {
        let path = temp_store_path(prefix);
        add_block(
            &path,
            AddBlockRequest {
                id: Some("blk-1".to_string()),
                prefix: "978".to_string(),
                publisher_code: "123456".to_string(),
                range_start: start,
                range_end: end,
                publisher: "test-press".to_string(),
                now: fixed_now(),
            },
        )
        .expect("block should register");
        path
    }

    fn request(book_id: &str, title: &str) -> ScheduleRequest {
        let mut request = ScheduleRequest::new(book_id, title);
        request.now = fixed_now();
        request
    }

    #[test]
    fn auto_allocation_walks_the_block_then_exhausts() {
        let path = store_with_block("exhaust", 100, 102);

        let expected = ["9781234561000", "9781234561017", "9781234561024"];
        for (seq, isbn) in expected.iter().enumerate() {
            let outcome = schedule(&path, request(&format!("book-{seq}"), "Title"))
                .expect("slot should allocate");
            assert_eq!(outcome.assignment.isbn, *isbn);
            assert!(outcome.auto_allocated);
            assert!(!outcome.updated);
        }

        let err = schedule(&path, request("book-overflow", "Title"))
            .expect_err("full block must refuse");
        assert!(matches!(
            err,
            AllocatorError::BlockExhausted { block_id } if block_id == "blk-1"
        ));
    }

    #[test]
    fn manual_isbn_is_validated_and_conflict_checked() {
        let path = store_with_block("manual", 100, 102);

        let mut bad = request("book-a", "Title");
        bad.manual_isbn = Some("978123456".to_string());
        assert!(matches!(
            schedule(&path, bad),
            Err(AllocatorError::InvalidIsbn { .. })
        ));

        let mut first = request("book-a", "Title A");
        first.manual_isbn = Some("978-1-234561-01-7".to_string());
        let outcome = schedule(&path, first).expect("manual schedule should succeed");
        assert_eq!(outcome.assignment.isbn, "9781234561017");
        assert!(!outcome.assignment.external);

        let mut second = request("book-b", "Title B");
        second.manual_isbn = Some("9781234561017".to_string());
        let err = schedule(&path, second).expect_err("duplicate manual must conflict");
        assert!(matches!(
            err,
            AllocatorError::IsbnInUse { isbn, book_id, .. }
                if isbn == "9781234561017" && book_id == "book-a"
        ));

        // The failed call must leave the registry unchanged.
        let registry = Registry::load(&path).expect("registry should load");
        assert_eq!(registry.assignment_count(), 1);
        assert!(registry.active_for_book("book-b").is_none());
    }

    #[test]
    fn manual_isbn_outside_any_block_is_tracked_as_external() {
        let path = store_with_block("external", 100, 102);
        let mut req = request("book-x", "Externally purchased");
        req.manual_isbn = Some("9780306406157".to_string());
        let outcome = schedule(&path, req).expect("external manual should succeed");
        assert!(outcome.assignment.external);
    }

    #[test]
    fn rescheduling_the_same_book_updates_in_place() {
        let path = store_with_block("update", 100, 102);

        let first = schedule(&path, request("book-a", "Working title"))
            .expect("first schedule should succeed");
        let mut second = request("book-a", "Final title");
        second.scheduled_date = NaiveDate::from_ymd_opt(2026, 10, 1);
        let outcome = schedule(&path, second).expect("reschedule should succeed");

        assert!(outcome.updated);
        assert_eq!(outcome.assignment.isbn, first.assignment.isbn);
        assert_eq!(outcome.assignment.title, "Final title");

        let registry = Registry::load(&path).expect("registry should load");
        let active: Vec<_> = registry
            .assignments()
            .filter(|record| record.status.is_active())
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn differing_manual_isbn_moves_the_booking() {
        let path = store_with_block("move", 100, 102);

        schedule(&path, request("book-a", "Title")).expect("first schedule should succeed");
        let mut moved = request("book-a", "Title");
        moved.manual_isbn = Some("9781234561024".to_string());
        let outcome = schedule(&path, moved).expect("move should succeed");

        assert!(outcome.updated);
        assert_eq!(outcome.assignment.isbn, "9781234561024");

        let registry = Registry::load(&path).expect("registry should load");
        let old = registry
            .assignment("9781234561000")
            .expect("old record must remain");
        assert_eq!(old.status, Status::Available);
        assert!(old.book_id.is_empty());
        assert_eq!(
            registry
                .active_for_book("book-a")
                .map(|record| record.isbn.as_str()),
            Some("9781234561024")
        );
    }

    #[test]
    fn get_or_assign_is_idempotent_across_rebuilds() {
        let path = store_with_block("idempotent", 100, 102);

        let first = get_or_assign(&path, request("book_42", "Title"))
            .expect("first call should allocate");
        assert!(!first.reused);
        assert_eq!(first.assignment.status, Status::Assigned);

        let second = get_or_assign(&path, request("book_42", "Title"))
            .expect("second call should reuse");
        assert!(second.reused);
        assert_eq!(second.isbn, first.isbn);

        let registry = Registry::load(&path).expect("registry should load");
        let active: Vec<_> = registry
            .assignments()
            .filter(|record| record.status.is_active() && record.book_id == "book_42")
            .collect();
        assert_eq!(active.len(), 1);
    }

    #[test]
    fn released_identifier_is_reissued_lowest_first() {
        let path = store_with_block("release", 100, 102);

        let first = schedule(&path, request("book-a", "A")).expect("schedule a");
        schedule(&path, request("book-b", "B")).expect("schedule b");
        assert_eq!(first.assignment.isbn, "9781234561000");

        release(&path, "9781234561000", fixed_now()).expect("release should succeed");
        let third = schedule(&path, request("book-c", "C")).expect("schedule c");
        assert_eq!(third.assignment.isbn, "9781234561000");
    }

    #[test]
    fn release_requires_an_active_record() {
        let path = store_with_block("release-missing", 100, 102);
        assert!(matches!(
            release(&path, "9781234561000", fixed_now()),
            Err(AllocatorError::NotReleasable { .. })
        ));
        assert!(matches!(
            release(&path, "not-an-isbn", fixed_now()),
            Err(AllocatorError::InvalidIsbn { .. })
        ));
    }

    #[test]
    fn reserve_then_assign_confirms_the_identifier() {
        let path = store_with_block("reserve", 100, 102);

        let reserved =
            reserve(&path, "9781234561000", fixed_now()).expect("reserve should succeed");
        assert_eq!(reserved.status, Status::Reserved);
        assert!(reserved.book_id.is_empty());

        assert!(matches!(
            reserve(&path, "9781234561000", fixed_now()),
            Err(AllocatorError::IsbnInUse { .. })
        ));

        let confirmed = assign(&path, "9781234561000", None, fixed_now())
            .expect("assign should confirm the reservation");
        assert_eq!(confirmed.status, Status::Assigned);
        assert_eq!(confirmed.assigned_date, Some(fixed_now().date_naive()));
    }

    #[test]
    fn assign_accepts_a_book_id_key_and_rejects_missing_records() {
        let path = store_with_block("assign-key", 100, 102);

        schedule(&path, request("book-a", "Title")).expect("schedule should succeed");
        let confirmed =
            assign(&path, "book-a", None, fixed_now()).expect("book id key should resolve");
        assert_eq!(confirmed.status, Status::Assigned);

        assert!(matches!(
            assign(&path, "book-unknown", None, fixed_now()),
            Err(AllocatorError::NotAssignable { .. })
        ));
        assert!(matches!(
            assign(&path, "9781234561017", None, fixed_now()),
            Err(AllocatorError::NotAssignable { .. })
        ));
    }

    #[test]
    fn auto_allocation_without_blocks_or_selection_is_refused() {
        let path = temp_store_path("no-blocks");
        assert!(matches!(
            schedule(&path, request("book-a", "Title")),
            Err(AllocatorError::NoBlocks)
        ));

        let path = store_with_block("ambiguous", 100, 102);
        add_block(
            &path,
            AddBlockRequest {
                id: Some("blk-2".to_string()),
                prefix: "978".to_string(),
                publisher_code: "654321".to_string(),
                range_start: 0,
                range_end: 99,
                publisher: "other-press".to_string(),
                now: fixed_now(),
            },
        )
        .expect("second block should register");

        assert!(matches!(
            schedule(&path, request("book-a", "Title")),
            Err(AllocatorError::BlockAmbiguous { .. })
        ));

        let mut by_publisher = request("book-a", "Title");
        by_publisher.publisher = "other-press".to_string();
        let outcome = schedule(&path, by_publisher)
            .expect("publisher-owned block should be selected");
        assert!(outcome.assignment.isbn.starts_with("978654321"));

        let mut explicit = request("book-b", "Title");
        explicit.block_id = Some("blk-404".to_string());
        assert!(matches!(
            schedule(&path, explicit),
            Err(AllocatorError::UnknownBlock { .. })
        ));
    }
}
