//! Registry: the aggregate root owning blocks and assignments.
//!
//! This is the memory boundary of the engine:
//! - load/save the persisted JSON document
//! - expose deterministic block/assignment queries
//! - enforce block validity and overlap rules
//!
//! Mutation of assignment state is the allocator's job; the registry only
//! offers the primitives it composes.

use crate::assignment::{Assignment, Status};
use crate::block::Block;
use crate::store::{self, RegistryDocument, StoreError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Errors raised while registering blocks.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid block {id}: {reason}")]
    InvalidBlock { id: String, reason: String },

    #[error("block id already registered: {0}")]
    DuplicateBlockId(String),

    #[error("block {id} overlaps block {other} on {prefix}-{publisher_code}")]
    BlockOverlap {
        id: String,
        other: String,
        prefix: String,
        publisher_code: String,
    },
}

/// Utilization counts for one block, recomputed on demand.
#[derive(Debug, Clone, Serialize)]
pub struct BlockUtilization {
    pub block_id: String,
    pub prefix: String,
    pub publisher_code: String,
    pub capacity: u64,
    pub available: u64,
    pub reserved: u64,
    pub scheduled: u64,
    pub assigned: u64,
}

/// Aggregate state for blocks and identifier assignments.
#[derive(Debug, Clone)]
pub struct Registry {
    schema_version: u32,
    blocks: Vec<Block>,
    assignments: BTreeMap<String, Assignment>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            schema_version: store::SCHEMA_VERSION,
            blocks: Vec::new(),
            assignments: BTreeMap::new(),
        }
    }
}

impl Registry {
    /// Build a registry from document parts.
    ///
    /// Duplicate ISBNs resolve with deterministic last-write-wins semantics,
    /// matching overlay behavior when documents are merged by hand.
    pub fn from_document(document: RegistryDocument) -> Self {
        let mut assignments = BTreeMap::new();
        for record in document.assignments {
            assignments.insert(record.isbn.clone(), record);
        }
        Self {
            schema_version: document.schema_version,
            blocks: document.blocks,
            assignments,
        }
    }

    pub fn to_document(&self) -> RegistryDocument {
        RegistryDocument {
            schema_version: self.schema_version,
            blocks: self.blocks.clone(),
            assignments: self.assignments.values().cloned().collect(),
        }
    }

    /// Load registry state from a JSON document path.
    ///
    /// A missing file is an empty registry; corrupt bytes are an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let document = store::read_document_from_path(path)?;
        Ok(Self::from_document(document))
    }

    /// Persist registry state with an atomic replace of the document.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        store::write_document_to_path(path, &self.to_document())
    }

    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    // ── Blocks ──

    /// Register a purchased range. Rejects malformed digit fields, inverted
    /// or oversized ranges, duplicate ids, and overlaps in the same stem
    /// space. Blocks are never deleted, only exhausted.
    pub fn add_block(&mut self, block: Block) -> Result<(), RegistryError> {
        validate_block(&block)?;
        if self.block(&block.id).is_some() {
            return Err(RegistryError::DuplicateBlockId(block.id));
        }
        if let Some(existing) = self.blocks.iter().find(|other| other.overlaps(&block)) {
            return Err(RegistryError::BlockOverlap {
                id: block.id,
                other: existing.id.clone(),
                prefix: block.prefix,
                publisher_code: block.publisher_code,
            });
        }
        self.blocks.push(block);
        Ok(())
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id == id)
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// The block a canonical identifier falls inside, if any.
    pub fn block_containing(&self, canonical: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.contains_isbn(canonical))
    }

    /// First free identifier in a block, scanning from `range_start` upward.
    ///
    /// Skips any slot whose record is in a non-Available status. `None`
    /// when the scan reaches `range_end` with nothing free.
    pub fn next_available_in(&self, block_id: &str) -> Option<String> {
        let block = self.block(block_id)?;
        for slot in block.range_start..=block.range_end {
            let candidate = block.isbn_for(slot)?;
            let taken = self
                .assignment(&candidate)
                .is_some_and(|record| record.status.is_active());
            if !taken {
                return Some(candidate);
            }
        }
        None
    }

    /// Per-block counts derived by cross-referencing assignments.
    pub fn utilization(&self, block_id: &str) -> Option<BlockUtilization> {
        let block = self.block(block_id)?;
        let mut reserved = 0u64;
        let mut scheduled = 0u64;
        let mut assigned = 0u64;
        for record in self.assignments.values() {
            if !block.contains_isbn(&record.isbn) {
                continue;
            }
            match record.status {
                Status::Available => {}
                Status::Reserved => reserved += 1,
                Status::Scheduled => scheduled += 1,
                Status::Assigned => assigned += 1,
            }
        }
        let capacity = block.capacity();
        Some(BlockUtilization {
            block_id: block.id.clone(),
            prefix: block.prefix.clone(),
            publisher_code: block.publisher_code.clone(),
            capacity,
            available: capacity - reserved - scheduled - assigned,
            reserved,
            scheduled,
            assigned,
        })
    }

    // ── Assignments ──

    pub fn assignment(&self, isbn: &str) -> Option<&Assignment> {
        self.assignments.get(isbn)
    }

    pub fn assignment_mut(&mut self, isbn: &str) -> Option<&mut Assignment> {
        self.assignments.get_mut(isbn)
    }

    /// Insert or replace a record by ISBN. Returns the previous value.
    pub fn upsert_assignment(&mut self, record: Assignment) -> Option<Assignment> {
        self.assignments.insert(record.isbn.clone(), record)
    }

    /// Iterate all records in deterministic ISBN order.
    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.values()
    }

    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// The active (non-Available) record booked for `book_id`, if any.
    ///
    /// The allocator keeps at most one such record per book.
    pub fn active_for_book(&self, book_id: &str) -> Option<&Assignment> {
        self.assignments
            .values()
            .find(|record| record.status.is_active() && record.book_id == book_id)
    }

    /// Whether an identifier is currently held in a non-Available status.
    pub fn is_taken(&self, isbn: &str) -> bool {
        self.assignment(isbn)
            .is_some_and(|record| record.status.is_active())
    }
}

fn validate_block(block: &Block) -> Result<(), RegistryError> {
    let invalid = |reason: String| RegistryError::InvalidBlock {
        id: block.id.clone(),
        reason,
    };

    if block.id.trim().is_empty() {
        return Err(invalid("block id must not be empty".to_string()));
    }
    if block.prefix.len() != 3 || !block.prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!(
            "prefix `{}` must be exactly 3 digits",
            block.prefix
        )));
    }
    if block.publisher_code.is_empty()
        || !block.publisher_code.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid(format!(
            "publisher code `{}` must be 1 or more digits",
            block.publisher_code
        )));
    }
    let width = block.slot_width();
    if width == 0 {
        return Err(invalid(format!(
            "prefix and publisher code `{}{}` leave no digits for the title sequence",
            block.prefix, block.publisher_code
        )));
    }
    if block.range_start > block.range_end {
        return Err(invalid(format!(
            "range start {} is past range end {}",
            block.range_start, block.range_end
        )));
    }
    let max_slot = 10u64.pow(width as u32) - 1;
    if block.range_end > max_slot {
        return Err(invalid(format!(
            "range end {} does not fit in {width} title-sequence digits",
            block.range_end
        )));
    }
    Ok(())
}
