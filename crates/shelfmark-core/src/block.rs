//! Block: a contiguous range of identifiers owned by one publisher.
//!
//! A block enumerates title-sequence slots. The 12-digit stem of slot `n`
//! is `prefix + publisher_code + zero_pad(n)`, and the full ISBN appends
//! the computed check digit. Only stems are sequential; check digits vary.

use crate::isbn;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Total stem length: EAN prefix + publisher code + title sequence.
pub const STEM_DIGITS: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub prefix: String,
    pub publisher_code: String,
    pub range_start: u64,
    pub range_end: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publisher: String,
    #[serde(default = "default_timestamp")]
    pub created_at: DateTime<Utc>,
}

fn default_timestamp() -> DateTime<Utc> {
    Utc::now()
}

impl Block {
    /// Digits available for the title sequence after prefix and publisher code.
    pub fn slot_width(&self) -> usize {
        STEM_DIGITS
            .saturating_sub(self.prefix.len())
            .saturating_sub(self.publisher_code.len())
    }

    /// Number of identifiers in the block, inclusive of both ends.
    pub fn capacity(&self) -> u64 {
        self.range_end - self.range_start + 1
    }

    /// The 12-digit stem for slot `n`, or `None` outside the range.
    pub fn stem(&self, n: u64) -> Option<String> {
        if n < self.range_start || n > self.range_end {
            return None;
        }
        Some(format!(
            "{}{}{:0width$}",
            self.prefix,
            self.publisher_code,
            n,
            width = self.slot_width()
        ))
    }

    /// The full ISBN for slot `n`: stem plus check digit.
    pub fn isbn_for(&self, n: u64) -> Option<String> {
        isbn::complete(&self.stem(n)?)
    }

    /// Whether a canonical 13-digit identifier falls inside this block.
    pub fn contains_isbn(&self, canonical: &str) -> bool {
        if canonical.len() != 13 {
            return false;
        }
        let stem = &canonical[..STEM_DIGITS];
        let head_len = self.prefix.len() + self.publisher_code.len();
        if !stem.starts_with(&self.prefix) || !stem[self.prefix.len()..].starts_with(&self.publisher_code)
        {
            return false;
        }
        match stem[head_len..].parse::<u64>() {
            Ok(slot) => slot >= self.range_start && slot <= self.range_end,
            Err(_) => false,
        }
    }

    /// Whether two blocks cover overlapping slots of the same stem space.
    pub fn overlaps(&self, other: &Block) -> bool {
        self.prefix == other.prefix
            && self.publisher_code == other.publisher_code
            && self.range_start <= other.range_end
            && other.range_start <= self.range_end
    }
}
