//! Template library occupancy and match results

use std::collections::BTreeSet;
use std::fmt;

/// Occupied template slots in the sensor library
///
/// Rebuilt from scratch on every index read; the sensor reports occupancy as
/// 32-byte bitmap pages, each covering 256 slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateIndex {
    slots: BTreeSet<u16>,
}

impl TemplateIndex {
    /// Slots covered by one bitmap page
    pub const SLOTS_PER_PAGE: u16 = 256;

    /// Bytes in one bitmap page
    pub const PAGE_BYTES: usize = 32;

    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one occupancy bitmap page
    ///
    /// Bit `b` of byte `i` on page `p` marks slot `p * 256 + i * 8 + b`.
    /// Bytes beyond the first 32 are ignored.
    pub fn merge_page(&mut self, page: u8, bitmap: &[u8]) {
        let base = u32::from(page) * u32::from(Self::SLOTS_PER_PAGE);

        for (byte_index, byte) in bitmap.iter().take(Self::PAGE_BYTES).enumerate() {
            for bit in 0..8 {
                if byte & (1 << bit) != 0 {
                    let slot = base + (byte_index as u32) * 8 + bit;
                    // page is a u8, so the highest slot is 65535
                    self.slots.insert(slot as u16);
                }
            }
        }
    }

    pub fn contains(&self, slot: u16) -> bool {
        self.slots.contains(&slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Occupied slots in ascending order
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.slots.iter().copied()
    }

    /// Lowest slot below `capacity` that is not occupied
    pub fn first_free(&self, capacity: u16) -> Option<u16> {
        (0..capacity).find(|slot| !self.slots.contains(slot))
    }
}

impl FromIterator<u16> for TemplateIndex {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().collect(),
        }
    }
}

/// Result of a library search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchResult {
    /// Library slot of the matching template
    pub template_id: u16,

    /// Device-computed match score
    pub confidence: u16,
}

impl fmt::Display for MatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} (confidence {})", self.template_id, self.confidence)
    }
}
