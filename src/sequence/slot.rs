//! Gap-filling allocation of child slots.

use crate::domain::{Segment, SegmentKind, ZettelId};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Letter slots scanned before widening: `a..=z`.
pub const LETTER_SLOTS: RangeInclusive<u64> = 1..=26;
/// Number slots scanned before widening: `1..=999`.
pub const NUMBER_SLOTS: RangeInclusive<u64> = 1..=999;

const WIDE_LETTER_SLOTS: RangeInclusive<u64> = 27..=702;
const WIDE_NUMBER_SLOTS: RangeInclusive<u64> = 1000..=9999;

/// A free child slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotAllocation {
    pub id: ZettelId,
    /// The natural range was full and a wider candidate was used.
    pub widened: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("no free child slot under {parent}: all {kind:?} slots up to {limit} are taken")]
    Exhausted {
        parent: String,
        kind: SegmentKind,
        limit: String,
    },
}

/// Returns the first child slot of `parent` not present in `existing`.
///
/// Slots are scanned in natural order (`a..z` or `1..999`, by the parent's
/// depth parity), so gaps left by deletions are reused before the range is
/// extended. When the natural range is full, a warning is logged and the
/// scan continues over two-letter slots (`aa..zz`) or four-digit numbers.
pub fn find_next_available_child_slot<'a>(
    parent: &ZettelId,
    existing: impl IntoIterator<Item = &'a ZettelId>,
) -> Result<SlotAllocation, SlotError> {
    let taken: HashSet<&ZettelId> = existing.into_iter().collect();
    let kind = parent.child_kind();
    let (natural, wide) = match kind {
        SegmentKind::Letter => (LETTER_SLOTS, WIDE_LETTER_SLOTS),
        SegmentKind::Number => (NUMBER_SLOTS, WIDE_NUMBER_SLOTS),
    };

    let free = |range: RangeInclusive<u64>| {
        range
            .map(|ordinal| parent.with_child(Segment::from_ordinal(kind, ordinal)))
            .find(|candidate| !taken.contains(candidate))
    };

    if let Some(id) = free(natural) {
        return Ok(SlotAllocation { id, widened: false });
    }

    tracing::warn!(parent = %parent, ?kind, "child slots exhausted, widening");
    let limit = Segment::from_ordinal(kind, *wide.end()).to_string();
    free(wide)
        .map(|id| SlotAllocation { id, widened: true })
        .ok_or_else(|| SlotError::Exhausted {
            parent: parent.to_string(),
            kind,
            limit,
        })
}
