//! Tree derivation and slot allocation over identifier sets

mod index;
mod slot;

pub(crate) use index::addressable;
pub use index::{
    BuildOptions, FlatNode, NodeFilter, Sequence, SequenceMeta, SequenceNode, build_sequence,
    calculate_level, find_all_roots, find_all_sequences, find_children, is_direct_child, is_root,
};
pub use slot::{
    LETTER_SLOTS, NUMBER_SLOTS, SlotAllocation, SlotError, find_next_available_child_slot,
};
