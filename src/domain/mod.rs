//! Core types: ZettelId, Segment, Note

mod identifier;
mod note;

pub use identifier::{
    ParseZettelIdError, ParseZettelIdErrorKind, Segment, SegmentKind, TIMESTAMP_LEN, ZettelId,
    format_timestamp, parse_timestamp,
};
pub use note::{NOTE_EXTENSION, Note, NoteMetadata, NoteName};
