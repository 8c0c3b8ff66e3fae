//! Fresh root identifiers for notes promoted out of a root's subtree.

use super::PlanError;
use crate::domain::{ZettelId, format_timestamp};
use chrono::{DateTime, Local, NaiveDateTime, TimeDelta, Utc};
use std::collections::HashSet;

pub const DEFAULT_TIMESTAMP_ATTEMPTS: u32 = 1000;

/// Picks an unused root timestamp.
///
/// Candidates in order: `now`, the note's creation time, then the original
/// identifier's date combined with the current time of day, stepping one
/// millisecond per attempt. `taken` holds the timestamps already in use.
pub fn allocate_root_timestamp(
    taken: &HashSet<String>,
    now: NaiveDateTime,
    created: Option<DateTime<Utc>>,
    original: Option<&ZettelId>,
    max_attempts: u32,
) -> Result<ZettelId, PlanError> {
    let free = |at: NaiveDateTime| {
        let stamp = format_timestamp(at);
        (!taken.contains(&stamp)).then(|| ZettelId::from_datetime(at))
    };

    if let Some(id) = free(now) {
        return Ok(id);
    }

    let created = created.map(|c| c.with_timezone(&Local).naive_local());
    if let Some(id) = created.and_then(free) {
        tracing::debug!(id = %id, "root timestamp from creation time");
        return Ok(id);
    }

    let date = original
        .and_then(ZettelId::created_at)
        .map_or(now.date(), |d| d.date());
    let base = date.and_time(now.time());
    for step in 0..max_attempts {
        let candidate = base + TimeDelta::milliseconds(i64::from(step));
        if let Some(id) = free(candidate) {
            tracing::debug!(id = %id, step, "root timestamp after collision");
            return Ok(id);
        }
    }

    Err(PlanError::TimestampExhausted {
        base: format_timestamp(base),
        attempts: max_attempts,
    })
}
