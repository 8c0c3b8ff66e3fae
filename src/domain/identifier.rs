//! Folgezettel identifier: a 17-digit timestamp followed by hierarchy segments.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Width of the `YYYYMMDDHHMMSSmmm` timestamp that starts every identifier.
pub const TIMESTAMP_LEN: usize = 17;

/// The two kinds of hierarchy segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// Lowercase letters, counted in bijective base 26 (`a`..`z`, `aa`, ...).
    Letter,
    /// Decimal digits with no fixed width.
    Number,
}

impl SegmentKind {
    /// Returns the kind the generator uses at a zero-based segment position.
    ///
    /// Even positions branch with letters, odd positions enumerate with numbers.
    pub fn at_position(index: usize) -> Self {
        if index % 2 == 0 {
            SegmentKind::Letter
        } else {
            SegmentKind::Number
        }
    }

    /// Returns the other kind.
    pub fn flipped(self) -> Self {
        match self {
            SegmentKind::Letter => SegmentKind::Number,
            SegmentKind::Number => SegmentKind::Letter,
        }
    }

    fn of_char(c: char) -> Option<Self> {
        if c.is_ascii_lowercase() {
            Some(SegmentKind::Letter)
        } else if c.is_ascii_digit() {
            Some(SegmentKind::Number)
        } else {
            None
        }
    }
}

/// One letter run or digit run of an identifier's hierarchy tail.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    kind: SegmentKind,
    value: String,
}

impl Segment {
    /// Returns the first slot of the given kind: `a` or `1`.
    pub fn first(kind: SegmentKind) -> Self {
        Self::from_ordinal(kind, 1)
    }

    /// Builds the segment with the given 1-based ordinal.
    ///
    /// Ordinal 0 has no letter encoding and is clamped to 1.
    pub fn from_ordinal(kind: SegmentKind, ordinal: u64) -> Self {
        let value = match kind {
            SegmentKind::Number => ordinal.to_string(),
            SegmentKind::Letter => {
                let mut n = ordinal.max(1);
                let mut letters = Vec::new();
                while n > 0 {
                    n -= 1;
                    letters.push(b'a' + (n % 26) as u8);
                    n /= 26;
                }
                letters.reverse();
                String::from_utf8(letters).unwrap_or_default()
            }
        };
        Self { kind, value }
    }

    /// Returns the segment's kind.
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Returns the rendered value.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the 1-based position of this segment in its kind's counting order.
    ///
    /// `a` is 1, `z` is 26, `aa` is 27; numbers are their integer value.
    /// Values too large for `u64` saturate.
    pub fn ordinal(&self) -> u64 {
        match self.kind {
            SegmentKind::Number => self.value.bytes().fold(0u64, |acc, b| {
                acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
            }),
            SegmentKind::Letter => self.value.bytes().fold(0u64, |acc, b| {
                acc.saturating_mul(26).saturating_add(u64::from(b - b'a' + 1))
            }),
        }
    }

    /// Returns the segment with the same ordinal encoded as `kind`.
    pub fn with_kind(&self, kind: SegmentKind) -> Self {
        if kind == self.kind {
            self.clone()
        } else {
            Self::from_ordinal(kind, self.ordinal())
        }
    }

    /// Returns the following slot of the same kind.
    ///
    /// Numbers count without fixed width (`9` -> `10`, `09` -> `10`). Letters
    /// carry right to left and grow on overflow (`z` -> `aa`, `az` -> `ba`,
    /// `zz` -> `aaa`).
    pub fn next(&self) -> Self {
        let value = match self.kind {
            SegmentKind::Number => increment_decimal(&self.value),
            SegmentKind::Letter => increment_letters(&self.value),
        };
        Self {
            kind: self.kind,
            value,
        }
    }

    /// Length of the number without leading zeros, plus the trimmed digits.
    fn numeric_key(&self) -> (usize, &str) {
        let trimmed = self.value.trim_start_matches('0');
        (trimmed.len(), trimmed)
    }
}

fn increment_decimal(value: &str) -> String {
    let trimmed = value.trim_start_matches('0');
    let mut digits: Vec<u8> = trimmed.bytes().collect();
    let mut i = digits.len();
    loop {
        if i == 0 {
            digits.insert(0, b'1');
            break;
        }
        i -= 1;
        if digits[i] == b'9' {
            digits[i] = b'0';
        } else {
            digits[i] += 1;
            break;
        }
    }
    String::from_utf8(digits).unwrap_or_default()
}

fn increment_letters(value: &str) -> String {
    let mut letters: Vec<u8> = value.bytes().collect();
    let mut i = letters.len();
    loop {
        if i == 0 {
            letters.insert(0, b'a');
            break;
        }
        i -= 1;
        if letters[i] == b'z' {
            letters[i] = b'a';
        } else {
            letters[i] += 1;
            break;
        }
    }
    String::from_utf8(letters).unwrap_or_default()
}

impl Ord for Segment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.kind, other.kind) {
            (SegmentKind::Number, SegmentKind::Number) => self
                .numeric_key()
                .cmp(&other.numeric_key())
                .then_with(|| self.value.cmp(&other.value)),
            (SegmentKind::Letter, SegmentKind::Letter) => self
                .value
                .len()
                .cmp(&other.value.len())
                .then_with(|| self.value.cmp(&other.value)),
            (SegmentKind::Number, SegmentKind::Letter) => Ordering::Less,
            (SegmentKind::Letter, SegmentKind::Number) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Segment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.value)
    }
}

/// A note address: chronological timestamp plus hierarchy segments.
///
/// The rendering is the timestamp immediately followed by every segment
/// value, e.g. `20240101000000000a1b`. Identifiers order by timestamp, then
/// segment by segment, with number segments compared numerically so that
/// `a2` sorts before `a10`.
///
/// # Examples
///
/// ```
/// use zettel::domain::ZettelId;
///
/// let root: ZettelId = "20240101000000000".parse().unwrap();
/// let child = root.next_child();
/// assert_eq!(child.to_string(), "20240101000000000a");
/// assert_eq!(child.next_child().to_string(), "20240101000000000a1");
/// assert_eq!(child.next_sibling().unwrap().to_string(), "20240101000000000b");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ZettelId {
    timestamp: String,
    segments: Vec<Segment>,
}

impl ZettelId {
    /// Creates a root identifier from a local date-time.
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self {
            timestamp: format_timestamp(datetime),
            segments: Vec::new(),
        }
    }

    /// Returns the 17-digit timestamp.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Returns the hierarchy segments in order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the rendered segment tail after the timestamp.
    pub fn tail(&self) -> String {
        self.segments.iter().map(Segment::as_str).collect()
    }

    /// Number of segments; 0 for a root.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the root identifier (the timestamp alone).
    pub fn root(&self) -> Self {
        Self {
            timestamp: self.timestamp.clone(),
            segments: Vec::new(),
        }
    }

    /// Returns the identifier with the last segment removed.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            timestamp: self.timestamp.clone(),
            segments: rest.to_vec(),
        })
    }

    /// Returns the kind a newly generated child segment must have.
    pub fn child_kind(&self) -> SegmentKind {
        SegmentKind::at_position(self.segments.len())
    }

    /// Returns this identifier extended by one segment.
    pub fn with_child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self {
            timestamp: self.timestamp.clone(),
            segments,
        }
    }

    /// Returns the first child slot: `a` under an even depth, `1` under an odd one.
    pub fn next_child(&self) -> Self {
        self.with_child(Segment::first(self.child_kind()))
    }

    /// Returns the identifier with its last segment incremented.
    ///
    /// Roots have no sibling in this algebra.
    pub fn next_sibling(&self) -> Option<Self> {
        let (last, rest) = self.segments.split_last()?;
        let mut segments = rest.to_vec();
        segments.push(last.next());
        Some(Self {
            timestamp: self.timestamp.clone(),
            segments,
        })
    }

    /// True if `other` lies strictly below this identifier.
    pub fn is_ancestor_of(&self, other: &ZettelId) -> bool {
        self.timestamp == other.timestamp
            && other.segments.len() > self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }

    /// True if `other` extends this identifier by exactly one segment.
    pub fn is_parent_of(&self, other: &ZettelId) -> bool {
        other.segments.len() == self.segments.len() + 1 && self.is_ancestor_of(other)
    }

    /// True if segment kinds alternate letter, number, letter, ... by position.
    pub fn is_well_formed(&self) -> bool {
        self.segments
            .iter()
            .enumerate()
            .all(|(i, s)| s.kind == SegmentKind::at_position(i))
    }

    /// Moves this identifier from under `from` to under `to`.
    ///
    /// Returns `to` itself when `self == from`, and `None` when `from` is
    /// neither this identifier nor one of its ancestors. When the depth
    /// changes by an odd amount every tail segment is re-encoded to the other
    /// kind with the same ordinal, so the alternation of the tail survives
    /// the move.
    pub fn rebase(&self, from: &ZettelId, to: &ZettelId) -> Option<Self> {
        if self == from {
            return Some(to.clone());
        }
        if !from.is_ancestor_of(self) {
            return None;
        }
        let flip = (to.depth() + from.depth()) % 2 == 1;
        let mut segments = to.segments.clone();
        segments.extend(self.segments[from.depth()..].iter().map(|s| {
            if flip {
                s.with_kind(s.kind.flipped())
            } else {
                s.clone()
            }
        }));
        Some(Self {
            timestamp: to.timestamp.clone(),
            segments,
        })
    }

    /// Parses the timestamp as a local date-time.
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.timestamp)
    }
}

/// Renders a local date-time as a 17-digit `YYYYMMDDHHMMSSmmm` timestamp.
pub fn format_timestamp(datetime: NaiveDateTime) -> String {
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}{:03}",
        datetime.year(),
        datetime.month(),
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second(),
        (datetime.nanosecond() / 1_000_000).min(999)
    )
}

/// Parses a 17-digit timestamp; `None` if it is not a valid date-time.
pub fn parse_timestamp(timestamp: &str) -> Option<NaiveDateTime> {
    if timestamp.len() != TIMESTAMP_LEN || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let field = |range: std::ops::Range<usize>| timestamp[range].parse::<u32>().ok();
    let year = timestamp[0..4].parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, field(4..6)?, field(6..8)?)?.and_hms_milli_opt(
        field(8..10)?,
        field(10..12)?,
        field(12..14)?,
        field(14..17)?,
    )
}

impl Ord for ZettelId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.segments.cmp(&other.segments))
    }
}

impl PartialOrd for ZettelId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ZettelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.timestamp)?;
        for segment in &self.segments {
            f.write_str(&segment.value)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ZettelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZettelId(\"{}\")", self)
    }
}

/// The kind of error that occurred when parsing an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseZettelIdErrorKind {
    /// Fewer than 17 characters, or a non-digit inside the timestamp.
    InvalidTimestamp,
    /// A character in the tail that is neither a lowercase letter nor a digit.
    InvalidCharacter { position: usize },
}

/// Error returned when a string does not match the identifier grammar.
#[derive(Debug, Clone)]
pub struct ParseZettelIdError {
    value: String,
    kind: ParseZettelIdErrorKind,
}

impl ParseZettelIdError {
    /// Returns the invalid value that caused this error.
    pub fn invalid_value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> ParseZettelIdErrorKind {
        self.kind
    }
}

impl fmt::Display for ParseZettelIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ParseZettelIdErrorKind::InvalidTimestamp => write!(
                f,
                "invalid zettel id '{}': must start with a {}-digit timestamp",
                self.value, TIMESTAMP_LEN
            ),
            ParseZettelIdErrorKind::InvalidCharacter { position } => write!(
                f,
                "invalid zettel id '{}': unexpected character at position {}",
                self.value, position
            ),
        }
    }
}

impl std::error::Error for ParseZettelIdError {}

impl FromStr for ZettelId {
    type Err = ParseZettelIdError;

    /// Splits off the timestamp and cuts the tail into maximal same-class runs.
    ///
    /// Each run takes the kind of its characters, not the kind its position
    /// would demand, so hand-edited tails such as `1a` still parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |kind| ParseZettelIdError {
            value: s.to_string(),
            kind,
        };

        let bytes = s.as_bytes();
        if bytes.len() < TIMESTAMP_LEN || !bytes[..TIMESTAMP_LEN].iter().all(u8::is_ascii_digit)
        {
            return Err(error(ParseZettelIdErrorKind::InvalidTimestamp));
        }

        let mut segments: Vec<Segment> = Vec::new();
        for (offset, c) in s[TIMESTAMP_LEN..].char_indices() {
            let kind = SegmentKind::of_char(c).ok_or_else(|| {
                error(ParseZettelIdErrorKind::InvalidCharacter {
                    position: TIMESTAMP_LEN + offset,
                })
            })?;
            match segments.last_mut() {
                Some(last) if last.kind == kind => last.value.push(c),
                _ => segments.push(Segment {
                    kind,
                    value: c.to_string(),
                }),
            }
        }

        Ok(Self {
            timestamp: s[..TIMESTAMP_LEN].to_string(),
            segments,
        })
    }
}

impl Serialize for ZettelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ZettelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
