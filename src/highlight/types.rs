//! Highlight record types
//!
//! `HighlightRecord` is the persisted unit: plain fields only, so a page's
//! record list can go through any key-value store as JSON and come back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::anchor::RangeAnchor;
use crate::error::HighlightError;

/// Highlight colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    Yellow,
    Green,
    Blue,
    Pink,
}

impl HighlightColor {
    pub const ALL: [HighlightColor; 4] = [Self::Yellow, Self::Green, Self::Blue, Self::Pink];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Pink => "pink",
        }
    }

    /// CSS color used for inline rendering
    pub fn css(&self) -> &'static str {
        match self {
            Self::Yellow => "#fff59d",
            Self::Green => "#c5e1a5",
            Self::Blue => "#90caf9",
            Self::Pink => "#f48fb1",
        }
    }
}

impl Default for HighlightColor {
    fn default() -> Self {
        Self::Yellow
    }
}

impl fmt::Display for HighlightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HighlightColor {
    type Err = HighlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| HighlightError::InvalidColor(s.to_string()))
    }
}

/// Highlight identifier, `h<n>` with `n >= 1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HighlightId(u64);

impl HighlightId {
    pub fn new(n: u64) -> Option<Self> {
        (n >= 1).then_some(Self(n))
    }

    pub fn number(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HighlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "h{}", self.0)
    }
}

impl FromStr for HighlightId {
    type Err = HighlightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix('h')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .and_then(Self::new)
            .ok_or_else(|| HighlightError::InvalidId(s.to_string()))
    }
}

impl Serialize for HighlightId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HighlightId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Hands out strictly increasing ids for one page session.
///
/// Ids are never reused, even after removal. Restored ids push the counter
/// past them so new highlights cannot collide with stored ones.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> HighlightId {
        self.last += 1;
        HighlightId(self.last)
    }

    /// Record an id that entered the session from storage
    pub fn observe(&mut self, id: HighlightId) {
        self.last = self.last.max(id.0);
    }
}

/// A persisted highlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightRecord {
    /// Unique identifier within the page (`h<n>`)
    pub id: String,
    /// Normalized snapshot of the highlighted text
    pub text: String,
    /// Highlight color
    pub color: HighlightColor,
    /// Structural address of the start container
    pub start_path: String,
    /// UTF-16 offset within the start container
    pub start_offset: usize,
    /// Structural address of the end container
    pub end_path: String,
    /// UTF-16 offset within the end container
    pub end_offset: usize,
}

impl HighlightRecord {
    pub fn new(id: HighlightId, text: String, color: HighlightColor, anchor: RangeAnchor) -> Self {
        Self {
            id: id.to_string(),
            text,
            color,
            start_path: anchor.start_path,
            start_offset: anchor.start_offset,
            end_path: anchor.end_path,
            end_offset: anchor.end_offset,
        }
    }

    /// The structural half of the record
    pub fn anchor(&self) -> RangeAnchor {
        RangeAnchor {
            start_path: self.start_path.clone(),
            start_offset: self.start_offset,
            end_path: self.end_path.clone(),
            end_offset: self.end_offset,
        }
    }

    /// Parsed id, if well formed
    pub fn highlight_id(&self) -> Option<HighlightId> {
        self.id.parse().ok()
    }
}
