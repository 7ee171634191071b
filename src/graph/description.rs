//! Crossroad description table: the per-node / per-edge semantic labels
//! produced by the intersection describer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use super::node::NodeId;
use crate::error::{DescriptionError, InputError, Result};

/// Key of a description row: a single node (`"id"`) or an oriented edge
/// (`"a;b"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DescriptionKey {
    Node(NodeId),
    Edge(NodeId, NodeId),
}

impl DescriptionKey {
    /// The same edge key with swapped endpoints. Node keys are unchanged.
    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Edge(a, b) => Self::Edge(b, a),
            node => node,
        }
    }
}

impl FromStr for DescriptionKey {
    type Err = DescriptionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<NodeId>()
                .map_err(|_| DescriptionError::InvalidKey(s.to_owned()))
        };
        match s.split_once(';') {
            None => Ok(Self::Node(parse(s)?)),
            Some((a, b)) if !b.contains(';') => Ok(Self::Edge(parse(a)?, parse(b)?)),
            Some(_) => Err(DescriptionError::InvalidKey(s.to_owned())),
        }
    }
}

impl fmt::Display for DescriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(id) => write!(f, "{id}"),
            Self::Edge(a, b) => write!(f, "{a};{b}"),
        }
    }
}

/// Semantic type assigned to a described entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// First edge of a crossroad arm.
    Branch,
    /// Edge inside the intersection.
    Way,
    #[serde(other)]
    Other,
}

/// One row of the description table.
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_id")]
    pub left_sidewalk: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub right_sidewalk: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub left_island: Option<i64>,
    #[serde(default, deserialize_with = "optional_id")]
    pub right_island: Option<i64>,
}

impl DescriptionEntry {
    /// Creates an edge row without sidewalk or island assignment.
    #[must_use]
    pub fn edge(kind: EntryKind, a: NodeId, b: NodeId) -> Self {
        Self {
            id: DescriptionKey::Edge(a, b).to_string(),
            kind,
            name: None,
            left_sidewalk: None,
            right_sidewalk: None,
            left_island: None,
            right_island: None,
        }
    }

    /// Sets the street name.
    #[must_use]
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Sets the sidewalk ids on the left and right of the row orientation.
    #[must_use]
    pub fn sidewalks(mut self, left: Option<i64>, right: Option<i64>) -> Self {
        self.left_sidewalk = left;
        self.right_sidewalk = right;
        self
    }

    /// Sets the island ids on the left and right of the row orientation.
    #[must_use]
    pub fn islands(mut self, left: Option<i64>, right: Option<i64>) -> Self {
        self.left_island = left;
        self.right_island = right;
        self
    }

    /// True if at least one side carries a sidewalk.
    #[must_use]
    pub fn has_sidewalk(&self) -> bool {
        self.left_sidewalk.is_some() || self.right_sidewalk.is_some()
    }
}

/// Lookup table of description rows, keyed by node or oriented edge.
#[derive(Debug, Clone, Default)]
pub struct DescriptionTable {
    entries: BTreeMap<DescriptionKey, DescriptionEntry>,
}

impl DescriptionTable {
    /// Builds a table from rows. A later row with the same key replaces an
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns `DescriptionError::InvalidKey` for rows whose id is neither a
    /// node id nor an `a;b` edge key.
    pub fn from_entries(
        entries: impl IntoIterator<Item = DescriptionEntry>,
    ) -> std::result::Result<Self, DescriptionError> {
        let mut table = Self::default();
        for entry in entries {
            let key: DescriptionKey = entry.id.parse()?;
            table.entries.insert(key, entry);
        }
        Ok(table)
    }

    /// Parses a table from a JSON array of rows.
    ///
    /// # Errors
    ///
    /// Returns an input error for malformed JSON, or a description error for
    /// malformed keys.
    pub fn from_json(text: &str) -> Result<Self> {
        let rows: Vec<DescriptionEntry> = serde_json::from_str(text).map_err(InputError::from)?;
        Ok(Self::from_entries(rows)?)
    }

    /// Row stored under exactly this key.
    #[must_use]
    pub fn get(&self, key: DescriptionKey) -> Option<&DescriptionEntry> {
        self.entries.get(&key)
    }

    /// Row describing the edge `a → b` in either orientation, with a flag
    /// telling whether the row is stored as `a;b`.
    #[must_use]
    pub fn edge(&self, a: NodeId, b: NodeId) -> Option<(&DescriptionEntry, bool)> {
        let key = DescriptionKey::Edge(a, b);
        self.get(key)
            .map(|e| (e, true))
            .or_else(|| self.get(key.reversed()).map(|e| (e, false)))
    }

    /// Iterates over rows in key order.
    pub fn iter(&self) -> impl Iterator<Item = (DescriptionKey, &DescriptionEntry)> {
        self.entries.iter().map(|(k, e)| (*k, e))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accepts a missing value, `null`, `""`, an integer or an integer string.
fn optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Cell {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Option::<Cell>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Cell::Int(v)) => Ok(Some(v)),
        #[allow(clippy::cast_possible_truncation)]
        Some(Cell::Float(v)) if v.is_finite() && v.fract() == 0.0 => Ok(Some(v as i64)),
        Some(Cell::Float(_)) => Ok(None),
        Some(Cell::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Cell::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid id {s:?}"))),
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}
