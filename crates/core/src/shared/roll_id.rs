use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("roll ID must not be empty")]
pub struct InvalidRollId;

/// Unique identifier of an enrolled student.
///
/// Stored trimmed and lower-cased, matching the folder names used for
/// reference images, so `" BT23ECI024_Pragyan "` and `"bt23eci024_pragyan"`
/// are the same student. Ordering is lexicographic on the normalized form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RollId(String);

impl RollId {
    pub fn new(raw: &str) -> Result<Self, InvalidRollId> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(InvalidRollId);
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RollId {
    type Err = InvalidRollId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Parses an enrolled roster from either a JSON array of strings or a
/// comma-separated list.
///
/// Blank entries are skipped and duplicates collapse onto their first
/// occurrence, so the returned order is the order students were supplied.
pub fn parse_roster(input: &str) -> Vec<RollId> {
    let entries: Vec<String> = match serde_json::from_str::<Vec<String>>(input) {
        Ok(list) => list,
        Err(_) => input.split(',').map(str::to_string).collect(),
    };

    let mut seen = HashSet::new();
    entries
        .iter()
        .filter_map(|raw| RollId::new(raw).ok())
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
