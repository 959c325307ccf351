//! Job identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one generation job.
///
/// A v4 UUID: 122 bits of cryptographically strong randomness, rendered
/// in canonical hyphenated form. Parsing is strict, so any id arriving
/// from the outside that is not a canonical UUID (including anything
/// containing path separators or `..`) is rejected before it can be
/// used to build a filesystem path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Mint a fresh, globally unique job id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Canonical hyphenated lowercase form.
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Error returned when a string is not a canonical job id.
#[derive(Debug, thiserror::Error)]
#[error("Invalid job id")]
pub struct InvalidJobId;

impl FromStr for JobId {
    type Err = InvalidJobId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // `Uuid::parse_str` accepts a few alternate encodings (braced,
        // simple); require the canonical 36-character form so ids
        // round-trip exactly through URLs and directory names.
        if s.len() != 36 {
            return Err(InvalidJobId);
        }
        let uuid = Uuid::parse_str(s).map_err(|_| InvalidJobId)?;
        Ok(Self(uuid))
    }
}
