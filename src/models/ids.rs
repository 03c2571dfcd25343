//! Deterministic identities derived from SHA256 content hashes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash a list of fields joined with `|` and return the full hex digest.
pub(crate) fn content_hash(fields: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Identity of one physical battle, independent of which participant's
/// log it was observed in.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(String);

impl BattleId {
    /// Generate a battle id from the battle timestamp and both player tags.
    ///
    /// Tags are sorted before hashing so the same battle seen from either
    /// side's log produces the same id. Truncated to 32 hex chars.
    pub fn generate(battle_time: &str, tag_a: &str, tag_b: &str) -> Self {
        let (first, second) = if tag_a <= tag_b {
            (tag_a, tag_b)
        } else {
            (tag_b, tag_a)
        };
        let mut hasher = Sha256::new();
        hasher.update(battle_time.as_bytes());
        hasher.update(b"_");
        hasher.update(first.as_bytes());
        hasher.update(b"_");
        hasher.update(second.as_bytes());
        let hash = hex::encode(hasher.finalize());
        Self(hash[..32].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BattleId({})", self.0)
    }
}

impl From<&str> for BattleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identity of one persisted meta snapshot.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Generate a snapshot id from its scope label and creation timestamp.
    /// Uses SHA256 and takes the first 16 characters for brevity.
    pub fn generate(fields: &[&str]) -> Self {
        let hash = content_hash(fields);
        Self(hash[..16].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotId({})", self.0)
    }
}

impl From<&str> for SnapshotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
