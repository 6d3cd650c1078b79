// Participant records and the identity key used to collapse duplicate entries.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Characters removed from an identifier before it is compared
/// (thousand separators and stray spacing, e.g. "12.345.678").
pub const IDENTIFIER_SEPARATORS: &[char] = &['.', ',', ' '];

/// Identifier placeholder meaning "no data" in pasted lists.
pub const DEFAULT_MISSING_IDENTIFIER_MARKER: &str = "S/D";

// ---------------------------------------------------------------------------
// ParticipantId
// ---------------------------------------------------------------------------

/// Opaque participant identifier, unique within a parse batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Build the id for the participant at `index` of the batch tagged `batch`.
    pub fn new(index: usize, batch: &uuid::Uuid) -> Self {
        ParticipantId(format!("local-{index}-{}", batch.simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Participant
// ---------------------------------------------------------------------------

/// One raffle entry, produced from a single pasted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Assigned at parse time; stable for the session.
    pub id: ParticipantId,
    /// The trimmed source line, untouched otherwise.
    pub original_string: String,
    /// Display name with list marker and trailing identifier removed.
    pub name: String,
    /// Secondary identity token (a DNI or member number). Empty when absent.
    pub identifier: String,
}

impl Participant {
    pub fn new(
        id: ParticipantId,
        original_string: impl Into<String>,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Participant {
            id,
            original_string: original_string.into(),
            name: name.into(),
            identifier: identifier.into(),
        }
    }

    /// Whether a usable identifier was extracted for this entry.
    pub fn has_identifier(&self) -> bool {
        !self.identifier.trim().is_empty()
    }

    /// Identity key using the default missing-identifier marker.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityRules::default().key_for(self)
    }
}

// ---------------------------------------------------------------------------
// Identity keys
// ---------------------------------------------------------------------------

/// Normalized identity of a participant: the normalized identifier when one
/// is present, else the trimmed, lower-cased name. Two entries with equal
/// keys are treated as the same person: they cannot both win one draw, and
/// both leave the pool when either wins. A bare "12345" line and
/// "Juan - 12345" therefore share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rules for deriving an [`IdentityKey`] from a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRules {
    /// Identifier values that mean "absent" (compared case-insensitively).
    missing_markers: Vec<String>,
}

impl Default for IdentityRules {
    fn default() -> Self {
        IdentityRules {
            missing_markers: vec![DEFAULT_MISSING_IDENTIFIER_MARKER.to_lowercase()],
        }
    }
}

impl IdentityRules {
    pub fn new<I, S>(missing_markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        IdentityRules {
            missing_markers: missing_markers
                .into_iter()
                .map(|m| m.as_ref().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect(),
        }
    }

    /// Compute the identity key for `participant`.
    pub fn key_for(&self, participant: &Participant) -> IdentityKey {
        let identifier = participant.identifier.trim().to_lowercase();
        if !identifier.is_empty() && !self.missing_markers.contains(&identifier) {
            let normalized = normalize_identifier(&identifier);
            if !normalized.is_empty() {
                return IdentityKey(normalized);
            }
        }
        IdentityKey(participant.name.trim().to_lowercase())
    }

    /// Collect the keys of every participant in `participants`.
    pub fn keys_of<'a, I>(&self, participants: I) -> HashSet<IdentityKey>
    where
        I: IntoIterator<Item = &'a Participant>,
    {
        participants.into_iter().map(|p| self.key_for(p)).collect()
    }
}

/// Trim, lower-case and strip [`IDENTIFIER_SEPARATORS`].
pub fn normalize_identifier(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !IDENTIFIER_SEPARATORS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
