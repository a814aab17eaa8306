//! Identity types for chain events and logs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::DecodeError;

/// Length in bytes of an [`EventId`].
pub const EVENT_ID_LEN: usize = 32;

// ============================================================================
// EVENT ID
// ============================================================================

/// Content-derived identifier of an event.
///
/// Identifiers are assigned by the origin store and compared by byte
/// equality only. The all-zero value is the sentinel: it marks "no
/// predecessor" on the first event of a chain, and "empty chain" when
/// used as a log head.
///
/// The textual encoding is 64 lowercase hex characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct EventId([u8; EVENT_ID_LEN]);

impl EventId {
    /// The "no predecessor" / "empty chain" identifier.
    pub const SENTINEL: Self = Self([0u8; EVENT_ID_LEN]);

    /// Wrap raw identifier bytes.
    pub const fn from_bytes(bytes: [u8; EVENT_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from a byte slice of exactly [`EVENT_ID_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let raw: [u8; EVENT_ID_LEN] = bytes.try_into().map_err(|_| DecodeError::InvalidEventId {
            value: hex::encode(bytes),
            reason: format!("expected {} bytes, got {}", EVENT_ID_LEN, bytes.len()),
        })?;
        Ok(Self(raw))
    }

    /// Raw identifier bytes.
    pub const fn as_bytes(&self) -> &[u8; EVENT_ID_LEN] {
        &self.0
    }

    /// Whether this is the sentinel identifier.
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Parse the textual encoding. Surrounding whitespace is not accepted.
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        if s.len() != EVENT_ID_LEN * 2 {
            return Err(DecodeError::InvalidEventId {
                value: s.to_string(),
                reason: format!("expected {} hex characters, got {}", EVENT_ID_LEN * 2, s.len()),
            });
        }
        let mut raw = [0u8; EVENT_ID_LEN];
        hex::decode_to_slice(s, &mut raw).map_err(|e| DecodeError::InvalidEventId {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(raw))
    }

    /// Compute the content digest of an event body.
    ///
    /// SHA-256 over a length-prefixed encoding of `previous`, `kind` and
    /// `data`. Used to verify origin responses and to build fixture chains.
    pub fn digest(previous: &EventId, kind: &str, data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(previous.0);
        hasher.update((kind.len() as u64).to_be_bytes());
        hasher.update(kind.as_bytes());
        hasher.update((data.len() as u64).to_be_bytes());
        hasher.update(data);
        let result = hasher.finalize();
        let mut raw = [0u8; EVENT_ID_LEN];
        raw.copy_from_slice(&result);
        Self(raw)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self)
    }
}

impl FromStr for EventId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// LOG ID
// ============================================================================

/// Identifier of a log (a named chain).
///
/// The head lookup table is keyed by the 16 raw bytes of the UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(Uuid);

impl LogId {
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DecodeError::InvalidLogId {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LogId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
