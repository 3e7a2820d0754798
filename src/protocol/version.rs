//! # Protocol Versions
//!
//! Immutable registry of the wire-format revisions a server speaks.
//!
//! A [`ProtocolVersions`] registry is built once at startup and passed by
//! reference to whatever needs version gating. Lookups by protocol id (as sent
//! by clients) and by ordinal (dense internal index) are O(1) array reads;
//! anything outside the registered ranges resolves to
//! [`ProtocolVersion::UNKNOWN`].
//!
//! ```rust
//! use shipnet::protocol::version::{ProtocolVersion, ProtocolVersions};
//!
//! let versions = ProtocolVersions::new([
//!     ProtocolVersion::new(0, 47, "1.8"),
//!     ProtocolVersion::new(1, 340, "1.12.2"),
//! ])
//! .unwrap();
//!
//! assert_eq!(versions.from_protocol_id(340).display(), "1.12.2");
//! assert!(versions.from_protocol_id(100).is_unknown());
//! assert!(versions.maximum() > versions.minimum());
//! ```

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::error::{constants, ProtocolError, Result};

/// A single wire-format revision.
///
/// Equality, ordering and hashing consider only the protocol id.
#[derive(Debug, Clone)]
pub struct ProtocolVersion {
    ordinal: u32,
    protocol_id: u32,
    display: Cow<'static, str>,
}

impl ProtocolVersion {
    /// Sentinel returned by lookups that match nothing
    pub const UNKNOWN: ProtocolVersion = ProtocolVersion {
        ordinal: u32::MAX,
        protocol_id: u32::MAX,
        display: Cow::Borrowed("unknown"),
    };

    pub fn new(ordinal: u32, protocol_id: u32, display: impl Into<Cow<'static, str>>) -> Self {
        Self {
            ordinal,
            protocol_id,
            display: display.into(),
        }
    }

    #[inline]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    #[inline]
    pub fn protocol_id(&self) -> u32 {
        self.protocol_id
    }

    /// Human-readable label such as `"1.12.2"`
    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_unknown(&self) -> bool {
        self.ordinal == u32::MAX && self.protocol_id == u32::MAX
    }
}

impl PartialEq for ProtocolVersion {
    fn eq(&self, other: &Self) -> bool {
        self.protocol_id == other.protocol_id
    }
}

impl Eq for ProtocolVersion {}

impl PartialOrd for ProtocolVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProtocolVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.protocol_id.cmp(&other.protocol_id)
    }
}

impl Hash for ProtocolVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.protocol_id.hash(state);
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (protocol {})", self.display, self.protocol_id)
    }
}

static UNKNOWN_VERSION: ProtocolVersion = ProtocolVersion::UNKNOWN;

/// Dense lookup tables over a fixed set of versions.
///
/// Table sizes follow the spread of registered ids and ordinals, so sparse id
/// spaces cost memory proportional to `max - min`.
#[derive(Debug, Clone)]
pub struct ProtocolVersions {
    versions: Vec<ProtocolVersion>,
    minimum: usize,
    maximum: usize,
    min_protocol_id: u32,
    min_ordinal: u32,
    by_protocol_id: Vec<Option<usize>>,
    by_ordinal: Vec<Option<usize>>,
}

impl ProtocolVersions {
    /// Build the registry from an ordered list of versions.
    ///
    /// Fails with `InvalidInput` when the list is empty. A later entry with an
    /// already registered protocol id or ordinal replaces the earlier slot.
    ///
    /// Lookup tables span `max - min + 1` slots for protocol ids and for
    /// ordinals. A list mixing id `0` with an id near `u32::MAX` allocates
    /// gigabytes, so keep ids within the range a game actually ships.
    pub fn new<I>(versions: I) -> Result<Self>
    where
        I: IntoIterator<Item = ProtocolVersion>,
    {
        let versions: Vec<ProtocolVersion> = versions.into_iter().collect();
        if versions.is_empty() {
            return Err(ProtocolError::InvalidInput(
                constants::ERR_EMPTY_VERSION_LIST.to_string(),
            ));
        }

        let mut minimum = 0;
        let mut maximum = 0;
        for (index, version) in versions.iter().enumerate() {
            if version.protocol_id < versions[minimum].protocol_id {
                minimum = index;
            }
            if version.protocol_id > versions[maximum].protocol_id {
                maximum = index;
            }
        }

        let min_protocol_id = versions[minimum].protocol_id;
        let max_protocol_id = versions[maximum].protocol_id;
        let min_ordinal = versions.iter().map(|v| v.ordinal).min().unwrap_or(0);
        let max_ordinal = versions.iter().map(|v| v.ordinal).max().unwrap_or(0);

        let mut by_protocol_id = vec![None; (max_protocol_id - min_protocol_id) as usize + 1];
        let mut by_ordinal = vec![None; (max_ordinal - min_ordinal) as usize + 1];
        for (index, version) in versions.iter().enumerate() {
            by_protocol_id[(version.protocol_id - min_protocol_id) as usize] = Some(index);
            by_ordinal[(version.ordinal - min_ordinal) as usize] = Some(index);
        }

        debug!(
            count = versions.len(),
            min_protocol_id,
            max_protocol_id,
            "Built protocol version registry"
        );

        Ok(Self {
            versions,
            minimum,
            maximum,
            min_protocol_id,
            min_ordinal,
            by_protocol_id,
            by_ordinal,
        })
    }

    /// Version registered for a wire protocol id, or [`ProtocolVersion::UNKNOWN`].
    pub fn from_protocol_id(&self, protocol_id: u32) -> &ProtocolVersion {
        Self::lookup(&self.versions, &self.by_protocol_id, self.min_protocol_id, protocol_id)
    }

    /// Version registered for an ordinal, or [`ProtocolVersion::UNKNOWN`].
    pub fn from_ordinal(&self, ordinal: u32) -> &ProtocolVersion {
        Self::lookup(&self.versions, &self.by_ordinal, self.min_ordinal, ordinal)
    }

    pub fn minimum(&self) -> &ProtocolVersion {
        &self.versions[self.minimum]
    }

    pub fn maximum(&self) -> &ProtocolVersion {
        &self.versions[self.maximum]
    }

    pub fn is_supported(&self, protocol_id: u32) -> bool {
        !self.from_protocol_id(protocol_id).is_unknown()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Registered versions in construction order
    pub fn iter(&self) -> impl Iterator<Item = &ProtocolVersion> {
        self.versions.iter()
    }

    fn lookup<'a>(
        versions: &'a [ProtocolVersion],
        table: &[Option<usize>],
        base: u32,
        key: u32,
    ) -> &'a ProtocolVersion {
        key.checked_sub(base)
            .and_then(|offset| table.get(offset as usize).copied().flatten())
            .map_or(&UNKNOWN_VERSION, |index| &versions[index])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn registry() -> ProtocolVersions {
        ProtocolVersions::new([
            ProtocolVersion::new(0, 47, "1.8"),
            ProtocolVersion::new(1, 107, "1.9"),
            ProtocolVersion::new(2, 340, "1.12.2"),
            ProtocolVersion::new(3, 754, "1.16.5"),
        ])
        .unwrap()
    }

    #[test]
    fn test_lookup_by_protocol_id() {
        let versions = registry();
        assert_eq!(versions.from_protocol_id(107).display(), "1.9");
        assert_eq!(versions.from_protocol_id(754).ordinal(), 3);
        assert!(versions.from_protocol_id(108).is_unknown());
        assert!(versions.from_protocol_id(46).is_unknown());
        assert!(versions.from_protocol_id(755).is_unknown());
        assert!(versions.from_protocol_id(u32::MAX).is_unknown());
    }

    #[test]
    fn test_lookup_by_ordinal() {
        let versions = registry();
        assert_eq!(versions.from_ordinal(2).protocol_id(), 340);
        assert!(versions.from_ordinal(4).is_unknown());
    }

    #[test]
    fn test_min_max_and_ordering() {
        let versions = registry();
        assert_eq!(versions.minimum().protocol_id(), 47);
        assert_eq!(versions.maximum().protocol_id(), 754);
        assert!(versions.from_ordinal(1) < versions.from_ordinal(2));
        assert!(versions.is_supported(340));
        assert!(!versions.is_supported(341));
    }

    #[test]
    fn test_equality_uses_protocol_id_only() {
        let a = ProtocolVersion::new(0, 47, "1.8");
        let b = ProtocolVersion::new(9, 47, "1.8.9");
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(
            ProtocolVersions::new(Vec::new()),
            Err(ProtocolError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_ordinals_need_not_start_at_zero() {
        let versions = ProtocolVersions::new([
            ProtocolVersion::new(5, 10, "a"),
            ProtocolVersion::new(7, 12, "b"),
        ])
        .unwrap();
        assert_eq!(versions.from_ordinal(7).display(), "b");
        assert!(versions.from_ordinal(6).is_unknown());
        assert!(versions.from_ordinal(0).is_unknown());
    }
}
