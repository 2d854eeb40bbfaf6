//! Content checksums for catalog tables
//!
//! Provides [`Checksum`], a 32-byte Blake3 digest of a serialized table.
//! Run reports carry it so two runs over the same inputs can be compared.

use std::fmt::{self, Display, Formatter};

/// A 32-byte content hash (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Compute Blake3 hash of arbitrary data
    #[inline]
    #[must_use]
    pub fn compute(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Get reference to the underlying bytes
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short string representation (first 16 hex chars)
    #[inline]
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl serde::Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_is_deterministic() {
        assert_eq!(Checksum::compute(b"name,volume\n"), Checksum::compute(b"name,volume\n"));
        assert_ne!(Checksum::compute(b"a"), Checksum::compute(b"b"));
    }

    #[test]
    fn short_is_prefix_of_display() {
        let sum = Checksum::compute(b"catalog");
        assert_eq!(sum.short().len(), 16);
        assert!(sum.to_string().starts_with(&sum.short()));
        assert_eq!(sum.to_string().len(), 64);
    }
}
