//! File format definitions for grove-db persistence.

use crate::distance::DistanceMetric;
use crate::error::{GroveDbError, Result};

/// Magic bytes identifying a grove-db file: "GROVEDB\0"
pub const MAGIC: [u8; 8] = *b"GROVEDB\0";

/// Current format version.
pub const FORMAT_VERSION: u32 = 1;

/// Node tag of a leaf block.
pub const NODE_LEAF: u8 = 0;

/// Node tag of an internal (split) block.
pub const NODE_INTERNAL: u8 = 1;

/// File header structure.
///
/// Total size: 36 bytes
/// ```text
/// [MAGIC 8B][VERSION u32][DIM u32][TREES u32][ITEMS u32][LEAF_CAP u32]
/// [METRIC u8][RESERVED 3B][CHECKSUM u32]
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    /// Magic bytes (must be MAGIC)
    pub magic: [u8; 8],
    /// Format version
    pub version: u32,
    /// Vector dimension D
    pub dimension: u32,
    /// Number of trees T
    pub tree_count: u32,
    /// Number of items N
    pub item_count: u32,
    /// Leaf capacity used at build time
    pub leaf_capacity: u32,
    /// Distance metric
    pub metric: DistanceMetric,
    /// CRC32 checksum of the data section (everything after header)
    pub checksum: u32,
}

impl FileHeader {
    /// Header size in bytes.
    pub const SIZE: usize = 36;

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.dimension.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.tree_count.to_le_bytes());
        bytes[20..24].copy_from_slice(&self.item_count.to_le_bytes());
        bytes[24..28].copy_from_slice(&self.leaf_capacity.to_le_bytes());
        bytes[28] = self.metric.tag();
        bytes[32..36].copy_from_slice(&self.checksum.to_le_bytes());
        bytes
    }

    /// Deserialize header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < Self::SIZE {
            return Err(GroveDbError::corrupt("file too small for header"));
        }

        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        if magic != MAGIC {
            return Err(GroveDbError::corrupt("invalid magic bytes"));
        }

        let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let metric = DistanceMetric::from_tag(bytes[28])
            .ok_or_else(|| GroveDbError::corrupt(format!("unknown metric tag {}", bytes[28])))?;

        let header = Self {
            magic,
            version: word(8),
            dimension: word(12),
            tree_count: word(16),
            item_count: word(20),
            leaf_capacity: word(24),
            metric,
            checksum: word(32),
        };
        header.verify()?;
        Ok(header)
    }

    /// Verify the header describes an index this version can read.
    pub fn verify(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(GroveDbError::corrupt("invalid magic bytes"));
        }

        if self.version == 0 || self.version > FORMAT_VERSION {
            return Err(GroveDbError::corrupt(format!(
                "unsupported version {} (max supported: {})",
                self.version, FORMAT_VERSION
            )));
        }

        if self.dimension == 0 {
            return Err(GroveDbError::corrupt("dimension is zero"));
        }

        if self.leaf_capacity == 0 {
            return Err(GroveDbError::corrupt("leaf capacity is zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileHeader {
        FileHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            dimension: 384,
            tree_count: 10,
            item_count: 10_000,
            leaf_capacity: 64,
            metric: DistanceMetric::Angular,
            checksum: 0x1234_5678,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = sample();
        let parsed = FileHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_invalid_magic() {
        let mut bytes = sample().to_bytes();
        bytes[0..8].copy_from_slice(b"INVALID\0");
        assert!(matches!(
            FileHeader::from_bytes(&bytes),
            Err(GroveDbError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_unknown_metric_tag() {
        let mut bytes = sample().to_bytes();
        bytes[28] = 200;
        assert!(FileHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_future_version_rejected() {
        let header = FileHeader {
            version: FORMAT_VERSION + 1,
            ..sample()
        };
        assert!(FileHeader::from_bytes(&header.to_bytes()).is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let header = FileHeader {
            dimension: 0,
            ..sample()
        };
        assert!(header.verify().is_err());
    }

    #[test]
    fn test_short_header() {
        assert!(FileHeader::from_bytes(&[0u8; 10]).is_err());
    }
}
