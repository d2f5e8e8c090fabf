use std::fmt::Display;

use crate::{constants::KIB, error::DevicegraphError};

/// A contiguous range of blocks on a block device.
///
/// Regions are immutable values. Two regions are equal iff their start,
/// length and block size are all equal, so regions with different block sizes
/// never compare equal even when they describe the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    start: u64,
    length: u64,
    block_size: u32,
}

impl Region {
    /// Creates a new region.
    ///
    /// Fails if the block size is zero or the region extends past the
    /// addressable range.
    pub fn new(start: u64, length: u64, block_size: u32) -> Result<Self, DevicegraphError> {
        if block_size == 0 {
            return Err(DevicegraphError::InvalidRegion {
                reason: "block size must be greater than zero".into(),
            });
        }

        if start.checked_add(length).is_none() {
            return Err(DevicegraphError::InvalidRegion {
                reason: format!("region starting at {start} with length {length} overflows"),
            });
        }

        Ok(Self {
            start,
            length,
            block_size,
        })
    }

    /// Creates a new region from signed values, as provided by untyped
    /// callers such as layout files.
    pub fn from_signed(start: i64, length: i64, block_size: i64) -> Result<Self, DevicegraphError> {
        let start = u64::try_from(start).map_err(|_| DevicegraphError::InvalidRegion {
            reason: format!("start must not be negative, got {start}"),
        })?;
        let length = u64::try_from(length).map_err(|_| DevicegraphError::InvalidRegion {
            reason: format!("length must not be negative, got {length}"),
        })?;
        if block_size <= 0 {
            return Err(DevicegraphError::InvalidRegion {
                reason: format!("block size must be greater than zero, got {block_size}"),
            });
        }
        let block_size = u32::try_from(block_size).map_err(|_| DevicegraphError::InvalidRegion {
            reason: format!("block size {block_size} is too large"),
        })?;

        Self::new(start, length, block_size)
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn length(&self) -> u64 {
        self.length
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Returns the last block of the region, or None for an empty region.
    pub fn end(&self) -> Option<u64> {
        (self.length > 0).then(|| self.start + self.length - 1)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the size of the region in bytes.
    pub fn size_bytes(&self) -> u128 {
        u128::from(self.length) * u128::from(self.block_size)
    }

    /// Converts a number of blocks of this region's block size into KiB.
    /// Saturates at `u64::MAX`.
    pub fn to_kb(&self, blocks: u64) -> u64 {
        let kb = u128::from(blocks) * u128::from(self.block_size) / u128::from(KIB);
        u64::try_from(kb).unwrap_or(u64::MAX)
    }

    /// Converts a number of KiB into blocks of this region's block size.
    /// Saturates at `u64::MAX`.
    pub fn to_blocks(&self, kb: u64) -> u64 {
        let blocks = u128::from(kb) * u128::from(KIB) / u128::from(self.block_size);
        u64::try_from(blocks).unwrap_or(u64::MAX)
    }

    /// Block following the last block of the region.
    fn exclusive_end(&self) -> u64 {
        self.start + self.length
    }

    fn assert_equal_block_size(&self, other: &Region) -> Result<(), DevicegraphError> {
        if self.block_size != other.block_size {
            return Err(DevicegraphError::DifferentBlockSizes {
                lhs: self.block_size,
                rhs: other.block_size,
            });
        }
        Ok(())
    }

    /// Returns whether this region lies completely inside `other`.
    pub fn inside(&self, other: &Region) -> Result<bool, DevicegraphError> {
        self.assert_equal_block_size(other)?;
        Ok(self.start >= other.start && self.exclusive_end() <= other.exclusive_end())
    }

    /// Returns whether this region and `other` share at least one block.
    pub fn intersect(&self, other: &Region) -> Result<bool, DevicegraphError> {
        self.assert_equal_block_size(other)?;
        Ok(self.start < other.exclusive_end() && other.start < self.exclusive_end())
    }

    /// Returns the blocks shared by this region and `other`, if any.
    pub fn intersection(&self, other: &Region) -> Result<Option<Region>, DevicegraphError> {
        if !self.intersect(other)? {
            return Ok(None);
        }

        let start = self.start.max(other.start);
        let end = self.exclusive_end().min(other.exclusive_end());
        Ok(Some(Region {
            start,
            length: end - start,
            block_size: self.block_size,
        }))
    }

    /// Returns the parts of this region not covered by any region in `used`,
    /// ordered by start.
    pub fn unused_regions(&self, used: &[Region]) -> Result<Vec<Region>, DevicegraphError> {
        let mut covered = Vec::with_capacity(used.len());
        for region in used {
            if let Some(common) = self.intersection(region)? {
                covered.push(common);
            }
        }
        covered.sort_by_key(|r| r.start);

        let mut unused = Vec::new();
        let mut position = self.start;
        for region in covered {
            if region.start > position {
                unused.push(Region {
                    start: position,
                    length: region.start - position,
                    block_size: self.block_size,
                });
            }
            position = position.max(region.exclusive_end());
        }

        if position < self.exclusive_end() {
            unused.push(Region {
                start: position,
                length: self.exclusive_end() - position,
                block_size: self.block_size,
            });
        }

        Ok(unused)
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}, {} B]", self.start, self.length, self.block_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: u64, length: u64) -> Region {
        Region::new(start, length, 512).unwrap()
    }

    #[test]
    fn test_new() {
        let r = Region::new(1, 2, 512).unwrap();
        assert_eq!(r.start(), 1);
        assert_eq!(r.length(), 2);
        assert_eq!(r.block_size(), 512);

        assert!(matches!(
            Region::new(0, 10, 0),
            Err(DevicegraphError::InvalidRegion { .. })
        ));
        assert!(matches!(
            Region::new(u64::MAX, 1, 512),
            Err(DevicegraphError::InvalidRegion { .. })
        ));
        Region::new(u64::MAX, 0, 512).unwrap();
    }

    #[test]
    fn test_from_signed() {
        assert_eq!(Region::from_signed(1, 2, 512).unwrap(), region(1, 2));
        assert_eq!(Region::from_signed(0, 0, 4096).unwrap().length(), 0);

        for (start, length, block_size) in [(0, -1, 512), (-1, 1, 512), (0, 1, 0), (0, 1, -512)] {
            assert!(
                matches!(
                    Region::from_signed(start, length, block_size),
                    Err(DevicegraphError::InvalidRegion { .. })
                ),
                "Region ({start}, {length}, {block_size}) should be invalid"
            );
        }

        assert!(matches!(
            Region::from_signed(0, 1, i64::from(u32::MAX) + 1),
            Err(DevicegraphError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn test_equality() {
        assert_eq!(region(1, 2), Region::new(1, 2, 512).unwrap());
        assert_ne!(region(1, 2), region(1, 3));
        assert_ne!(region(1, 2), region(2, 2));
        assert_ne!(region(1, 2), Region::new(1, 2, 4096).unwrap());
    }

    #[test]
    fn test_end_and_size() {
        assert_eq!(region(10, 5).end(), Some(14));
        assert_eq!(region(10, 0).end(), None);
        assert!(region(10, 0).is_empty());
        assert_eq!(region(0, 2048).size_bytes(), 1024 * 1024);
        assert_eq!(
            Region::new(0, u64::MAX, u32::MAX).unwrap().size_bytes(),
            u128::from(u64::MAX) * u128::from(u32::MAX)
        );
    }

    #[test]
    fn test_kb_conversion() {
        let r = region(0, 100);
        assert_eq!(r.to_kb(2048), 1024);
        assert_eq!(r.to_blocks(1024), 2048);

        let r = Region::new(0, 100, 4096).unwrap();
        assert_eq!(r.to_kb(1), 4);
        assert_eq!(r.to_blocks(8), 2);
    }

    #[test]
    fn test_kb_conversion_saturates() {
        let r = region(0, 100);
        assert_eq!(r.to_blocks(1 << 63), u64::MAX);
        assert_eq!(r.to_blocks((1 << 63) - 1), u64::MAX - 1);

        let r = Region::new(0, 100, 4096).unwrap();
        assert_eq!(r.to_kb(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_inside_and_intersect() {
        let outer = region(100, 100);
        assert!(region(100, 100).inside(&outer).unwrap());
        assert!(region(150, 10).inside(&outer).unwrap());
        assert!(!region(150, 51).inside(&outer).unwrap());
        assert!(!region(99, 10).inside(&outer).unwrap());

        assert!(region(50, 51).intersect(&outer).unwrap());
        assert!(!region(50, 50).intersect(&outer).unwrap());
        assert!(!region(200, 10).intersect(&outer).unwrap());
        assert!(region(199, 10).intersect(&outer).unwrap());

        assert_eq!(
            region(150, 100).intersection(&outer).unwrap(),
            Some(region(150, 50))
        );
        assert_eq!(region(0, 10).intersection(&outer).unwrap(), None);
    }

    #[test]
    fn test_different_block_sizes() {
        let a = region(0, 10);
        let b = Region::new(0, 10, 4096).unwrap();
        assert_eq!(
            a.inside(&b).unwrap_err(),
            DevicegraphError::DifferentBlockSizes {
                lhs: 512,
                rhs: 4096
            }
        );
        assert!(a.intersect(&b).is_err());
        assert!(a.unused_regions(&[b]).is_err());
    }

    #[test]
    fn test_unused_regions() {
        let disk = region(0, 1000);
        assert_eq!(disk.unused_regions(&[]).unwrap(), vec![disk]);

        let used = [region(500, 100), region(100, 100), region(150, 100)];
        assert_eq!(
            disk.unused_regions(&used).unwrap(),
            vec![region(0, 100), region(250, 250), region(600, 400)]
        );

        assert!(disk.unused_regions(&[region(0, 1000)]).unwrap().is_empty());
        assert_eq!(
            disk.unused_regions(&[region(900, 500)]).unwrap(),
            vec![region(0, 900)]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(region(1, 2).to_string(), "[1, 2, 512 B]");
    }
}
