pub const FLIP_H: u32 = 0x8000_0000; // bit 31
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

/// A raw tile index as stored in a layer, flip bits included.
///
/// Index `0` is the conventional "no tile" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TileIndex(pub u32);

impl TileIndex {
    pub const EMPTY: TileIndex = TileIndex(0);

    #[inline] pub fn raw(self) -> u32 { self.0 }
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.clean() == 0
    }
}

impl From<u32> for TileIndex {
    fn from(raw: u32) -> Self {
        TileIndex(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flip_bits_are_stripped_from_clean_index() {
        let id = TileIndex(FLIP_H | FLIP_D | 7);
        assert_eq!(id.clean(), 7);
        assert!(id.flip_h());
        assert!(!id.flip_v());
        assert!(id.flip_d());
    }

    #[test]
    fn flipped_zero_is_still_empty() {
        assert!(TileIndex(FLIP_V).is_empty());
        assert!(!TileIndex(1).is_empty());
    }
}
