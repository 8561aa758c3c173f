//! Generational actor handles.
//!
//! An [`ActorUid`] packs a 16-bit salt and a 16-bit slot index into one `u32`.
//! The map stamps every spawned actor with the next salt from a monotonically
//! advancing counter, so a handle captured before its slot was freed and
//! reused carries a salt that no longer matches and resolves to nothing.
//!
//! Handles are plain values: copying one never extends the actor's lifetime,
//! and the registry alone decides when a slot is emptied.

use std::fmt;

/// Compact, recyclable reference to an actor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorUid(u32);

impl ActorUid {
    /// All-ones sentinel.  Never minted by the registry.
    pub const INVALID: ActorUid = ActorUid(u32::MAX);

    /// Mint a handle from a salt and a slot index.
    #[inline]
    pub const fn new(salt: u16, index: u16) -> Self {
        Self(((salt as u32) << 16) | index as u32)
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }

    /// Slot index this handle addresses.
    #[inline]
    pub const fn index(self) -> usize {
        (self.0 & 0xFFFF) as usize
    }

    #[inline]
    pub const fn salt(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Packed representation, for logging and snapshots.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl Default for ActorUid {
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for ActorUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}:{}", self.index(), self.salt())
        } else {
            f.write_str("#invalid")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_salt_high_and_index_low() {
        let uid = ActorUid::new(3, 7);
        assert_eq!(uid.raw(), 0x0003_0007);
        assert_eq!(uid.salt(), 3);
        assert_eq!(uid.index(), 7);
        assert!(uid.is_valid());
    }

    #[test]
    fn only_all_ones_is_invalid() {
        assert!(!ActorUid::INVALID.is_valid());
        assert!(!ActorUid::default().is_valid());
        assert!(ActorUid::new(0xFFFF, 0xFFFE).is_valid());
        assert!(ActorUid::new(0, 0).is_valid());
    }

    #[test]
    fn same_slot_different_salt_compares_unequal() {
        assert_ne!(ActorUid::new(1, 4), ActorUid::new(2, 4));
    }
}
