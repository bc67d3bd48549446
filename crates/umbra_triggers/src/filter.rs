//! Reaction flags deciding what a volume reacts and responds to

use serde::{Deserialize, Serialize};
use std::ops::BitOr;

/// What kind of thing touched a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstigatorKind {
    /// The player character
    Player,
    /// Any other actor
    Npc,
    /// A non-actor object (thrown item, projectile)
    Object,
}

/// Reaction flag set of a trigger volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ReactFlags(u8);

impl ReactFlags {
    /// Accepts Trigger/Untrigger/Enable/Disable events
    pub const REACT_TO_ON_TRIGGER: Self = Self(1);
    /// Reacts to actors entering the volume
    pub const REACT_TO_ON_TOUCH: Self = Self(1 << 1);
    /// Reacts to being damaged
    pub const REACT_TO_ON_DAMAGE: Self = Self(1 << 2);
    /// Touch by objects counts
    pub const RESPOND_TO_OBJECT: Self = Self(1 << 3);
    /// Touch by the player counts
    pub const RESPOND_TO_PC: Self = Self(1 << 4);
    /// Touch by other actors counts
    pub const RESPOND_TO_NPC: Self = Self(1 << 5);
    /// Volume starts out enabled
    pub const START_ENABLED: Self = Self(1 << 6);

    /// No flags
    pub const fn empty() -> Self {
        Self(0)
    }

    /// From raw bits as stored in level data
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if all flags in `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set flags
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clear flags
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Whether touch by this kind of instigator counts
    pub fn responds_to(&self, kind: InstigatorKind) -> bool {
        match kind {
            InstigatorKind::Player => self.contains(Self::RESPOND_TO_PC),
            InstigatorKind::Npc => self.contains(Self::RESPOND_TO_NPC),
            InstigatorKind::Object => self.contains(Self::RESPOND_TO_OBJECT),
        }
    }
}

impl BitOr for ReactFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_bits_match_level_data() {
        assert_eq!(ReactFlags::REACT_TO_ON_TRIGGER.bits(), 1);
        assert_eq!(ReactFlags::RESPOND_TO_PC.bits(), 16);
        assert_eq!(ReactFlags::START_ENABLED.bits(), 64);
    }

    #[test]
    fn test_responds_to() {
        let flags = ReactFlags::REACT_TO_ON_TOUCH | ReactFlags::RESPOND_TO_PC;
        assert!(flags.responds_to(InstigatorKind::Player));
        assert!(!flags.responds_to(InstigatorKind::Npc));
        assert!(!flags.responds_to(InstigatorKind::Object));
    }

    #[test]
    fn test_insert_remove() {
        let mut flags = ReactFlags::empty();
        flags.insert(ReactFlags::START_ENABLED);
        assert!(flags.contains(ReactFlags::START_ENABLED));
        flags.remove(ReactFlags::START_ENABLED);
        assert_eq!(flags, ReactFlags::empty());
    }
}
