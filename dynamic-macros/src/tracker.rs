use crate::MAX_ACTIVE_MACRO_KEYS;
use crate::event::KeyPos;

/// Outcome of claiming a slot for a macro key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Claim {
    /// The key got a slot and its macro should play
    Claimed,
    /// The key already holds a slot, e.g. a repeated press
    AlreadyActive,
    /// All slots are taken, the press is dropped
    Full,
}

/// The macro keys that are currently held.
///
/// A slot is taken when a macro key is pressed and freed when it's released,
/// so a release can be matched with the press that started the macro.
#[derive(Debug, Default)]
pub struct ActiveMacroKeys {
    slots: [Option<KeyPos>; MAX_ACTIVE_MACRO_KEYS],
}

impl ActiveMacroKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self, pos: KeyPos) -> bool {
        self.slots.contains(&Some(pos))
    }

    /// Take a free slot for the key at `pos`.
    pub fn claim(&mut self, pos: KeyPos) -> Claim {
        if self.is_active(pos) {
            return Claim::AlreadyActive;
        }
        match self.slots.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(pos);
                Claim::Claimed
            }
            None => Claim::Full,
        }
    }

    /// Free the slot of the key at `pos`, returns false if it had none.
    pub fn release(&mut self, pos: KeyPos) -> bool {
        match self.slots.iter_mut().find(|slot| **slot == Some(pos)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = KeyPos> + '_ {
        self.slots.iter().flatten().copied()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_release() {
        let mut active = ActiveMacroKeys::new();
        let pos = KeyPos::new(1, 2);
        assert_eq!(active.claim(pos), Claim::Claimed);
        assert!(active.is_active(pos));
        assert_eq!(active.claim(pos), Claim::AlreadyActive);
        assert_eq!(active.len(), 1);

        assert!(active.release(pos));
        assert!(!active.is_active(pos));
        assert!(!active.release(pos));
        assert!(active.is_empty());
    }

    #[test]
    fn test_capacity() {
        let mut active = ActiveMacroKeys::new();
        for col in 0..MAX_ACTIVE_MACRO_KEYS as u8 {
            assert_eq!(active.claim(KeyPos::new(0, col)), Claim::Claimed);
        }
        assert_eq!(active.claim(KeyPos::new(1, 0)), Claim::Full);
        assert!(!active.is_active(KeyPos::new(1, 0)));

        // A freed slot is reused
        active.release(KeyPos::new(0, 3));
        assert_eq!(active.claim(KeyPos::new(1, 0)), Claim::Claimed);
        assert_eq!(active.len(), MAX_ACTIVE_MACRO_KEYS);
    }
}
