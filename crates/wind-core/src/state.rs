//! State identifier type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Handle of a logical actor in the state registry.
///
/// State ids are 1-based: slot `k` of the registry holds the state with id
/// `k + 1`, and `0` is reserved as the "free slot" sentinel, so it can never
/// name a live state.
///
/// ```
/// use wind_core::StateId;
///
/// assert!(StateId::new(0).is_none());
/// let id = StateId::new(3).unwrap();
/// assert_eq!(id.slot(), 2);
/// assert_eq!(StateId::from_slot(2), id);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StateId(NonZeroU32);

impl StateId {
    /// Creates a state id, returning `None` for the free sentinel `0`.
    pub const fn new(id: u32) -> Option<Self> {
        match NonZeroU32::new(id) {
            Some(id) => Some(Self(id)),
            None => None,
        }
    }

    /// Returns the state id for a zero-based registry slot.
    pub const fn from_slot(slot: usize) -> Self {
        match NonZeroU32::new(slot as u32 + 1) {
            Some(id) => Self(id),
            None => unreachable!(),
        }
    }

    /// Returns the raw id.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }

    /// Returns the zero-based registry slot.
    #[inline]
    pub const fn slot(&self) -> usize {
        self.0.get() as usize - 1
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateId<{}>", self.0)
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_state() {
        assert_eq!(StateId::new(0), None);
        assert_eq!(StateId::new(1).map(|s| s.slot()), Some(0));
    }

    #[test]
    fn test_slot_mapping() {
        for slot in [0usize, 1, 511, 1023] {
            let id = StateId::from_slot(slot);
            assert_eq!(id.slot(), slot);
            assert_eq!(id.get() as usize, slot + 1);
        }
    }
}
