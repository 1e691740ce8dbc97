//! Contains common, primitive types shared across the Shotclock engine.
//!
//! Timer handles are `slotmap` keys so a handle that has been cancelled or
//! has fired can never alias a timer created later.

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Uniquely and safely identifies a scheduled timer within the `Timebase`.
    ///
    /// Keys are generational: once a timer is cancelled or claimed its key is
    /// dead forever, which is what lets the control task ignore late fires.
    pub struct TimerId;
}

/// Position of a pattern within the run order of the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternIndex(pub usize);

/// Counts phase entries. Work spawned under one epoch is discarded once the
/// scheduler has moved on to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Epoch(pub u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_advances() {
        let e = Epoch::default();
        assert_eq!(e.next(), Epoch(1));
        assert_ne!(e.next(), e);
    }
}
