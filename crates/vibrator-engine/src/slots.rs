//! Custom waveform slot bookkeeping.

use serde::Serialize;

/// An uploaded custom waveform still resident on the actuators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeldSlot {
    pub index: u32,
    pub payload: Vec<u8>,
    /// Kept after playback so an identical request can replay it
    pub retain: bool,
}

/// What to do with the held slot before playing `payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotAction {
    /// Nothing held; upload
    Upload,
    /// Identical retained payload already resident at this index
    Reuse(u32),
    /// Erase this index, then upload
    Replace(u32),
}

/// Tracks the custom slot the engine currently owns, if any.
///
/// The engine erases a held slot before uploading a different payload, so
/// at most one slot is held at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlotLedger {
    held: Option<HeldSlot>,
    uploads: u64,
    erases: u64,
}

impl SlotLedger {
    pub fn held(&self) -> Option<&HeldSlot> {
        self.held.as_ref()
    }

    pub fn plan(&self, payload: &[u8], retain: bool) -> SlotAction {
        match &self.held {
            None => SlotAction::Upload,
            Some(held) if held.retain && retain && held.payload == payload => {
                SlotAction::Reuse(held.index)
            }
            Some(held) => SlotAction::Replace(held.index),
        }
    }

    pub fn hold(&mut self, index: u32, payload: &[u8], retain: bool) {
        self.uploads += 1;
        self.held = Some(HeldSlot {
            index,
            payload: payload.to_vec(),
            retain,
        });
    }

    /// Forget the slot at `index` after it was erased.
    pub fn release(&mut self, index: u32) {
        if self.held.as_ref().is_some_and(|held| held.index == index) {
            self.held = None;
            self.erases += 1;
        }
    }

    /// Whether the slot at `index` should be erased once playback ends.
    pub fn erase_after_playback(&self, index: u32) -> bool {
        self.held
            .as_ref()
            .is_some_and(|held| held.index == index && !held.retain)
    }

    /// Total uploads recorded.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Total erases recorded.
    pub fn erases(&self) -> u64 {
        self.erases
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_with_nothing_held() {
        assert_eq!(SlotLedger::default().plan(&[1, 2], true), SlotAction::Upload);
    }

    #[test]
    fn test_retained_identical_payload_reused() {
        let mut ledger = SlotLedger::default();
        ledger.hold(14, &[1, 2], true);
        assert_eq!(ledger.plan(&[1, 2], true), SlotAction::Reuse(14));
        assert_eq!(ledger.plan(&[1, 3], true), SlotAction::Replace(14));
        assert_eq!(ledger.plan(&[1, 2], false), SlotAction::Replace(14));
        assert!(!ledger.erase_after_playback(14));
    }

    #[test]
    fn test_unretained_slot_replaced_and_erased() {
        let mut ledger = SlotLedger::default();
        ledger.hold(15, &[9], false);
        assert_eq!(ledger.plan(&[9], false), SlotAction::Replace(15));
        assert!(ledger.erase_after_playback(15));
        ledger.release(15);
        assert!(ledger.held().is_none());
        assert_eq!((ledger.uploads(), ledger.erases()), (1, 1));
    }

    #[test]
    fn test_release_ignores_other_index() {
        let mut ledger = SlotLedger::default();
        ledger.hold(14, &[1], false);
        ledger.release(15);
        assert!(ledger.held().is_some());
    }
}
