use embassy_time::Instant;
use hbm_types::keycode::KeyCode;
use hbm_types::modifier::ModifierCombination;
use heapless::Deque;

// Max number of parked macro operations
pub(crate) const MACRO_QUEUE_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroOperation {
    Press(KeyCode),
    Release(KeyCode),
    Tap(KeyCode),
    /// Tap a key with extra modifiers, like QMK's `tap_code16`
    TapWithModifiers(KeyCode, ModifierCombination),
    /// Wait before running the rest of the operations, in milliseconds
    Delay(u16),
}

/// Operations waiting behind a `Delay`.
#[derive(Debug, Default)]
pub(crate) struct MacroQueue {
    ops: Deque<MacroOperation, MACRO_QUEUE_SIZE>,
    /// Until when the queue is parked
    pub(crate) deadline: Option<Instant>,
}

impl MacroQueue {
    pub(crate) fn is_parked(&self) -> bool {
        self.deadline.is_some()
    }

    pub(crate) fn push(&mut self, op: MacroOperation) {
        if self.ops.push_back(op).is_err() {
            warn!("Macro queue is full, dropping {:?}", op);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<MacroOperation> {
        self.ops.pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
