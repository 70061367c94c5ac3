use embassy_time::Instant;
use hbm_types::action::{Action, KeyAction};

use crate::classifier::{Hand, KeyClass};
use crate::event::{KeyPos, KeyboardEvent};

/// The buffer of tap/hold keys which are pressed.
///
/// At most one key in the buffer is undecided: while it is, later events wait in
/// the keyboard's unprocessed events instead of reaching the buffer.
#[derive(Debug, Default, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeldBuffer {
    pub(crate) keys: heapless::Vec<HeldKey, 16>,
}

impl HeldBuffer {
    /// Create a new held buffer
    pub fn new() -> Self {
        Self {
            keys: heapless::Vec::new(),
        }
    }

    /// Push a new held key into the buffer
    pub fn push(&mut self, key: HeldKey) {
        if let Err(e) = self.keys.push(key) {
            error!("Held buffer overflowed, cannot save: {:?}", e);
        }
    }

    /// Find a held key by the KeyPos
    pub fn find_pos(&self, pos: KeyPos) -> Option<&HeldKey> {
        self.keys.iter().find(|x| x.event.pos == pos)
    }

    /// Find a mutable held key by the KeyPos
    pub fn find_pos_mut(&mut self, pos: KeyPos) -> Option<&mut HeldKey> {
        self.keys.iter_mut().find(|x| x.event.pos == pos)
    }

    /// Remove a held key from the buffer, keep the order
    pub fn remove(&mut self, pos: KeyPos) -> Option<HeldKey> {
        self.keys
            .iter()
            .position(|k| k.event.pos == pos)
            .map(|i| self.keys.remove(i))
    }

    /// The key which is neither tap nor hold yet
    pub fn undecided(&self) -> Option<&HeldKey> {
        self.keys.iter().find(|k| k.state == KeyState::Pressed)
    }

    /// Another key was pressed, keys which are already holding can no longer retro tap
    pub fn mark_interrupted(&mut self, pressed: KeyPos) {
        self.keys
            .iter_mut()
            .filter(|k| k.event.pos != pressed && k.state == KeyState::Holding)
            .for_each(|k| k.interrupted = true);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// The state of a held key.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyState {
    /// After a press event is received, neither tap nor hold is decided
    Pressed,

    /// The key is decided as hold, the hold action is pressed
    Holding,

    /// The corresponding action is already executed (so the Pressed HID report is sent),
    /// but the release HID report is not sent yet (will be sent only when the corresponding
    /// key is really released). Quick tap puts a key in this state.
    ProcessedButReleaseNotReportedYet(Action),
    // The Idle state is represented by the removal from the HeldBuffer
}

#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HeldKey {
    pub event: KeyboardEvent,
    pub action: KeyAction,
    pub hand: Hand,
    pub class: KeyClass,
    /// Current state of the held key
    pub state: KeyState,
    /// The press time for the key
    pub press_time: Instant,
    /// The timeout time for the key
    pub timeout_time: Instant,
    /// Whether another key was pressed while this key was holding
    pub interrupted: bool,
}

impl HeldKey {
    pub fn new(
        event: KeyboardEvent,
        action: KeyAction,
        hand: Hand,
        state: KeyState,
        press_time: Instant,
        timeout_time: Instant,
    ) -> Self {
        Self {
            event,
            action,
            hand,
            class: crate::classifier::classify(&action),
            state,
            press_time,
            timeout_time,
            interrupted: false,
        }
    }
}
