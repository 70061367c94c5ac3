use embassy_time::{Duration, Instant};
use hbm_types::action::Action;
use hbm_types::modifier::HidModifiers;

use super::Keyboard;
use crate::userspace::{CapsWordDecision, Userspace};

/// Caps word: shift letters until a word-ending key, or until the keyboard is idle.
#[derive(Debug, Default)]
pub(crate) struct CapsWord {
    active: bool,
    /// Caps word turns off at this time unless another key is pressed
    pub(crate) deadline: Option<Instant>,
}

impl CapsWord {
    pub(crate) fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self, now: Instant, idle_timeout: Duration) {
        if !self.active {
            info!("Caps word on");
        }
        self.active = true;
        self.deadline = Some(now + idle_timeout);
    }

    pub(crate) fn deactivate(&mut self) {
        if self.active {
            info!("Caps word off");
        }
        self.active = false;
        self.deadline = None;
    }

    pub(crate) fn refresh(&mut self, now: Instant, idle_timeout: Duration) {
        if self.active {
            self.deadline = Some(now + idle_timeout);
        }
    }
}

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, U, ROW, COL, NUM_LAYER> {
    /// Run caps word on a press which is about to be dispatched
    pub(crate) fn process_caps_word(&mut self, action: &Action) {
        if !self.state.caps_word.is_active() {
            return;
        }
        let idle_timeout = self.state.keymap.behavior.caps_word.idle_timeout;
        self.state.caps_word.refresh(self.state.now, idle_timeout);

        // Layer keys, modifiers and one shot keys don't end the word
        match action {
            Action::Key(k) | Action::KeyWithModifier(k, _) if !k.is_modifier() => (),
            Action::User(_) => (),
            _ => return,
        }

        // Shortcuts like ctrl+c end the word
        if !(self.state.modifiers.explicit() & !HidModifiers::SHIFT).is_empty() {
            self.state.caps_word.deactivate();
            return;
        }

        match self.user.caps_word_press(action) {
            CapsWordDecision::Shifted => self.state.modifiers.weak |= HidModifiers::new().with_left_shift(true),
            CapsWordDecision::Continue => (),
            CapsWordDecision::Stop => self.state.caps_word.deactivate(),
        }
    }
}
