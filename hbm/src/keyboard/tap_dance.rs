use embassy_time::Instant;
use hbm_types::action::KeyAction;

use super::Keyboard;
use crate::event::{KeyPos, KeyboardEvent};
use crate::tap_dance::classify;
use crate::userspace::Userspace;

/// Progress of one tap dance key
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct DanceTracker {
    /// Number of presses so far
    count: u8,
    pressed: bool,
    /// Another key was pressed during the dance
    interrupted: bool,
    pos: Option<KeyPos>,
    /// End of the window for the next tap
    pub(crate) deadline: Option<Instant>,
    /// Outcome dispatched while the key was still down, released with the key
    active: Option<KeyAction>,
}

impl DanceTracker {
    fn is_dancing(&self) -> bool {
        self.count > 0 && self.active.is_none()
    }
}

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, U, ROW, COL, NUM_LAYER> {
    pub(crate) fn process_key_action_tap_dance(&mut self, index: u8, event: KeyboardEvent, time: Instant) {
        let i = index as usize;
        if i >= self.tap_dances.len() {
            warn!("Tap dance {} out of range", index);
            return;
        }

        if event.pressed {
            let Some(tap_dance) = self.state.keymap.behavior.tap_dance.tap_dances.get(i) else {
                warn!("Tap dance {} is not configured", index);
                return;
            };
            let default = self.state.keymap.behavior.tap_hold.tapping_term;
            let tapping_term = tap_dance
                .tapping_term
                .unwrap_or_else(|| self.user.tapping_term(&KeyAction::TapDance(index), default));

            let tracker = &mut self.tap_dances[i];
            tracker.count = tracker.count.saturating_add(1);
            tracker.pressed = true;
            tracker.pos = Some(event.pos);
            tracker.deadline = Some(time + tapping_term);

            // A second tap needs no more waiting
            if tracker.count >= 2 {
                self.finish_tap_dance(i);
            }
        } else if let Some(action) = self.tap_dances[i].active {
            let tap_count = self.tap_dances[i].count;
            self.tap_dances[i] = DanceTracker::default();
            self.dispatch_key_action(action, event, tap_count);
        } else {
            self.tap_dances[i].pressed = false;
        }
    }

    /// Decide the outcome of a tap dance and dispatch its action
    pub(crate) fn finish_tap_dance(&mut self, i: usize) {
        let tracker = self.tap_dances[i];
        let Some(pos) = tracker.pos else {
            self.tap_dances[i] = DanceTracker::default();
            return;
        };
        let state = classify(tracker.count, tracker.pressed, tracker.interrupted);
        let action = self
            .state
            .keymap
            .behavior
            .tap_dance
            .tap_dances
            .get(i)
            .map_or(KeyAction::No, |td| td.action(state));
        debug!("Tap dance {} finished as {:?}", i, state);

        let press = KeyboardEvent { pressed: true, pos };
        if tracker.pressed {
            self.tap_dances[i].deadline = None;
            self.tap_dances[i].active = Some(action);
            self.dispatch_key_action(action, press, tracker.count);
        } else {
            self.tap_dances[i] = DanceTracker::default();
            self.dispatch_key_action(action, press, tracker.count);
            self.dispatch_key_action(action, KeyboardEvent { pressed: false, pos }, tracker.count);
        }
    }

    /// Another key was pressed, every dance in progress ends now
    pub(crate) fn interrupt_tap_dances(&mut self, pos: KeyPos) {
        for i in 0..self.tap_dances.len() {
            let tracker = &mut self.tap_dances[i];
            if tracker.is_dancing() && tracker.pos != Some(pos) {
                tracker.interrupted = true;
                self.finish_tap_dance(i);
            }
        }
    }

    /// Dance windows which expired at `time`
    pub(crate) fn expire_tap_dances(&mut self, time: Instant) {
        for i in 0..self.tap_dances.len() {
            let tracker = &self.tap_dances[i];
            if tracker.is_dancing() && tracker.deadline.is_some_and(|d| d <= time) {
                self.finish_tap_dance(i);
            }
        }
    }

    pub(crate) fn next_tap_dance_deadline(&self) -> Option<Instant> {
        self.tap_dances
            .iter()
            .filter(|t| t.is_dancing())
            .filter_map(|t| t.deadline)
            .min()
    }
}
