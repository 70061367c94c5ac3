use hbm_types::modifier::{HidModifiers, ModifierCombination};

use super::Keyboard;
use crate::event::KeyboardEvent;
use crate::userspace::Userspace;

/// State machine for one shot keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OneShotState<T> {
    /// First one shot key press
    Initial(T),
    /// One shot key was released before any other key, normal one shot behavior
    Single(T),
    /// Another key was pressed before one shot key was released, treat as a normal modifier/layer
    Held(T),
    /// One shot inactive
    #[default]
    None,
}

impl<T> OneShotState<T> {
    /// Get the current one shot value if any
    pub fn value(&self) -> Option<&T> {
        match self {
            OneShotState::Initial(v) | OneShotState::Single(v) | OneShotState::Held(v) => Some(v),
            OneShotState::None => None,
        }
    }
}

/// Shift, and nothing else
fn is_shift_only(modifiers: HidModifiers) -> bool {
    !modifiers.is_empty() && (modifiers & !HidModifiers::SHIFT).is_empty()
}

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, U, ROW, COL, NUM_LAYER> {
    pub(crate) fn process_action_osm(&mut self, new_modifiers: ModifierCombination, event: KeyboardEvent) {
        let new_modifiers = new_modifiers.to_hid_modifiers();

        // Update one shot state
        if event.pressed {
            if self.try_double_tap_shift(new_modifiers) {
                return;
            }

            // Add new modifier combination to existing one shot or init if none
            let osm_state = &mut self.state.modifiers.osm_state;
            *osm_state = match *osm_state {
                OneShotState::None => OneShotState::Initial(new_modifiers),
                OneShotState::Initial(cur_modifiers) => OneShotState::Initial(cur_modifiers | new_modifiers),
                OneShotState::Single(cur_modifiers) => OneShotState::Single(cur_modifiers | new_modifiers),
                OneShotState::Held(cur_modifiers) => OneShotState::Held(cur_modifiers | new_modifiers),
            };
            self.osm_deadline = None;

            self.update_osl(event);
        } else {
            if core::mem::take(&mut self.osm_release_consumed) {
                return;
            }
            match self.state.modifiers.osm_state {
                OneShotState::Initial(cur_modifiers) | OneShotState::Single(cur_modifiers) => {
                    self.state.modifiers.osm_state = OneShotState::Single(cur_modifiers);
                    let timeout = self.state.keymap.behavior.one_shot.timeout;
                    self.osm_deadline = Some(self.state.now + timeout);
                    self.last_osm_tap = Some(self.state.now);
                }
                OneShotState::Held(_) => {
                    // Release modifier
                    self.update_osl(event);
                    self.state.modifiers.osm_state = OneShotState::None;

                    // This sends a separate hid report with the
                    // currently registered modifiers except the
                    // one shot modifiers -> this way "releasing" them.
                    self.state.send_keyboard_report_with_resolved_modifiers(false);
                }
                OneShotState::None => (),
            };
        }
    }

    /// A shift one shot tapped twice within the tapping term toggles caps word instead
    fn try_double_tap_shift(&mut self, new_modifiers: HidModifiers) -> bool {
        if !self.state.keymap.behavior.caps_word.double_tap_shift || !is_shift_only(new_modifiers) {
            return false;
        }
        let OneShotState::Single(cur_modifiers) = self.state.modifiers.osm_state else {
            return false;
        };
        let tapping_term = self.state.keymap.behavior.tap_hold.tapping_term;
        let within_term = self
            .last_osm_tap
            .is_some_and(|t| self.state.now.saturating_duration_since(t) <= tapping_term);
        if !is_shift_only(cur_modifiers) || !within_term {
            return false;
        }

        debug!("Double tapped one shot shift");
        self.state.modifiers.osm_state = OneShotState::None;
        self.osm_deadline = None;
        self.last_osm_tap = None;
        self.osm_release_consumed = true;
        if self.state.caps_word.is_active() {
            self.state.caps_word.deactivate();
        } else {
            self.state.activate_caps_word();
        }
        true
    }

    pub(crate) fn process_action_osl(&mut self, layer_num: u8, event: KeyboardEvent) {
        // Update one shot state
        if event.pressed {
            // Deactivate old layer if any
            if let Some(&l) = self.osl_state.value() {
                self.state.keymap.deactivate_layer(l);
            }

            // Update layer of one shot
            self.osl_state = match self.osl_state {
                OneShotState::None => OneShotState::Initial(layer_num),
                OneShotState::Initial(_) => OneShotState::Initial(layer_num),
                OneShotState::Single(_) => OneShotState::Single(layer_num),
                OneShotState::Held(_) => OneShotState::Held(layer_num),
            };
            self.osl_deadline = None;

            // Activate new layer
            self.state.keymap.activate_layer(layer_num);
        } else {
            match self.osl_state {
                OneShotState::Initial(l) | OneShotState::Single(l) => {
                    self.osl_state = OneShotState::Single(l);
                    let timeout = self.state.keymap.behavior.one_shot.timeout;
                    self.osl_deadline = Some(self.state.now + timeout);
                }
                OneShotState::Held(layer_num) => {
                    self.osl_state = OneShotState::None;
                    self.state.keymap.deactivate_layer(layer_num);
                }
                OneShotState::None => (),
            };
        }
    }

    pub(crate) fn update_osm(&mut self, event: KeyboardEvent) {
        match self.state.modifiers.osm_state {
            OneShotState::Initial(m) => self.state.modifiers.osm_state = OneShotState::Held(m),
            OneShotState::Single(_) => {
                if !event.pressed {
                    self.state.modifiers.osm_state = OneShotState::None;
                    self.osm_deadline = None;
                }
            }
            _ => (),
        }
    }

    pub(crate) fn update_osl(&mut self, event: KeyboardEvent) {
        match self.osl_state {
            OneShotState::Initial(l) => self.osl_state = OneShotState::Held(l),
            OneShotState::Single(layer_num) => {
                if !event.pressed {
                    self.state.keymap.deactivate_layer(layer_num);
                    self.osl_state = OneShotState::None;
                    self.osl_deadline = None;
                }
            }
            _ => (),
        }
    }

    /// One shot modifiers timed out before another key was pressed
    pub(crate) fn expire_osm(&mut self) {
        self.osm_deadline = None;
        if let OneShotState::Single(_) = self.state.modifiers.osm_state {
            debug!("One shot modifier timeout");
            self.state.modifiers.osm_state = OneShotState::None;
        }
    }

    pub(crate) fn expire_osl(&mut self) {
        self.osl_deadline = None;
        if let OneShotState::Single(layer_num) = self.osl_state {
            debug!("One shot layer {} timeout", layer_num);
            self.state.keymap.deactivate_layer(layer_num);
            self.osl_state = OneShotState::None;
        }
    }
}
