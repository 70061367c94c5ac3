use hbm_types::action::KeyAction;
use heapless::Vec;

use crate::event::KeyPos;

// Max number of combos
pub(crate) const COMBO_MAX_NUM: usize = 16;
// Max size of combos
pub(crate) const COMBO_MAX_LENGTH: usize = 4;

#[derive(Clone, Debug)]
pub struct Combo {
    pub(crate) actions: Vec<KeyAction, COMBO_MAX_LENGTH>,
    pub(crate) output: KeyAction,
    pub(crate) layer: Option<u8>,
    state: u8,
    /// Positions of the components which triggered the combo and are still held
    pub(crate) held: Vec<KeyPos, COMBO_MAX_LENGTH>,
}

impl Default for Combo {
    fn default() -> Self {
        Self::empty()
    }
}

impl Combo {
    pub fn new<I: IntoIterator<Item = KeyAction>>(actions: I, output: KeyAction, layer: Option<u8>) -> Self {
        let mut components = Vec::new();
        for a in actions {
            if components.push(a).is_err() {
                warn!("Combo has more than {} components, the rest are ignored", COMBO_MAX_LENGTH);
                break;
            }
        }
        Self {
            actions: components,
            output,
            layer,
            state: 0,
            held: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::<KeyAction, COMBO_MAX_LENGTH>::new(), KeyAction::No, None)
    }

    /// Record a component press. Returns `true` if the action is a component of this combo.
    pub(crate) fn update(&mut self, key_action: KeyAction, active_layer: u8) -> bool {
        if key_action == KeyAction::No || self.is_triggered() {
            return false;
        }

        if let Some(layer) = self.layer {
            if layer != active_layer {
                return false;
            }
        }

        let action_idx = self.actions.iter().position(|&a| a == key_action);
        if let Some(i) = action_idx {
            self.state |= 1 << i;
        } else if !self.done() {
            self.reset();
        }
        action_idx.is_some()
    }

    /// Would `key_action` start or continue this combo on `active_layer`?
    pub(crate) fn accepts(&self, key_action: &KeyAction, active_layer: u8) -> bool {
        if self.is_triggered() || self.layer.is_some_and(|l| l != active_layer) {
            return false;
        }
        self.actions.iter().enumerate().any(|(i, a)| a == key_action && self.state & (1 << i) == 0)
    }

    pub(crate) fn done(&self) -> bool {
        self.started() && self.keys_pressed() == self.actions.len() as u32
    }

    pub(crate) fn started(&self) -> bool {
        self.state != 0
    }

    pub(crate) fn keys_pressed(&self) -> u32 {
        self.state.count_ones()
    }

    pub(crate) fn is_triggered(&self) -> bool {
        !self.held.is_empty()
    }

    pub(crate) fn reset(&mut self) {
        self.state = 0;
    }
}
