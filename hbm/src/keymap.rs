use hbm_types::action::{Action, KeyAction};

use crate::classifier::Hand;
use crate::combo::Combo;
use crate::config::BehaviorConfig;
use crate::error::KeymapError;
use crate::event::KeyboardEvent;

/// Keymap represents the stack of layers.
///
/// Each physical position also carries the hand it belongs to, which the
/// handedness rules read when a key is pressed.
pub struct KeyMap<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Layers
    pub(crate) layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
    /// Hand of each position
    hands: [[Hand; COL]; ROW],
    /// Current state of each layer
    layer_state: [bool; NUM_LAYER],
    /// Default layer number
    default_layer: u8,
    /// Layer cache
    layer_cache: [[u8; COL]; ROW],
    /// Combos, longest first
    pub(crate) combos: heapless::Vec<Combo, { crate::combo::COMBO_MAX_NUM }>,
    /// Options for configurable action behavior
    pub(crate) behavior: BehaviorConfig,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyMap<'a, ROW, COL, NUM_LAYER> {
    pub fn new(
        layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
        hands: [[Hand; COL]; ROW],
        behavior: BehaviorConfig,
    ) -> Result<Self, KeymapError> {
        for layer in layers.iter() {
            for row in layer.iter() {
                for action in row.iter() {
                    Self::validate_action(action, &behavior)?;
                }
            }
        }
        for td in behavior.tap_dance.tap_dances.iter() {
            for action in [td.tap, td.hold, td.double_tap] {
                Self::validate_action(&action, &behavior)?;
            }
        }
        for (i, combo) in behavior.combo.combos.iter().enumerate() {
            if combo.actions.is_empty() {
                return Err(KeymapError::EmptyCombo(i));
            }
            Self::validate_action(&combo.output, &behavior)?;
            if let Some(layer) = combo.layer {
                Self::validate_layer(layer)?;
            }
        }

        let mut combos = behavior.combo.combos.clone();
        combos.sort_unstable_by(|c1, c2| c2.actions.len().cmp(&c1.actions.len()));

        Ok(KeyMap {
            layers,
            hands,
            layer_state: [false; NUM_LAYER],
            default_layer: 0,
            layer_cache: [[0; COL]; ROW],
            combos,
            behavior,
        })
    }

    fn validate_layer(layer: u8) -> Result<(), KeymapError> {
        if layer as usize >= NUM_LAYER {
            return Err(KeymapError::LayerOutOfRange {
                layer,
                num_layers: NUM_LAYER,
            });
        }
        Ok(())
    }

    fn validate_action(action: &KeyAction, behavior: &BehaviorConfig) -> Result<(), KeymapError> {
        let check = |a: &Action| match a {
            Action::LayerOn(l)
            | Action::LayerOff(l)
            | Action::LayerToggle(l)
            | Action::DefaultLayer(l)
            | Action::OneShotLayer(l) => Self::validate_layer(*l),
            _ => Ok(()),
        };
        match action {
            KeyAction::Single(a) | KeyAction::Tap(a) => check(a),
            KeyAction::TapHold(tap, hold) => check(tap).and(check(hold)),
            KeyAction::TapDance(idx) => {
                if (*idx as usize) < behavior.tap_dance.tap_dances.len() {
                    Ok(())
                } else {
                    Err(KeymapError::TapDanceNotFound(*idx))
                }
            }
            KeyAction::No | KeyAction::Transparent => Ok(()),
        }
    }

    /// Get the default layer number
    pub fn get_default_layer(&self) -> u8 {
        self.default_layer
    }

    /// Set the default layer number
    pub(crate) fn set_default_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }
        self.default_layer = layer_num;
    }

    /// Hand of the key at the event's position
    pub fn hand_of(&self, event: &KeyboardEvent) -> Hand {
        self.hands
            .get(event.pos.row as usize)
            .and_then(|r| r.get(event.pos.col as usize))
            .copied()
            .unwrap_or_default()
    }

    /// Fetch the action in keymap, with layer cache
    pub(crate) fn get_action_with_layer_cache(&mut self, event: KeyboardEvent) -> KeyAction {
        let row = event.pos.row as usize;
        let col = event.pos.col as usize;
        if row >= ROW || col >= COL {
            warn!("Key position {:?} is out of the keymap", event.pos);
            return KeyAction::No;
        }
        if !event.pressed {
            // Releasing a pressed key, use cached layer and restore the cache
            let layer = self.pop_layer_from_cache(row, col);
            return self.layers[layer as usize][row][col];
        }

        // Iterate from higher layer to lower layer, the lowest checked layer is the default layer
        for (layer_idx, layer) in self.layers.iter().enumerate().rev() {
            if self.layer_state[layer_idx] || layer_idx as u8 == self.default_layer {
                let action = layer[row][col];
                if action == KeyAction::Transparent {
                    continue;
                }

                // Found a valid action in the layer, cache it
                self.layer_cache[row][col] = layer_idx as u8;
                return action;
            }

            if layer_idx as u8 == self.default_layer {
                break;
            }
        }

        KeyAction::No
    }

    /// Fetch the action a press at `event` would resolve to, without touching the layer cache
    pub(crate) fn peek_action(&self, event: KeyboardEvent) -> KeyAction {
        let row = event.pos.row as usize;
        let col = event.pos.col as usize;
        if row >= ROW || col >= COL {
            return KeyAction::No;
        }
        if !event.pressed {
            return self.layers[self.layer_cache[row][col] as usize][row][col];
        }
        for (layer_idx, layer) in self.layers.iter().enumerate().rev() {
            if self.layer_state[layer_idx] || layer_idx as u8 == self.default_layer {
                let action = layer[row][col];
                if action != KeyAction::Transparent {
                    return action;
                }
            }
            if layer_idx as u8 == self.default_layer {
                break;
            }
        }
        KeyAction::No
    }

    /// The highest active layer
    pub fn get_activated_layer(&self) -> u8 {
        for (layer_idx, _) in self.layers.iter().enumerate().rev() {
            if self.layer_state[layer_idx] || layer_idx as u8 == self.default_layer {
                return layer_idx as u8;
            }
        }

        self.default_layer
    }

    pub fn is_layer_active(&self, layer_num: u8) -> bool {
        self.layer_state.get(layer_num as usize).copied().unwrap_or(false) || layer_num == self.default_layer
    }

    fn pop_layer_from_cache(&mut self, row: usize, col: usize) -> u8 {
        let layer = self.layer_cache[row][col];
        self.layer_cache[row][col] = self.default_layer;

        layer
    }

    /// Activate given layer
    pub(crate) fn activate_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }
        self.layer_state[layer_num as usize] = true;
    }

    /// Deactivate given layer
    pub(crate) fn deactivate_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }
        self.layer_state[layer_num as usize] = false;
    }

    /// Toggle given layer
    pub(crate) fn toggle_layer(&mut self, layer_num: u8) {
        if layer_num as usize >= NUM_LAYER {
            warn!("Not a valid layer {}, keyboard supports only {} layers", layer_num, NUM_LAYER);
            return;
        }

        self.layer_state[layer_num as usize] = !self.layer_state[layer_num as usize];
    }
}

#[cfg(test)]
mod tests {
    use hbm_types::keycode::{HidKeyCode, KeyCode};

    use super::*;
    use crate::classifier::split_hands;
    use crate::tap_dance::TapDance;

    const fn key(k: HidKeyCode) -> KeyAction {
        KeyAction::Single(Action::Key(KeyCode::Hid(k)))
    }

    static LAYERS: [[[KeyAction; 2]; 1]; 3] = [
        [[key(HidKeyCode::A), KeyAction::Single(Action::LayerOn(1))]],
        [[KeyAction::Transparent, KeyAction::Transparent]],
        [[key(HidKeyCode::Kc1), KeyAction::No]],
    ];

    #[test]
    fn test_transparent_and_cache() {
        let mut keymap = KeyMap::new(&LAYERS, split_hands::<1, 2>(), BehaviorConfig::default()).unwrap();
        keymap.activate_layer(2);
        assert_eq!(keymap.get_activated_layer(), 2);
        assert_eq!(keymap.get_action_with_layer_cache(KeyboardEvent::key(0, 0, true)), key(HidKeyCode::Kc1));

        // Release resolves on the layer the key was pressed on
        keymap.deactivate_layer(2);
        assert_eq!(keymap.get_action_with_layer_cache(KeyboardEvent::key(0, 0, false)), key(HidKeyCode::Kc1));

        keymap.activate_layer(1);
        assert_eq!(keymap.get_action_with_layer_cache(KeyboardEvent::key(0, 0, true)), key(HidKeyCode::A));
        assert_eq!(keymap.hand_of(&KeyboardEvent::key(0, 1, true)), Hand::Right);
    }

    #[test]
    fn test_invalid_references() {
        static BAD_LAYER: [[[KeyAction; 1]; 1]; 1] = [[[KeyAction::Single(Action::LayerOn(4))]]];
        assert_eq!(
            KeyMap::new(&BAD_LAYER, split_hands::<1, 1>(), BehaviorConfig::default()).err(),
            Some(KeymapError::LayerOutOfRange { layer: 4, num_layers: 1 })
        );

        static BAD_TD: [[[KeyAction; 1]; 1]; 1] = [[[KeyAction::TapDance(1)]]];
        let mut behavior = BehaviorConfig::default();
        behavior.tap_dance.tap_dances.push(TapDance::default()).unwrap();
        assert_eq!(
            KeyMap::new(&BAD_TD, split_hands::<1, 1>(), behavior).err(),
            Some(KeymapError::TapDanceNotFound(1))
        );
    }
}
