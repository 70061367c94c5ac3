//! Actions stored in a keymap.
//!
//! A [`KeyAction`] is what sits at a keyboard position. It wraps one or two [`Action`]s and decides
//! when they fire: immediately, as a tap, after tap/hold resolution or after a tap dance.

use crate::keycode::{HidKeyCode, KeyCode};
use crate::modifier::ModifierCombination;

/// A KeyAction is the action at a keyboard position, stored in keymap.
/// It can be a single action like triggering a key, or a composite keyboard action like tap/hold
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    /// No action.
    No,
    /// Transparent action, next layer will be checked.
    Transparent,
    /// A single action, such as triggering a key, or activating a layer. Action is triggered when pressed and cancelled when released.
    Single(Action),
    /// Don't wait the release of the key, auto-release right after the press.
    Tap(Action),
    /// Tap/hold action: `TapHold(tap, hold)`.
    /// Home-row modifiers and layer-taps are tap/hold keys.
    TapHold(Action, Action),
    /// Tap dance action, references a tap dance configuration by index.
    TapDance(u8),
}

impl KeyAction {
    /// Convert `KeyAction` to the internal `Action`.
    /// Only valid for `Single` and `Tap` variant, returns `Action::No` for other variants.
    pub fn to_action(self) -> Action {
        match self {
            KeyAction::Single(a) | KeyAction::Tap(a) => a,
            _ => Action::No,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, KeyAction::No)
    }

    /// Returns `true` if the key is a tap/hold key whose hold action is a modifier
    pub fn is_mod_tap(&self) -> bool {
        matches!(self, KeyAction::TapHold(_, Action::Modifier(_)))
    }

    /// Returns `true` if the key is a tap/hold key whose hold action activates a layer
    pub fn is_layer_tap(&self) -> bool {
        matches!(self, KeyAction::TapHold(_, Action::LayerOn(_)))
    }
}

/// A single basic action that a keyboard can execute.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    /// Default action, no action.
    No,
    /// Transparent action, next layer will be checked.
    Transparent,
    /// A normal key stroke, keyboard page or consumer page.
    Key(KeyCode),
    /// Modifier combination, held while the key is held.
    Modifier(ModifierCombination),
    /// Key stroke with modifier combination triggered.
    KeyWithModifier(KeyCode, ModifierCombination),
    /// Activate a layer
    LayerOn(u8),
    /// Deactivate a layer
    LayerOff(u8),
    /// Toggle a layer
    LayerToggle(u8),
    /// Set default layer
    DefaultLayer(u8),
    /// Oneshot layer, keep the layer active until the next key is triggered.
    OneShotLayer(u8),
    /// Oneshot modifier, keep the modifier active until the next key is triggered.
    OneShotModifier(ModifierCombination),
    /// Turn caps word on, or off if it's already active.
    CapsWordToggle,
    /// A custom keycode. The engine does nothing with it, userspace callbacks give it meaning.
    User(u8),
}

impl Action {
    /// The keycode sent by this action, if it sends one
    pub fn keycode(&self) -> Option<KeyCode> {
        match self {
            Action::Key(k) | Action::KeyWithModifier(k, _) => Some(*k),
            _ => None,
        }
    }

    /// Returns `true` if this action sends exactly `key` without extra modifiers
    pub fn is_key(&self, key: HidKeyCode) -> bool {
        *self == Action::Key(KeyCode::Hid(key))
    }

    /// Returns `true` if this action changes the layer state
    pub fn is_layer_action(&self) -> bool {
        matches!(
            self,
            Action::LayerOn(_)
                | Action::LayerOff(_)
                | Action::LayerToggle(_)
                | Action::DefaultLayer(_)
                | Action::OneShotLayer(_)
        )
    }
}
