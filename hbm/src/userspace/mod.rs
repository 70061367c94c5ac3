//! Userspace callbacks and the keyboard primitives they can use.
//!
//! A [`Userspace`] sees every key event after tap/hold and tap dance resolution, and can
//! replace the default handling with its own sequence of [`KeyboardContext`] calls.

use embassy_time::{Duration, Instant};
use hbm_types::action::{Action, KeyAction};
use hbm_types::keycode::{HidKeyCode, KeyCode};
use hbm_types::modifier::{HidModifiers, ModifierCombination};
use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::classifier::{Hand, KeyClass};
use crate::event::KeyboardEvent;
use crate::keyboard_macro::MacroOperation;

pub mod hbmorrison;
pub mod tenkey;

pub use hbmorrison::HbmUserspace;
pub use tenkey::TenkeyUserspace;

/// Default tapping term, in milliseconds
pub const TAPPING_TERM: u64 = 190;
/// Tapping term of home-row mods
pub const TAPPING_TERM_MODS: u64 = 800;
/// Tapping term of layer keys
pub const TAPPING_TERM_LAYER: u64 = 175;
/// Tap dance window of the side keys
pub const TAPPING_TERM_SIDEKEY_TD: u64 = 150;
/// Tap dance window of the thumb keys
pub const TAPPING_TERM_THUMBKEY_TD: u64 = 50;
pub const CAPS_WORD_IDLE_TIMEOUT: u64 = 2000;
/// Pause between `Esc` and `:` of the esc-colon macro
pub const ESC_COLON_DELAY: u64 = 100;

/// Named timing constants of the userspace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timings {
    pub tapping_term: Duration,
    pub tapping_term_mods: Duration,
    pub tapping_term_layer: Duration,
    pub tapping_term_sidekey_td: Duration,
    pub tapping_term_thumbkey_td: Duration,
    pub caps_word_idle_timeout: Duration,
    pub esc_colon_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tapping_term: Duration::from_millis(TAPPING_TERM),
            tapping_term_mods: Duration::from_millis(TAPPING_TERM_MODS),
            tapping_term_layer: Duration::from_millis(TAPPING_TERM_LAYER),
            tapping_term_sidekey_td: Duration::from_millis(TAPPING_TERM_SIDEKEY_TD),
            tapping_term_thumbkey_td: Duration::from_millis(TAPPING_TERM_THUMBKEY_TD),
            caps_word_idle_timeout: Duration::from_millis(CAPS_WORD_IDLE_TIMEOUT),
            esc_colon_delay: Duration::from_millis(ESC_COLON_DELAY),
        }
    }
}

/// Host operating system, selects what the desktop macros send
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "lowercase")]
pub enum OperatingSystem {
    Windows,
    ChromeOs,
    #[default]
    Linux,
}

/// Custom keycodes, stored in a keymap as `Action::User(code)`
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CustomKey {
    /// Hold alt and tab through windows
    AltTab = 0,
    /// Esc, then `:`
    EscColon,
    NextDesktop,
    PrevDesktop,
    Overview,
    Fullscreen,
    Minimise,
    Emoji,
    IsWindows,
    IsChromeOs,
    IsLinux,
}

impl CustomKey {
    pub const fn action(self) -> Action {
        Action::User(self as u8)
    }

    /// The custom key of an action, if it is one
    pub fn from_action(action: &Action) -> Option<Self> {
        match action {
            Action::User(code) => Self::from_repr(*code),
            _ => None,
        }
    }
}

/// What caps word does with a keystroke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CapsWordDecision {
    /// Apply shift to this key and continue
    Shifted,
    /// Continue without shift
    Continue,
    /// Turn caps word off, the key is still sent
    Stop,
}

/// The key event handed to userspace callbacks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyRecord {
    /// The action at the key's position. For tap/hold keys this is the `TapHold` itself
    pub action: KeyAction,
    pub event: KeyboardEvent,
    pub hand: Hand,
    pub class: KeyClass,
    /// 1 when a tap/hold key was tapped, 0 when held, the number of taps for a tap dance
    pub tap_count: u8,
    pub time: Instant,
}

impl KeyRecord {
    /// The action which is executed, the tap action of a tapped tap/hold key
    pub fn executed(&self) -> Action {
        match self.action {
            KeyAction::Single(a) | KeyAction::Tap(a) => a,
            KeyAction::TapHold(tap, _) if self.tap_count > 0 => tap,
            KeyAction::TapHold(_, hold) => hold,
            _ => Action::No,
        }
    }
}

/// Keyboard primitives available to userspace callbacks.
///
/// Key primitives produce reports right away, unless a macro delay is pending: then they
/// queue behind it and run in order once it expires.
pub trait KeyboardContext {
    /// Registered modifiers
    fn get_mods(&self) -> HidModifiers;
    fn set_mods(&mut self, mods: HidModifiers);
    fn add_mods(&mut self, mods: HidModifiers);
    fn del_mods(&mut self, mods: HidModifiers);
    fn clear_mods(&mut self);
    fn get_oneshot_mods(&self) -> HidModifiers;
    fn del_oneshot_mods(&mut self, mods: HidModifiers);
    /// Modifiers applied to the next press report only
    fn add_weak_mods(&mut self, mods: HidModifiers);

    fn register_code(&mut self, key: KeyCode);
    fn unregister_code(&mut self, key: KeyCode);
    fn tap_code(&mut self, key: KeyCode);
    fn tap_code_with_modifiers(&mut self, key: KeyCode, modifiers: ModifierCombination);
    /// Delay the key primitives which follow
    fn delay(&mut self, ms: u16);
    fn send_macro(&mut self, operations: &[MacroOperation]);

    fn highest_layer(&self) -> u8;
    fn layer_on(&mut self, layer: u8);
    fn layer_off(&mut self, layer: u8);

    fn caps_word_on(&mut self);
    fn caps_word_off(&mut self);
    fn caps_word_toggle(&mut self);
    fn is_caps_word_on(&self) -> bool;

    /// Time of the event being processed
    fn now(&self) -> Instant;
}

/// Custom behavior hooked into the keyboard.
pub trait Userspace {
    /// Called for every dispatched key event, before the default handling.
    /// Return `false` to skip the default handling.
    fn process_record(&mut self, _ctx: &mut dyn KeyboardContext, _record: &KeyRecord) -> bool {
        true
    }

    /// Decide what caps word does with a keystroke
    fn caps_word_press(&mut self, action: &Action) -> CapsWordDecision {
        default_caps_word_press(action)
    }

    /// Tapping term of a tap/hold or tap dance key
    fn tapping_term(&self, _action: &KeyAction, default: Duration) -> Duration {
        default
    }
}

/// Keyboard without userspace callbacks
impl Userspace for () {}

/// Letters and `-` are shifted, digits, backspace, delete and `_` continue the word.
pub fn default_caps_word_press(action: &Action) -> CapsWordDecision {
    match action {
        Action::Key(KeyCode::Hid(k)) if k.is_letter() || *k == HidKeyCode::Minus => CapsWordDecision::Shifted,
        _ if continues_caps_word(action) => CapsWordDecision::Continue,
        _ => CapsWordDecision::Stop,
    }
}

/// Digits, backspace, delete and `_`
pub(crate) fn continues_caps_word(action: &Action) -> bool {
    match action {
        Action::Key(KeyCode::Hid(k)) => k.is_digit() || matches!(k, HidKeyCode::Backspace | HidKeyCode::Delete),
        Action::KeyWithModifier(KeyCode::Hid(HidKeyCode::Minus), m) => *m == ModifierCombination::SHIFT,
        _ => false,
    }
}

/// Letters are shifted. `-` stops the word, unlike the default.
pub(crate) fn letters_caps_word_press(action: &Action) -> CapsWordDecision {
    match action {
        Action::Key(KeyCode::Hid(k)) if k.is_letter() => CapsWordDecision::Shifted,
        _ if continues_caps_word(action) => CapsWordDecision::Continue,
        _ => CapsWordDecision::Stop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_caps_word_press() {
        let key = |k| Action::Key(KeyCode::Hid(k));
        assert_eq!(default_caps_word_press(&key(HidKeyCode::A)), CapsWordDecision::Shifted);
        assert_eq!(default_caps_word_press(&key(HidKeyCode::Minus)), CapsWordDecision::Shifted);
        assert_eq!(default_caps_word_press(&key(HidKeyCode::Kc5)), CapsWordDecision::Continue);
        assert_eq!(
            default_caps_word_press(&Action::KeyWithModifier(
                KeyCode::Hid(HidKeyCode::Minus),
                ModifierCombination::SHIFT
            )),
            CapsWordDecision::Continue
        );
        assert_eq!(default_caps_word_press(&key(HidKeyCode::Space)), CapsWordDecision::Stop);
        assert_eq!(letters_caps_word_press(&key(HidKeyCode::Minus)), CapsWordDecision::Stop);
    }

    #[test]
    fn test_custom_key_roundtrip() {
        assert_eq!(CustomKey::from_action(&CustomKey::Emoji.action()), Some(CustomKey::Emoji));
        assert_eq!(CustomKey::from_action(&Action::User(200)), None);
        assert_eq!(CustomKey::from_action(&Action::No), None);
    }
}
