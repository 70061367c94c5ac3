//! The hbmorrison layout: Colemak-DH base with home-row mods on the bottom row, two symbol layers
//! reached from the outer bottom keys, and nav/num layers on the thumbs.

use hbm_types::action::{Action, KeyAction};
use hbm_types::modifier::ModifierCombination;
use serde::{Deserialize, Serialize};

use super::{COL, ROW, ferris_hands};
use crate::config::BehaviorConfig;
use crate::error::KeymapError;
use crate::keymap::KeyMap;
use crate::tap_dance::TapDance;
use crate::userspace::Timings;

pub const NUM_LAYER: usize = 7;

pub const BASE: u8 = 0;
pub const LSYM: u8 = 1;
pub const RSYM: u8 = 2;
pub const NAV: u8 = 3;
pub const NUM: u8 = 4;
pub const FUNC: u8 = 5;
pub const CTLS: u8 = 6;

/// Tap dance indices of the tap dance variant
pub const TD_LSFT: u8 = 0;
pub const TD_RSFT: u8 = 1;
pub const TD_RSYM: u8 = 2;
pub const TD_LSYM: u8 = 3;

/// How the symbol layer side keys and the shift thumbs work
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Side keys tap `Z`/`/` and hold a symbol layer
    #[default]
    LayerTap,
    /// Side keys are one shot symbol layers
    OneShot,
    /// Side keys and shift thumbs are tap dances
    TapDance,
}

const RSFT: ModifierCombination = ModifierCombination::new_from(true, false, false, true, false);
const RCTL: ModifierCombination = ModifierCombination::new_from(true, false, false, false, true);

// Bare Ctrl-Alt keys. Right Ctrl with left Alt, since right Alt is AltGr on UK hosts.
const LCA: KeyAction = mods!(ModifierCombination::CTRL_ALT);
const RCA: KeyAction = wm!(LAlt, RCTL);

// Right-hand home-row mods send left-hand modifiers, the hand table attributes them to the right
const HR_LGUI: KeyAction = mt!(X, ModifierCombination::GUI);
const HR_LALT: KeyAction = mt!(C, ModifierCombination::ALT);
const HR_LCTL: KeyAction = mt!(D, ModifierCombination::CTRL);
const HR_LCA: KeyAction = mt!(V, ModifierCombination::CTRL_ALT);
const HR_RCA: KeyAction = mt!(K, ModifierCombination::CTRL_ALT);
const HR_RCTL: KeyAction = mt!(H, ModifierCombination::CTRL);
const HR_RALT: KeyAction = mt!(Comma, ModifierCombination::ALT);
const HR_RGUI: KeyAction = mt!(Dot, ModifierCombination::GUI);

const NO: KeyAction = a!(No);
const TRNS: KeyAction = a!(Transparent);

/// The layers of a variant
pub const fn layers(variant: Variant) -> [[[KeyAction; COL]; ROW]; NUM_LAYER] {
    let mut layers = [
        layer!([
            [k!(Q), k!(W), lt!(FUNC, F), k!(P), k!(B), k!(J), k!(L), lt!(CTLS, U), k!(Y), k!(Backspace)],
            [k!(A), k!(R), k!(S), k!(T), k!(G), k!(M), k!(N), k!(E), k!(I), k!(O)],
            [lt!(RSYM, Z), HR_LGUI, HR_LALT, HR_LCTL, HR_LCA, HR_RCA, HR_RCTL, HR_RALT, HR_RGUI, lt!(LSYM, Slash)],
            [NO, NO, NO, osm!(ModifierCombination::SHIFT), lt!(NAV, Space), lt!(NUM, Enter), osm!(RSFT), NO, NO, NO]
        ]),
        layer!([
            [uk!(EXLM), uk!(DQUO), uk!(PND), uk!(DLR), uk!(PERC), NO, NO, NO, NO, NO],
            [uk!(GRV), uk!(PIPE), k!(LeftBracket), uk!(LCBR), uk!(LPRN), NO, NO, NO, NO, NO],
            [k!(Z), uk!(BSLS), k!(RightBracket), uk!(RCBR), uk!(RPRN), NO, NO, NO, NO, TRNS],
            [NO, NO, NO, NO, NO, NO, NO, NO, NO, NO]
        ]),
        layer!([
            [NO, NO, NO, NO, NO, uk!(CIRC), uk!(AMPR), uk!(ASTR), uk!(UNDS), uk!(PLUS)],
            [NO, NO, NO, NO, NO, uk!(COLN), uk!(AT), uk!(TILD), k!(Minus), k!(Equal)],
            [TRNS, NO, NO, NO, NO, k!(Semicolon), k!(Quote), uk!(HASH), uk!(RABK), k!(Slash)],
            [NO, NO, NO, NO, NO, NO, NO, NO, NO, NO]
        ]),
        layer!([
            [NO, NO, NO, NO, NO, user!(Overview), user!(PrevDesktop), wm!(Tab, ModifierCombination::CTRL), user!(AltTab), user!(NextDesktop)],
            [NO, NO, NO, NO, NO, user!(Fullscreen), k!(Left), k!(Down), k!(Up), k!(Right)],
            [NO, k!(LGui), k!(LAlt), k!(LCtrl), LCA, user!(Minimise), k!(Home), k!(PageDown), k!(PageUp), k!(End)],
            [NO, NO, NO, NO, TRNS, k!(Escape), user!(EscColon), NO, NO, NO]
        ]),
        layer!([
            [NO, k!(Kc1), k!(Kc2), k!(Kc3), k!(KpSlash), NO, NO, NO, NO, NO],
            [NO, k!(Kc4), k!(Kc5), k!(Kc6), k!(Dot), NO, NO, NO, NO, NO],
            [NO, k!(Kc7), k!(Kc8), k!(Kc9), k!(Kc0), RCA, k!(RCtrl), k!(RAlt), k!(RGui), NO],
            [NO, NO, NO, shifted!(Tab), k!(Tab), TRNS, NO, NO, NO, NO]
        ]),
        layer!([
            [NO, NO, TRNS, NO, NO, k!(F1), k!(F2), k!(F3), k!(F4), k!(F5)],
            [NO, NO, NO, NO, NO, k!(F6), k!(F7), k!(F8), k!(F9), k!(F10)],
            [NO, k!(LGui), k!(LAlt), k!(LCtrl), LCA, k!(F11), k!(F12), k!(F13), k!(F14), k!(F15)],
            [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
        ]),
        layer!([
            [NO, media!(PlayPause), media!(Mute), k!(PrintScreen), user!(IsWindows), NO, NO, TRNS, NO, NO],
            [NO, media!(NextTrack), media!(VolumeIncrement), media!(BrightnessUp), user!(IsChromeOs), NO, NO, NO, NO, NO],
            [NO, media!(PrevTrack), media!(VolumeDecrement), media!(BrightnessDown), user!(IsLinux), NO, NO, NO, NO, NO],
            [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
        ]),
    ];

    let base = BASE as usize;
    match variant {
        Variant::LayerTap => (),
        Variant::OneShot => {
            layers[base][2][0] = osl!(RSYM);
            layers[base][2][9] = osl!(LSYM);
        }
        Variant::TapDance => {
            layers[base][2][0] = td!(TD_RSYM);
            layers[base][2][9] = td!(TD_LSYM);
            layers[base][3][3] = td!(TD_LSFT);
            layers[base][3][6] = td!(TD_RSFT);
        }
    }
    layers
}

/// Tap dances of the tap dance variant, in index order.
///
/// Shift thumbs: tap for one shot shift, hold for shift, double tap for caps word.
/// Side keys: tap for the letter, hold for the symbol layer, double tap to lock it.
/// The windows come from the userspace tapping terms.
pub fn tap_dances() -> [TapDance; 4] {
    let caps_word = KeyAction::Single(Action::CapsWordToggle);
    [
        TapDance::new(osm!(ModifierCombination::SHIFT), mods!(ModifierCombination::SHIFT), caps_word, None),
        TapDance::new(osm!(RSFT), mods!(RSFT), caps_word, None),
        TapDance::new(k!(Z), mo!(RSYM), tg!(RSYM), None),
        TapDance::new(k!(Slash), mo!(LSYM), tg!(LSYM), None),
    ]
}

/// Behavior config of a variant
pub fn behavior_config(variant: Variant, timings: &Timings) -> BehaviorConfig {
    let mut behavior = BehaviorConfig::default();
    behavior.tap_hold.tapping_term = timings.tapping_term;
    behavior.caps_word.idle_timeout = timings.caps_word_idle_timeout;
    if variant == Variant::TapDance {
        for tap_dance in tap_dances() {
            if behavior.tap_dance.tap_dances.push(tap_dance).is_err() {
                warn!("Tap dance config is full");
            }
        }
    }
    behavior
}

/// Build the keymap of a variant on `layers`, which should come from [`layers`] with the same variant
pub fn keymap<'a>(
    layers: &'a [[[KeyAction; COL]; ROW]; NUM_LAYER],
    variant: Variant,
    timings: &Timings,
) -> Result<KeyMap<'a, ROW, COL, NUM_LAYER>, KeymapError> {
    KeyMap::new(layers, ferris_hands(), behavior_config(variant, timings))
}
