//! The tenkey layout: Colemak-DH with home-row mods on the top and middle rows, fill layers
//! behind `S` and `E`, one shot symbol layers on the outer bottom keys, and modifier combos on
//! the bottom row.

use hbm_types::action::KeyAction;
use hbm_types::modifier::ModifierCombination;

use super::{COL, ROW, ferris_hands};
use crate::combo::Combo;
use crate::config::BehaviorConfig;
use crate::error::KeymapError;
use crate::keymap::KeyMap;
use crate::userspace::Timings;

pub const NUM_LAYER: usize = 8;

pub const BASE: u8 = 0;
pub const SYM_LEFT: u8 = 1;
pub const SYM_RIGHT: u8 = 2;
pub const FILL_LEFT: u8 = 3;
pub const FILL_RIGHT: u8 = 4;
pub const NAV: u8 = 5;
pub const NUM: u8 = 6;
pub const FUNC: u8 = 7;

const RCTL: ModifierCombination = ModifierCombination::new_from(true, false, false, false, true);
const RCTL_RSFT: ModifierCombination = ModifierCombination::new_from(true, false, false, true, true);
const CTRL_GUI: ModifierCombination = ModifierCombination::new_from(false, true, false, false, true);

const NO: KeyAction = a!(No);
const TRNS: KeyAction = a!(Transparent);

pub static LAYERS: [[[KeyAction; COL]; ROW]; NUM_LAYER] = [
    layer!([
        [k!(Q), mt!(W, ModifierCombination::ALT), k!(F), mt!(P, ModifierCombination::GUI), k!(B), k!(J), mt!(L, ModifierCombination::GUI), k!(U), mt!(Y, ModifierCombination::ALT), k!(Backspace)],
        [k!(A), mt!(R, ModifierCombination::CTRL), lt!(FILL_LEFT, S), mt!(T, ModifierCombination::SHIFT), k!(G), k!(M), mt!(N, ModifierCombination::SHIFT), lt!(FILL_RIGHT, E), mt!(I, ModifierCombination::CTRL), k!(O)],
        [osl!(SYM_LEFT), k!(X), k!(C), k!(D), k!(V), k!(K), k!(H), k!(Comma), k!(Dot), osl!(SYM_RIGHT)],
        [NO, NO, NO, osm!(ModifierCombination::SHIFT), lt!(NAV, Space), lt!(NUM, Enter), k!(Backspace), NO, NO, NO]
    ]),
    layer!([
        [NO, uk!(EXLM), uk!(QUES), uk!(CIRC), NO, NO, uk!(AMPR), uk!(ASTR), osl!(FUNC), NO],
        [NO, uk!(GRV), uk!(PLUS), uk!(COLN), NO, NO, uk!(AT), uk!(TILD), uk!(UNDS), NO],
        [NO, k!(X), k!(Equal), k!(Semicolon), NO, NO, uk!(QUOT), uk!(HASH), k!(Minus), NO],
        [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
    ]),
    layer!([
        [NO, uk!(DQUO), uk!(PND), uk!(DLR), NO, NO, uk!(PERC), NO, NO, NO],
        [NO, uk!(PIPE), k!(LeftBracket), uk!(LCBR), NO, NO, uk!(LPRN), uk!(LABK), NO, NO],
        [NO, uk!(BSLS), k!(RightBracket), uk!(RCBR), NO, NO, uk!(RPRN), uk!(RABK), k!(Dot), NO],
        [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
    ]),
    layer!([
        [NO, k!(LAlt), NO, k!(LGui), NO, NO, k!(J), NO, k!(Backspace), NO],
        [NO, k!(LCtrl), TRNS, k!(LShift), NO, NO, k!(M), NO, k!(O), NO],
        [NO, NO, NO, NO, NO, NO, k!(K), k!(H), k!(Slash), NO],
        [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
    ]),
    layer!([
        [NO, k!(Q), NO, k!(B), NO, NO, k!(LGui), NO, k!(LAlt), NO],
        [NO, k!(A), TRNS, k!(G), NO, NO, k!(LShift), k!(E), k!(LCtrl), NO],
        [NO, k!(Z), k!(D), k!(V), NO, NO, NO, NO, NO, NO],
        [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
    ]),
    layer!([
        [NO, k!(Escape), k!(PrintScreen), NO, NO, NO, wm!(Left, CTRL_GUI), k!(Up), wm!(Right, CTRL_GUI), NO],
        [NO, k!(Tab), user!(AltTab), NO, NO, NO, k!(Left), k!(Down), k!(Right), NO],
        [NO, k!(CapsLock), k!(PageDown), NO, NO, NO, k!(Home), k!(PageUp), k!(End), NO],
        [NO, NO, NO, NO, TRNS, k!(Escape), NO, NO, NO, NO]
    ]),
    layer!([
        [NO, k!(Kc1), k!(Kc2), k!(Kc3), NO, NO, NO, k!(Delete), k!(Backspace), NO],
        [NO, k!(Kc4), k!(Kc5), k!(Kc6), NO, NO, NO, k!(Kc0), NO, NO],
        [NO, k!(Kc7), k!(Kc8), k!(Kc9), NO, NO, NO, k!(Dot), k!(Slash), NO],
        [NO, NO, NO, shifted!(Tab), k!(Tab), TRNS, NO, NO, NO, NO]
    ]),
    layer!([
        [NO, k!(F1), k!(F2), k!(F3), NO, NO, media!(BrightnessUp), media!(VolumeIncrement), NO, NO],
        [NO, k!(F4), k!(F5), k!(F6), NO, NO, media!(BrightnessDown), media!(VolumeDecrement), media!(Mute), NO],
        [NO, k!(F7), k!(F8), k!(F9), NO, NO, k!(F10), k!(F11), k!(F12), NO],
        [NO, NO, NO, TRNS, TRNS, TRNS, TRNS, NO, NO, NO]
    ]),
];

/// Modifier combos on the bottom row, active on the base layer
pub fn combos() -> [Combo; 10] {
    let base = Some(BASE);
    [
        Combo::new([k!(V), k!(D)], mods!(ModifierCombination::CTRL | ModifierCombination::SHIFT), base),
        Combo::new([k!(D), k!(C)], mods!(ModifierCombination::CTRL), base),
        Combo::new([k!(C), k!(X)], mods!(ModifierCombination::ALT), base),
        Combo::new([k!(X), k!(Z)], mods!(ModifierCombination::GUI), base),
        Combo::new([k!(D), k!(C), k!(X)], mods!(ModifierCombination::MEH), base),
        Combo::new([k!(K), k!(H)], mods!(RCTL_RSFT), base),
        Combo::new([k!(H), k!(Comma)], mods!(RCTL), base),
        Combo::new([k!(Comma), k!(Dot)], mods!(ModifierCombination::ALT), base),
        Combo::new([k!(Dot), k!(Slash)], mods!(ModifierCombination::GUI), base),
        Combo::new([k!(H), k!(Comma), k!(Dot)], wm!(LAlt, RCTL_RSFT), base),
    ]
}

pub fn behavior_config(timings: &Timings) -> BehaviorConfig {
    let mut behavior = BehaviorConfig::default();
    behavior.tap_hold.tapping_term = timings.tapping_term;
    behavior.caps_word.idle_timeout = timings.caps_word_idle_timeout;
    for combo in combos() {
        if behavior.combo.combos.push(combo).is_err() {
            warn!("Combo config is full");
        }
    }
    behavior
}

pub fn keymap(timings: &Timings) -> Result<KeyMap<'static, ROW, COL, NUM_LAYER>, KeymapError> {
    KeyMap::new(&LAYERS, ferris_hands(), behavior_config(timings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap() {
        let keymap = keymap(&Timings::default()).unwrap();
        assert_eq!(keymap.combos.len(), 10);
        // Longest combos are tried first
        assert_eq!(keymap.combos[0].actions.len(), 3);
        assert_eq!(LAYERS[BASE as usize][2][0], osl!(SYM_LEFT));
    }
}
