use serde::{Deserialize, Serialize};
use strum::FromRepr;

use crate::modifier::HidModifiers;

/// Key codes in the keyboard/keypad page of the HID usage tables
/// Ref: <https://www.usb.org/sites/default/files/documents/hut1_12v2.pdf#page=53>
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord, FromRepr)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidKeyCode {
    /// Reserved, no-key.
    No = 0x00,
    /// `a` and `A`
    A = 0x04,
    B = 0x05,
    C = 0x06,
    D = 0x07,
    E = 0x08,
    F = 0x09,
    G = 0x0A,
    H = 0x0B,
    I = 0x0C,
    J = 0x0D,
    K = 0x0E,
    L = 0x0F,
    M = 0x10,
    N = 0x11,
    O = 0x12,
    P = 0x13,
    Q = 0x14,
    R = 0x15,
    S = 0x16,
    T = 0x17,
    U = 0x18,
    V = 0x19,
    W = 0x1A,
    X = 0x1B,
    Y = 0x1C,
    /// `z` and `Z`
    Z = 0x1D,
    /// `1` and `!`
    Kc1 = 0x1E,
    /// `2` and `"` on a UK layout
    Kc2 = 0x1F,
    /// `3` and `£` on a UK layout
    Kc3 = 0x20,
    Kc4 = 0x21,
    Kc5 = 0x22,
    Kc6 = 0x23,
    Kc7 = 0x24,
    Kc8 = 0x25,
    Kc9 = 0x26,
    Kc0 = 0x27,
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    /// `-` and `_`
    Minus = 0x2D,
    /// `=` and `+`
    Equal = 0x2E,
    /// `[` and `{`
    LeftBracket = 0x2F,
    /// `]` and `}`
    RightBracket = 0x30,
    /// `\` and `|` on ANSI, `#` and `~` on a UK layout
    Backslash = 0x31,
    /// Non-US `#` and `~`
    NonusHash = 0x32,
    /// `;` and `:`
    Semicolon = 0x33,
    /// `'` and `@` on a UK layout
    Quote = 0x34,
    /// `` ` `` and `¬` on a UK layout
    Grave = 0x35,
    /// `,` and `<`
    Comma = 0x36,
    /// `.` and `>`
    Dot = 0x37,
    /// `/` and `?`
    Slash = 0x38,
    CapsLock = 0x39,
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,
    PrintScreen = 0x46,
    ScrollLock = 0x47,
    Pause = 0x48,
    Insert = 0x49,
    Home = 0x4A,
    PageUp = 0x4B,
    Delete = 0x4C,
    End = 0x4D,
    PageDown = 0x4E,
    Right = 0x4F,
    Left = 0x50,
    Down = 0x51,
    Up = 0x52,
    NumLock = 0x53,
    KpSlash = 0x54,
    KpAsterisk = 0x55,
    KpMinus = 0x56,
    KpPlus = 0x57,
    KpEnter = 0x58,
    Kp1 = 0x59,
    Kp2 = 0x5A,
    Kp3 = 0x5B,
    Kp4 = 0x5C,
    Kp5 = 0x5D,
    Kp6 = 0x5E,
    Kp7 = 0x5F,
    Kp8 = 0x60,
    Kp9 = 0x61,
    Kp0 = 0x62,
    KpDot = 0x63,
    /// Non-US `\` and `|`, the key left of `Z` on ISO boards
    NonusBackslash = 0x64,
    Application = 0x65,
    F13 = 0x68,
    F14 = 0x69,
    F15 = 0x6A,
    F16 = 0x6B,
    F17 = 0x6C,
    F18 = 0x6D,
    F19 = 0x6E,
    F20 = 0x6F,
    F21 = 0x70,
    F22 = 0x71,
    F23 = 0x72,
    F24 = 0x73,
    LCtrl = 0xE0,
    LShift = 0xE1,
    LAlt = 0xE2,
    LGui = 0xE3,
    RCtrl = 0xE4,
    RShift = 0xE5,
    RAlt = 0xE6,
    RGui = 0xE7,
}

impl HidKeyCode {
    /// Returns `true` if the keycode is a modifier keycode
    pub fn is_modifier(self) -> bool {
        HidKeyCode::LCtrl <= self && self <= HidKeyCode::RGui
    }

    pub fn is_letter(self) -> bool {
        HidKeyCode::A <= self && self <= HidKeyCode::Z
    }

    pub fn is_digit(self) -> bool {
        HidKeyCode::Kc1 <= self && self <= HidKeyCode::Kc0
    }

    /// Returns the byte with the bit corresponding to the USB HID
    /// modifier bitfield set.
    pub fn to_hid_modifiers(self) -> HidModifiers {
        match self {
            HidKeyCode::LCtrl => HidModifiers::new().with_left_ctrl(true),
            HidKeyCode::LShift => HidModifiers::new().with_left_shift(true),
            HidKeyCode::LAlt => HidModifiers::new().with_left_alt(true),
            HidKeyCode::LGui => HidModifiers::new().with_left_gui(true),
            HidKeyCode::RCtrl => HidModifiers::new().with_right_ctrl(true),
            HidKeyCode::RShift => HidModifiers::new().with_right_shift(true),
            HidKeyCode::RAlt => HidModifiers::new().with_right_alt(true),
            HidKeyCode::RGui => HidModifiers::new().with_right_gui(true),
            _ => HidModifiers::new(),
        }
    }
}

/// Keys in consumer page
/// Ref: <https://www.usb.org/sites/default/files/documents/hut1_12v2.pdf#page=75>
#[repr(u16)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsumerKey {
    No = 0x00,
    BrightnessUp = 0x6F,
    BrightnessDown = 0x70,
    NextTrack = 0xB5,
    PrevTrack = 0xB6,
    StopPlay = 0xB7,
    PlayPause = 0xCD,
    Mute = 0xE2,
    VolumeIncrement = 0xE9,
    VolumeDecrement = 0xEA,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyCode {
    Hid(HidKeyCode),
    Consumer(ConsumerKey),
}

impl KeyCode {
    /// The HID keycode, if this is a keyboard page key
    pub fn as_hid(self) -> Option<HidKeyCode> {
        match self {
            KeyCode::Hid(k) => Some(k),
            KeyCode::Consumer(_) => None,
        }
    }

    pub fn is_modifier(self) -> bool {
        matches!(self, KeyCode::Hid(k) if k.is_modifier())
    }
}

impl From<HidKeyCode> for KeyCode {
    fn from(k: HidKeyCode) -> Self {
        KeyCode::Hid(k)
    }
}

impl From<ConsumerKey> for KeyCode {
    fn from(k: ConsumerKey) -> Self {
        KeyCode::Consumer(k)
    }
}

/// Symbols as they are typed on a host configured with a UK keyboard layout.
///
/// Each alias is a keycode plus the modifiers that produce the symbol.
pub mod uk {
    use super::HidKeyCode;
    use crate::modifier::ModifierCombination;

    const S: ModifierCombination = ModifierCombination::SHIFT;
    const NONE: ModifierCombination = ModifierCombination::new();

    pub const EXLM: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc1, S);
    pub const DQUO: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc2, S);
    pub const PND: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc3, S);
    pub const DLR: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc4, S);
    pub const PERC: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc5, S);
    pub const CIRC: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc6, S);
    pub const AMPR: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc7, S);
    pub const ASTR: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc8, S);
    pub const LPRN: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc9, S);
    pub const RPRN: (HidKeyCode, ModifierCombination) = (HidKeyCode::Kc0, S);
    pub const UNDS: (HidKeyCode, ModifierCombination) = (HidKeyCode::Minus, S);
    pub const PLUS: (HidKeyCode, ModifierCombination) = (HidKeyCode::Equal, S);
    pub const LCBR: (HidKeyCode, ModifierCombination) = (HidKeyCode::LeftBracket, S);
    pub const RCBR: (HidKeyCode, ModifierCombination) = (HidKeyCode::RightBracket, S);
    pub const COLN: (HidKeyCode, ModifierCombination) = (HidKeyCode::Semicolon, S);
    pub const AT: (HidKeyCode, ModifierCombination) = (HidKeyCode::Quote, S);
    pub const TILD: (HidKeyCode, ModifierCombination) = (HidKeyCode::Backslash, S);
    pub const PIPE: (HidKeyCode, ModifierCombination) = (HidKeyCode::NonusBackslash, S);
    pub const LABK: (HidKeyCode, ModifierCombination) = (HidKeyCode::Comma, S);
    pub const RABK: (HidKeyCode, ModifierCombination) = (HidKeyCode::Dot, S);
    pub const QUES: (HidKeyCode, ModifierCombination) = (HidKeyCode::Slash, S);
    pub const HASH: (HidKeyCode, ModifierCombination) = (HidKeyCode::Backslash, NONE);
    pub const BSLS: (HidKeyCode, ModifierCombination) = (HidKeyCode::NonusBackslash, NONE);
    pub const QUOT: (HidKeyCode, ModifierCombination) = (HidKeyCode::Quote, NONE);
    pub const GRV: (HidKeyCode, ModifierCombination) = (HidKeyCode::Grave, NONE);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keycode_ranges() {
        assert!(HidKeyCode::Q.is_letter());
        assert!(!HidKeyCode::Kc1.is_letter());
        assert!(HidKeyCode::Kc0.is_digit());
        assert!(HidKeyCode::RGui.is_modifier());
        assert!(!HidKeyCode::Delete.is_modifier());
        assert_eq!(HidKeyCode::from_repr(0x2A), Some(HidKeyCode::Backspace));
    }

    #[test]
    fn test_modifier_keycode_bits() {
        assert_eq!(HidKeyCode::LShift.to_hid_modifiers(), HidModifiers::new().with_left_shift(true));
        assert_eq!(HidKeyCode::RAlt.to_hid_modifiers().into_bits(), 0b0100_0000);
        assert!(HidKeyCode::Tab.to_hid_modifiers().is_empty());
    }
}
