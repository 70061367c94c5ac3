use embassy_time::Duration;
use hbm_types::action::{Action, KeyAction};
use hbm_types::keycode::{HidKeyCode, KeyCode};
use hbm_types::modifier::{HidModifiers, ModifierCombination};

use super::{
    CapsWordDecision, CustomKey, KeyRecord, KeyboardContext, OperatingSystem, Timings, Userspace,
    letters_caps_word_press,
};
use crate::layouts::hbmorrison::{LSYM, RSYM, TD_LSFT, TD_LSYM, TD_RSFT, TD_RSYM};

/// Userspace of the hbmorrison layout
#[derive(Debug, Default)]
pub struct HbmUserspace {
    timings: Timings,
    /// Host OS the desktop macros are sent for
    os: OperatingSystem,
    /// LAlt is registered by the alt-tab key
    alt_tab_pressed: bool,
    /// Shift+Backspace registered Delete
    del_registered: bool,
}

impl HbmUserspace {
    pub fn new(timings: Timings, os: OperatingSystem) -> Self {
        Self {
            timings,
            os,
            ..Default::default()
        }
    }

    pub fn operating_system(&self) -> OperatingSystem {
        self.os
    }

    fn process_custom_key(&mut self, ctx: &mut dyn KeyboardContext, key: CustomKey) {
        match key {
            CustomKey::AltTab => {
                // Keep LAlt down while tabbing through windows
                if !self.alt_tab_pressed {
                    ctx.register_code(KeyCode::Hid(HidKeyCode::LAlt));
                    self.alt_tab_pressed = true;
                }
                ctx.tap_code(KeyCode::Hid(HidKeyCode::Tab));
            }
            CustomKey::EscColon => {
                ctx.tap_code(KeyCode::Hid(HidKeyCode::Escape));
                ctx.delay(delay_ms(self.timings.esc_colon_delay));
                ctx.tap_code_with_modifiers(KeyCode::Hid(HidKeyCode::Semicolon), ModifierCombination::SHIFT);
            }
            CustomKey::IsWindows => self.set_operating_system(OperatingSystem::Windows),
            CustomKey::IsChromeOs => self.set_operating_system(OperatingSystem::ChromeOs),
            CustomKey::IsLinux => self.set_operating_system(OperatingSystem::Linux),
            _ => {
                if let Some((key, modifiers)) = desktop_shortcut(self.os, key) {
                    ctx.tap_code_with_modifiers(KeyCode::Hid(key), modifiers);
                }
            }
        }
    }

    fn set_operating_system(&mut self, os: OperatingSystem) {
        info!("Operating system: {:?}", os);
        self.os = os;
    }
}

fn delay_ms(duration: Duration) -> u16 {
    u16::try_from(duration.as_millis()).unwrap_or(u16::MAX)
}

/// The shortcut a desktop macro sends on `os`
pub fn desktop_shortcut(os: OperatingSystem, key: CustomKey) -> Option<(HidKeyCode, ModifierCombination)> {
    const CTRL_GUI: ModifierCombination = ModifierCombination::new_from(false, true, false, false, true);
    const SHIFT_GUI: ModifierCombination = ModifierCombination::new_from(false, true, false, true, false);
    const NONE: ModifierCombination = ModifierCombination::new();
    use ModifierCombination as M;
    use OperatingSystem::*;

    let shortcut = match (key, os) {
        (CustomKey::NextDesktop, Windows) => (HidKeyCode::Right, CTRL_GUI),
        (CustomKey::NextDesktop, ChromeOs) => (HidKeyCode::RightBracket, M::GUI),
        (CustomKey::NextDesktop, Linux) => (HidKeyCode::Right, M::CTRL_ALT),
        (CustomKey::PrevDesktop, Windows) => (HidKeyCode::Left, CTRL_GUI),
        (CustomKey::PrevDesktop, ChromeOs) => (HidKeyCode::LeftBracket, M::GUI),
        (CustomKey::PrevDesktop, Linux) => (HidKeyCode::Left, M::CTRL_ALT),
        (CustomKey::Overview, Windows) => (HidKeyCode::Tab, M::GUI),
        (CustomKey::Overview, ChromeOs) => (HidKeyCode::F5, NONE),
        (CustomKey::Overview, Linux) => (HidKeyCode::LGui, NONE),
        (CustomKey::Fullscreen, ChromeOs) => (HidKeyCode::F4, NONE),
        (CustomKey::Fullscreen, _) => (HidKeyCode::F11, NONE),
        (CustomKey::Minimise, Windows) => (HidKeyCode::Down, M::GUI),
        (CustomKey::Minimise, ChromeOs) => (HidKeyCode::Minus, M::ALT),
        (CustomKey::Minimise, Linux) => (HidKeyCode::H, M::GUI),
        (CustomKey::Emoji, Windows) => (HidKeyCode::Semicolon, M::GUI),
        (CustomKey::Emoji, ChromeOs) => (HidKeyCode::Space, SHIFT_GUI),
        (CustomKey::Emoji, Linux) => (HidKeyCode::Dot, M::CTRL),
        _ => return None,
    };
    Some(shortcut)
}

impl Userspace for HbmUserspace {
    fn process_record(&mut self, ctx: &mut dyn KeyboardContext, record: &KeyRecord) -> bool {
        let action = record.executed();
        let custom_key = CustomKey::from_action(&action);

        // Release LAlt once anything but alt-tab happens
        if self.alt_tab_pressed && custom_key != Some(CustomKey::AltTab) {
            ctx.unregister_code(KeyCode::Hid(HidKeyCode::LAlt));
            self.alt_tab_pressed = false;
        }

        // Symbols are never shifted, unless the keymap shifts them explicitly
        let pressed = record.event.pressed;
        if pressed && matches!(ctx.highest_layer(), LSYM | RSYM) {
            ctx.del_mods(HidModifiers::SHIFT);
            ctx.del_oneshot_mods(HidModifiers::SHIFT);
        }

        let mod_state = ctx.get_mods();

        if action.is_key(HidKeyCode::Backspace) {
            if pressed && mod_state.intersects(HidModifiers::SHIFT) {
                ctx.del_mods(HidModifiers::SHIFT);
                ctx.register_code(KeyCode::Hid(HidKeyCode::Delete));
                self.del_registered = true;
                ctx.set_mods(mod_state);
                return false;
            }
            if !pressed && self.del_registered {
                ctx.unregister_code(KeyCode::Hid(HidKeyCode::Delete));
                self.del_registered = false;
                return false;
            }
            return true;
        }

        match custom_key {
            Some(key) => {
                if pressed {
                    self.process_custom_key(ctx, key);
                }
                false
            }
            None => true,
        }
    }

    fn caps_word_press(&mut self, action: &Action) -> CapsWordDecision {
        letters_caps_word_press(action)
    }

    fn tapping_term(&self, action: &KeyAction, default: Duration) -> Duration {
        match action {
            KeyAction::TapHold(_, Action::LayerOn(_)) => self.timings.tapping_term_layer,
            KeyAction::TapDance(TD_LSYM | TD_RSYM) => self.timings.tapping_term_sidekey_td,
            KeyAction::TapDance(TD_LSFT | TD_RSFT) => self.timings.tapping_term_thumbkey_td,
            _ => default,
        }
    }
}
