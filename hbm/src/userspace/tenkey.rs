use embassy_time::Duration;
use hbm_types::action::{Action, KeyAction};
use hbm_types::keycode::{HidKeyCode, KeyCode};
use hbm_types::modifier::HidModifiers;

use super::{CapsWordDecision, CustomKey, KeyRecord, KeyboardContext, Timings, Userspace, letters_caps_word_press};
use crate::layouts::tenkey::BASE;

/// Userspace of the tenkey layout
#[derive(Debug, Default)]
pub struct TenkeyUserspace {
    timings: Timings,
    /// LAlt is registered by the alt-tab key
    alt_tab_pressed: bool,
}

impl TenkeyUserspace {
    pub fn new(timings: Timings) -> Self {
        Self {
            timings,
            alt_tab_pressed: false,
        }
    }
}

impl Userspace for TenkeyUserspace {
    fn process_record(&mut self, ctx: &mut dyn KeyboardContext, record: &KeyRecord) -> bool {
        let action = record.executed();
        let custom_key = CustomKey::from_action(&action);

        if self.alt_tab_pressed && custom_key != Some(CustomKey::AltTab) {
            ctx.unregister_code(KeyCode::Hid(HidKeyCode::LAlt));
            self.alt_tab_pressed = false;
        }

        // Nothing above the base layer is shifted, except Tab
        if record.event.pressed && ctx.highest_layer() > BASE && !action.is_key(HidKeyCode::Tab) {
            ctx.del_mods(HidModifiers::SHIFT);
            ctx.del_oneshot_mods(HidModifiers::SHIFT);
        }

        if custom_key == Some(CustomKey::AltTab) {
            if record.event.pressed {
                if !self.alt_tab_pressed {
                    ctx.register_code(KeyCode::Hid(HidKeyCode::LAlt));
                    self.alt_tab_pressed = true;
                }
                ctx.tap_code(KeyCode::Hid(HidKeyCode::Tab));
            }
            return false;
        }
        true
    }

    fn caps_word_press(&mut self, action: &Action) -> CapsWordDecision {
        letters_caps_word_press(action)
    }

    fn tapping_term(&self, action: &KeyAction, default: Duration) -> Duration {
        match action {
            KeyAction::TapHold(_, Action::Modifier(_)) => self.timings.tapping_term_mods,
            KeyAction::TapHold(_, Action::LayerOn(_)) => self.timings.tapping_term_layer,
            _ => default,
        }
    }
}
