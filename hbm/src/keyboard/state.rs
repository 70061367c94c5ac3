use embassy_time::{Duration, Instant};
use hbm_types::keycode::{HidKeyCode, KeyCode};
use hbm_types::modifier::{HidModifiers, ModifierCombination};
use heapless::Deque;
use usbd_hid::descriptor::MediaKeyboardReport;

use super::caps_word::CapsWord;
use super::modifiers::ModifierState;
use super::oneshot::OneShotState;
use crate::descriptor::KeyboardReport;
use crate::event::KeyPos;
use crate::hid::Report;
use crate::keyboard_macro::{MacroOperation, MacroQueue};
use crate::keymap::KeyMap;
use crate::userspace::KeyboardContext;

// Max number of reports waiting to be taken
pub(crate) const REPORT_QUEUE_SIZE: usize = 32;

/// Everything userspace callbacks can reach through [`KeyboardContext`].
pub struct KeyboardState<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Keymap
    pub(crate) keymap: KeyMap<'a, ROW, COL, NUM_LAYER>,

    pub(crate) modifiers: ModifierState,

    pub(crate) caps_word: CapsWord,

    /// the held keys for the keyboard hid report, except the modifiers
    pub(crate) held_keycodes: [HidKeyCode; 6],

    /// Registered key position, `None` for keys registered by macros
    registered_keys: [Option<KeyPos>; 6],

    /// Reports waiting to be taken
    pub(crate) reports: Deque<Report, REPORT_QUEUE_SIZE>,

    pub(crate) macros: MacroQueue,

    /// Time of the event being processed
    pub(crate) now: Instant,
}

impl<'a, const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyboardState<'a, ROW, COL, NUM_LAYER> {
    pub(crate) fn new(keymap: KeyMap<'a, ROW, COL, NUM_LAYER>) -> Self {
        Self {
            keymap,
            modifiers: ModifierState::default(),
            caps_word: CapsWord::default(),
            held_keycodes: [HidKeyCode::No; 6],
            registered_keys: [None; 6],
            reports: Deque::new(),
            macros: MacroQueue::default(),
            now: Instant::from_ticks(0),
        }
    }

    fn push_report(&mut self, report: Report) {
        if self.reports.push_back(report).is_err() {
            warn!("Report queue is full, dropping report");
        }
    }

    pub(crate) fn send_keyboard_report_with_resolved_modifiers(&mut self, pressed: bool) {
        let modifier = self.modifiers.resolve(pressed).into_bits();
        self.push_report(Report::KeyboardReport(KeyboardReport {
            modifier,
            reserved: 0,
            leds: 0,
            keycodes: self.held_keycodes.map(|k| k as u8),
        }));
        if pressed {
            self.modifiers.after_press_report();
        }
    }

    pub(crate) fn send_media_report(&mut self, usage_id: u16) {
        self.push_report(Report::MediaKeyboardReport(MediaKeyboardReport { usage_id }));
    }

    /// Register a key and send the report
    pub(crate) fn press_key(&mut self, key: KeyCode, pos: Option<KeyPos>) {
        match key {
            KeyCode::Hid(k) => {
                self.register_key(k, pos);
                self.send_keyboard_report_with_resolved_modifiers(true);
            }
            KeyCode::Consumer(c) => self.send_media_report(c as u16),
        }
    }

    /// Unregister a key and send the report
    pub(crate) fn release_key(&mut self, key: KeyCode, pos: Option<KeyPos>) {
        match key {
            KeyCode::Hid(k) => {
                self.unregister_key(k, pos);
                self.send_keyboard_report_with_resolved_modifiers(false);
            }
            KeyCode::Consumer(_) => self.send_media_report(0),
        }
    }

    /// Register a key, the key can be a basic keycode or a modifier.
    fn register_key(&mut self, key: HidKeyCode, pos: Option<KeyPos>) {
        if key.is_modifier() {
            self.modifiers.held |= key.to_hid_modifiers();
            return;
        }

        // First, find the key event slot according to the position
        let slot = pos.and_then(|p| self.registered_keys.iter().position(|k| *k == Some(p)));
        // Otherwise, find the first free slot
        let slot = slot.or_else(|| self.held_keycodes.iter().position(|&k| k == HidKeyCode::No));
        match slot {
            Some(index) => {
                self.held_keycodes[index] = key;
                self.registered_keys[index] = pos;
            }
            None => warn!("All 6 keycode slots are taken, dropping {:?}", key),
        }
    }

    /// Unregister a key, the key can be a basic keycode or a modifier.
    fn unregister_key(&mut self, key: HidKeyCode, pos: Option<KeyPos>) {
        if key.is_modifier() {
            self.modifiers.held &= !key.to_hid_modifiers();
            return;
        }

        let slot = pos.and_then(|p| self.registered_keys.iter().position(|k| *k == Some(p)));
        // Otherwise, release the first same key
        let slot = slot.or_else(|| self.held_keycodes.iter().position(|&k| k == key));
        if let Some(index) = slot {
            self.held_keycodes[index] = HidKeyCode::No;
            self.registered_keys[index] = None;
        }
    }

    fn run_macro_operation(&mut self, op: MacroOperation) {
        match op {
            MacroOperation::Press(k) => self.press_key(k, None),
            MacroOperation::Release(k) => self.release_key(k, None),
            MacroOperation::Tap(k) => {
                self.press_key(k, None);
                self.release_key(k, None);
            }
            MacroOperation::TapWithModifiers(k, m) => {
                self.modifiers.with_modifiers = m.to_hid_modifiers();
                self.press_key(k, None);
                self.modifiers.with_modifiers = HidModifiers::new();
                self.release_key(k, None);
            }
            MacroOperation::Delay(ms) => {
                self.macros.deadline = Some(self.now + Duration::from_millis(ms as u64));
            }
        }
    }

    /// Run an operation now, or queue it behind a pending delay
    pub(crate) fn queue_or_run(&mut self, op: MacroOperation) {
        if self.macros.is_parked() {
            self.macros.push(op);
        } else {
            self.run_macro_operation(op);
        }
    }

    /// The pending delay expired, run operations until the next one
    pub(crate) fn resume_macros(&mut self, now: Instant) {
        self.now = now;
        self.macros.deadline = None;
        while !self.macros.is_parked() {
            match self.macros.pop() {
                Some(op) => self.run_macro_operation(op),
                None => break,
            }
        }
    }

    /// Run all parked operations right away, skipping their delays
    pub(crate) fn flush_macros(&mut self) {
        if self.macros.is_empty() && !self.macros.is_parked() {
            return;
        }
        debug!("Flushing parked macro operations");
        self.macros.deadline = None;
        while let Some(op) = self.macros.pop() {
            if !matches!(op, MacroOperation::Delay(_)) {
                self.run_macro_operation(op);
            }
        }
    }

    pub(crate) fn activate_caps_word(&mut self) {
        let idle_timeout = self.keymap.behavior.caps_word.idle_timeout;
        self.caps_word.activate(self.now, idle_timeout);
    }
}

impl<const ROW: usize, const COL: usize, const NUM_LAYER: usize> KeyboardContext
    for KeyboardState<'_, ROW, COL, NUM_LAYER>
{
    fn get_mods(&self) -> HidModifiers {
        self.modifiers.held
    }

    fn set_mods(&mut self, mods: HidModifiers) {
        self.modifiers.held = mods;
    }

    fn add_mods(&mut self, mods: HidModifiers) {
        self.modifiers.held |= mods;
    }

    fn del_mods(&mut self, mods: HidModifiers) {
        self.modifiers.held &= !mods;
    }

    fn clear_mods(&mut self) {
        self.modifiers.held = HidModifiers::new();
    }

    fn get_oneshot_mods(&self) -> HidModifiers {
        self.modifiers.oneshot()
    }

    fn del_oneshot_mods(&mut self, mods: HidModifiers) {
        let osm = &mut self.modifiers.osm_state;
        *osm = match *osm {
            OneShotState::Initial(m) => OneShotState::Initial(m & !mods),
            OneShotState::Single(m) if (m & !mods).is_empty() => OneShotState::None,
            OneShotState::Single(m) => OneShotState::Single(m & !mods),
            OneShotState::Held(m) => OneShotState::Held(m & !mods),
            OneShotState::None => OneShotState::None,
        };
    }

    fn add_weak_mods(&mut self, mods: HidModifiers) {
        self.modifiers.weak |= mods;
    }

    fn register_code(&mut self, key: KeyCode) {
        self.queue_or_run(MacroOperation::Press(key));
    }

    fn unregister_code(&mut self, key: KeyCode) {
        self.queue_or_run(MacroOperation::Release(key));
    }

    fn tap_code(&mut self, key: KeyCode) {
        self.queue_or_run(MacroOperation::Tap(key));
    }

    fn tap_code_with_modifiers(&mut self, key: KeyCode, modifiers: ModifierCombination) {
        self.queue_or_run(MacroOperation::TapWithModifiers(key, modifiers));
    }

    fn delay(&mut self, ms: u16) {
        self.queue_or_run(MacroOperation::Delay(ms));
    }

    fn send_macro(&mut self, operations: &[MacroOperation]) {
        for op in operations {
            self.queue_or_run(*op);
        }
    }

    fn highest_layer(&self) -> u8 {
        self.keymap.get_activated_layer()
    }

    fn layer_on(&mut self, layer: u8) {
        self.keymap.activate_layer(layer);
    }

    fn layer_off(&mut self, layer: u8) {
        self.keymap.deactivate_layer(layer);
    }

    fn caps_word_on(&mut self) {
        self.activate_caps_word();
    }

    fn caps_word_off(&mut self) {
        self.caps_word.deactivate();
    }

    fn caps_word_toggle(&mut self) {
        if self.caps_word.is_active() {
            self.caps_word.deactivate();
        } else {
            self.activate_caps_word();
        }
    }

    fn is_caps_word_on(&self) -> bool {
        self.caps_word.is_active()
    }

    fn now(&self) -> Instant {
        self.now
    }
}
