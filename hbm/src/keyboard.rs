use embassy_futures::select::{Either, select};
use embassy_time::{Instant, Timer};
use hbm_types::action::{Action, KeyAction};
use hbm_types::keycode::KeyCode;
use hbm_types::modifier::{HidModifiers, ModifierCombination};
use heapless::Deque;

use crate::channel::{KEY_EVENT_CHANNEL, KEYBOARD_REPORT_CHANNEL};
use crate::classifier::{ClassifiedEvent, Hand, KeyClass, classify};
use crate::combo::COMBO_MAX_LENGTH;
use crate::event::{KeyPos, KeyboardEvent};
use crate::hid::Report;
use crate::keymap::KeyMap;
use crate::tap_dance::TAP_DANCE_MAX_NUM;
use crate::userspace::{KeyRecord, Userspace};

pub(crate) mod caps_word;
mod combo;
pub(crate) mod held_buffer;
pub(crate) mod modifiers;
pub(crate) mod oneshot;
pub(crate) mod state;
mod tap_dance;

use held_buffer::{HeldBuffer, HeldKey, KeyState};
use oneshot::OneShotState;
pub use state::KeyboardState;
use tap_dance::DanceTracker;

/// Anything that runs as a long-living task
#[allow(async_fn_in_trait)]
pub trait Runnable {
    async fn run(&mut self);
}

/// An event which waits for an undecided tap/hold key
#[derive(Clone, Copy, Debug)]
struct PendingEvent {
    event: KeyboardEvent,
    time: Instant,
    /// Action decided before buffering, combo outputs have one
    resolved: Option<KeyAction>,
}

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Runnable
    for Keyboard<'a, U, ROW, COL, NUM_LAYER>
{
    /// Main keyboard processing task, it receives key events and timeouts, processes keys.
    /// The reports are sent to `KEYBOARD_REPORT_CHANNEL`.
    async fn run(&mut self) {
        loop {
            match self.next_deadline() {
                Some(deadline) => match select(KEY_EVENT_CHANNEL.receive(), Timer::at(deadline)).await {
                    Either::First(event) => self.process(event, Instant::now()),
                    Either::Second(_) => self.poll(Instant::now()),
                },
                None => {
                    let event = KEY_EVENT_CHANNEL.receive().await;
                    self.process(event, Instant::now());
                }
            }

            while let Some(report) = self.take_report() {
                KEYBOARD_REPORT_CHANNEL.send(report).await;
            }
        }
    }
}

/// The keyboard: turns key events into HID reports.
///
/// Processing is synchronous and driven by timestamps. Feed events with [`Keyboard::process`], fire
/// timeouts with [`Keyboard::poll`] no later than [`Keyboard::next_deadline`], and take the
/// produced reports with [`Keyboard::take_report`]. [`Runnable::run`] does all of this with the
/// embassy channels and timers.
pub struct Keyboard<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> {
    /// Userspace callbacks
    pub(crate) user: U,

    /// State userspace callbacks can reach
    pub(crate) state: KeyboardState<'a, ROW, COL, NUM_LAYER>,

    /// Pressed tap/hold keys
    held_buffer: HeldBuffer,

    /// Events which wait for the undecided tap/hold key
    unprocessed_events: Deque<PendingEvent, 16>,

    /// Buffer for pressed `KeyAction` and `KeyboardEvent`s in combos
    combo_actions_buffer: Deque<(KeyAction, KeyboardEvent, Instant), COMBO_MAX_LENGTH>,

    /// The buffered combo components are flushed at this time
    combo_deadline: Option<Instant>,

    /// Tap dance progress, indexed like the tap dance config
    tap_dances: [DanceTracker; TAP_DANCE_MAX_NUM],

    /// One shot layer state
    osl_state: OneShotState<u8>,

    osl_deadline: Option<Instant>,

    osm_deadline: Option<Instant>,

    /// Last time a one shot modifier was tapped, for double tap shift
    last_osm_tap: Option<Instant>,

    /// The one shot key press toggled caps word, so its release is ignored
    osm_release_consumed: bool,

    /// Last tapped tap/hold key, for quick tap
    last_tap: Option<(KeyPos, Instant)>,
}

impl<'a, U: Userspace, const ROW: usize, const COL: usize, const NUM_LAYER: usize> Keyboard<'a, U, ROW, COL, NUM_LAYER> {
    pub fn new(keymap: KeyMap<'a, ROW, COL, NUM_LAYER>, user: U) -> Self {
        Keyboard {
            user,
            state: KeyboardState::new(keymap),
            held_buffer: HeldBuffer::new(),
            unprocessed_events: Deque::new(),
            combo_actions_buffer: Deque::new(),
            combo_deadline: None,
            tap_dances: [DanceTracker::default(); TAP_DANCE_MAX_NUM],
            osl_state: OneShotState::default(),
            osl_deadline: None,
            osm_deadline: None,
            last_osm_tap: None,
            osm_release_consumed: false,
            last_tap: None,
        }
    }

    pub fn keymap(&self) -> &KeyMap<'a, ROW, COL, NUM_LAYER> {
        &self.state.keymap
    }

    pub fn userspace(&self) -> &U {
        &self.user
    }

    /// The modifier byte a press report would carry now
    pub fn modifiers(&self) -> HidModifiers {
        self.state.modifiers.resolve(true)
    }

    pub fn is_caps_word_on(&self) -> bool {
        self.state.caps_word.is_active()
    }

    /// Process a key event which happened at `now`
    pub fn process(&mut self, event: KeyboardEvent, now: Instant) {
        self.fire_deadlines(now);
        self.state.now = now;

        // Delayed macro operations don't outlive the next key event
        self.state.flush_macros();

        if self.state.keymap.combos.is_empty() {
            self.process_inner(event, now, None);
        } else {
            self.process_combo(event, now);
        }
        self.state.now = now;
    }

    /// Fire all timeouts up to `now`
    pub fn poll(&mut self, now: Instant) {
        self.fire_deadlines(now);
        self.state.now = now;
    }

    /// When `poll` should be called next
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.held_buffer.undecided().map(|k| k.timeout_time),
            self.combo_deadline,
            self.next_tap_dance_deadline(),
            self.osm_deadline,
            self.osl_deadline,
            self.state.caps_word.deadline,
            self.state.macros.deadline,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Take the next report to be sent
    pub fn take_report(&mut self) -> Option<Report> {
        self.state.reports.pop_front()
    }

    /// Fire expired timeouts in order
    fn fire_deadlines(&mut self, until: Instant) {
        while let Some(deadline) = self.next_deadline() {
            if deadline > until {
                break;
            }
            self.state.now = deadline;
            self.fire_deadline(deadline);
        }
    }

    fn fire_deadline(&mut self, time: Instant) {
        if let Some(key) = self.held_buffer.undecided().copied() {
            if key.timeout_time <= time {
                debug!("Tap/hold key {:?} timed out, hold", key.event.pos);
                self.resolve_hold(key.event.pos);
                return;
            }
        }
        if self.combo_deadline.is_some_and(|d| d <= time) {
            debug!("Combo timeout, dispatching buffered keys");
            self.dispatch_combos();
            return;
        }
        if self.next_tap_dance_deadline().is_some_and(|d| d <= time) {
            self.expire_tap_dances(time);
            return;
        }
        if self.osm_deadline.is_some_and(|d| d <= time) {
            self.expire_osm();
            return;
        }
        if self.osl_deadline.is_some_and(|d| d <= time) {
            self.expire_osl();
            return;
        }
        if self.state.caps_word.deadline.is_some_and(|d| d <= time) {
            debug!("Caps word idle timeout");
            self.state.caps_word.deactivate();
            return;
        }
        if self.state.macros.deadline.is_some_and(|d| d <= time) {
            self.state.resume_macros(time);
        }
    }

    /// Process an event after combos. Buffer it if a tap/hold key is undecided.
    fn process_inner(&mut self, event: KeyboardEvent, time: Instant, resolved: Option<KeyAction>) {
        match self.held_buffer.undecided().copied() {
            Some(undecided) => self.process_while_undecided(undecided, event, time, resolved),
            None => self.process_event(event, time, resolved),
        }
    }

    fn process_while_undecided(
        &mut self,
        undecided: HeldKey,
        event: KeyboardEvent,
        time: Instant,
        resolved: Option<KeyAction>,
    ) {
        let pos = undecided.event.pos;
        if event.pos == pos && !event.pressed {
            // Released within the tapping term
            debug!("Tap/hold key {:?} released in time, tap", pos);
            self.resolve_tap(pos, time, true);
            self.replay_unprocessed_events();
            return;
        }

        if event.pressed {
            let action = resolved.unwrap_or_else(|| self.state.keymap.peek_action(event));
            let next = ClassifiedEvent::new(event, &action, self.state.keymap.hand_of(&event));
            if self.state.keymap.behavior.handedness.unilateral_tap
                && undecided.class == KeyClass::ModTap
                && next.hand != Hand::Unknown
                && next.hand == undecided.hand
                && matches!(next.class, KeyClass::Simple | KeyClass::ModTap)
            {
                debug!("Same hand key {:?} pressed after mod-tap {:?}, tap", event.pos, pos);
                self.resolve_tap(pos, time, false);
                self.replay_unprocessed_events();
                self.process_inner(event, time, resolved);
                return;
            }
            self.push_unprocessed(event, time, resolved);
            return;
        }

        // Releases of keys pressed before the tap/hold key go through
        let pressed_after = self
            .unprocessed_events
            .iter()
            .any(|e| e.event.pressed && e.event.pos == event.pos);
        if !pressed_after {
            self.process_event(event, time, resolved);
            return;
        }

        self.push_unprocessed(event, time, resolved);
        if self.state.keymap.behavior.tap_hold.permissive_hold {
            debug!("Key {:?} tapped while {:?} is pressed, hold", event.pos, pos);
            self.resolve_hold(pos);
        }
    }

    fn push_unprocessed(&mut self, event: KeyboardEvent, time: Instant, resolved: Option<KeyAction>) {
        if self
            .unprocessed_events
            .push_back(PendingEvent { event, time, resolved })
            .is_err()
        {
            warn!("Unprocessed event queue is full, dropping event {:?}", event);
        }
    }

    /// Process the events buffered while a tap/hold key was undecided, with their own timestamps
    fn replay_unprocessed_events(&mut self) {
        let events = core::mem::replace(&mut self.unprocessed_events, Deque::new());
        for e in events.iter() {
            self.fire_deadlines(e.time);
            self.state.now = e.time;
            self.process_inner(e.event, e.time, e.resolved);
        }
    }

    /// The undecided key at `pos` is a tap. With `released`, the key itself is already up.
    fn resolve_tap(&mut self, pos: KeyPos, time: Instant, released: bool) {
        let Some(key) = self.held_buffer.remove(pos) else {
            return;
        };
        let KeyAction::TapHold(tap, _) = key.action else {
            return;
        };
        if released {
            // Restore the layer cache of the position
            let _ = self.state.keymap.get_action_with_layer_cache(KeyboardEvent { pressed: false, pos });
        }
        self.state.now = time;
        let press = KeyboardEvent { pressed: true, pos };
        self.dispatch(key.action, tap, press, 1);
        self.dispatch(key.action, tap, KeyboardEvent { pressed: false, pos }, 1);
        self.last_tap = Some((pos, time));
    }

    /// The undecided key at `pos` is a hold, press its hold action then replay what waited for it
    fn resolve_hold(&mut self, pos: KeyPos) {
        let Some(key) = self.held_buffer.find_pos_mut(pos) else {
            return;
        };
        key.state = KeyState::Holding;
        let key = *key;
        if let KeyAction::TapHold(_, hold) = key.action {
            self.dispatch(key.action, hold, key.event, 0);
        }
        self.replay_unprocessed_events();
    }

    /// Process an event which nothing is waiting for
    fn process_event(&mut self, event: KeyboardEvent, time: Instant, resolved: Option<KeyAction>) {
        self.state.now = time;

        if event.pressed {
            self.interrupt_tap_dances(event.pos);
            self.held_buffer.mark_interrupted(event.pos);
        } else if let Some(key) = self.held_buffer.remove(event.pos) {
            if resolved.is_none() {
                // Restore the layer cache of the position
                let _ = self.state.keymap.get_action_with_layer_cache(event);
            }
            self.release_held_key(key, event);
            return;
        }

        let key_action = match resolved {
            Some(action) => action,
            None => self.state.keymap.get_action_with_layer_cache(event),
        };
        self.process_key_action(key_action, event, time);
    }

    fn process_key_action(&mut self, key_action: KeyAction, event: KeyboardEvent, time: Instant) {
        match key_action {
            KeyAction::No | KeyAction::Transparent => (),
            KeyAction::Single(a) => self.dispatch(key_action, a, event, 0),
            KeyAction::Tap(a) => {
                if event.pressed {
                    self.dispatch(key_action, a, event, 0);
                    self.dispatch(key_action, a, KeyboardEvent { pressed: false, ..event }, 0);
                }
            }
            KeyAction::TapHold(tap, _) => self.process_key_action_tap_hold(key_action, tap, event, time),
            KeyAction::TapDance(index) => self.process_key_action_tap_dance(index, event, time),
        }
    }

    fn process_key_action_tap_hold(&mut self, key_action: KeyAction, tap: Action, event: KeyboardEvent, time: Instant) {
        if !event.pressed {
            // Tap/hold keys are released through the held buffer, this one was already tapped
            return;
        }

        let default = self.state.keymap.behavior.tap_hold.tapping_term;
        let tapping_term = self.user.tapping_term(&key_action, default);
        let hand = self.state.keymap.hand_of(&event);

        // Pressed again right after a tap, hold the tap action
        let quick_tap = self.state.keymap.behavior.tap_hold.quick_tap
            && self
                .last_tap
                .is_some_and(|(pos, last)| pos == event.pos && time.saturating_duration_since(last) < tapping_term);
        if quick_tap {
            debug!("Quick tap on {:?}", event.pos);
            self.last_tap = None;
            self.held_buffer.push(HeldKey::new(
                event,
                key_action,
                hand,
                KeyState::ProcessedButReleaseNotReportedYet(tap),
                time,
                time,
            ));
            self.dispatch(key_action, tap, event, 1);
            return;
        }

        self.held_buffer.push(HeldKey::new(
            event,
            key_action,
            hand,
            KeyState::Pressed,
            time,
            time + tapping_term,
        ));
    }

    /// A decided tap/hold key is released
    fn release_held_key(&mut self, key: HeldKey, event: KeyboardEvent) {
        let KeyAction::TapHold(tap, hold) = key.action else {
            return;
        };
        match key.state {
            KeyState::Pressed => {
                // Not reachable through the undecided path, release as a tap
                self.dispatch(key.action, tap, KeyboardEvent { pressed: true, ..event }, 1);
                self.dispatch(key.action, tap, event, 1);
            }
            KeyState::Holding => {
                self.dispatch(key.action, hold, event, 0);
                if self.state.keymap.behavior.tap_hold.retro_tap && !key.interrupted {
                    debug!("Retro tap on {:?}", event.pos);
                    self.dispatch(key.action, tap, KeyboardEvent { pressed: true, ..event }, 1);
                    self.dispatch(key.action, tap, event, 1);
                }
            }
            KeyState::ProcessedButReleaseNotReportedYet(action) => self.dispatch(key.action, action, event, 1),
        }
    }

    /// Dispatch a `KeyAction` decided by a tap dance
    pub(crate) fn dispatch_key_action(&mut self, key_action: KeyAction, event: KeyboardEvent, tap_count: u8) {
        match key_action {
            KeyAction::Single(a) | KeyAction::TapHold(a, _) => self.dispatch(key_action, a, event, tap_count),
            KeyAction::Tap(a) => {
                if event.pressed {
                    self.dispatch(key_action, a, event, tap_count);
                    self.dispatch(key_action, a, KeyboardEvent { pressed: false, ..event }, tap_count);
                }
            }
            KeyAction::No | KeyAction::Transparent | KeyAction::TapDance(_) => (),
        }
    }

    /// Run an action: caps word, then the userspace hook, then the default handling
    fn dispatch(&mut self, key_action: KeyAction, action: Action, event: KeyboardEvent, tap_count: u8) {
        let hand = self.state.keymap.hand_of(&event);
        let class = classify(&key_action);

        if event.pressed {
            self.process_caps_word(&action);
        }

        let record = KeyRecord {
            action: key_action,
            event,
            hand,
            class,
            tap_count,
            time: self.state.now,
        };
        if self.user.process_record(&mut self.state, &record) {
            self.process_action(action, event, hand, class);
        }

        // Keystrokes use up one shot keys
        let is_keystroke = match action {
            Action::Key(k) | Action::KeyWithModifier(k, _) => !k.is_modifier(),
            Action::User(_) => true,
            _ => false,
        };
        if is_keystroke {
            self.update_osm(event);
            self.update_osl(event);
        }
    }

    fn process_action(&mut self, action: Action, event: KeyboardEvent, hand: Hand, class: KeyClass) {
        match action {
            Action::No | Action::Transparent | Action::User(_) => (),
            Action::Key(key) => self.process_action_key(key, ModifierCombination::new(), event, hand, class),
            Action::KeyWithModifier(key, modifiers) => self.process_action_key(key, modifiers, event, hand, class),
            Action::Modifier(modifiers) => {
                // Only mod-tap holds count for the hand rules
                let hand = (class == KeyClass::ModTap).then_some(hand);
                if event.pressed {
                    self.state.modifiers.register(modifiers, hand);
                } else {
                    self.state.modifiers.unregister(modifiers, hand);
                }
                self.state.send_keyboard_report_with_resolved_modifiers(event.pressed);
            }
            Action::LayerOn(layer_num) => {
                if event.pressed {
                    self.state.keymap.activate_layer(layer_num);
                } else {
                    self.state.keymap.deactivate_layer(layer_num);
                }
                debug!("Layer {} {}", layer_num, if event.pressed { "on" } else { "off" });
            }
            Action::LayerOff(layer_num) => {
                if event.pressed {
                    self.state.keymap.deactivate_layer(layer_num);
                }
            }
            Action::LayerToggle(layer_num) => {
                // Toggle on release, like QMK's `TG`
                if !event.pressed {
                    self.state.keymap.toggle_layer(layer_num);
                    debug!("Layer {} toggled", layer_num);
                }
            }
            Action::DefaultLayer(layer_num) => {
                if event.pressed {
                    self.state.keymap.set_default_layer(layer_num);
                }
            }
            Action::OneShotLayer(layer_num) => self.process_action_osl(layer_num, event),
            Action::OneShotModifier(modifiers) => self.process_action_osm(modifiers, event),
            Action::CapsWordToggle => {
                if event.pressed {
                    if self.state.caps_word.is_active() {
                        self.state.caps_word.deactivate();
                    } else {
                        self.state.activate_caps_word();
                    }
                }
            }
        }
    }

    fn process_action_key(
        &mut self,
        key: KeyCode,
        modifiers: ModifierCombination,
        event: KeyboardEvent,
        hand: Hand,
        class: KeyClass,
    ) {
        // A modifier key with extra modifiers is a bare modifier combination, like `RCTL(KC_LALT)`
        if key.is_modifier() {
            if event.pressed {
                self.state.modifiers.register(modifiers, None);
                self.state.press_key(key, Some(event.pos));
            } else {
                self.state.modifiers.unregister(modifiers, None);
                self.state.release_key(key, Some(event.pos));
            }
            return;
        }

        if event.pressed {
            self.state.modifiers.with_modifiers = modifiers.to_hid_modifiers();
            if self.state.keymap.behavior.handedness.suppress_same_hand_mods
                && matches!(key, KeyCode::Hid(_))
                && matches!(class, KeyClass::Simple | KeyClass::ModTap)
            {
                self.state.modifiers.suppress_same_hand(hand);
            }
            self.state.press_key(key, Some(event.pos));
        } else {
            self.state.modifiers.with_modifiers = HidModifiers::new();
            self.state.release_key(key, Some(event.pos));
        }
    }
}
