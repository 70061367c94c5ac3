use hbm_types::modifier::{HidModifiers, ModifierCombination};

use super::oneshot::OneShotState;
use crate::classifier::Hand;

/// All the modifier sets which end up in the modifier byte of a keyboard report.
#[derive(Debug, Default)]
pub(crate) struct ModifierState {
    /// Registered modifiers: modifier keys, mod-tap holds and userspace `register_code`/`add_mods`
    pub(crate) held: HidModifiers,
    /// Modifiers held by each hand's mod-taps, left then right
    pub(crate) hand_held: [HidModifiers; 2],
    /// Applied to the next press report only
    pub(crate) weak: HidModifiers,
    /// The modifiers coming from (last) `Action::KeyWithModifier`
    pub(crate) with_modifiers: HidModifiers,
    /// Left out of the current press report
    pub(crate) suppressed: HidModifiers,
    /// One shot modifier state
    pub(crate) osm_state: OneShotState<HidModifiers>,
}

impl ModifierState {
    /// Register a modifier combination, attributing it to `hand` when a mod-tap holds it.
    pub(crate) fn register(&mut self, modifiers: ModifierCombination, hand: Option<Hand>) {
        let modifiers = modifiers.to_hid_modifiers();
        self.held |= modifiers;
        if let Some(i) = hand.and_then(Hand::index) {
            self.hand_held[i] |= modifiers;
        }
    }

    pub(crate) fn unregister(&mut self, modifiers: ModifierCombination, hand: Option<Hand>) {
        let modifiers = modifiers.to_hid_modifiers();
        self.held &= !modifiers;
        if let Some(i) = hand.and_then(Hand::index) {
            self.hand_held[i] &= !modifiers;
        }
    }

    /// Leave out the modifiers which only `hand`'s mod-taps hold.
    ///
    /// A modifier held on both hands is kept, so is anything registered some other way.
    /// Only the press report of the keystroke is affected: the next report, even one sent while
    /// the same-hand key is still down, carries the modifiers again.
    pub(crate) fn suppress_same_hand(&mut self, hand: Hand) {
        if let Some(i) = hand.index() {
            let own = self.hand_held[i];
            let other = self.hand_held[1 - i];
            self.suppressed = own & !other;
        }
    }

    /// Value of the one shot modifiers, whatever their state
    pub(crate) fn oneshot(&self) -> HidModifiers {
        self.osm_state.value().copied().unwrap_or_default()
    }

    /// Registered and one shot modifiers, what caps word checks for non-shift modifiers
    pub(crate) fn explicit(&self) -> HidModifiers {
        self.held | self.oneshot()
    }

    /// Calculates the combined effect of all modifiers:
    /// - registered (held) modifiers keys
    /// - one-shot modifiers
    /// - same hand suppression of the current keystroke
    /// - effect of `Action::KeyWithModifier` while it's pressed
    /// - weak modifiers
    pub(crate) fn resolve(&self, pressed: bool) -> HidModifiers {
        let mut result = self.held;

        if pressed {
            result |= self.oneshot();
        } else if let OneShotState::Held(osm) = self.osm_state {
            // A held one shot key works like a normal modifier until it's released
            result |= osm;
        }

        result &= !self.suppressed;

        if pressed {
            result |= self.with_modifiers;
        }

        result | self.weak
    }

    /// Called after a press report went out. Weak modifiers and same hand suppression end here.
    pub(crate) fn after_press_report(&mut self) {
        self.weak = HidModifiers::new();
        self.suppressed = HidModifiers::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_hand_suppression() {
        let mut state = ModifierState::default();
        state.register(ModifierCombination::CTRL, Some(Hand::Left));
        state.register(ModifierCombination::ALT, Some(Hand::Right));

        state.suppress_same_hand(Hand::Left);
        assert_eq!(state.resolve(true), HidModifiers::new().with_left_alt(true));
        state.after_press_report();
        assert_eq!(
            state.resolve(true),
            HidModifiers::new().with_left_alt(true).with_left_ctrl(true)
        );
    }

    #[test]
    fn test_both_hands_hold_same_modifier() {
        let mut state = ModifierState::default();
        state.register(ModifierCombination::CTRL, Some(Hand::Left));
        state.register(ModifierCombination::CTRL, Some(Hand::Right));
        state.suppress_same_hand(Hand::Right);
        assert_eq!(state.resolve(true), HidModifiers::new().with_left_ctrl(true));
    }

    #[test]
    fn test_oneshot_and_weak() {
        let mut state = ModifierState::default();
        state.osm_state = OneShotState::Single(HidModifiers::new().with_left_shift(true));
        state.weak = HidModifiers::new().with_left_gui(true);

        assert_eq!(
            state.resolve(true),
            HidModifiers::new().with_left_shift(true).with_left_gui(true)
        );
        state.after_press_report();
        assert_eq!(state.resolve(false), HidModifiers::new());
    }
}
