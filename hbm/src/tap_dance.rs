use embassy_time::Duration;
use hbm_types::action::KeyAction;

// Max number of tap dances
pub(crate) const TAP_DANCE_MAX_NUM: usize = 8;

#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TapDance {
    pub tap: KeyAction,
    pub hold: KeyAction,
    pub double_tap: KeyAction,
    /// Window for the next tap. Falls back to the per-key tapping term when `None`
    pub tapping_term: Option<Duration>,
}

impl Default for TapDance {
    fn default() -> Self {
        Self {
            tap: KeyAction::No,
            hold: KeyAction::No,
            double_tap: KeyAction::No,
            tapping_term: None,
        }
    }
}

impl TapDance {
    pub fn new(tap: KeyAction, hold: KeyAction, double_tap: KeyAction, tapping_term: Option<Duration>) -> Self {
        Self {
            tap,
            hold,
            double_tap,
            tapping_term,
        }
    }

    /// The action dispatched for a finalized tap sequence
    pub fn action(&self, state: TapDanceState) -> KeyAction {
        match state {
            TapDanceState::None => KeyAction::No,
            TapDanceState::SingleTap => self.tap,
            TapDanceState::DoubleTap => self.double_tap,
            TapDanceState::Hold => self.hold,
        }
    }
}

/// Outcome of a tap sequence on a tap dance key
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapDanceState {
    #[default]
    None,
    SingleTap,
    DoubleTap,
    Hold,
}

/// Classify a tap sequence.
///
/// A single press counts as a tap if it was interrupted by another key or already released,
/// otherwise the key is being held. Two or more presses are always a double tap.
pub fn classify(count: u8, pressed: bool, interrupted: bool) -> TapDanceState {
    match count {
        0 => TapDanceState::None,
        1 if interrupted || !pressed => TapDanceState::SingleTap,
        1 => TapDanceState::Hold,
        _ => TapDanceState::DoubleTap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(0, false, false), TapDanceState::None);
        assert_eq!(classify(1, false, false), TapDanceState::SingleTap);
        assert_eq!(classify(1, true, true), TapDanceState::SingleTap);
        assert_eq!(classify(1, true, false), TapDanceState::Hold);
        assert_eq!(classify(2, true, false), TapDanceState::DoubleTap);
        assert_eq!(classify(3, false, true), TapDanceState::DoubleTap);
    }
}
