use embassy_time::Duration;
use heapless::Vec;

use crate::combo::{COMBO_MAX_NUM, Combo};
use crate::tap_dance::{TAP_DANCE_MAX_NUM, TapDance};

/// Config for configurable action behavior
#[derive(Clone, Debug, Default)]
pub struct BehaviorConfig {
    pub tap_hold: TapHoldConfig,
    pub one_shot: OneShotConfig,
    pub caps_word: CapsWordConfig,
    pub tap_dance: TapDancesConfig,
    pub combo: CombosConfig,
    pub handedness: HandednessConfig,
}

/// Configurations for tap hold behavior
#[derive(Clone, Copy, Debug)]
pub struct TapHoldConfig {
    /// Default tapping term, used by keys the userspace doesn't give their own term
    pub tapping_term: Duration,
    /// Decide hold when another key is pressed and released while the tap/hold key is held
    pub permissive_hold: bool,
    /// Send the tap action when a key held past its tapping term is released without interruption
    pub retro_tap: bool,
    /// Re-pressing a tapped key within its tapping term holds the tap action
    pub quick_tap: bool,
}

impl Default for TapHoldConfig {
    fn default() -> Self {
        Self {
            tapping_term: Duration::from_millis(190),
            permissive_hold: true,
            retro_tap: false,
            quick_tap: true,
        }
    }
}

/// Config for one shot behavior
#[derive(Clone, Copy, Debug)]
pub struct OneShotConfig {
    pub timeout: Duration,
}

impl Default for OneShotConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}

/// Config for caps word
#[derive(Clone, Copy, Debug)]
pub struct CapsWordConfig {
    /// Caps word turns off when no key is pressed for this long
    pub idle_timeout: Duration,
    /// Double tapping a one shot shift toggles caps word
    pub double_tap_shift: bool,
}

impl Default for CapsWordConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_millis(2000),
            double_tap_shift: true,
        }
    }
}

/// Config for tap dances, referenced by `KeyAction::TapDance(index)`
#[derive(Clone, Debug, Default)]
pub struct TapDancesConfig {
    pub tap_dances: Vec<TapDance, TAP_DANCE_MAX_NUM>,
}

/// Config for combo behavior
#[derive(Clone, Debug)]
pub struct CombosConfig {
    pub combos: Vec<Combo, COMBO_MAX_NUM>,
    pub timeout: Duration,
}

impl Default for CombosConfig {
    fn default() -> Self {
        Self {
            combos: Vec::new(),
            timeout: Duration::from_millis(50),
        }
    }
}

/// Config for the split-hand modifier rules
#[derive(Clone, Copy, Debug)]
pub struct HandednessConfig {
    /// An undecided mod-tap followed by a key from the same hand resolves as a tap
    pub unilateral_tap: bool,
    /// Modifiers held by one hand's mod-taps are left out of that hand's keystrokes
    pub suppress_same_hand_mods: bool,
}

impl Default for HandednessConfig {
    fn default() -> Self {
        Self {
            unilateral_tap: true,
            suppress_same_hand_mods: true,
        }
    }
}
