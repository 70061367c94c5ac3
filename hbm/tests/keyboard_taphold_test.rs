#[macro_use]
pub mod common;

use hbm::config::{BehaviorConfig, TapHoldConfig};

fn behavior_with_tap_hold(tap_hold: TapHoldConfig) -> BehaviorConfig {
    BehaviorConfig {
        tap_hold,
        ..BehaviorConfig::default()
    }
}

mod tap_hold_test {
    use hbm::layouts::hbmorrison::Variant;

    use super::*;
    use crate::common::{create_hbm_keyboard, create_test_keyboard, create_test_keyboard_with_config, KC_LCTRL, KC_LSHIFT};

    #[test]
    fn test_taphold_tap() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [0, 1, true, 10],  // Press mt!(S, SHIFT)
                [0, 1, false, 100], // Release S before hold timeout
            ],
            expected_reports: [
                [0, [kc8!(S), 0, 0, 0, 0, 0]], // Should be a tapping S
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_taphold_hold() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [0, 1, true, 10],  // Press mt!(S, SHIFT)
                [0, 1, false, 300], // Release after the tapping term
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_taphold_hold_then_other_hand_key() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [0, 1, true, 10], // Press mt!(S, SHIFT)
                [0, 2, true, 250], // Press K after hold timeout
                [0, 2, false, 20], // Release K
                [0, 1, false, 20], // Release S
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(K), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_permissive_hold() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [0, 1, true, 10], // Press mt!(S, SHIFT)
                [0, 2, true, 20], // Press K within the tapping term
                [0, 2, false, 20], // Release K, S is a hold now
                [0, 1, false, 20], // Release S
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(K), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_permissive_hold_disabled() {
        let config = behavior_with_tap_hold(TapHoldConfig {
            permissive_hold: false,
            ..TapHoldConfig::default()
        });
        key_sequence_test! {
            keyboard: create_test_keyboard_with_config(config),
            sequence: [
                [0, 1, true, 10], // Press mt!(S, SHIFT)
                [0, 2, true, 20], // Press K
                [0, 2, false, 20], // Release K
                [0, 1, false, 20], // Release S within the tapping term
            ],
            expected_reports: [
                [0, [kc8!(S), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(K), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_key_pressed_before_taphold_released_in_between() {
        key_sequence_test! {
            keyboard: create_test_keyboard(),
            sequence: [
                [0, 2, true, 10], // Press K
                [0, 1, true, 20], // Press mt!(S, SHIFT)
                [0, 2, false, 20], // Release K, it was pressed first so it goes through
                [0, 1, false, 20], // Release S, a tap
            ],
            expected_reports: [
                [0, [kc8!(K), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(S), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_retro_tap() {
        let config = behavior_with_tap_hold(TapHoldConfig {
            retro_tap: true,
            ..TapHoldConfig::default()
        });
        key_sequence_test! {
            keyboard: create_test_keyboard_with_config(config),
            sequence: [
                [0, 1, true, 10], // Press mt!(S, SHIFT)
                [0, 1, false, 300], // Release without pressing another key
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(S), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_retro_tap_interrupted() {
        let config = behavior_with_tap_hold(TapHoldConfig {
            retro_tap: true,
            ..TapHoldConfig::default()
        });
        key_sequence_test! {
            keyboard: create_test_keyboard_with_config(config),
            sequence: [
                [0, 1, true, 10], // Press mt!(S, SHIFT)
                [0, 2, true, 250], // Press K while holding
                [0, 2, false, 20],
                [0, 1, false, 20], // No retro tap
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(K), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_quick_tap() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 4, true, 10], // Press lt!(NAV, Space)
                [3, 4, false, 40], // Tap
                [3, 4, true, 50], // Press again within the tapping term
                [3, 4, false, 300], // Space is held, not the layer
            ],
            expected_reports: [
                [0, [kc8!(Space), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(Space), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_quick_tap_disabled() {
        let layers = Box::leak(Box::new(hbm::layouts::hbmorrison::layers(Variant::LayerTap)));
        let timings = hbm::userspace::Timings::default();
        let mut behavior = hbm::layouts::hbmorrison::behavior_config(Variant::LayerTap, &timings);
        behavior.tap_hold.quick_tap = false;
        let keymap = hbm::KeyMap::new(layers, hbm::layouts::ferris_hands(), behavior).unwrap();
        let keyboard = hbm::Keyboard::new(keymap, hbm::userspace::HbmUserspace::new(timings, Default::default()));

        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 4, true, 10], // Press lt!(NAV, Space)
                [3, 4, false, 40], // Tap
                [3, 4, true, 50], // Press again, a hold this time
                [1, 6, true, 300], // Left on the nav layer
                [1, 6, false, 20],
                [3, 4, false, 20],
            ],
            expected_reports: [
                [0, [kc8!(Space), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(Left), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_home_row_mod_hold() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [2, 3, true, 10], // Press D, left ctrl on hold
                [2, 3, false, 300],
            ],
            expected_reports: [
                [KC_LCTRL, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }
}
