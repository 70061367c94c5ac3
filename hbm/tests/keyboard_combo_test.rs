#[macro_use]
pub mod common;

mod combo_test {
    use crate::common::{create_tenkey_keyboard, KC_LALT, KC_LCTRL, KC_LSHIFT, KC_RCTRL, KC_RSHIFT};

    #[test]
    fn test_combo_basic() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 3, true, 10], // Press D
                [2, 2, true, 10], // Press C, D+C is ctrl
                [1, 0, true, 100], // Press A
                [1, 0, false, 10],
                [2, 3, false, 10], // Release D, ctrl is released
                [2, 2, false, 10],
            ],
            expected_reports: [
                [KC_LCTRL, [0, 0, 0, 0, 0, 0]],
                [KC_LCTRL, [kc8!(A), 0, 0, 0, 0, 0]],
                [KC_LCTRL, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_longest_wins() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 3, true, 10], // Press D
                [2, 2, true, 10], // Press C
                [2, 1, true, 10], // Press X, D+C+X is meh
                [2, 1, false, 50],
                [2, 2, false, 10],
                [2, 3, false, 10],
            ],
            expected_reports: [
                [KC_LCTRL | KC_LSHIFT | KC_LALT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_timeout() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 3, true, 10], // Press D
                [2, 2, true, 100], // Press C after the combo timeout
                [2, 2, false, 10],
                [2, 3, false, 10],
            ],
            expected_reports: [
                [0, [kc8!(D), 0, 0, 0, 0, 0]],
                [0, [kc8!(D), kc8!(C), 0, 0, 0, 0]],
                [0, [kc8!(D), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_component_released_early() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 3, true, 10], // Press D
                [2, 3, false, 10], // Release D before the timeout
            ],
            expected_reports: [
                [0, [kc8!(D), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_interrupted() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 3, true, 10], // Press D
                [1, 0, true, 10], // Press A, not a component
                [1, 0, false, 10],
                [2, 3, false, 10],
            ],
            expected_reports: [
                [0, [kc8!(D), 0, 0, 0, 0, 0]],
                [0, [kc8!(D), kc8!(A), 0, 0, 0, 0]],
                [0, [kc8!(D), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_right_hand_combo() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 5, true, 10], // Press K
                [2, 6, true, 10], // Press H, K+H is right ctrl + right shift
                [2, 6, false, 100],
                [2, 5, false, 10],
            ],
            expected_reports: [
                [KC_RCTRL | KC_RSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_with_modifier_key_output() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 6, true, 10], // Press H
                [2, 7, true, 10], // Press Comma
                [2, 8, true, 10], // Press Dot, left alt with right ctrl and shift
                [1, 0, true, 20], // A
                [1, 0, false, 10],
                [2, 6, false, 10],
                [2, 7, false, 10],
                [2, 8, false, 10],
            ],
            expected_reports: [
                [KC_LALT | KC_RCTRL | KC_RSHIFT, [0, 0, 0, 0, 0, 0]],
                [KC_LALT | KC_RCTRL | KC_RSHIFT, [kc8!(A), 0, 0, 0, 0, 0]],
                [KC_LALT | KC_RCTRL | KC_RSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_combo_only_on_base_layer() {
        key_sequence_test! {
            keyboard: create_tenkey_keyboard(),
            sequence: [
                [2, 9, true, 10], // Tap osl!(SYM_RIGHT)
                [2, 9, false, 10],
                [2, 2, true, 10], // ] on the symbol layer
                [2, 2, false, 10],
            ],
            expected_reports: [
                [0, [kc8!(RightBracket), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }
}
