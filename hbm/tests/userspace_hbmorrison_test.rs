#[macro_use]
pub mod common;

mod hbmorrison_test {
    use hbm::keycode::ConsumerKey;
    use hbm::layouts::hbmorrison::Variant;
    use hbm::userspace::OperatingSystem;

    use crate::common::{
        create_hbm_keyboard, create_hbm_keyboard_with_os, keyboard_reports, media_usages, run_key_sequence, KC_LALT,
        KC_LCTRL, KC_LGUI, KC_LSHIFT,
    };

    #[test]
    fn test_shift_backspace_is_delete() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::TapDance),
            sequence: [
                [3, 3, true, 10], // Hold td!(TD_LSFT)
                [0, 9, true, 100], // Backspace
                [0, 9, false, 20],
                [3, 3, false, 20],
            ],
            expected_reports: [
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [kc8!(Delete), 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_alt_tab() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [0, 8, true, 290], // Alt-tab
                [0, 8, false, 20],
                [0, 8, true, 20], // Tab again, alt stays down
                [0, 8, false, 20],
                [3, 4, false, 40], // Releasing the layer key releases alt
            ],
            expected_reports: [
                [KC_LALT, [0, 0, 0, 0, 0, 0]],
                [KC_LALT, [kc8!(Tab), 0, 0, 0, 0, 0]],
                [KC_LALT, [0, 0, 0, 0, 0, 0]],
                [KC_LALT, [kc8!(Tab), 0, 0, 0, 0, 0]],
                [KC_LALT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_esc_colon() {
        let mut keyboard = create_hbm_keyboard(Variant::LayerTap);
        let reports = run_key_sequence(
            &mut keyboard,
            &key_sequence![
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [3, 6, true, 290], // Esc, then colon after a pause
            ],
        );
        assert_eq!(
            keyboard_reports(&reports),
            key_report![
                [0, [kc8!(Escape), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(Semicolon), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        );
    }

    #[test]
    fn test_esc_colon_flushed_by_next_key() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [3, 6, true, 290], // Esc, colon waits
                [3, 6, false, 20], // The pending colon is sent first
                [3, 4, false, 20],
            ],
            expected_reports: [
                [0, [kc8!(Escape), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(Semicolon), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_desktop_macros_follow_os() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [0, 9, true, 290], // Next desktop on Linux
                [0, 9, false, 20],
                [3, 4, false, 20],
            ],
            expected_reports: [
                [KC_LCTRL | KC_LALT, [kc8!(Right), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };

        key_sequence_test! {
            keyboard: create_hbm_keyboard_with_os(Variant::LayerTap, OperatingSystem::ChromeOs),
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [0, 6, true, 290], // Previous desktop on ChromeOS
                [0, 6, false, 20],
                [3, 4, false, 20],
            ],
            expected_reports: [
                [KC_LGUI, [kc8!(LeftBracket), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_switch_operating_system() {
        let mut keyboard = create_hbm_keyboard(Variant::LayerTap);
        assert_eq!(keyboard.userspace().operating_system(), OperatingSystem::Linux);

        let reports = run_key_sequence(
            &mut keyboard,
            &key_sequence![
                [0, 7, true, 10], // Hold lt!(CTLS, U)
                [0, 4, true, 290], // Windows
                [0, 4, false, 20],
                [0, 7, false, 20],
            ],
        );
        assert!(reports.is_empty());
        assert_eq!(keyboard.userspace().operating_system(), OperatingSystem::Windows);

        key_sequence_test! {
            keyboard: keyboard,
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [0, 5, true, 290], // Overview on Windows
                [0, 5, false, 20],
                [3, 4, false, 20],
            ],
            expected_reports: [
                [KC_LGUI, [kc8!(Tab), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_symbols_are_not_shifted() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 3, true, 10], // Tap osm!(SHIFT)
                [3, 3, false, 10],
                [2, 0, true, 10], // Hold lt!(RSYM, Z)
                [2, 5, true, 250], // Semicolon, the one shot shift is dropped
                [2, 5, false, 10],
                [2, 0, false, 10],
            ],
            expected_reports: [
                [0, [kc8!(Semicolon), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_uk_symbol() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [2, 9, true, 10], // Hold lt!(LSYM, Slash)
                [0, 2, true, 250], // Pound sign
                [0, 2, false, 10],
                [1, 1, true, 10], // Pipe
                [1, 1, false, 10],
                [2, 9, false, 10],
            ],
            expected_reports: [
                [KC_LSHIFT, [kc8!(Kc3), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
                [KC_LSHIFT, [kc8!(NonusBackslash), 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }

    #[test]
    fn test_media_keys() {
        let mut keyboard = create_hbm_keyboard(Variant::LayerTap);
        let reports = run_key_sequence(
            &mut keyboard,
            &key_sequence![
                [0, 7, true, 10], // Hold lt!(CTLS, U)
                [1, 2, true, 290], // Volume up
                [1, 2, false, 20],
                [0, 7, false, 20],
            ],
        );
        assert_eq!(media_usages(&reports), vec![ConsumerKey::VolumeIncrement as u16, 0]);
        assert!(keyboard_reports(&reports).is_empty());
    }

    #[test]
    fn test_ctrl_alt_key() {
        key_sequence_test! {
            keyboard: create_hbm_keyboard(Variant::LayerTap),
            sequence: [
                [3, 4, true, 10], // Hold lt!(NAV, Space)
                [2, 4, true, 290], // Ctrl-Alt
                [1, 6, true, 20], // Left
                [1, 6, false, 20],
                [2, 4, false, 20],
                [3, 4, false, 20],
            ],
            expected_reports: [
                [KC_LCTRL | KC_LALT, [0, 0, 0, 0, 0, 0]],
                [KC_LCTRL | KC_LALT, [kc8!(Left), 0, 0, 0, 0, 0]],
                [KC_LCTRL | KC_LALT, [0, 0, 0, 0, 0, 0]],
                [0, [0, 0, 0, 0, 0, 0]],
            ]
        };
    }
}
