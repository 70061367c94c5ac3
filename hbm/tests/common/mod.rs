#[macro_use]
pub mod test_macro;

use embassy_time::{Duration, Instant};
use hbm::action::KeyAction;
use hbm::classifier::split_hands;
use hbm::config::BehaviorConfig;
use hbm::descriptor::KeyboardReport;
use hbm::event::KeyboardEvent;
use hbm::hid::Report;
use hbm::keyboard::Keyboard;
use hbm::keymap::KeyMap;
use hbm::layouts::hbmorrison::{self, NUM_LAYER as HBM_LAYERS, Variant};
use hbm::layouts::tenkey::{self, NUM_LAYER as TENKEY_LAYERS};
use hbm::layouts::{COL, ROW};
use hbm::modifier::ModifierCombination;
use hbm::userspace::{HbmUserspace, OperatingSystem, TenkeyUserspace, Timings, Userspace};
use hbm::{a, df, k, layer, lt, mo, mt, tg};
use log::debug;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub(crate) const KC_LCTRL: u8 = 1 << 0;
pub(crate) const KC_LSHIFT: u8 = 1 << 1;
pub(crate) const KC_LALT: u8 = 1 << 2;
pub(crate) const KC_LGUI: u8 = 1 << 3;
pub(crate) const KC_RCTRL: u8 = 1 << 4;
pub(crate) const KC_RSHIFT: u8 = 1 << 5;

// Timeouts still pending after the last key event fire within this time
const SETTLE_TIME: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct TestKeyPress {
    pub row: u8,
    pub col: u8,
    pub pressed: bool,
    pub delay: u64, // Delay before this key event in milliseconds
}

/// Feed a key sequence to the keyboard on a virtual clock starting at 0, return all reports.
///
/// Timeouts fire at their exact deadline, before the next event. After the last event, the
/// timeouts due within `SETTLE_TIME` fire too.
pub fn run_key_sequence<U: Userspace, const R: usize, const C: usize, const L: usize>(
    keyboard: &mut Keyboard<'_, U, R, C, L>,
    key_sequence: &[TestKeyPress],
) -> Vec<Report> {
    let mut reports = Vec::new();
    let mut now = Instant::from_millis(0);

    for key in key_sequence {
        now += Duration::from_millis(key.delay);
        keyboard.process(KeyboardEvent::key(key.row, key.col, key.pressed), now);
        while let Some(report) = keyboard.take_report() {
            reports.push(report);
        }
    }

    let settle_until = now + SETTLE_TIME;
    while let Some(deadline) = keyboard.next_deadline() {
        if deadline > settle_until {
            break;
        }
        keyboard.poll(deadline);
        while let Some(report) = keyboard.take_report() {
            reports.push(report);
        }
    }
    reports
}

/// The keyboard reports among `reports`
pub fn keyboard_reports(reports: &[Report]) -> Vec<KeyboardReport> {
    reports
        .iter()
        .filter_map(|r| match r {
            Report::KeyboardReport(report) => Some(*report),
            Report::MediaKeyboardReport(report) => {
                // Packed field, copy it out before formatting
                let usage_id = report.usage_id;
                debug!("media report {:?}", usage_id);
                None
            }
        })
        .collect()
}

/// Usage ids of the media reports among `reports`
pub fn media_usages(reports: &[Report]) -> Vec<u16> {
    reports
        .iter()
        .filter_map(|r| match r {
            Report::MediaKeyboardReport(report) => {
                let usage_id = report.usage_id;
                Some(usage_id)
            }
            Report::KeyboardReport(_) => None,
        })
        .collect()
}

// run a keyboard test, input is seq of key input with delay, use expected report to verify
pub fn run_key_sequence_test<U: Userspace, const R: usize, const C: usize, const L: usize>(
    keyboard: &mut Keyboard<'_, U, R, C, L>,
    key_sequence: &[TestKeyPress],
    expected_reports: &[KeyboardReport],
) {
    let reports = keyboard_reports(&run_key_sequence(keyboard, key_sequence));
    for (i, (expected, actual)) in expected_reports.iter().zip(reports.iter()).enumerate() {
        assert_eq!(
            expected, actual,
            "on #{} reports, expected left but actually right",
            i
        );
    }
    assert_eq!(
        expected_reports.len(),
        reports.len(),
        "expected {} reports, got {:?}",
        expected_reports.len(),
        reports
    );
}

pub fn create_hbm_keyboard_with_os(
    variant: Variant,
    os: OperatingSystem,
) -> Keyboard<'static, HbmUserspace, ROW, COL, HBM_LAYERS> {
    // Box::leak is acceptable in tests
    let layers = Box::leak(Box::new(hbmorrison::layers(variant)));
    let timings = Timings::default();
    let keymap = hbmorrison::keymap(layers, variant, &timings).unwrap();
    Keyboard::new(keymap, HbmUserspace::new(timings, os))
}

pub fn create_hbm_keyboard(variant: Variant) -> Keyboard<'static, HbmUserspace, ROW, COL, HBM_LAYERS> {
    create_hbm_keyboard_with_os(variant, OperatingSystem::Linux)
}

pub fn create_tenkey_keyboard() -> Keyboard<'static, TenkeyUserspace, ROW, COL, TENKEY_LAYERS> {
    let timings = Timings::default();
    Keyboard::new(tenkey::keymap(&timings).unwrap(), TenkeyUserspace::new(timings))
}

pub const TEST_ROW: usize = 2;
pub const TEST_COL: usize = 4;
pub const TEST_LAYER: usize = 3;

// Columns 0-1 are the left hand, 2-3 the right hand
#[rustfmt::skip]
pub static TEST_KEYMAP: [[[KeyAction; TEST_COL]; TEST_ROW]; TEST_LAYER] = [
    layer!([
        [k!(A), mt!(S, ModifierCombination::SHIFT), k!(K), mo!(1)],
        [tg!(2), lt!(1, Space), df!(2), mt!(J, ModifierCombination::CTRL)]
    ]),
    layer!([
        [k!(Kc1), a!(Transparent), k!(Kc2), a!(Transparent)],
        [a!(No), a!(Transparent), a!(No), a!(No)]
    ]),
    layer!([
        [k!(F1), a!(Transparent), k!(F2), a!(Transparent)],
        [tg!(2), a!(Transparent), df!(0), a!(Transparent)]
    ]),
];

pub fn create_test_keyboard_with_config(config: BehaviorConfig) -> Keyboard<'static, (), TEST_ROW, TEST_COL, TEST_LAYER> {
    let keymap = KeyMap::new(&TEST_KEYMAP, split_hands::<TEST_ROW, TEST_COL>(), config).unwrap();
    Keyboard::new(keymap, ())
}

pub fn create_test_keyboard() -> Keyboard<'static, (), TEST_ROW, TEST_COL, TEST_LAYER> {
    create_test_keyboard_with_config(BehaviorConfig::default())
}
