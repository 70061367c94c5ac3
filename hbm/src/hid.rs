//! HID reports produced by the keyboard.

use usbd_hid::descriptor::MediaKeyboardReport;

use crate::descriptor::KeyboardReport;

/// A report for the writer of the run loop. The writer picks the endpoint from the variant.
pub enum Report {
    /// Normal keyboard hid report
    KeyboardReport(KeyboardReport),
    /// Media keyboard report
    MediaKeyboardReport(MediaKeyboardReport),
}
