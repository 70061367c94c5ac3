//! Boot keyboard report, laid out as the USB HID boot protocol sends it.

/// Modifier byte, reserved byte, LED byte and six keycodes.
///
/// The LED byte is the host's output report, the engine leaves it 0.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyboardReport {
    pub modifier: u8, // HidModifiers
    pub reserved: u8,
    pub leds: u8,
    pub keycodes: [u8; 6],
}

impl KeyboardReport {
    /// The 8 bytes sent to the host
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0; 8];
        bytes[0] = self.modifier;
        bytes[1] = self.reserved;
        bytes[2..].copy_from_slice(&self.keycodes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_bytes() {
        let report = KeyboardReport {
            modifier: 0x02,
            reserved: 0,
            leds: 0x01,
            keycodes: [0x04, 0x05, 0, 0, 0, 0],
        };
        assert_eq!(report.to_bytes(), [0x02, 0, 0x04, 0x05, 0, 0, 0, 0]);
    }
}
