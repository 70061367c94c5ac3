use core::fmt;

/// Errors found while building a keymap from layers and behavior config
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeymapError {
    /// An action references a layer the keymap doesn't have
    LayerOutOfRange { layer: u8, num_layers: usize },
    /// A `KeyAction::TapDance` index has no tap dance configured
    TapDanceNotFound(u8),
    /// A combo has no components
    EmptyCombo(usize),
}

impl fmt::Display for KeymapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeymapError::LayerOutOfRange { layer, num_layers } => {
                write!(f, "layer {} referenced, but the keymap has only {} layers", layer, num_layers)
            }
            KeymapError::TapDanceNotFound(idx) => write!(f, "tap dance {} is not configured", idx),
            KeymapError::EmptyCombo(idx) => write!(f, "combo {} has no components", idx),
        }
    }
}

impl core::error::Error for KeymapError {}
