//! Tags key events with the hand they come from and the kind of key that produced them.

use hbm_types::action::{Action, KeyAction};

use crate::event::KeyboardEvent;

/// Which half of a split keyboard a key sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Hand {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Hand {
    pub fn opposite(self) -> Self {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
            Hand::Unknown => Hand::Unknown,
        }
    }

    pub(crate) fn index(self) -> Option<usize> {
        match self {
            Hand::Left => Some(0),
            Hand::Right => Some(1),
            Hand::Unknown => None,
        }
    }
}

/// Hand table where the left `COL / 2` columns belong to the left hand.
pub const fn split_hands<const ROW: usize, const COL: usize>() -> [[Hand; COL]; ROW] {
    let mut hands = [[Hand::Unknown; COL]; ROW];
    let mut row = 0;
    while row < ROW {
        let mut col = 0;
        while col < COL {
            hands[row][col] = if col < COL / 2 { Hand::Left } else { Hand::Right };
            col += 1;
        }
        row += 1;
    }
    hands
}

/// Coarse kind of a key, as seen by the handedness rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyClass {
    /// A plain alpha/punctuation keystroke
    Simple,
    /// A tap/hold key which holds a modifier
    ModTap,
    /// Any key which changes layers, directly or on hold
    LayerKey,
    Other,
}

pub fn classify(action: &KeyAction) -> KeyClass {
    match action {
        KeyAction::Single(a) | KeyAction::Tap(a) => match a {
            Action::Key(k) | Action::KeyWithModifier(k, _) if !k.is_modifier() => KeyClass::Simple,
            a if a.is_layer_action() => KeyClass::LayerKey,
            _ => KeyClass::Other,
        },
        KeyAction::TapHold(_, Action::Modifier(_)) => KeyClass::ModTap,
        KeyAction::TapHold(_, hold) if hold.is_layer_action() => KeyClass::LayerKey,
        _ => KeyClass::Other,
    }
}

/// A key event tagged with its hand and class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassifiedEvent {
    pub event: KeyboardEvent,
    pub hand: Hand,
    pub class: KeyClass,
}

impl ClassifiedEvent {
    pub fn new(event: KeyboardEvent, action: &KeyAction, hand: Hand) -> Self {
        Self {
            event,
            hand,
            class: classify(action),
        }
    }
}
