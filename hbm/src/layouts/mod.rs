//! Keymaps for the Ferris sweep, a 3x5+2 split keyboard.
//!
//! Both layouts use a 4x10 matrix: three rows of five keys per hand, and a fourth row with the
//! thumb keys in columns 3 to 6. The other positions of the fourth row don't exist and hold `No`.

use crate::classifier::{Hand, split_hands};

pub mod hbmorrison;
pub mod tenkey;

pub const ROW: usize = 4;
pub const COL: usize = 10;

/// Left half is columns 0 to 4, thumbs included
pub const fn ferris_hands() -> [[Hand; COL]; ROW] {
    split_hands::<ROW, COL>()
}
