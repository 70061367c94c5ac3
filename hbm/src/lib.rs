//! # hbm
//!
//! A keyboard behavior engine for split, home-row-mod layouts: tap/hold keys with handedness rules,
//! tap dance, one shot keys, caps word and combos, plus the userspace callbacks and layouts built
//! on top of them.
//!
//! The engine turns debounced key events into HID reports. It's synchronous and driven by
//! timestamps, so it runs the same way on the device and in host tests.
//!
//! ## Modules
//!
//! - [`keyboard`] - The engine, and the [`keyboard::Runnable`] task which wires it to the channels
//! - [`keymap`] - Layer stack, layer cache and per-position handedness
//! - [`userspace`] - Userspace callbacks and the primitives available to them
//! - [`layouts`] - Ready-made keymaps with their behavior config

#![no_std]

#[macro_use]
mod fmt;

pub use hbm_types::{action, keycode, modifier};

pub mod channel;
pub mod classifier;
pub mod combo;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod event;
pub mod hid;
pub mod keyboard;
pub mod keyboard_macro;
pub mod keymap;
#[macro_use]
pub mod layout_macro;
pub mod layouts;
pub mod tap_dance;
pub mod userspace;

pub use error::KeymapError;
pub use keyboard::{Keyboard, Runnable};
pub use keymap::KeyMap;

/// Raw mutex used by the channels
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub(crate) const EVENT_CHANNEL_SIZE: usize = 16;
pub(crate) const REPORT_CHANNEL_SIZE: usize = 16;
