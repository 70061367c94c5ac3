//! # hbm types
//!
//! Fundamental type definitions shared by the hbm keyboard engine and its configuration loader.
//!
//! ## Modules
//!
//! - [`action`] - Keyboard actions stored in the keymap (key presses, layer operations, tap/hold, tap dance)
//! - [`keycode`] - HID keyboard page and consumer page keycodes, plus UK symbol aliases
//! - [`modifier`] - Modifier combinations used in keymaps and the HID modifier byte

#![no_std]

pub mod action;
pub mod keycode;
pub mod modifier;
