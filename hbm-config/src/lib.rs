//! Reads `userspace.toml`, the user-facing settings of the hbm layouts, and turns it into the
//! [`BehaviorConfig`] and [`Timings`] the engine runs with.
//!
//! Every field is optional, a missing field takes the value the layouts are tuned for:
//!
//! ```toml
//! [userspace]
//! layout = "hbmorrison"
//! variant = "tap_dance"
//! os = "chromeos"
//!
//! [timing]
//! tapping_term = "190ms"
//! tapping_term_layer = "175ms"
//!
//! [behavior]
//! retro_tap = true
//! one_shot_timeout = "1s"
//! ```

use std::path::Path;

use embassy_time::Duration;
use hbm::config::BehaviorConfig;
use hbm::layouts::hbmorrison::{self, Variant};
use hbm::layouts::tenkey;
use hbm::userspace::{self, OperatingSystem, Timings};
use serde::de;
use serde_derive::Deserialize;
use serde_inline_default::serde_inline_default;

mod error;

pub use error::{ConfigError, ConfigResult};

/// Layouts a userspace can run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Hbmorrison,
    Tenkey,
}

/// Configurations of the userspace.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserspaceConfig {
    #[serde(default)]
    userspace: UserspaceInfo,
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    behavior: BehaviorTomlConfig,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserspaceInfo {
    #[serde(default)]
    pub layout: Layout,
    /// Only the hbmorrison layout has variants
    pub variant: Option<Variant>,
    /// Host OS the desktop macros start with, switchable from the keyboard
    #[serde(default)]
    pub os: OperatingSystem,
}

/// Named timings, the defaults are the userspace constants
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    #[serde_inline_default(DurationMillis(userspace::TAPPING_TERM))]
    pub tapping_term: DurationMillis,
    /// Tapping term of the tenkey home-row mods
    #[serde_inline_default(DurationMillis(userspace::TAPPING_TERM_MODS))]
    pub tapping_term_mods: DurationMillis,
    #[serde_inline_default(DurationMillis(userspace::TAPPING_TERM_LAYER))]
    pub tapping_term_layer: DurationMillis,
    #[serde_inline_default(DurationMillis(userspace::TAPPING_TERM_SIDEKEY_TD))]
    pub tapping_term_sidekey_td: DurationMillis,
    #[serde_inline_default(DurationMillis(userspace::TAPPING_TERM_THUMBKEY_TD))]
    pub tapping_term_thumbkey_td: DurationMillis,
    #[serde_inline_default(DurationMillis(userspace::CAPS_WORD_IDLE_TIMEOUT))]
    pub caps_word_idle_timeout: DurationMillis,
    #[serde_inline_default(DurationMillis(userspace::ESC_COLON_DELAY))]
    pub esc_colon_delay: DurationMillis,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tapping_term: DurationMillis(userspace::TAPPING_TERM),
            tapping_term_mods: DurationMillis(userspace::TAPPING_TERM_MODS),
            tapping_term_layer: DurationMillis(userspace::TAPPING_TERM_LAYER),
            tapping_term_sidekey_td: DurationMillis(userspace::TAPPING_TERM_SIDEKEY_TD),
            tapping_term_thumbkey_td: DurationMillis(userspace::TAPPING_TERM_THUMBKEY_TD),
            caps_word_idle_timeout: DurationMillis(userspace::CAPS_WORD_IDLE_TIMEOUT),
            esc_colon_delay: DurationMillis(userspace::ESC_COLON_DELAY),
        }
    }
}

/// Switches of the engine behaviors
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BehaviorTomlConfig {
    #[serde_inline_default(true)]
    pub permissive_hold: bool,
    #[serde_inline_default(false)]
    pub retro_tap: bool,
    #[serde_inline_default(true)]
    pub quick_tap: bool,
    #[serde_inline_default(DurationMillis(1000))]
    pub one_shot_timeout: DurationMillis,
    /// Double tapping a one shot shift toggles caps word
    #[serde_inline_default(true)]
    pub double_tap_shift: bool,
    #[serde_inline_default(DurationMillis(50))]
    pub combo_timeout: DurationMillis,
    #[serde_inline_default(true)]
    pub unilateral_tap: bool,
    #[serde_inline_default(true)]
    pub suppress_same_hand_mods: bool,
}

impl Default for BehaviorTomlConfig {
    fn default() -> Self {
        Self {
            permissive_hold: true,
            retro_tap: false,
            quick_tap: true,
            one_shot_timeout: DurationMillis(1000),
            double_tap_shift: true,
            combo_timeout: DurationMillis(50),
            unilateral_tap: true,
            suppress_same_hand_mods: true,
        }
    }
}

/// A duration written as `"<n>ms"` or `"<n>s"`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct DurationMillis(#[serde(deserialize_with = "parse_duration_millis")] pub u64);

impl From<DurationMillis> for Duration {
    fn from(value: DurationMillis) -> Self {
        Duration::from_millis(value.0)
    }
}

fn parse_duration_millis<'de, D: de::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let input: String = de::Deserialize::deserialize(deserializer)?;
    let num = input.trim_end_matches(|c: char| !c.is_numeric());
    let unit = &input[num.len()..];
    let num: u64 = num
        .parse()
        .map_err(|_| de::Error::custom(format!("Invalid number \"{num}\" in duration: number part must be a u64")))?;

    match unit {
        "s" => num
            .checked_mul(1000)
            .ok_or_else(|| de::Error::custom(format!("Duration \"{input}\" overflows"))),
        "ms" => Ok(num),
        other => Err(de::Error::custom(format!(
            "Invalid duration unit \"{other}\": unit part must be either \"s\" or \"ms\""
        ))),
    }
}

impl UserspaceConfig {
    /// Parse and validate a config from a TOML string
    pub fn from_toml_str(toml_str: &str) -> ConfigResult<Self> {
        Self::parse(toml_str, "<string>")
    }

    /// Read, parse and validate the config file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(toml_str: &str, path: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::TomlParse {
            path: path.to_string(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.userspace.layout == Layout::Tenkey {
            if let Some(variant) = self.userspace.variant {
                return Err(ConfigError::InvalidValue {
                    field: "userspace.variant".to_string(),
                    value: format!("{:?}", variant),
                    expected: "no variant, the tenkey layout has none".to_string(),
                });
            }
        }

        let timing = &self.timing;
        let behavior = &self.behavior;
        let durations = [
            ("timing.tapping_term", timing.tapping_term),
            ("timing.tapping_term_mods", timing.tapping_term_mods),
            ("timing.tapping_term_layer", timing.tapping_term_layer),
            ("timing.tapping_term_sidekey_td", timing.tapping_term_sidekey_td),
            ("timing.tapping_term_thumbkey_td", timing.tapping_term_thumbkey_td),
            ("timing.caps_word_idle_timeout", timing.caps_word_idle_timeout),
            ("timing.esc_colon_delay", timing.esc_colon_delay),
            ("behavior.one_shot_timeout", behavior.one_shot_timeout),
            ("behavior.combo_timeout", behavior.combo_timeout),
        ];
        for (field, duration) in durations {
            check_duration(field, duration)?;
        }
        Ok(())
    }

    pub fn layout(&self) -> Layout {
        self.userspace.layout
    }

    /// Variant of the hbmorrison layout, the default one if unset
    pub fn variant(&self) -> Variant {
        self.userspace.variant.unwrap_or_default()
    }

    pub fn operating_system(&self) -> OperatingSystem {
        self.userspace.os
    }

    pub fn timings(&self) -> Timings {
        let timing = &self.timing;
        Timings {
            tapping_term: timing.tapping_term.into(),
            tapping_term_mods: timing.tapping_term_mods.into(),
            tapping_term_layer: timing.tapping_term_layer.into(),
            tapping_term_sidekey_td: timing.tapping_term_sidekey_td.into(),
            tapping_term_thumbkey_td: timing.tapping_term_thumbkey_td.into(),
            caps_word_idle_timeout: timing.caps_word_idle_timeout.into(),
            esc_colon_delay: timing.esc_colon_delay.into(),
        }
    }

    /// The layout's behavior config, with the switches of `[behavior]` applied
    pub fn behavior_config(&self) -> BehaviorConfig {
        let timings = self.timings();
        let mut config = match self.userspace.layout {
            Layout::Hbmorrison => hbmorrison::behavior_config(self.variant(), &timings),
            Layout::Tenkey => tenkey::behavior_config(&timings),
        };

        let behavior = &self.behavior;
        config.tap_hold.permissive_hold = behavior.permissive_hold;
        config.tap_hold.retro_tap = behavior.retro_tap;
        config.tap_hold.quick_tap = behavior.quick_tap;
        config.one_shot.timeout = behavior.one_shot_timeout.into();
        config.caps_word.double_tap_shift = behavior.double_tap_shift;
        config.combo.timeout = behavior.combo_timeout.into();
        config.handedness.unilateral_tap = behavior.unilateral_tap;
        config.handedness.suppress_same_hand_mods = behavior.suppress_same_hand_mods;
        config
    }
}

fn check_duration(field: &str, duration: DurationMillis) -> ConfigResult<()> {
    if duration.0 == 0 {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: "must be greater than 0".to_string(),
        });
    }
    if duration.0 > u16::MAX as u64 {
        return Err(ConfigError::Validation {
            field: field.to_string(),
            message: format!("must be at most {}ms, got {}ms", u16::MAX, duration.0),
        });
    }
    Ok(())
}
