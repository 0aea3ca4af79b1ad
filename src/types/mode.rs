// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic enums shared by every family.
//!
//! These replace the per-family vendor enums: each family maps them onto
//! its own codes through an [`EnumCodec`](super::EnumCodec).

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Fan operation mode.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::OperationMode;
///
/// let mode: OperationMode = "nature".parse().unwrap();
/// assert_eq!(mode, OperationMode::Nature);
/// assert_eq!(mode.as_str(), "nature");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMode {
    /// Constant speed from the direct speed channel.
    Normal,
    /// Speed varies to imitate natural wind.
    Nature,
    /// Quiet night mode.
    Sleep,
    /// Maximum airflow.
    Strong,
}

impl OperationMode {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Nature => "nature",
            Self::Sleep => "sleep",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" | "manual" | "straight" => Ok(Self::Normal),
            "nature" | "natural" => Ok(Self::Nature),
            "sleep" => Ok(Self::Sleep),
            "strong" => Ok(Self::Strong),
            _ => Err(ValueError::InvalidOperationMode(s.to_string())),
        }
    }
}

/// Direction for a one-step head rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotateDirection {
    /// Rotate left.
    Left,
    /// Rotate right.
    Right,
}

impl RotateDirection {
    /// Returns the lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for RotateDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RotateDirection {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ValueError::InvalidDirection(s.to_string())),
        }
    }
}

/// Three-step LED brightness.
///
/// The numeric level used on the capability surface is 0 (bright),
/// 1 (dim) and 2 (off).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedBrightness {
    /// Full brightness.
    Bright,
    /// Reduced brightness.
    Dim,
    /// LED off.
    Off,
}

impl LedBrightness {
    /// Every level in surface order.
    pub const LEVELS: [u8; 3] = [0, 1, 2];

    /// Converts a surface level (0-2) into a brightness.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` for levels above 2.
    pub fn from_level(level: u8) -> Result<Self, ValueError> {
        match level {
            0 => Ok(Self::Bright),
            1 => Ok(Self::Dim),
            2 => Ok(Self::Off),
            _ => Err(ValueError::OutOfRange {
                min: 0,
                max: 2,
                actual: u32::from(level),
            }),
        }
    }

    /// Returns the surface level (0-2).
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::Bright => 0,
            Self::Dim => 1,
            Self::Off => 2,
        }
    }

    /// Classifies a raw 0-100 light level.
    #[must_use]
    pub const fn from_percent(raw: u8) -> Self {
        match raw {
            0 => Self::Off,
            1..=50 => Self::Dim,
            _ => Self::Bright,
        }
    }

    /// Returns the raw 0-100 light level written for this brightness.
    #[must_use]
    pub const fn to_percent(&self) -> u8 {
        match self {
            Self::Bright => 100,
            Self::Dim => 50,
            Self::Off => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_mode_accepts_vendor_aliases() {
        assert_eq!("Natural".parse::<OperationMode>(), Ok(OperationMode::Nature));
        assert_eq!("manual".parse::<OperationMode>(), Ok(OperationMode::Normal));
        assert!("turbo".parse::<OperationMode>().is_err());
    }

    #[test]
    fn led_levels_round_trip_through_percent_scale() {
        for level in LedBrightness::LEVELS {
            let led = LedBrightness::from_level(level).unwrap();
            assert_eq!(LedBrightness::from_percent(led.to_percent()), led);
        }
    }

    #[test]
    fn led_percent_classification() {
        assert_eq!(LedBrightness::from_percent(0), LedBrightness::Off);
        assert_eq!(LedBrightness::from_percent(1), LedBrightness::Dim);
        assert_eq!(LedBrightness::from_percent(50), LedBrightness::Dim);
        assert_eq!(LedBrightness::from_percent(51), LedBrightness::Bright);
    }

    #[test]
    fn led_level_out_of_range() {
        assert!(LedBrightness::from_level(3).is_err());
    }
}
