// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Percentage type for fan speed control.

use std::fmt;

use crate::error::ValueError;

/// Fan speed as a percentage (0-100).
///
/// 0 means off; every family accepts the full range at the capability
/// surface and maps it onto its own speed encoding.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::Percentage;
///
/// let speed = Percentage::new(75).unwrap();
/// assert_eq!(speed.value(), 75);
/// assert!(Percentage::new(101).is_err());
/// assert!(Percentage::OFF.is_off());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct Percentage(u8);

impl Percentage {
    /// Fan off.
    pub const OFF: Self = Self(0);

    /// Full speed.
    pub const FULL: Self = Self(100);

    /// Creates a new percentage value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u32::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a percentage, clamping values above 100.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` for 0%.
    #[must_use]
    pub const fn is_off(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Percentage {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
