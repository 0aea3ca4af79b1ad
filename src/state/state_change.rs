// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! A successful command does not show up in the next status read, so the
//! entity applies the expected result locally as a [`StateChange`] and
//! suppresses that read. Changes are the only way state is modified
//! outside a poll.
//!
//! # Examples
//!
//! ```
//! use miio_fan_lib::state::{FanState, StateChange};
//! use miio_fan_lib::types::PresetMode;
//!
//! let mut state = FanState::new();
//! let change = StateChange::batch(vec![
//!     StateChange::power_on(),
//!     StateChange::speed(35, Some(PresetMode::Level2)),
//! ]);
//!
//! assert!(state.apply(&change));
//! assert_eq!(state.is_on(), Some(true));
//! assert_eq!(state.preset_mode(), Some(PresetMode::Level2));
//!
//! // Applying the same change again reports no difference
//! assert!(!state.apply(&change));
//! ```

use crate::types::{LedBrightness, OperationMode, PresetMode};

/// A locally applied change to a fan's state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum StateChange {
    /// Power switched.
    Power(bool),

    /// Speed changed.
    Speed {
        /// New percentage.
        percentage: u8,
        /// Preset matching the percentage, if any.
        preset: Option<PresetMode>,
    },

    /// Oscillation switched.
    Oscillating(bool),

    /// Natural wind switched.
    NaturalMode(bool),

    /// Operation mode changed.
    Mode(OperationMode),

    /// Oscillation angle changed.
    Angle(u16),

    /// Buzzer switched.
    Buzzer(bool),

    /// Child lock switched.
    ChildLock(bool),

    /// LED switched.
    Led(bool),

    /// LED brightness changed.
    LedBrightness(LedBrightness),

    /// Anion generator switched.
    Anion(bool),

    /// Power-off timer set; `0` cancels it.
    DelayOff {
        /// Remaining time in seconds.
        seconds: u32,
    },

    /// Multiple changes at once.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Creates a power-on change.
    #[must_use]
    pub fn power_on() -> Self {
        Self::Power(true)
    }

    /// Creates a power-off change.
    #[must_use]
    pub fn power_off() -> Self {
        Self::Power(false)
    }

    /// Creates a speed change.
    #[must_use]
    pub fn speed(percentage: u8, preset: Option<PresetMode>) -> Self {
        Self::Speed { percentage, preset }
    }

    /// Creates a delay-off change from minutes.
    #[must_use]
    pub fn delay_off_minutes(minutes: u32) -> Self {
        Self::DelayOff {
            seconds: minutes.saturating_mul(60),
        }
    }

    /// Creates a batch of changes.
    #[must_use]
    pub fn batch(changes: Vec<StateChange>) -> Self {
        Self::Batch(changes)
    }
}
