// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device command adapters.
//!
//! A [`CommandAdapter`] translates the uniform operation set into the
//! property writes a given firmware understands. Every adapter:
//!
//! - validates family-specific value sets before writing, so a rejected
//!   value never reaches the network;
//! - issues one write per call, except where the firmware needs to be
//!   powered on before it accepts a speed (the adapter then inserts the
//!   power-on itself);
//! - converts the uniform minute-based delay-off into the unit its
//!   firmware expects.
//!
//! Operations a family has no command for return
//! [`CommandError::Unsupported`]. Feature gating happens one layer up in
//! the entity, which never calls an adapter for an unset feature.
//!
//! # Examples
//!
//! ```
//! use miio_fan_lib::command::check_angle;
//! use miio_fan_lib::CommandError;
//!
//! assert!(check_angle(90, &[30, 60, 90, 120]).is_ok());
//! assert!(matches!(
//!     check_angle(45, &[30, 60, 90, 120]),
//!     Err(CommandError::UnsupportedAngle { angle: 45, .. })
//! ));
//! ```

use serde_json::Value;

use crate::error::{AdapterError, CommandError, TransportFault};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{LedBrightness, OperationMode, Percentage, RotateDirection};

/// Result of a single adapter operation.
pub type AdapterResult = Result<(), AdapterError>;

/// Family-specific translation of the uniform operation set.
///
/// Adapters are stateless and shared; the transport is passed in on
/// every call and all calls block.
pub trait CommandAdapter: Send + Sync {
    /// Reads the raw status properties of the family.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the read fails.
    fn status(&self, transport: &dyn DeviceTransport) -> Result<Vec<RawProperty>, TransportFault>;

    /// Switches the fan on.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn power_on(&self, transport: &dyn DeviceTransport) -> AdapterResult;

    /// Switches the fan off.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn power_off(&self, transport: &dyn DeviceTransport) -> AdapterResult;

    /// Sets the fan speed on the direct channel.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError` if the value is rejected or the write fails.
    fn set_speed_percentage(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult;

    /// Sets the fan speed on the natural wind channel.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Unsupported` for families without a separate
    /// natural channel.
    fn set_natural_speed(
        &self,
        _transport: &dyn DeviceTransport,
        _percentage: Percentage,
    ) -> AdapterResult {
        unsupported("set_natural_speed")
    }

    /// Selects a raw fixed speed level.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Unsupported` for continuous-speed families.
    fn set_preset_level(&self, _transport: &dyn DeviceTransport, _level: u8) -> AdapterResult {
        unsupported("set_preset_level")
    }

    /// Switches oscillation.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult;

    /// Sets the oscillation angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedAngle` for angles outside the
    /// family's discrete set.
    fn set_oscillation_angle(&self, _transport: &dyn DeviceTransport, _angle: u16) -> AdapterResult {
        unsupported("set_oscillation_angle")
    }

    /// Sets the operation mode.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedMode` if the family has no code
    /// for `mode`.
    fn set_mode(&self, _transport: &dyn DeviceTransport, _mode: OperationMode) -> AdapterResult {
        unsupported("set_mode")
    }

    /// Switches the buzzer.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_buzzer(&self, _transport: &dyn DeviceTransport, _on: bool) -> AdapterResult {
        unsupported("set_buzzer")
    }

    /// Switches the child lock.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_child_lock(&self, _transport: &dyn DeviceTransport, _on: bool) -> AdapterResult {
        unsupported("set_child_lock")
    }

    /// Switches the status LED.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_led(&self, _transport: &dyn DeviceTransport, _on: bool) -> AdapterResult {
        unsupported("set_led")
    }

    /// Sets the LED brightness.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_led_brightness(
        &self,
        _transport: &dyn DeviceTransport,
        _brightness: LedBrightness,
    ) -> AdapterResult {
        unsupported("set_led_brightness")
    }

    /// Switches the anion generator.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_anion(&self, _transport: &dyn DeviceTransport, _on: bool) -> AdapterResult {
        unsupported("set_anion")
    }

    /// Schedules power-off after `minutes`; `0` cancels the timer.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::DelayOffOutOfRange` above the family maximum.
    fn set_delay_off(&self, _transport: &dyn DeviceTransport, _minutes: u32) -> AdapterResult {
        unsupported("set_delay_off")
    }

    /// Rotates the head one step.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::Transport` if the write fails.
    fn set_rotate_direction(
        &self,
        _transport: &dyn DeviceTransport,
        _direction: RotateDirection,
    ) -> AdapterResult {
        unsupported("set_rotate_direction")
    }
}

/// Longest delay-off accepted by most firmware, in minutes.
pub const MAX_DELAY_OFF_MINUTES: u32 = 480;

/// Rejects an angle outside `allowed`.
///
/// # Errors
///
/// Returns `CommandError::UnsupportedAngle` carrying the allowed set.
pub fn check_angle(angle: u16, allowed: &[u16]) -> Result<(), CommandError> {
    if allowed.contains(&angle) {
        Ok(())
    } else {
        Err(CommandError::UnsupportedAngle {
            angle,
            allowed: allowed.to_vec(),
        })
    }
}

/// Rejects a delay-off longer than `max_minutes`.
///
/// # Errors
///
/// Returns `CommandError::DelayOffOutOfRange`.
pub fn check_delay_off(minutes: u32, max_minutes: u32) -> Result<(), CommandError> {
    if minutes > max_minutes {
        return Err(CommandError::DelayOffOutOfRange {
            minutes,
            max_minutes,
        });
    }
    Ok(())
}

/// Rejects a raw fixed level outside `min..=max`.
///
/// # Errors
///
/// Returns `CommandError::LevelOutOfRange`.
pub fn check_level(level: u8, min: u8, max: u8) -> Result<(), CommandError> {
    if (min..=max).contains(&level) {
        Ok(())
    } else {
        Err(CommandError::LevelOutOfRange { level, min, max })
    }
}

/// Issues one property write, lifting the fault into an adapter error.
pub(crate) fn write(
    transport: &dyn DeviceTransport,
    id: PropertyId,
    value: impl Into<Value>,
) -> AdapterResult {
    transport.write_property(id, value.into())?;
    Ok(())
}

/// Reads a single power property and reports whether it is on.
///
/// `is_on` interprets the raw value, since firmware disagree on the
/// encoding. A failed or missing read counts as off.
pub(crate) fn read_power(
    transport: &dyn DeviceTransport,
    id: PropertyId,
    is_on: fn(&Value) -> bool,
) -> Result<bool, TransportFault> {
    let properties = transport.get_properties(&[id])?;
    Ok(properties
        .iter()
        .find(|prop| prop.id == id && prop.is_ok())
        .is_some_and(|prop| is_on(&prop.value)))
}

pub(crate) fn unsupported(operation: &'static str) -> AdapterResult {
    Err(CommandError::Unsupported { operation }.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    #[test]
    fn angle_outside_set_is_rejected_with_allowed_values() {
        let err = check_angle(140, &[30, 60, 90, 120]).unwrap_err();
        assert_eq!(
            err,
            CommandError::UnsupportedAngle {
                angle: 140,
                allowed: vec![30, 60, 90, 120]
            }
        );
    }

    #[test]
    fn delay_off_limit_is_inclusive() {
        assert!(check_delay_off(480, MAX_DELAY_OFF_MINUTES).is_ok());
        assert!(check_delay_off(481, MAX_DELAY_OFF_MINUTES).is_err());
        assert!(check_delay_off(0, MAX_DELAY_OFF_MINUTES).is_ok());
    }

    #[test]
    fn level_bounds() {
        assert!(check_level(1, 1, 3).is_ok());
        assert!(check_level(3, 1, 3).is_ok());
        assert_eq!(
            check_level(0, 1, 3),
            Err(CommandError::LevelOutOfRange {
                level: 0,
                min: 1,
                max: 3
            })
        );
    }

    #[test]
    fn read_power_treats_failed_property_as_off() {
        let transport = RecordingTransport::default();
        let on = read_power(&transport, PropertyId::Named("power"), |v| v == "on").unwrap();
        assert!(!on);

        let transport = RecordingTransport::with(&[(PropertyId::Named("power"), json!("on"))]);
        let on = read_power(&transport, PropertyId::Named("power"), |v| v == "on").unwrap();
        assert!(on);
    }
}
