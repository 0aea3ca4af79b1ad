// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Leshow SS4 ventilator.
//!
//! Integer switches, a four-way mode and a speed the firmware drops
//! unless the fan is already running.

use serde_json::Value;

use crate::command::{
    AdapterResult, CommandAdapter, check_delay_off, check_level, read_power, write,
};
use crate::error::{CommandError, TransportFault};
use crate::status::{ParsedStatus, PropertyView, StatusNormalizer, StatusSnapshot};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{EnumCodec, OperationMode, Percentage, RawCode};

const POWER: PropertyId = PropertyId::Named("power");
const MODE: PropertyId = PropertyId::Named("mode");
const SPEED: PropertyId = PropertyId::Named("blow");
const DELAY_OFF: PropertyId = PropertyId::Named("timer");
const BUZZER: PropertyId = PropertyId::Named("sound");
const OSCILLATE: PropertyId = PropertyId::Named("yaw");
const FAULT: PropertyId = PropertyId::Named("fault");

const STATUS_PROPERTIES: [PropertyId; 7] =
    [POWER, MODE, SPEED, DELAY_OFF, BUZZER, OSCILLATE, FAULT];

/// Longest timer the SS4 accepts, in minutes.
pub const MAX_DELAY_OFF_MINUTES: u32 = 540;

const MODES: EnumCodec<OperationMode> = EnumCodec::new(
    "mode",
    &[
        (RawCode::Int(0), OperationMode::Normal),
        (RawCode::Int(1), OperationMode::Sleep),
        (RawCode::Int(2), OperationMode::Strong),
        (RawCode::Int(3), OperationMode::Nature),
    ],
);

const fn flag(on: bool) -> u8 {
    if on { 1 } else { 0 }
}

fn is_on(value: &Value) -> bool {
    value.as_i64() == Some(1)
}

/// Adapter and normalizer for the Leshow SS4.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeshowFan;

impl CommandAdapter for LeshowFan {
    fn status(&self, transport: &dyn DeviceTransport) -> Result<Vec<RawProperty>, TransportFault> {
        transport.get_properties(&STATUS_PROPERTIES)
    }

    fn power_on(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_on(POWER, flag(true).into())?;
        Ok(())
    }

    fn power_off(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_off(POWER, flag(false).into())?;
        Ok(())
    }

    fn set_speed_percentage(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult {
        check_level(percentage.value(), 1, 100)?;
        if !read_power(transport, POWER, is_on)? {
            transport.power_on(POWER, flag(true).into())?;
        }
        write(transport, SPEED, percentage.value())
    }

    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, OSCILLATE, flag(on))
    }

    fn set_mode(&self, transport: &dyn DeviceTransport, mode: OperationMode) -> AdapterResult {
        let value = MODES
            .encode(mode)
            .ok_or_else(|| CommandError::UnsupportedMode(mode.to_string()))?;
        write(transport, MODE, value)
    }

    fn set_buzzer(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, BUZZER, flag(on))
    }

    fn set_delay_off(&self, transport: &dyn DeviceTransport, minutes: u32) -> AdapterResult {
        check_delay_off(minutes, MAX_DELAY_OFF_MINUTES)?;
        write(transport, DELAY_OFF, minutes)
    }
}

impl StatusNormalizer for LeshowFan {
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus {
        let mut view = PropertyView::new(properties);
        let minutes: Option<u32> = view.unsigned(DELAY_OFF, "delay_off_countdown");
        let fault: Option<u32> = view.unsigned(FAULT, "error_detected");
        let snapshot = StatusSnapshot {
            power: view.switch(POWER, "power"),
            mode: view.decode(MODE, &MODES),
            speed: view.unsigned(SPEED, "speed"),
            delay_off_countdown: minutes.map(|m| m.saturating_mul(60)),
            buzzer: view.switch(BUZZER, "buzzer"),
            oscillate: view.switch(OSCILLATE, "oscillate"),
            error_detected: fault.map(|code| code != 0),
            ..StatusSnapshot::default()
        };
        view.finish(snapshot)
    }
}
