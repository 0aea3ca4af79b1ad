// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dmaker 1C and P8 fans.
//!
//! These have three fixed speed levels instead of a percentage. The
//! firmware ignores a level write while switched off, so the adapter reads
//! the power property first and switches the fan on if needed.

use serde_json::Value;

use crate::command::{
    AdapterResult, CommandAdapter, MAX_DELAY_OFF_MINUTES, check_delay_off, check_level,
    read_power, write,
};
use crate::error::{CommandError, TransportFault};
use crate::status::{ParsedStatus, PropertyView, StatusNormalizer, StatusSnapshot};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{EnumCodec, OperationMode, OrderedPresets, Percentage, RawCode};

const POWER: PropertyId = PropertyId::miot(2, 1);
const FAN_LEVEL: PropertyId = PropertyId::miot(2, 2);
const OSCILLATE: PropertyId = PropertyId::miot(2, 3);
const MODE: PropertyId = PropertyId::miot(2, 7);
const DELAY_OFF: PropertyId = PropertyId::miot(2, 10);
const BUZZER: PropertyId = PropertyId::miot(2, 11);
const LED: PropertyId = PropertyId::miot(2, 12);
const CHILD_LOCK: PropertyId = PropertyId::miot(3, 1);

const STATUS_PROPERTIES: [PropertyId; 8] = [
    POWER, FAN_LEVEL, CHILD_LOCK, OSCILLATE, DELAY_OFF, BUZZER, LED, MODE,
];

const MODES: EnumCodec<OperationMode> = EnumCodec::new(
    "mode",
    &[
        (RawCode::Int(0), OperationMode::Normal),
        (RawCode::Int(1), OperationMode::Nature),
    ],
);

/// Levels of the fixed-speed line.
pub const LEVELS: &OrderedPresets = &OrderedPresets::ONE_C;

/// Adapter and normalizer for the Dmaker 1C line.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneCFan;

fn is_on(value: &Value) -> bool {
    value.as_bool().unwrap_or(false)
}

impl CommandAdapter for OneCFan {
    fn status(&self, transport: &dyn DeviceTransport) -> Result<Vec<RawProperty>, TransportFault> {
        transport.get_properties(&STATUS_PROPERTIES)
    }

    fn power_on(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_on(POWER, true.into())?;
        Ok(())
    }

    fn power_off(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_off(POWER, false.into())?;
        Ok(())
    }

    fn set_speed_percentage(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult {
        let preset = LEVELS.preset_for(percentage.value());
        let level = LEVELS.raw_level(preset).ok_or(CommandError::LevelOutOfRange {
            level: percentage.value(),
            min: 1,
            max: 100,
        })?;
        self.set_preset_level(transport, level)
    }

    fn set_preset_level(&self, transport: &dyn DeviceTransport, level: u8) -> AdapterResult {
        let max = u8::try_from(LEVELS.len()).unwrap_or(u8::MAX);
        check_level(level, 1, max)?;
        if !read_power(transport, POWER, is_on)? {
            transport.power_on(POWER, true.into())?;
        }
        write(transport, FAN_LEVEL, level)
    }

    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, OSCILLATE, on)
    }

    fn set_mode(&self, transport: &dyn DeviceTransport, mode: OperationMode) -> AdapterResult {
        let value = MODES
            .encode(mode)
            .ok_or_else(|| CommandError::UnsupportedMode(mode.to_string()))?;
        write(transport, MODE, value)
    }

    fn set_buzzer(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, BUZZER, on)
    }

    fn set_child_lock(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, CHILD_LOCK, on)
    }

    fn set_led(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, LED, on)
    }

    fn set_delay_off(&self, transport: &dyn DeviceTransport, minutes: u32) -> AdapterResult {
        check_delay_off(minutes, MAX_DELAY_OFF_MINUTES)?;
        write(transport, DELAY_OFF, minutes)
    }
}

impl StatusNormalizer for OneCFan {
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus {
        let mut view = PropertyView::new(properties);
        let minutes: Option<u32> = view.unsigned(DELAY_OFF, "delay_off_countdown");
        let snapshot = StatusSnapshot {
            power: view.switch(POWER, "power"),
            fan_level: view.unsigned(FAN_LEVEL, "fan_level"),
            oscillate: view.switch(OSCILLATE, "oscillate"),
            mode: view.decode(MODE, &MODES),
            delay_off_countdown: minutes.map(|m| m.saturating_mul(60)),
            buzzer: view.switch(BUZZER, "buzzer"),
            led: view.switch(LED, "led"),
            child_lock: view.switch(CHILD_LOCK, "child_lock"),
            ..StatusSnapshot::default()
        };
        view.finish(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    #[test]
    fn level_write_powers_on_first_when_off() {
        let transport = RecordingTransport::with(&[(POWER, json!(false))]);
        OneCFan.set_preset_level(&transport, 2).unwrap();
        assert_eq!(
            transport.writes(),
            vec![(POWER, json!(true)), (FAN_LEVEL, json!(2))]
        );
    }

    #[test]
    fn level_write_skips_power_on_when_on() {
        let transport = RecordingTransport::with(&[(POWER, json!(true))]);
        OneCFan.set_preset_level(&transport, 3).unwrap();
        assert_eq!(transport.writes(), vec![(FAN_LEVEL, json!(3))]);
    }

    #[test]
    fn level_out_of_range_issues_no_read_or_write() {
        let transport = RecordingTransport::default();
        assert_eq!(
            OneCFan.set_preset_level(&transport, 4),
            Err(AdapterError::Command(CommandError::LevelOutOfRange {
                level: 4,
                min: 1,
                max: 3
            }))
        );
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn percentage_maps_to_level() {
        let transport = RecordingTransport::with(&[(POWER, json!(true))]);
        OneCFan
            .set_speed_percentage(&transport, Percentage::new(50).unwrap())
            .unwrap();
        assert_eq!(transport.writes(), vec![(FAN_LEVEL, json!(2))]);
    }

    #[test]
    fn parses_status() {
        let props = [
            RawProperty::ok(POWER, true),
            RawProperty::ok(FAN_LEVEL, 2),
            RawProperty::ok(MODE, 1),
            RawProperty::ok(DELAY_OFF, 5),
            RawProperty::failed(LED, -4004),
        ];
        let parsed = OneCFan.parse(&props);
        assert!(parsed.anomalies.is_empty());
        assert_eq!(parsed.snapshot.fan_level, Some(2));
        assert_eq!(parsed.snapshot.mode, Some(OperationMode::Nature));
        assert_eq!(parsed.snapshot.delay_off_countdown, Some(300));
        assert_eq!(parsed.snapshot.led, None);
    }
}
