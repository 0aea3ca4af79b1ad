// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Dmaker P5 pedestal fan.
//!
//! Named properties with JSON booleans for switches, a string operation
//! mode and a minute-based power-off timer.

use crate::command::{
    AdapterResult, CommandAdapter, MAX_DELAY_OFF_MINUTES, check_angle, check_delay_off,
    check_level, write,
};
use crate::error::{CommandError, TransportFault};
use crate::status::{ParsedStatus, PropertyView, StatusNormalizer, StatusSnapshot};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{EnumCodec, OperationMode, Percentage, RawCode, RotateDirection};

const POWER: PropertyId = PropertyId::Named("power");
const MODE: PropertyId = PropertyId::Named("mode");
const SPEED: PropertyId = PropertyId::Named("speed");
const OSCILLATE: PropertyId = PropertyId::Named("roll_enable");
const ANGLE: PropertyId = PropertyId::Named("roll_angle");
const DELAY_OFF: PropertyId = PropertyId::Named("time_off");
const LED: PropertyId = PropertyId::Named("light");
const BUZZER: PropertyId = PropertyId::Named("beep_sound");
const CHILD_LOCK: PropertyId = PropertyId::Named("child_lock");
const MOVE: PropertyId = PropertyId::Named("m_roll");

const STATUS_PROPERTIES: [PropertyId; 9] = [
    POWER, MODE, SPEED, OSCILLATE, ANGLE, DELAY_OFF, LED, BUZZER, CHILD_LOCK,
];

/// Oscillation angles accepted by the P5.
pub const ANGLES: [u16; 5] = [30, 60, 90, 120, 140];

const MODES: EnumCodec<OperationMode> = EnumCodec::new(
    "mode",
    &[
        (RawCode::Text("normal"), OperationMode::Normal),
        (RawCode::Text("nature"), OperationMode::Nature),
    ],
);

/// Adapter and normalizer for the Dmaker P5.
#[derive(Debug, Clone, Copy, Default)]
pub struct P5Fan;

impl CommandAdapter for P5Fan {
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
        check_level(percentage.value(), 1, 100)?;
        write(transport, SPEED, percentage.value())
    }

    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, OSCILLATE, on)
    }

    fn set_oscillation_angle(&self, transport: &dyn DeviceTransport, angle: u16) -> AdapterResult {
        check_angle(angle, &ANGLES)?;
        write(transport, ANGLE, angle)
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

    fn set_rotate_direction(
        &self,
        transport: &dyn DeviceTransport,
        direction: RotateDirection,
    ) -> AdapterResult {
        write(transport, MOVE, direction.as_str())
    }
}

impl StatusNormalizer for P5Fan {
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus {
        let mut view = PropertyView::new(properties);
        let minutes: Option<u32> = view.unsigned(DELAY_OFF, "delay_off_countdown");
        let snapshot = StatusSnapshot {
            power: view.switch(POWER, "power"),
            mode: view.decode(MODE, &MODES),
            speed: view.unsigned(SPEED, "speed"),
            oscillate: view.switch(OSCILLATE, "oscillate"),
            angle: view.unsigned(ANGLE, "angle"),
            delay_off_countdown: minutes.map(|m| m.saturating_mul(60)),
            led: view.switch(LED, "led"),
            buzzer: view.switch(BUZZER, "buzzer"),
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
    fn parses_status() {
        let props = [
            RawProperty::ok(POWER, true),
            RawProperty::ok(MODE, "nature"),
            RawProperty::ok(SPEED, 35),
            RawProperty::ok(OSCILLATE, false),
            RawProperty::ok(ANGLE, 140),
            RawProperty::ok(DELAY_OFF, 10),
            RawProperty::ok(LED, true),
        ];
        let parsed = P5Fan.parse(&props);
        assert!(parsed.anomalies.is_empty());
        let snapshot = parsed.snapshot;
        assert_eq!(snapshot.mode, Some(OperationMode::Nature));
        assert_eq!(snapshot.angle, Some(140));
        assert_eq!(snapshot.delay_off_countdown, Some(600));
        assert_eq!(snapshot.buzzer, None);
    }

    #[test]
    fn unknown_mode_string_is_an_anomaly() {
        let props = [RawProperty::ok(MODE, "turbo")];
        let parsed = P5Fan.parse(&props);
        assert_eq!(parsed.snapshot.mode, None);
        assert_eq!(parsed.anomalies.len(), 1);
    }

    #[test]
    fn writes_use_native_encodings() {
        let transport = RecordingTransport::default();
        P5Fan.set_mode(&transport, OperationMode::Normal).unwrap();
        P5Fan.set_oscillation_angle(&transport, 140).unwrap();
        P5Fan.set_delay_off(&transport, 60).unwrap();
        P5Fan
            .set_rotate_direction(&transport, RotateDirection::Left)
            .unwrap();
        assert_eq!(
            transport.writes(),
            vec![
                (MODE, json!("normal")),
                (ANGLE, json!(140)),
                (DELAY_OFF, json!(60)),
                (MOVE, json!("left")),
            ]
        );
    }

    #[test]
    fn sleep_mode_is_not_encodable() {
        let transport = RecordingTransport::default();
        assert_eq!(
            P5Fan.set_mode(&transport, OperationMode::Sleep),
            Err(AdapterError::Command(CommandError::UnsupportedMode(
                "sleep".into()
            )))
        );
        assert!(transport.writes().is_empty());
    }
}
