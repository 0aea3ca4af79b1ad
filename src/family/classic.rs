// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Classic zhimi pedestal fans (V2, V3, SA1, ZA1, ZA3, ZA4).
//!
//! These firmware keep two independent speed channels: `speed_level` for
//! constant wind and `natural_level` for natural wind. Whichever is
//! non-zero is the active one. Switches are `"on"`/`"off"` strings except
//! the ZA3/ZA4 buzzer, which is numeric.

use crate::command::{
    AdapterResult, CommandAdapter, MAX_DELAY_OFF_MINUTES, check_angle, check_delay_off,
    check_level, unsupported, write,
};
use crate::error::{AdapterError, CommandError, TransportFault};
use crate::status::{ParsedStatus, PropertyView, StatusNormalizer, StatusSnapshot};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{
    DeviceModel, EnumCodec, LedBrightness, OperationMode, Percentage, RawCode, RotateDirection,
};

use super::on_off;

const POWER: PropertyId = PropertyId::Named("power");
const SPEED: PropertyId = PropertyId::Named("speed");
const DIRECT_SPEED: PropertyId = PropertyId::Named("speed_level");
const NATURAL_SPEED: PropertyId = PropertyId::Named("natural_level");
const OSCILLATE: PropertyId = PropertyId::Named("angle_enable");
const ANGLE: PropertyId = PropertyId::Named("angle");
const DELAY_OFF: PropertyId = PropertyId::Named("poweroff_time");
const LED_BRIGHTNESS: PropertyId = PropertyId::Named("led_b");
const LED: PropertyId = PropertyId::Named("led");
const BUZZER: PropertyId = PropertyId::Named("buzzer");
const CHILD_LOCK: PropertyId = PropertyId::Named("child_lock");
const AC_POWER: PropertyId = PropertyId::Named("ac_power");
const BATTERY: PropertyId = PropertyId::Named("battery");
const BATTERY_CHARGE: PropertyId = PropertyId::Named("bat_charge");
const TEMPERATURE: PropertyId = PropertyId::Named("temp_dec");
const HUMIDITY: PropertyId = PropertyId::Named("humidity");
const BUTTON_PRESSED: PropertyId = PropertyId::Named("button_pressed");
const USE_TIME: PropertyId = PropertyId::Named("use_time");
const MOVE: PropertyId = PropertyId::Named("set_move");

const STATUS_PROPERTIES: [PropertyId; 18] = [
    TEMPERATURE,
    HUMIDITY,
    ANGLE,
    SPEED,
    DELAY_OFF,
    POWER,
    AC_POWER,
    BATTERY,
    OSCILLATE,
    DIRECT_SPEED,
    NATURAL_SPEED,
    CHILD_LOCK,
    BUZZER,
    LED_BRIGHTNESS,
    LED,
    BATTERY_CHARGE,
    BUTTON_PRESSED,
    USE_TIME,
];

/// Oscillation angles accepted by classic firmware.
pub const ANGLES: [u16; 4] = [30, 60, 90, 120];

const LED_LEVELS: EnumCodec<LedBrightness> = EnumCodec::new(
    "led_brightness",
    &[
        (RawCode::Int(0), LedBrightness::Bright),
        (RawCode::Int(1), LedBrightness::Dim),
        (RawCode::Int(2), LedBrightness::Off),
    ],
);

const BUZZER_TEXT: EnumCodec<bool> = EnumCodec::new(
    "buzzer",
    &[(RawCode::Text("on"), true), (RawCode::Text("off"), false)],
);

const BUZZER_NUMERIC: EnumCodec<bool> = EnumCodec::new(
    "buzzer",
    &[
        (RawCode::Int(2), true),
        (RawCode::Int(0), false),
        (RawCode::Int(1), true),
    ],
);

const CHARGING: EnumCodec<bool> = EnumCodec::new(
    "battery_charging",
    &[
        (RawCode::Text("progress"), true),
        (RawCode::Text("complete"), false),
    ],
);

/// Adapter and normalizer for classic zhimi fans.
#[derive(Debug, Clone, Copy)]
pub struct ClassicFan {
    model: DeviceModel,
}

impl ClassicFan {
    /// Creates the family implementation for `model`.
    #[must_use]
    pub const fn new(model: DeviceModel) -> Self {
        Self { model }
    }

    const fn buzzer_codec(&self) -> &'static EnumCodec<bool> {
        match self.model {
            DeviceModel::ZhimiZa3 | DeviceModel::ZhimiZa4 => &BUZZER_NUMERIC,
            _ => &BUZZER_TEXT,
        }
    }

    const fn has_led_switch(&self) -> bool {
        matches!(self.model, DeviceModel::ZhimiV2)
    }
}

impl CommandAdapter for ClassicFan {
    fn status(&self, transport: &dyn DeviceTransport) -> Result<Vec<RawProperty>, TransportFault> {
        transport.get_properties(&STATUS_PROPERTIES)
    }

    fn power_on(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_on(POWER, on_off(true).into())?;
        Ok(())
    }

    fn power_off(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_off(POWER, on_off(false).into())?;
        Ok(())
    }

    fn set_speed_percentage(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult {
        check_level(percentage.value(), 1, 100)?;
        write(transport, DIRECT_SPEED, percentage.value())
    }

    fn set_natural_speed(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult {
        check_level(percentage.value(), 1, 100)?;
        write(transport, NATURAL_SPEED, percentage.value())
    }

    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, OSCILLATE, on_off(on))
    }

    fn set_oscillation_angle(&self, transport: &dyn DeviceTransport, angle: u16) -> AdapterResult {
        check_angle(angle, &ANGLES)?;
        write(transport, ANGLE, angle)
    }

    fn set_mode(&self, _transport: &dyn DeviceTransport, mode: OperationMode) -> AdapterResult {
        // Natural wind is a speed channel on this firmware, not a mode.
        Err(CommandError::UnsupportedMode(mode.to_string()).into())
    }

    fn set_buzzer(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        let value = self
            .buzzer_codec()
            .encode(on)
            .ok_or(AdapterError::Command(CommandError::Unsupported {
                operation: "set_buzzer",
            }))?;
        write(transport, BUZZER, value)
    }

    fn set_child_lock(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, CHILD_LOCK, on_off(on))
    }

    fn set_led(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        if !self.has_led_switch() {
            return unsupported("set_led");
        }
        write(transport, LED, on_off(on))
    }

    fn set_led_brightness(
        &self,
        transport: &dyn DeviceTransport,
        brightness: LedBrightness,
    ) -> AdapterResult {
        write(transport, LED_BRIGHTNESS, brightness.level())
    }

    fn set_delay_off(&self, transport: &dyn DeviceTransport, minutes: u32) -> AdapterResult {
        check_delay_off(minutes, MAX_DELAY_OFF_MINUTES)?;
        write(transport, DELAY_OFF, minutes * 60)
    }

    fn set_rotate_direction(
        &self,
        transport: &dyn DeviceTransport,
        direction: RotateDirection,
    ) -> AdapterResult {
        write(transport, MOVE, direction.as_str())
    }
}

impl StatusNormalizer for ClassicFan {
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus {
        let mut view = PropertyView::new(properties);
        let direct_speed = view.unsigned(DIRECT_SPEED, "direct_speed");
        let natural_speed: Option<u8> = view.unsigned(NATURAL_SPEED, "natural_speed");
        let mode = natural_speed.map(|natural| {
            if natural == 0 {
                OperationMode::Normal
            } else {
                OperationMode::Nature
            }
        });
        let temperature = view.float(TEMPERATURE, "temperature").map(|raw| raw / 10.0);

        let snapshot = StatusSnapshot {
            power: view.switch(POWER, "power"),
            mode,
            speed: view.unsigned(SPEED, "speed"),
            direct_speed,
            natural_speed,
            oscillate: view.switch(OSCILLATE, "oscillate"),
            angle: view.unsigned(ANGLE, "angle"),
            delay_off_countdown: view.unsigned(DELAY_OFF, "delay_off_countdown"),
            led: if self.has_led_switch() {
                view.switch(LED, "led")
            } else {
                None
            },
            led_brightness: view.decode(LED_BRIGHTNESS, &LED_LEVELS),
            buzzer: view.decode(BUZZER, self.buzzer_codec()),
            child_lock: view.switch(CHILD_LOCK, "child_lock"),
            ac_power: view.switch(AC_POWER, "ac_power"),
            battery: view.unsigned(BATTERY, "battery"),
            battery_charging: view.decode(BATTERY_CHARGE, &CHARGING),
            temperature,
            humidity: view.unsigned(HUMIDITY, "humidity"),
            use_time: view.unsigned(USE_TIME, "use_time"),
            button_pressed: view.text(BUTTON_PRESSED, "button_pressed"),
            ..StatusSnapshot::default()
        };
        view.finish(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    fn za4_status() -> Vec<RawProperty> {
        vec![
            RawProperty::ok(POWER, "on"),
            RawProperty::ok(SPEED, 30),
            RawProperty::ok(DIRECT_SPEED, 0),
            RawProperty::ok(NATURAL_SPEED, 30),
            RawProperty::ok(OSCILLATE, "off"),
            RawProperty::ok(ANGLE, 120),
            RawProperty::ok(DELAY_OFF, 3600),
            RawProperty::ok(LED_BRIGHTNESS, 1),
            RawProperty::ok(BUZZER, 2),
            RawProperty::ok(CHILD_LOCK, "off"),
            RawProperty::ok(AC_POWER, "on"),
            RawProperty::ok(TEMPERATURE, 232),
            RawProperty::failed(BATTERY_CHARGE, -4001),
        ]
    }

    #[test]
    fn parses_natural_channel_status() {
        let parsed = ClassicFan::new(DeviceModel::ZhimiZa4).parse(&za4_status());
        let snapshot = parsed.snapshot;
        assert!(parsed.anomalies.is_empty());
        assert_eq!(snapshot.power, Some(true));
        assert_eq!(snapshot.natural_speed, Some(30));
        assert_eq!(snapshot.mode, Some(OperationMode::Nature));
        assert_eq!(snapshot.oscillate, Some(false));
        assert_eq!(snapshot.delay_off_countdown, Some(3600));
        assert_eq!(snapshot.led_brightness, Some(LedBrightness::Dim));
        assert_eq!(snapshot.buzzer, Some(true));
        assert_eq!(snapshot.temperature, Some(23.2));
        assert_eq!(snapshot.battery_charging, None);
        assert_eq!(snapshot.led, None);
    }

    #[test]
    fn unknown_led_code_is_an_anomaly() {
        let props = [RawProperty::ok(POWER, "on"), RawProperty::ok(LED_BRIGHTNESS, 5)];
        let parsed = ClassicFan::new(DeviceModel::ZhimiV3).parse(&props);
        assert_eq!(parsed.snapshot.power, Some(true));
        assert_eq!(parsed.snapshot.led_brightness, None);
        assert_eq!(parsed.anomalies.len(), 1);
    }

    #[test]
    fn charging_state_is_derived_from_text() {
        let props = [RawProperty::ok(BATTERY_CHARGE, "progress")];
        let parsed = ClassicFan::new(DeviceModel::ZhimiV2).parse(&props);
        assert_eq!(parsed.snapshot.battery_charging, Some(true));
    }

    #[test]
    fn angle_outside_set_issues_no_write() {
        let transport = RecordingTransport::default();
        let result = ClassicFan::new(DeviceModel::ZhimiZa4).set_oscillation_angle(&transport, 45);
        assert!(matches!(
            result,
            Err(AdapterError::Command(CommandError::UnsupportedAngle { angle: 45, .. }))
        ));
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn delay_off_is_written_in_seconds() {
        let transport = RecordingTransport::default();
        ClassicFan::new(DeviceModel::ZhimiSa1)
            .set_delay_off(&transport, 30)
            .unwrap();
        assert_eq!(transport.writes(), vec![(DELAY_OFF, json!(1800))]);
    }

    #[test]
    fn buzzer_encoding_depends_on_model() {
        let transport = RecordingTransport::default();
        ClassicFan::new(DeviceModel::ZhimiZa3)
            .set_buzzer(&transport, true)
            .unwrap();
        ClassicFan::new(DeviceModel::ZhimiV3)
            .set_buzzer(&transport, true)
            .unwrap();
        assert_eq!(
            transport.writes(),
            vec![(BUZZER, json!(2)), (BUZZER, json!("on"))]
        );
    }

    #[test]
    fn led_switch_only_on_v2() {
        let transport = RecordingTransport::default();
        assert!(ClassicFan::new(DeviceModel::ZhimiV2).set_led(&transport, false).is_ok());
        assert!(matches!(
            ClassicFan::new(DeviceModel::ZhimiZa1).set_led(&transport, false),
            Err(AdapterError::Command(CommandError::Unsupported { .. }))
        ));
        assert_eq!(transport.writes(), vec![(LED, json!("off"))]);
    }

    #[test]
    fn speed_channels() {
        let transport = RecordingTransport::default();
        let fan = ClassicFan::new(DeviceModel::ZhimiZa1);
        fan.set_speed_percentage(&transport, Percentage::new(45).unwrap())
            .unwrap();
        fan.set_natural_speed(&transport, Percentage::new(74).unwrap())
            .unwrap();
        assert_eq!(
            transport.writes(),
            vec![(DIRECT_SPEED, json!(45)), (NATURAL_SPEED, json!(74))]
        );
    }
}
