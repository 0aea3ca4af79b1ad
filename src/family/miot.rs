// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property-mapped fans (ZA5, FA1, FB1 and dmaker P9 to P39).
//!
//! All of these speak the same `siid`/`piid` protocol and differ only in
//! where each field lives and how a handful of values are encoded. A
//! [`MiotLayout`] captures both; one adapter drives every layout.

use crate::command::{
    AdapterResult, CommandAdapter, MAX_DELAY_OFF_MINUTES, check_angle, check_delay_off,
    check_level, unsupported, write,
};
use crate::error::{CommandError, TransportFault};
use crate::status::{ParsedStatus, PropertyView, StatusNormalizer, StatusSnapshot};
use crate::transport::{DeviceTransport, PropertyId, RawProperty};
use crate::types::{
    DeviceModel, EnumCodec, LedBrightness, OperationMode, Percentage, RawCode, RotateDirection,
};

const fn id(siid: u16, piid: u16) -> PropertyId {
    PropertyId::miot(siid, piid)
}

const fn opt(siid: u16, piid: u16) -> Option<PropertyId> {
    Some(PropertyId::miot(siid, piid))
}

/// Unit of the power-off timer property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayUnit {
    /// Timer counts seconds.
    Seconds,
    /// Timer counts minutes.
    Minutes,
}

/// Encoding of the light property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightEncoding {
    /// Boolean switch.
    Switch,
    /// Brightness from 0 to 100.
    Percent,
}

/// Encoding of the one-step rotation action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveEncoding {
    /// `1` for left, `2` for right.
    Numeric,
    /// `"left"` or `"right"`.
    Text,
}

/// Where each field of a property-mapped model lives and how it is encoded.
#[derive(Debug, Clone, Copy)]
pub struct MiotLayout {
    power: PropertyId,
    fan_level: PropertyId,
    fan_speed: PropertyId,
    swing: PropertyId,
    angle: PropertyId,
    mode: PropertyId,
    off_time: PropertyId,
    buzzer: PropertyId,
    light: PropertyId,
    child_lock: PropertyId,
    set_move: Option<(PropertyId, MoveEncoding)>,
    anion: Option<PropertyId>,
    buttons_pressed: Option<PropertyId>,
    battery_supported: Option<PropertyId>,
    speed_rpm: Option<PropertyId>,
    powersupply_attached: Option<PropertyId>,
    humidity: Option<PropertyId>,
    temperature: Option<PropertyId>,
    angles: &'static [u16],
    modes: &'static EnumCodec<OperationMode>,
    delay_unit: DelayUnit,
    light_encoding: LightEncoding,
}

const DMAKER_MODES: EnumCodec<OperationMode> = EnumCodec::new(
    "mode",
    &[
        (RawCode::Int(0), OperationMode::Normal),
        (RawCode::Int(1), OperationMode::Nature),
    ],
);

const ZHIMI_MODES: EnumCodec<OperationMode> = EnumCodec::new(
    "mode",
    &[
        (RawCode::Int(0), OperationMode::Nature),
        (RawCode::Int(1), OperationMode::Normal),
    ],
);

const DMAKER_ANGLES: [u16; 5] = [30, 60, 90, 120, 140];
const P9_ANGLES: [u16; 5] = [30, 60, 90, 120, 150];
const ZHIMI_ANGLES: [u16; 4] = [30, 60, 90, 120];

/// Dmaker P9.
pub const P9: MiotLayout = MiotLayout {
    power: id(2, 1),
    fan_level: id(2, 2),
    mode: id(2, 4),
    swing: id(2, 5),
    angle: id(2, 6),
    buzzer: id(2, 7),
    off_time: id(2, 8),
    light: id(2, 9),
    fan_speed: id(2, 11),
    child_lock: id(3, 1),
    set_move: Some((id(2, 10), MoveEncoding::Numeric)),
    anion: None,
    buttons_pressed: None,
    battery_supported: None,
    speed_rpm: None,
    powersupply_attached: None,
    humidity: None,
    temperature: None,
    angles: &P9_ANGLES,
    modes: &DMAKER_MODES,
    delay_unit: DelayUnit::Minutes,
    light_encoding: LightEncoding::Switch,
};

/// Dmaker P10 and P18.
pub const P10: MiotLayout = MiotLayout {
    mode: id(2, 3),
    swing: id(2, 4),
    angle: id(2, 5),
    off_time: id(2, 6),
    light: id(2, 7),
    buzzer: id(2, 8),
    fan_speed: id(2, 10),
    set_move: Some((id(2, 11), MoveEncoding::Numeric)),
    angles: &DMAKER_ANGLES,
    ..P9
};

/// Dmaker P11, P15 and P33.
pub const P11: MiotLayout = MiotLayout {
    mode: id(2, 3),
    swing: id(2, 4),
    angle: id(2, 5),
    fan_speed: id(2, 6),
    off_time: id(3, 1),
    light: id(4, 1),
    buzzer: id(5, 1),
    set_move: Some((id(6, 1), MoveEncoding::Numeric)),
    child_lock: id(7, 1),
    angles: &DMAKER_ANGLES,
    ..P9
};

/// Dmaker P39.
pub const P39: MiotLayout = MiotLayout {
    angles: &DMAKER_ANGLES,
    ..P9
};

/// Zhimi ZA5.
pub const ZA5: MiotLayout = MiotLayout {
    power: id(2, 1),
    fan_level: id(2, 2),
    swing: id(2, 3),
    angle: id(2, 5),
    mode: id(2, 7),
    off_time: id(2, 10),
    anion: opt(2, 11),
    child_lock: id(3, 1),
    light: id(4, 3),
    buzzer: id(5, 1),
    buttons_pressed: opt(6, 1),
    battery_supported: opt(6, 2),
    set_move: Some((id(6, 3), MoveEncoding::Text)),
    speed_rpm: opt(6, 4),
    powersupply_attached: opt(6, 5),
    fan_speed: id(6, 8),
    humidity: opt(7, 1),
    temperature: opt(7, 7),
    angles: &ZHIMI_ANGLES,
    modes: &ZHIMI_MODES,
    delay_unit: DelayUnit::Seconds,
    light_encoding: LightEncoding::Percent,
};

/// Zhimi FA1 and FB1 circulating fans.
pub const FA1: MiotLayout = MiotLayout {
    power: id(2, 1),
    fan_level: id(2, 2),
    swing: id(2, 3),
    angle: id(2, 5),
    mode: id(2, 7),
    light: id(2, 10),
    buzzer: id(2, 11),
    off_time: id(5, 2),
    fan_speed: id(5, 10),
    child_lock: id(6, 1),
    set_move: None,
    anion: None,
    buttons_pressed: None,
    battery_supported: None,
    speed_rpm: None,
    powersupply_attached: None,
    humidity: None,
    temperature: None,
    angles: &ZHIMI_ANGLES,
    modes: &ZHIMI_MODES,
    delay_unit: DelayUnit::Minutes,
    light_encoding: LightEncoding::Switch,
};

impl MiotLayout {
    /// Returns the layout of a property-mapped model.
    #[must_use]
    pub const fn for_model(model: DeviceModel) -> Option<&'static Self> {
        match model {
            DeviceModel::DmakerP9 => Some(&P9),
            DeviceModel::DmakerP10 | DeviceModel::DmakerP18 => Some(&P10),
            DeviceModel::DmakerP11 | DeviceModel::DmakerP15 | DeviceModel::DmakerP33 => {
                Some(&P11)
            }
            DeviceModel::DmakerP39 => Some(&P39),
            DeviceModel::ZhimiZa5 => Some(&ZA5),
            DeviceModel::ZhimiFa1 | DeviceModel::ZhimiFb1 => Some(&FA1),
            _ => None,
        }
    }

    /// Returns the accepted oscillation angles.
    #[must_use]
    pub const fn angles(&self) -> &'static [u16] {
        self.angles
    }

    fn status_properties(&self) -> Vec<PropertyId> {
        let mut ids = vec![
            self.power,
            self.fan_level,
            self.fan_speed,
            self.swing,
            self.angle,
            self.mode,
            self.off_time,
            self.buzzer,
            self.light,
            self.child_lock,
        ];
        ids.extend(
            [
                self.anion,
                self.buttons_pressed,
                self.battery_supported,
                self.speed_rpm,
                self.powersupply_attached,
                self.humidity,
                self.temperature,
            ]
            .into_iter()
            .flatten(),
        );
        ids
    }
}

/// Adapter and normalizer for property-mapped fans.
#[derive(Debug, Clone, Copy)]
pub struct MiotFan {
    layout: &'static MiotLayout,
}

impl MiotFan {
    /// Creates the family implementation for `layout`.
    #[must_use]
    pub const fn new(layout: &'static MiotLayout) -> Self {
        Self { layout }
    }

    fn read_optional<T>(
        view: &mut PropertyView<'_>,
        id: Option<PropertyId>,
        read: impl FnOnce(&mut PropertyView<'_>, PropertyId) -> Option<T>,
    ) -> Option<T> {
        id.and_then(|id| read(view, id))
    }
}

impl CommandAdapter for MiotFan {
    fn status(&self, transport: &dyn DeviceTransport) -> Result<Vec<RawProperty>, TransportFault> {
        transport.get_properties(&self.layout.status_properties())
    }

    fn power_on(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_on(self.layout.power, true.into())?;
        Ok(())
    }

    fn power_off(&self, transport: &dyn DeviceTransport) -> AdapterResult {
        transport.power_off(self.layout.power, false.into())?;
        Ok(())
    }

    fn set_speed_percentage(
        &self,
        transport: &dyn DeviceTransport,
        percentage: Percentage,
    ) -> AdapterResult {
        check_level(percentage.value(), 1, 100)?;
        write(transport, self.layout.fan_speed, percentage.value())
    }

    fn set_oscillate(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, self.layout.swing, on)
    }

    fn set_oscillation_angle(&self, transport: &dyn DeviceTransport, angle: u16) -> AdapterResult {
        check_angle(angle, self.layout.angles)?;
        write(transport, self.layout.angle, angle)
    }

    fn set_mode(&self, transport: &dyn DeviceTransport, mode: OperationMode) -> AdapterResult {
        let value = self
            .layout
            .modes
            .encode(mode)
            .ok_or_else(|| CommandError::UnsupportedMode(mode.to_string()))?;
        write(transport, self.layout.mode, value)
    }

    fn set_buzzer(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, self.layout.buzzer, on)
    }

    fn set_child_lock(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        write(transport, self.layout.child_lock, on)
    }

    fn set_led(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        match self.layout.light_encoding {
            LightEncoding::Switch => write(transport, self.layout.light, on),
            LightEncoding::Percent => {
                let brightness = if on {
                    LedBrightness::Bright
                } else {
                    LedBrightness::Off
                };
                write(transport, self.layout.light, brightness.to_percent())
            }
        }
    }

    fn set_led_brightness(
        &self,
        transport: &dyn DeviceTransport,
        brightness: LedBrightness,
    ) -> AdapterResult {
        match self.layout.light_encoding {
            LightEncoding::Percent => {
                write(transport, self.layout.light, brightness.to_percent())
            }
            LightEncoding::Switch => unsupported("set_led_brightness"),
        }
    }

    fn set_anion(&self, transport: &dyn DeviceTransport, on: bool) -> AdapterResult {
        match self.layout.anion {
            Some(anion) => write(transport, anion, on),
            None => unsupported("set_anion"),
        }
    }

    fn set_delay_off(&self, transport: &dyn DeviceTransport, minutes: u32) -> AdapterResult {
        check_delay_off(minutes, MAX_DELAY_OFF_MINUTES)?;
        let value = match self.layout.delay_unit {
            DelayUnit::Seconds => minutes * 60,
            DelayUnit::Minutes => minutes,
        };
        write(transport, self.layout.off_time, value)
    }

    fn set_rotate_direction(
        &self,
        transport: &dyn DeviceTransport,
        direction: RotateDirection,
    ) -> AdapterResult {
        let Some((id, encoding)) = self.layout.set_move else {
            return unsupported("set_rotate_direction");
        };
        match encoding {
            MoveEncoding::Numeric => {
                let value: u8 = match direction {
                    RotateDirection::Left => 1,
                    RotateDirection::Right => 2,
                };
                write(transport, id, value)
            }
            MoveEncoding::Text => write(transport, id, direction.as_str()),
        }
    }
}

impl StatusNormalizer for MiotFan {
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus {
        let layout = self.layout;
        let mut view = PropertyView::new(properties);

        let off_time: Option<u32> = view.unsigned(layout.off_time, "delay_off_countdown");
        let delay_off_countdown = off_time.map(|raw| match layout.delay_unit {
            DelayUnit::Seconds => raw,
            DelayUnit::Minutes => raw.saturating_mul(60),
        });

        let (led, led_brightness) = match layout.light_encoding {
            LightEncoding::Switch => (view.switch(layout.light, "led"), None),
            LightEncoding::Percent => {
                let raw: Option<u8> = view.unsigned(layout.light, "led_brightness");
                (
                    raw.map(|level| level > 0),
                    raw.map(LedBrightness::from_percent),
                )
            }
        };

        let battery_charging = Self::read_optional(&mut view, layout.powersupply_attached, |v, id| {
            v.switch(id, "battery_charging")
        });

        let snapshot = StatusSnapshot {
            power: view.switch(layout.power, "power"),
            fan_level: view.unsigned(layout.fan_level, "fan_level"),
            speed: view.unsigned(layout.fan_speed, "speed"),
            oscillate: view.switch(layout.swing, "oscillate"),
            angle: view.unsigned(layout.angle, "angle"),
            mode: view.decode(layout.mode, layout.modes),
            delay_off_countdown,
            buzzer: view.switch(layout.buzzer, "buzzer"),
            led,
            led_brightness,
            child_lock: view.switch(layout.child_lock, "child_lock"),
            anion: Self::read_optional(&mut view, layout.anion, |v, id| v.switch(id, "anion")),
            button_pressed: Self::read_optional(&mut view, layout.buttons_pressed, |v, id| {
                v.text(id, "button_pressed")
            }),
            battery_supported: Self::read_optional(&mut view, layout.battery_supported, |v, id| {
                v.switch(id, "battery_supported")
            }),
            speed_rpm: Self::read_optional(&mut view, layout.speed_rpm, |v, id| {
                v.unsigned(id, "speed_rpm")
            }),
            battery_charging,
            humidity: Self::read_optional(&mut view, layout.humidity, |v, id| {
                v.unsigned(id, "humidity")
            }),
            temperature: Self::read_optional(&mut view, layout.temperature, |v, id| {
                v.float(id, "temperature")
            }),
            ..StatusSnapshot::default()
        };
        view.finish(snapshot)
    }
}
