// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Normalized device status.
//!
//! A [`StatusNormalizer`] turns the raw property list returned by a family
//! adapter into a [`StatusSnapshot`] of semantic values. Partial data is
//! valid: a property the device failed to report leaves its field empty
//! instead of failing the whole snapshot, and an unrecognized enum code
//! leaves its field empty and is reported as a [`DecodeError`] next to the
//! snapshot.

use serde_json::Value;

use crate::error::DecodeError;
use crate::transport::{PropertyId, RawProperty};
use crate::types::{EnumCodec, LedBrightness, OperationMode};

/// One poll cycle's worth of normalized fields.
///
/// Which fields are present depends on the model. Vendor codes never
/// appear here.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct StatusSnapshot {
    /// Power switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    /// Operation mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<OperationMode>,
    /// Current speed in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u8>,
    /// Speed of the direct channel (classic fans).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direct_speed: Option<u8>,
    /// Speed of the natural wind channel (classic fans); `0` when inactive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub natural_speed: Option<u8>,
    /// Raw fixed speed level (1C line).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fan_level: Option<u8>,
    /// Oscillation switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oscillate: Option<bool>,
    /// Oscillation angle in degrees.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<u16>,
    /// Remaining time until scheduled power-off, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_off_countdown: Option<u32>,
    /// LED switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led: Option<bool>,
    /// LED brightness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub led_brightness: Option<LedBrightness>,
    /// Buzzer switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buzzer: Option<bool>,
    /// Child lock switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_lock: Option<bool>,
    /// Anion generator switch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anion: Option<bool>,
    /// Mains power connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ac_power: Option<bool>,
    /// Battery level in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery: Option<u8>,
    /// Battery is charging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_charging: Option<bool>,
    /// Battery is fitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_supported: Option<bool>,
    /// Temperature in degrees Celsius.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Relative humidity in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<u8>,
    /// Accumulated run time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_time: Option<u64>,
    /// Last physical button pressed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button_pressed: Option<String>,
    /// Motor speed in revolutions per minute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_rpm: Option<u32>,
    /// Device reports a fault.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detected: Option<bool>,
}

impl StatusSnapshot {
    /// Returns the snapshot as a JSON object of the present fields.
    #[must_use]
    pub fn to_attributes(&self) -> serde_json::Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

/// Output of a normalizer: the snapshot and any decode anomalies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedStatus {
    /// The normalized fields.
    pub snapshot: StatusSnapshot,
    /// Values that could not be decoded; their fields are empty.
    pub anomalies: Vec<DecodeError>,
}

/// Family-specific decoding of a raw property list.
pub trait StatusNormalizer: Send + Sync {
    /// Parses the properties returned by the family adapter.
    fn parse(&self, properties: &[RawProperty]) -> ParsedStatus;
}

/// Typed read access to a raw property list.
///
/// Every accessor returns `None` for properties that are missing, failed
/// or `null`. A value of the wrong type also returns `None` and is
/// recorded as an anomaly.
#[derive(Debug)]
pub struct PropertyView<'a> {
    properties: &'a [RawProperty],
    anomalies: Vec<DecodeError>,
}

impl<'a> PropertyView<'a> {
    /// Wraps a raw property list.
    #[must_use]
    pub fn new(properties: &'a [RawProperty]) -> Self {
        Self {
            properties,
            anomalies: Vec::new(),
        }
    }

    /// Returns the successfully reported value of `id`.
    #[must_use]
    pub fn raw(&self, id: PropertyId) -> Option<&'a Value> {
        self.properties
            .iter()
            .find(|prop| prop.id == id)
            .filter(|prop| prop.is_ok() && !prop.value.is_null())
            .map(|prop| &prop.value)
    }

    fn invalid(&mut self, field: &'static str, value: &Value) {
        self.anomalies.push(DecodeError::InvalidValue {
            field,
            value: value.clone(),
        });
    }

    /// Reads a switch encoded as a JSON bool, `"on"`/`"off"` or `1`/`0`.
    pub fn switch(&mut self, id: PropertyId, field: &'static str) -> Option<bool> {
        let value = self.raw(id)?;
        let decoded = match value {
            Value::Bool(on) => Some(*on),
            Value::String(text) => match text.as_str() {
                "on" => Some(true),
                "off" => Some(false),
                _ => None,
            },
            Value::Number(number) => match number.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            _ => None,
        };
        if decoded.is_none() {
            self.invalid(field, value);
        }
        decoded
    }

    /// Reads an unsigned integer that must fit in `T`.
    pub fn unsigned<T: TryFrom<u64>>(&mut self, id: PropertyId, field: &'static str) -> Option<T> {
        let value = self.raw(id)?;
        let decoded = value.as_u64().and_then(|raw| T::try_from(raw).ok());
        if decoded.is_none() {
            self.invalid(field, value);
        }
        decoded
    }

    /// Reads a number as `f32`.
    pub fn float(&mut self, id: PropertyId, field: &'static str) -> Option<f32> {
        let value = self.raw(id)?;
        #[allow(clippy::cast_possible_truncation)]
        let decoded = value.as_f64().map(|raw| raw as f32);
        if decoded.is_none() {
            self.invalid(field, value);
        }
        decoded
    }

    /// Reads a string, or the textual form of any scalar.
    pub fn text(&mut self, id: PropertyId, field: &'static str) -> Option<String> {
        let value = self.raw(id)?;
        match value {
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => {
                self.invalid(field, value);
                None
            }
        }
    }

    /// Decodes an enum-valued property through a family codec.
    pub fn decode<T: Copy + PartialEq>(&mut self, id: PropertyId, codec: &EnumCodec<T>) -> Option<T> {
        let value = self.raw(id)?;
        match codec.decode(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                self.anomalies.push(err);
                None
            }
        }
    }

    /// Finishes reading and pairs the snapshot with the anomalies seen.
    #[must_use]
    pub fn finish(self, snapshot: StatusSnapshot) -> ParsedStatus {
        ParsedStatus {
            snapshot,
            anomalies: self.anomalies,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RawCode;
    use serde_json::json;

    const POWER: PropertyId = PropertyId::Named("power");
    const MODE: PropertyId = PropertyId::miot(2, 7);

    const MODES: EnumCodec<OperationMode> = EnumCodec::new(
        "mode",
        &[
            (RawCode::Int(0), OperationMode::Nature),
            (RawCode::Int(1), OperationMode::Normal),
        ],
    );

    #[test]
    fn failed_property_reads_as_absent() {
        let props = [RawProperty::failed(POWER, -4001)];
        let mut view = PropertyView::new(&props);
        assert_eq!(view.switch(POWER, "power"), None);
        assert!(view.finish(StatusSnapshot::default()).anomalies.is_empty());
    }

    #[test]
    fn switch_encodings() {
        for (raw, expected) in [
            (json!("on"), true),
            (json!("off"), false),
            (json!(true), true),
            (json!(0), false),
        ] {
            let props = [RawProperty::ok(POWER, raw)];
            let mut view = PropertyView::new(&props);
            assert_eq!(view.switch(POWER, "power"), Some(expected));
        }
    }

    #[test]
    fn unknown_enum_code_is_reported_not_coerced() {
        let props = [RawProperty::ok(MODE, 9)];
        let mut view = PropertyView::new(&props);
        assert_eq!(view.decode(MODE, &MODES), None);
        let parsed = view.finish(StatusSnapshot::default());
        assert_eq!(
            parsed.anomalies,
            vec![DecodeError::UnknownCode {
                field: "mode",
                code: json!(9)
            }]
        );
    }

    #[test]
    fn out_of_range_integer_is_an_anomaly() {
        let props = [RawProperty::ok(POWER, 300)];
        let mut view = PropertyView::new(&props);
        assert_eq!(view.unsigned::<u8>(POWER, "speed"), None);
        assert_eq!(view.finish(StatusSnapshot::default()).anomalies.len(), 1);
    }

    #[test]
    fn attributes_only_contain_present_fields() {
        let snapshot = StatusSnapshot {
            power: Some(true),
            angle: Some(90),
            mode: Some(OperationMode::Nature),
            ..StatusSnapshot::default()
        };
        let attributes = snapshot.to_attributes();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes["mode"], json!("nature"));
        assert_eq!(attributes["angle"], json!(90));
    }
}
