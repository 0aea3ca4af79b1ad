// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Encode/decode tables between semantic enums and vendor codes.
//!
//! Each family declares its own [`EnumCodec`] for every enum-valued
//! property, so the same semantic value may travel as `"nature"`, `0` or
//! `1` depending on firmware.

use serde_json::Value;

use crate::error::DecodeError;

/// A raw vendor code as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawCode {
    /// Integer code.
    Int(i64),
    /// String code.
    Text(&'static str),
}

impl RawCode {
    /// Converts the code into a JSON value for a property write.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Int(code) => Value::from(code),
            Self::Text(code) => Value::from(code),
        }
    }

    /// Returns `true` if the raw JSON value carries this code.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Int(code) => value.as_i64() == Some(code),
            Self::Text(code) => value.as_str() == Some(code),
        }
    }
}

/// Bidirectional table between a semantic enum `T` and vendor codes.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::{EnumCodec, OperationMode, RawCode};
///
/// const MODES: EnumCodec<OperationMode> = EnumCodec::new(
///     "mode",
///     &[
///         (RawCode::Int(0), OperationMode::Nature),
///         (RawCode::Int(1), OperationMode::Normal),
///     ],
/// );
///
/// assert_eq!(MODES.encode(OperationMode::Normal), Some(serde_json::json!(1)));
/// assert_eq!(MODES.decode(&serde_json::json!(0)).unwrap(), OperationMode::Nature);
/// assert!(MODES.decode(&serde_json::json!(7)).is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct EnumCodec<T: 'static> {
    field: &'static str,
    entries: &'static [(RawCode, T)],
}

impl<T: Copy + PartialEq> EnumCodec<T> {
    /// Creates a codec for the named snapshot field.
    #[must_use]
    pub const fn new(field: &'static str, entries: &'static [(RawCode, T)]) -> Self {
        Self { field, entries }
    }

    /// Returns the vendor code for `value`, or `None` if the family has no
    /// encoding for it.
    #[must_use]
    pub fn encode(&self, value: T) -> Option<Value> {
        self.entries
            .iter()
            .find(|(_, known)| *known == value)
            .map(|(code, _)| code.to_value())
    }

    /// Decodes a vendor code.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnknownCode` for codes not in the table.
    pub fn decode(&self, raw: &Value) -> Result<T, DecodeError> {
        self.entries
            .iter()
            .find(|(code, _)| code.matches(raw))
            .map(|(_, value)| *value)
            .ok_or_else(|| DecodeError::UnknownCode {
                field: self.field,
                code: raw.clone(),
            })
    }

    /// Returns every semantic value the family can encode.
    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.entries.iter().map(|(_, value)| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SWITCH: EnumCodec<bool> = EnumCodec::new(
        "buzzer",
        &[(RawCode::Text("on"), true), (RawCode::Text("off"), false)],
    );

    #[test]
    fn encode_known_value() {
        assert_eq!(SWITCH.encode(true), Some(json!("on")));
        assert_eq!(SWITCH.encode(false), Some(json!("off")));
    }

    #[test]
    fn decode_unknown_code_names_field() {
        let err = SWITCH.decode(&json!("maybe")).unwrap_err();
        assert_eq!(
            err,
            DecodeError::UnknownCode {
                field: "buzzer",
                code: json!("maybe")
            }
        );
    }

    #[test]
    fn int_code_does_not_match_string() {
        assert!(!RawCode::Int(1).matches(&json!("1")));
        assert!(RawCode::Int(1).matches(&json!(1)));
    }
}
