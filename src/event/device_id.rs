// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity identifier type.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Identifier of a registered fan entity.
///
/// Assigned at setup and used to target service calls. It is distinct
/// from the entity's unique id, which is derived from the hardware and
/// survives re-registration.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::event::DeviceId;
///
/// let id = DeviceId::new();
/// let parsed: DeviceId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for DeviceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = self.0.simple().to_string();
        write!(f, "DeviceId({})", &full[..8])
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for DeviceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for DeviceId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(DeviceId::new(), DeviceId::new());
    }

    #[test]
    fn parses_hyphenated_form() {
        let uuid = Uuid::new_v4();
        let id: DeviceId = uuid.to_string().parse().unwrap();
        assert_eq!(id.as_uuid(), uuid);
        assert!("not-a-uuid".parse::<DeviceId>().is_err());
    }

    #[test]
    fn debug_is_shortened() {
        let debug = format!("{:?}", DeviceId::new());
        assert!(debug.starts_with("DeviceId("));
        assert_eq!(debug.len(), "DeviceId(".len() + 8 + 1);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = DeviceId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
