// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device transport boundary.
//!
//! The wire protocol (encryption, framing, token handshake) lives outside
//! this crate. A transport only has to read lists of properties, write
//! single properties and report device identity. Every call is blocking;
//! the entity layer moves them onto tokio's blocking pool with
//! [`offload`].
//!
//! Properties are addressed either by a legacy property name or by a
//! `siid`/`piid` pair for property-mapped firmware.

use std::fmt;

use serde_json::Value;

use crate::error::TransportFault;

/// Address of a device property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// Legacy named property, such as `"speed_level"`.
    Named(&'static str),
    /// Service and property id of a mapped property.
    Miot {
        /// Service id.
        siid: u16,
        /// Property id within the service.
        piid: u16,
    },
}

impl PropertyId {
    /// Shorthand for a mapped property.
    #[must_use]
    pub const fn miot(siid: u16, piid: u16) -> Self {
        Self::Miot { siid, piid }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Miot { siid, piid } => write!(f, "{siid}.{piid}"),
        }
    }
}

/// One entry of a property read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawProperty {
    /// The property that was read.
    pub id: PropertyId,
    /// The reported value, `Null` if the device did not return one.
    pub value: Value,
    /// Per-property status code; `0` means success.
    pub code: i32,
}

impl RawProperty {
    /// Creates a successfully read property.
    #[must_use]
    pub fn ok(id: PropertyId, value: impl Into<Value>) -> Self {
        Self {
            id,
            value: value.into(),
            code: 0,
        }
    }

    /// Creates a property the device failed to read.
    #[must_use]
    pub const fn failed(id: PropertyId, code: i32) -> Self {
        Self {
            id,
            value: Value::Null,
            code,
        }
    }

    /// Returns `true` if the device reported the property successfully.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Identity reported by a device.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceInfo {
    /// Vendor model string, such as `"zhimi.fan.za5"`.
    pub model: String,
    /// MAC address of the Wi-Fi module.
    pub mac_address: String,
    /// Firmware version.
    pub firmware_version: String,
    /// Hardware revision.
    pub hardware_version: String,
}

/// Blocking access to a single physical device.
///
/// Implementations are shared between the polling task and command
/// handlers, so they must be `Send + Sync`. A call that hangs is
/// indistinguishable from one that fails slowly; timeouts belong to the
/// implementation.
pub trait DeviceTransport: Send + Sync {
    /// Queries the device identity.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the device cannot be reached.
    fn info(&self) -> Result<DeviceInfo, TransportFault>;

    /// Reads the given properties, returning one entry per id in order.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the request as a whole fails.
    fn get_properties(&self, ids: &[PropertyId]) -> Result<Vec<RawProperty>, TransportFault>;

    /// Writes a single property.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the write is not acknowledged.
    fn write_property(&self, id: PropertyId, value: Value) -> Result<(), TransportFault>;

    /// Switches the device on through its power property.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the write is not acknowledged.
    fn power_on(&self, power: PropertyId, on_value: Value) -> Result<(), TransportFault> {
        self.write_property(power, on_value)
    }

    /// Switches the device off through its power property.
    ///
    /// # Errors
    ///
    /// Returns `TransportFault` if the write is not acknowledged.
    fn power_off(&self, power: PropertyId, off_value: Value) -> Result<(), TransportFault> {
        self.write_property(power, off_value)
    }
}

/// Runs a blocking transport call on tokio's blocking pool.
///
/// A worker that panics or is cancelled is reported as
/// `TransportFault::WorkerLost`.
pub(crate) async fn offload<T, E, F>(call: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<TransportFault> + Send + 'static,
{
    match tokio::task::spawn_blocking(call).await {
        Ok(result) => result,
        Err(e) => Err(TransportFault::WorkerLost(e.to_string()).into()),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory transport for unit tests.

    use std::collections::HashMap;

    use parking_lot::Mutex;

    use super::*;

    /// Transport backed by a property map that records every write.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        properties: Mutex<HashMap<PropertyId, Value>>,
        writes: Mutex<Vec<(PropertyId, Value)>>,
        pub(crate) fail: Mutex<bool>,
    }

    impl RecordingTransport {
        pub(crate) fn with(properties: &[(PropertyId, Value)]) -> Self {
            let transport = Self::default();
            transport
                .properties
                .lock()
                .extend(properties.iter().cloned());
            transport
        }

        pub(crate) fn writes(&self) -> Vec<(PropertyId, Value)> {
            self.writes.lock().clone()
        }
    }

    impl DeviceTransport for RecordingTransport {
        fn info(&self) -> Result<DeviceInfo, TransportFault> {
            Ok(DeviceInfo {
                model: "zhimi.fan.za4".into(),
                mac_address: "00:11:22:33:44:55".into(),
                firmware_version: "2.0.0".into(),
                hardware_version: "esp32".into(),
            })
        }

        fn get_properties(&self, ids: &[PropertyId]) -> Result<Vec<RawProperty>, TransportFault> {
            if *self.fail.lock() {
                return Err(TransportFault::Unavailable("scripted".into()));
            }
            let properties = self.properties.lock();
            Ok(ids
                .iter()
                .map(|id| match properties.get(id) {
                    Some(value) => RawProperty::ok(*id, value.clone()),
                    None => RawProperty::failed(*id, -4001),
                })
                .collect())
        }

        fn write_property(&self, id: PropertyId, value: Value) -> Result<(), TransportFault> {
            if *self.fail.lock() {
                return Err(TransportFault::Unavailable("scripted".into()));
            }
            self.writes.lock().push((id, value.clone()));
            self.properties.lock().insert(id, value);
            Ok(())
        }
    }
}
