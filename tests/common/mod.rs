// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory fan used by the integration tests.
//!
//! Writes are recorded but not applied: the fake keeps reporting the old
//! property values, like real firmware does for a moment after a write.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use miio_fan_lib::entity::FanEntity;
use miio_fan_lib::family::FamilyProfile;
use miio_fan_lib::transport::{DeviceInfo, DeviceTransport, PropertyId, RawProperty};
use miio_fan_lib::types::DeviceModel;
use miio_fan_lib::{EventBus, TransportFault};
use parking_lot::Mutex;
use serde_json::Value;

pub const TOKEN: &str = "00112233445566778899aabbccddeeff";
pub const MAC: &str = "04:cf:8c:aa:bb:cc";

#[derive(Default)]
struct Script {
    fail_reads: u32,
    fail_all_reads: bool,
    fail_writes: bool,
    unreachable: bool,
}

/// Scriptable fake device.
pub struct FakeTransport {
    model: String,
    properties: Mutex<HashMap<PropertyId, Value>>,
    writes: Mutex<Vec<(PropertyId, Value)>>,
    reads: Mutex<usize>,
    script: Mutex<Script>,
}

impl FakeTransport {
    pub fn new(model: DeviceModel) -> Self {
        Self::reporting(model.as_str())
    }

    /// A device that reports an arbitrary model string from `info()`.
    pub fn reporting(model: &str) -> Self {
        Self {
            model: model.to_string(),
            properties: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            reads: Mutex::new(0),
            script: Mutex::new(Script::default()),
        }
    }

    #[must_use]
    pub fn with(self, id: PropertyId, value: Value) -> Self {
        self.set(id, value);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Changes what the device reports.
    pub fn set(&self, id: PropertyId, value: Value) {
        self.properties.lock().insert(id, value);
    }

    pub fn fail_next_reads(&self, count: u32) {
        self.script.lock().fail_reads = count;
    }

    pub fn fail_reads(&self, fail: bool) {
        self.script.lock().fail_all_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.script.lock().fail_writes = fail;
    }

    pub fn unreachable(self) -> Self {
        self.script.lock().unreachable = true;
        self
    }

    pub fn writes(&self) -> Vec<(PropertyId, Value)> {
        self.writes.lock().clone()
    }

    pub fn clear_writes(&self) {
        self.writes.lock().clear();
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock()
    }
}

impl DeviceTransport for FakeTransport {
    fn info(&self) -> Result<DeviceInfo, TransportFault> {
        if self.script.lock().unreachable {
            return Err(TransportFault::Unavailable("no route to host".into()));
        }
        Ok(DeviceInfo {
            model: self.model.clone(),
            mac_address: MAC.into(),
            firmware_version: "2.1.7".into(),
            hardware_version: "esp8266".into(),
        })
    }

    fn get_properties(&self, ids: &[PropertyId]) -> Result<Vec<RawProperty>, TransportFault> {
        *self.reads.lock() += 1;
        {
            let mut script = self.script.lock();
            if script.unreachable || script.fail_all_reads {
                return Err(TransportFault::Unavailable("timeout".into()));
            }
            if script.fail_reads > 0 {
                script.fail_reads -= 1;
                return Err(TransportFault::Unavailable("timeout".into()));
            }
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
        let script = self.script.lock();
        if script.unreachable || script.fail_writes {
            return Err(TransportFault::Unavailable("timeout".into()));
        }
        self.writes.lock().push((id, value));
        Ok(())
    }
}

/// Builds an entity around a fake device.
pub fn entity(model: DeviceModel, transport: &Arc<FakeTransport>, retries: u32) -> FanEntity {
    entity_on(model, transport, retries, EventBus::new())
}

pub fn entity_on(
    model: DeviceModel,
    transport: &Arc<FakeTransport>,
    retries: u32,
    events: EventBus,
) -> FanEntity {
    let transport: Arc<dyn DeviceTransport> = transport.clone();
    FanEntity::builder(FamilyProfile::for_model(model), transport)
        .host("192.168.1.40")
        .retry_limit(retries)
        .events(events)
        .build()
        .unwrap()
}
