// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan event types.

use crate::state::{FanState, StateChange};
use crate::types::DeviceModel;

use super::DeviceId;

/// Events emitted by the fan registry.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::event::{DeviceId, FanEvent};
///
/// let id = DeviceId::new();
/// let event = FanEvent::AvailabilityChanged { id, available: false };
/// assert_eq!(event.device_id(), id);
/// assert!(!event.is_lifecycle());
/// ```
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FanEvent {
    /// An entity finished setup and was registered.
    EntityAdded {
        /// The assigned identifier.
        id: DeviceId,
        /// Hardware-derived unique id.
        unique_id: String,
        /// The resolved model.
        model: DeviceModel,
    },

    /// An entity was removed and retired.
    EntityRemoved {
        /// The identifier of the removed entity.
        id: DeviceId,
    },

    /// A command succeeded and its result was applied locally.
    StateChanged {
        /// The entity.
        id: DeviceId,
        /// The optimistic change.
        change: StateChange,
    },

    /// The entity state should be republished after a service call or poll.
    StateRefreshed {
        /// The entity.
        id: DeviceId,
        /// The full current state.
        state: Box<FanState>,
    },

    /// The entity became available or unavailable.
    AvailabilityChanged {
        /// The entity.
        id: DeviceId,
        /// The new availability.
        available: bool,
    },
}

impl FanEvent {
    /// Returns the identifier of the entity the event is about.
    #[must_use]
    pub fn device_id(&self) -> DeviceId {
        match self {
            Self::EntityAdded { id, .. }
            | Self::EntityRemoved { id }
            | Self::StateChanged { id, .. }
            | Self::StateRefreshed { id, .. }
            | Self::AvailabilityChanged { id, .. } => *id,
        }
    }

    /// Returns `true` for setup and removal events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::EntityAdded { .. } | Self::EntityRemoved { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_of_every_variant() {
        let id = DeviceId::new();
        let events = [
            FanEvent::EntityAdded {
                id,
                unique_id: "zhimi.fan.za4-aa:bb".into(),
                model: DeviceModel::ZhimiZa4,
            },
            FanEvent::EntityRemoved { id },
            FanEvent::StateChanged {
                id,
                change: StateChange::power_on(),
            },
            FanEvent::StateRefreshed {
                id,
                state: Box::default(),
            },
            FanEvent::AvailabilityChanged {
                id,
                available: true,
            },
        ];
        for event in events {
            assert_eq!(event.device_id(), id);
        }
    }

    #[test]
    fn serializes_with_event_tag() {
        let id = DeviceId::new();
        let json = serde_json::to_value(FanEvent::AvailabilityChanged {
            id,
            available: false,
        })
        .unwrap();
        assert_eq!(json["event"], "availability_changed");
        assert_eq!(json["available"], false);
    }
}
