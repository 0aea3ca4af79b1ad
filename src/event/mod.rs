// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event system for fan lifecycle and state updates.
//!
//! The registry publishes a [`FanEvent`] when an entity is added or
//! removed, when its availability flips, when a command is applied
//! optimistically and when a service call asks for its state to be
//! republished. The [`EventBus`] fans these out over a tokio broadcast
//! channel.
//!
//! # Examples
//!
//! ```
//! use miio_fan_lib::event::{DeviceId, EventBus, FanEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(FanEvent::AvailabilityChanged {
//!     id: DeviceId::new(),
//!     available: true,
//! });
//! ```

mod device_id;
mod event_bus;
mod fan_event;

pub use device_id::DeviceId;
pub use event_bus::{DEFAULT_EVENT_CAPACITY, EventBus};
pub use fan_event::FanEvent;
