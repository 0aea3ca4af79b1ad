// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting fan events.

use tokio::sync::broadcast;

use super::FanEvent;

/// Default number of events buffered per subscriber.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Broadcasts [`FanEvent`]s to every subscriber.
///
/// Backed by a tokio broadcast channel of fixed capacity. A subscriber
/// that falls behind loses the oldest events and sees
/// `RecvError::Lagged`. Publishing never blocks and never fails; with no
/// subscribers the event is dropped.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::event::{DeviceId, EventBus, FanEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(FanEvent::EntityRemoved { id: DeviceId::new() });
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FanEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// Creates a bus buffering at most `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FanEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    pub fn publish(&self, event: FanEvent) {
        let id = event.device_id();
        if self.sender.send(event).is_err() {
            tracing::trace!(%id, "No subscribers for fan event");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
