// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan registry, configuration and service routing.
//!
//! # Overview
//!
//! The [`FanRegistry`] is the runtime context for applications managing
//! several fans. It provides:
//!
//! - **Setup and teardown**: [`FanRegistry::setup`] turns a stored
//!   [`DeviceConfig`] into a registered entity; [`FanRegistry::remove`]
//!   retires it
//! - **Polling**: [`FanRegistry::poll_all`] polls every fan concurrently and
//!   [`FanRegistry::spawn_poller`] does so on an interval
//! - **Events**: subscribe with [`FanRegistry::subscribe`]
//!
//! The [`ServiceRouter`] fans named services such as `set_buzzer_on` out
//! to the registered fans.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use miio_fan_lib::event::FanEvent;
//! use miio_fan_lib::manager::{DeviceConfig, FanRegistry, ServiceRouter};
//! use miio_fan_lib::transport::DeviceTransport;
//!
//! async fn example(transport: Arc<dyn DeviceTransport>) -> miio_fan_lib::Result<()> {
//!     let registry = Arc::new(FanRegistry::new());
//!     let mut events = registry.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             if let FanEvent::AvailabilityChanged { id, available } = event {
//!                 println!("{id} available: {available}");
//!             }
//!         }
//!     });
//!
//!     let config = DeviceConfig::new("192.168.1.40", "0123456789abcdef0123456789abcdef");
//!     registry.setup(config, transport).await?;
//!
//!     let router = ServiceRouter::new(Arc::clone(&registry));
//!     router.dispatch("set_buzzer_off", None, &serde_json::Map::new()).await?;
//!     Ok(())
//! }
//! ```

mod device_config;
mod dispatch;
mod registry;

pub use device_config::{DEFAULT_NAME, DeviceConfig, TOKEN_LENGTH};
pub use dispatch::{DispatchReport, Service, ServiceRouter};
pub use registry::FanRegistry;
