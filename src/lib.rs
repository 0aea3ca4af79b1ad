// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `miio_fan_lib` - A Rust library exposing Xiaomi Wi-Fi fans as uniform
//! capability entities.
//!
//! Pedestal and circulating fans from the zhimi, dmaker and leshow product
//! lines speak very different dialects: property names, value encodings,
//! speed scales and units differ from one model to the next. This library
//! hides those differences behind one entity type with one operation set,
//! and normalizes every status read into one snapshot shape.
//!
//! # Supported Features
//!
//! - **Power and speed**: on/off, percentage speed, named presets
//! - **Motion**: oscillation, oscillation angle, one-step head rotation
//! - **Modes**: natural wind and vendor operation modes
//! - **Accessories**: buzzer, child lock, LED and LED brightness, anion,
//!   power-off timer
//! - **Polling**: availability tracking with a retry limit and optimistic
//!   updates after commands
//!
//! # Supported Families
//!
//! - Classic zhimi pedestal fans (`zhimi.fan.v2`, `v3`, `sa1`, `za1`, `za3`, `za4`)
//! - Dmaker P5 (`dmaker.fan.p5`)
//! - Dmaker 1C line (`dmaker.fan.1c`, `dmaker.fan.p8`)
//! - Leshow SS4 (`leshow.fan.ss4`)
//! - Property-mapped fans (`zhimi.fan.za5`, `fa1`, `fb1`, `dmaker.fan.p9` to `p39`)
//!
//! # Transport
//!
//! The library does not implement the encrypted LAN protocol. Callers
//! provide a [`DeviceTransport`](transport::DeviceTransport) that reads and
//! writes device properties; calls on it are blocking and run on the tokio
//! blocking pool.
//!
//! # Quick Start
//!
//! ## Single Fan
//!
//! ```no_run
//! use std::sync::Arc;
//! use miio_fan_lib::entity::FanEntity;
//! use miio_fan_lib::family::FamilyProfile;
//! use miio_fan_lib::transport::DeviceTransport;
//! use miio_fan_lib::types::{DeviceModel, PresetMode};
//!
//! async fn example(transport: Arc<dyn DeviceTransport>) -> miio_fan_lib::Result<()> {
//!     let fan = FanEntity::builder(FamilyProfile::for_model(DeviceModel::DmakerP9), transport)
//!         .host("192.168.1.40")
//!         .build()?;
//!
//!     fan.update().await;
//!     fan.turn_on(None, Some(PresetMode::Level2)).await?;
//!     fan.oscillate(true).await?;
//!
//!     // Optional features are no-ops on hardware without them
//!     fan.set_anion(true).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Registry with Polling
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use miio_fan_lib::manager::{DeviceConfig, FanRegistry};
//! use miio_fan_lib::transport::DeviceTransport;
//!
//! async fn example(transport: Arc<dyn DeviceTransport>) -> miio_fan_lib::Result<()> {
//!     let registry = Arc::new(FanRegistry::new());
//!     let config = DeviceConfig::from_json(
//!         r#"{"host": "192.168.1.40", "token": "0123456789abcdef0123456789abcdef"}"#,
//!     )?;
//!     let fan = registry.setup(config, transport).await?;
//!     println!("{}: {:?}", fan.unique_id(), fan.attributes());
//!
//!     let _poller = registry.spawn_poller(Duration::from_secs(30));
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod entity;
pub mod error;
pub mod event;
pub mod family;
pub mod manager;
pub mod state;
pub mod status;
pub mod transport;
pub mod types;

pub use entity::{FanEntity, PollOutcome};
pub use error::{
    AdapterError, CommandError, ConfigError, DecodeError, Error, Result, SetupError,
    TransportFault, ValueError,
};
pub use event::{DeviceId, EventBus, FanEvent};
pub use family::FamilyProfile;
pub use manager::{DeviceConfig, DispatchReport, FanRegistry, ServiceRouter};
pub use state::{FanState, StateChange};
pub use status::StatusSnapshot;
pub use transport::{DeviceInfo, DeviceTransport, PropertyId, RawProperty};
pub use types::{
    DeviceModel, FeatureFlags, LedBrightness, OperationMode, Percentage, PresetMode,
    RotateDirection,
};
