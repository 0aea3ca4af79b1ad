// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of configured fans.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::entity::{FanEntity, PollOutcome};
use crate::error::{Error, SetupError};
use crate::event::{DeviceId, EventBus, FanEvent};
use crate::family::FamilyProfile;
use crate::transport::{DeviceTransport, offload};
use crate::types::{DeviceModel, ModelSelection};

use super::DeviceConfig;

/// Routing table of fan entities keyed by host address.
///
/// Owns the lifecycle of every entity: [`setup`](Self::setup) creates and
/// registers one, [`remove`](Self::remove) retires it. All entity events
/// are published on the registry's event bus.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use miio_fan_lib::manager::{DeviceConfig, FanRegistry};
/// use miio_fan_lib::transport::DeviceTransport;
///
/// async fn example(transport: Arc<dyn DeviceTransport>) -> miio_fan_lib::Result<()> {
///     let registry = Arc::new(FanRegistry::new());
///     let mut events = registry.subscribe();
///
///     let config = DeviceConfig::new("192.168.1.40", "0123456789abcdef0123456789abcdef");
///     let fan = registry.setup(config, transport).await?;
///     println!("{} is {:?}", fan.name(), fan.state().is_on());
///
///     let poller = registry.spawn_poller(Duration::from_secs(30));
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
///     poller.abort();
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FanRegistry {
    entities: RwLock<HashMap<String, Arc<FanEntity>>>,
    events: EventBus,
}

impl FanRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_event_capacity(crate::event::DEFAULT_EVENT_CAPACITY)
    }

    /// Creates an empty registry with a custom event buffer size.
    #[must_use]
    pub fn with_event_capacity(capacity: usize) -> Self {
        Self {
            entities: RwLock::new(HashMap::new()),
            events: EventBus::with_capacity(capacity),
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Subscribes to events from every registered fan.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FanEvent> {
        self.events.subscribe()
    }

    /// Returns the event bus shared with the entities.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Sets up a fan from its configuration.
    ///
    /// Validates the configuration, resolves the model (querying the
    /// device when auto-detecting), registers the entity and runs the
    /// first poll.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the configuration is invalid.
    /// - `SetupError::DeviceNotReady` if auto-detection cannot reach the device.
    /// - `SetupError::UnsupportedModel` if the model is not supported.
    /// - `SetupError::InvalidPresetOverride` if the override names an
    ///   unknown preset.
    /// - `SetupError::AlreadyConfigured` if the host is already registered.
    pub async fn setup(
        &self,
        config: DeviceConfig,
        transport: Arc<dyn DeviceTransport>,
    ) -> Result<Arc<FanEntity>, Error> {
        config.validate()?;
        let host = config.ip_addr()?.to_string();
        if self.entities.read().await.contains_key(&host) {
            return Err(SetupError::AlreadyConfigured(host).into());
        }

        let (model, unique_id) = match &config.model {
            ModelSelection::AutoDetect => {
                let probe = Arc::clone(&transport);
                let info = offload(move || probe.info())
                    .await
                    .map_err(SetupError::DeviceNotReady)?;
                let model: DeviceModel = info.model.parse()?;
                tracing::info!(
                    host = %host,
                    model = %model,
                    firmware = %info.firmware_version,
                    hardware = %info.hardware_version,
                    "Detected device"
                );
                (model, format!("{}-{}", info.model, info.mac_address))
            }
            ModelSelection::Named(name) => (name.parse::<DeviceModel>()?, host.clone()),
        };

        tracing::info!(host = %host, model = %model, "Initializing with host");

        let entity = FanEntity::builder(FamilyProfile::for_model(model), transport)
            .name(config.display_name(Some(model)))
            .host(host.clone())
            .unique_id(unique_id.clone())
            .retry_limit(config.retries)
            .preset_modes_override(config.preset_modes_override)
            .events(self.events.clone())
            .build()?;
        let entity = Arc::new(entity);

        {
            let mut entities = self.entities.write().await;
            if entities.contains_key(&host) {
                return Err(SetupError::AlreadyConfigured(host).into());
            }
            entities.insert(host, Arc::clone(&entity));
        }

        self.events.publish(FanEvent::EntityAdded {
            id: entity.id(),
            unique_id,
            model,
        });

        entity.update().await;
        Ok(entity)
    }

    /// Removes a fan and retires its entity.
    ///
    /// A poll or command already running completes, but its result is no
    /// longer stored.
    ///
    /// # Errors
    ///
    /// Returns `Error::EntityNotFound` if no fan has this id.
    pub async fn remove(&self, id: DeviceId) -> Result<(), Error> {
        let entity = {
            let mut entities = self.entities.write().await;
            let host = entities
                .iter()
                .find(|(_, entity)| entity.id() == id)
                .map(|(host, _)| host.clone())
                .ok_or(Error::EntityNotFound)?;
            entities.remove(&host).ok_or(Error::EntityNotFound)?
        };

        entity.retire();
        tracing::info!(host = %entity.host(), "Removed fan");
        self.events.publish(FanEvent::EntityRemoved { id });
        Ok(())
    }

    /// Removes every fan.
    pub async fn clear(&self) {
        let drained: Vec<_> = self.entities.write().await.drain().collect();
        for (_, entity) in drained {
            entity.retire();
            self.events.publish(FanEvent::EntityRemoved { id: entity.id() });
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the fan with this id.
    pub async fn get(&self, id: DeviceId) -> Option<Arc<FanEntity>> {
        self.entities
            .read()
            .await
            .values()
            .find(|entity| entity.id() == id)
            .cloned()
    }

    /// Returns the fan registered for this host.
    pub async fn get_by_host(&self, host: &str) -> Option<Arc<FanEntity>> {
        self.entities.read().await.get(host).cloned()
    }

    /// Returns every registered fan.
    pub async fn entities(&self) -> Vec<Arc<FanEntity>> {
        self.entities.read().await.values().cloned().collect()
    }

    /// Returns the number of registered fans.
    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    /// Returns `true` if no fan is registered.
    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Polls every fan concurrently and returns each outcome.
    pub async fn poll_all(&self) -> Vec<(DeviceId, PollOutcome)> {
        let mut polls = JoinSet::new();
        for entity in self.entities().await {
            polls.spawn(async move { (entity.id(), entity.update().await) });
        }

        let mut outcomes = Vec::with_capacity(polls.len());
        while let Some(joined) = polls.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::warn!(error = %e, "Poll task failed"),
            }
        }
        outcomes
    }

    /// Spawns a task polling every fan once per `period`.
    ///
    /// The first cycle runs after one period; setup already polled once.
    /// Abort the returned handle to stop polling.
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let outcomes = registry.poll_all().await;
                tracing::trace!(fans = outcomes.len(), "Poll cycle finished");
            }
        })
    }
}

impl Default for FanRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PropertyId;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn transport() -> Arc<RecordingTransport> {
        Arc::new(RecordingTransport::with(&[(
            PropertyId::Named("power"),
            json!("on"),
        )]))
    }

    #[tokio::test]
    async fn auto_detect_uses_model_and_mac() {
        let registry = FanRegistry::new();
        let fan = registry
            .setup(DeviceConfig::new("10.0.0.2", TOKEN), transport())
            .await
            .unwrap();
        assert_eq!(fan.model(), DeviceModel::ZhimiZa4);
        assert_eq!(fan.unique_id(), "zhimi.fan.za4-00:11:22:33:44:55");
        assert_eq!(fan.name(), "Pedestal Fan ZA4");
        assert!(fan.available());
    }

    #[tokio::test]
    async fn configured_model_uses_host_as_unique_id() {
        let registry = FanRegistry::new();
        let config = DeviceConfig::new("10.0.0.2", TOKEN)
            .with_model(DeviceModel::DmakerP5)
            .with_name("Office");
        let fan = registry.setup(config, transport()).await.unwrap();
        assert_eq!(fan.unique_id(), "10.0.0.2");
        assert_eq!(fan.name(), "Office");
    }

    #[tokio::test]
    async fn unsupported_configured_model_aborts_setup() {
        let registry = FanRegistry::new();
        let config = DeviceConfig::new("10.0.0.2", TOKEN).with_model(ModelSelection::Named(
            "zhimi.airpurifier.v7".into(),
        ));
        let err = registry.setup(config, transport()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Setup(SetupError::UnsupportedModel(model)) if model == "zhimi.airpurifier.v7"
        ));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn duplicate_host_is_rejected() {
        let registry = FanRegistry::new();
        registry
            .setup(DeviceConfig::new("10.0.0.2", TOKEN), transport())
            .await
            .unwrap();
        let err = registry
            .setup(DeviceConfig::new("10.0.0.2", TOKEN), transport())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Setup(SetupError::AlreadyConfigured(_))));
    }

    #[tokio::test]
    async fn remove_retires_and_forgets() {
        let registry = FanRegistry::new();
        let fan = registry
            .setup(DeviceConfig::new("10.0.0.2", TOKEN), transport())
            .await
            .unwrap();
        registry.remove(fan.id()).await.unwrap();
        assert!(fan.is_retired());
        assert_eq!(fan.update().await, PollOutcome::Discarded);
        assert!(registry.get(fan.id()).await.is_none());
        assert!(matches!(
            registry.remove(fan.id()).await,
            Err(Error::EntityNotFound)
        ));
    }
}
