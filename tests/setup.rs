// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for configuration, setup and teardown.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakeTransport, MAC, TOKEN};
use miio_fan_lib::manager::{DeviceConfig, FanRegistry};
use miio_fan_lib::transport::PropertyId;
use miio_fan_lib::types::{DeviceModel, PresetMode};
use miio_fan_lib::{ConfigError, Error, FanEvent, PollOutcome, SetupError};
use serde_json::json;

// ============================================================================
// Model Resolution
// ============================================================================

mod resolution {
    use super::*;

    #[tokio::test]
    async fn auto_detect_resolves_model_and_unique_id() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::new(DeviceModel::DmakerP11).shared();

        let fan = registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), transport)
            .await
            .unwrap();

        assert_eq!(fan.model(), DeviceModel::DmakerP11);
        assert_eq!(fan.unique_id(), format!("dmaker.fan.p11-{MAC}"));
        assert_eq!(fan.name(), "Pedestal Fan P11");
    }

    #[tokio::test]
    async fn unreachable_device_is_not_ready() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::new(DeviceModel::ZhimiZa4).unreachable().shared();

        let err = registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), transport)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Setup(SetupError::DeviceNotReady(_))));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn detected_unsupported_model_is_distinct_from_unreachable() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::reporting("zhimi.heater.za1").shared();

        let err = registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), transport)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Setup(SetupError::UnsupportedModel(model)) if model == "zhimi.heater.za1"
        ));
    }

    #[tokio::test]
    async fn configured_model_skips_detection() {
        let registry = FanRegistry::new();
        // info() would fail; a configured model never calls it.
        let transport = FakeTransport::new(DeviceModel::LeshowSs4)
            .unreachable()
            .shared();
        let config = DeviceConfig::new("192.168.1.40", TOKEN).with_model(DeviceModel::LeshowSs4);

        let fan = registry.setup(config, transport).await.unwrap();
        assert_eq!(fan.unique_id(), "192.168.1.40");
        // The initial poll failed but stays below the retry limit.
        assert!(!fan.available());
        assert_eq!(fan.state().retry_count(), 1);
    }
}

// ============================================================================
// Configuration
// ============================================================================

mod configuration {
    use super::*;

    #[tokio::test]
    async fn invalid_token_fails_before_contacting_device() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::new(DeviceModel::ZhimiZa4).shared();

        let err = registry
            .setup(DeviceConfig::new("192.168.1.40", "not-a-token"), transport.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(ConfigError::InvalidToken(_))));
        assert_eq!(transport.reads(), 0);
    }

    #[tokio::test]
    async fn preset_override_must_exist_in_family() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::new(DeviceModel::Dmaker1C).shared();
        let config = DeviceConfig::new("192.168.1.40", TOKEN)
            .with_preset_modes_override(vec![PresetMode::Level4]);

        let err = registry.setup(config, transport).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Setup(SetupError::InvalidPresetOverride { .. })
        ));
    }

    #[tokio::test]
    async fn preset_override_limits_offered_presets() {
        let registry = FanRegistry::new();
        let transport = FakeTransport::new(DeviceModel::ZhimiZa4)
            .with(PropertyId::Named("speed_level"), json!(90))
            .with(PropertyId::Named("natural_level"), json!(0))
            .shared();
        let config = DeviceConfig::from_json(&format!(
            r#"{{"host": "192.168.1.40", "token": "{TOKEN}", "preset_modes_override": ["off", "level_1"]}}"#
        ))
        .unwrap();

        let fan = registry.setup(config, transport).await.unwrap();
        assert_eq!(fan.preset_modes(), vec![PresetMode::Off, PresetMode::Level1]);
        // Classification still uses the full table.
        assert_eq!(fan.state().preset_mode(), Some(PresetMode::Level4));
        assert!(fan.set_preset_mode(PresetMode::Level2).await.is_err());
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn setup_and_remove_publish_events() {
        let registry = FanRegistry::new();
        let mut events = registry.subscribe();
        let transport = FakeTransport::new(DeviceModel::ZhimiZa4)
            .with(PropertyId::Named("power"), json!("on"))
            .shared();

        let fan = registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), transport)
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            FanEvent::EntityAdded { id, unique_id, model } => {
                assert_eq!(id, fan.id());
                assert_eq!(unique_id, fan.unique_id());
                assert_eq!(model, DeviceModel::ZhimiZa4);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            events.recv().await.unwrap(),
            FanEvent::AvailabilityChanged { available: true, .. }
        ));

        registry.remove(fan.id()).await.unwrap();
        assert!(matches!(
            events.recv().await.unwrap(),
            FanEvent::EntityRemoved { id } if id == fan.id()
        ));
        assert_eq!(fan.update().await, PollOutcome::Discarded);
        assert_eq!(fan.turn_on(None, None).await, Ok(false));
    }

    #[tokio::test]
    async fn poll_all_polls_every_fan() {
        let registry = FanRegistry::new();
        let first = FakeTransport::new(DeviceModel::ZhimiZa4).shared();
        let second = FakeTransport::new(DeviceModel::DmakerP5).shared();
        registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), first.clone())
            .await
            .unwrap();
        registry
            .setup(DeviceConfig::new("192.168.1.41", TOKEN), second.clone())
            .await
            .unwrap();

        second.fail_reads(true);
        let outcomes = registry.poll_all().await;

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().any(|(_, o)| *o == PollOutcome::Updated));
        assert!(
            outcomes
                .iter()
                .any(|(_, o)| *o == PollOutcome::Failed { retry_count: 1 })
        );
        assert_eq!(first.reads(), 2);
        assert_eq!(second.reads(), 2);
    }

    #[tokio::test]
    async fn poller_runs_every_period() {
        let registry = Arc::new(FanRegistry::new());
        let transport = FakeTransport::new(DeviceModel::ZhimiZa4).shared();
        registry
            .setup(DeviceConfig::new("192.168.1.40", TOKEN), transport.clone())
            .await
            .unwrap();
        assert_eq!(transport.reads(), 1);

        let poller = registry.spawn_poller(Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(150)).await;
        poller.abort();

        assert!(transport.reads() >= 3);
    }
}
