// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named service fan-out.
//!
//! Automations address fans through named services with JSON parameters.
//! The router resolves the service, parses its parameters once, then calls
//! the matching entity operation on every targeted fan that supports it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::entity::FanEntity;
use crate::error::{CommandError, Error};
use crate::event::{DeviceId, FanEvent};
use crate::types::{FeatureFlags, OperationMode};

use super::FanRegistry;

/// A named service accepted by [`ServiceRouter::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// `set_buzzer_on`
    BuzzerOn,
    /// `set_buzzer_off`
    BuzzerOff,
    /// `set_child_lock_on`
    ChildLockOn,
    /// `set_child_lock_off`
    ChildLockOff,
    /// `set_led_on`
    LedOn,
    /// `set_led_off`
    LedOff,
    /// `set_led_brightness` with `brightness`
    LedBrightness,
    /// `set_oscillation_angle` with `angle`
    OscillationAngle,
    /// `set_natural_mode_on`
    NaturalModeOn,
    /// `set_natural_mode_off`
    NaturalModeOff,
    /// `set_anion_on`
    AnionOn,
    /// `set_anion_off`
    AnionOff,
    /// `set_delay_off` with `minutes`
    DelayOff,
    /// `set_mode` with `mode`
    Mode,
}

impl Service {
    /// Every service.
    pub const ALL: [Self; 14] = [
        Self::BuzzerOn,
        Self::BuzzerOff,
        Self::ChildLockOn,
        Self::ChildLockOff,
        Self::LedOn,
        Self::LedOff,
        Self::LedBrightness,
        Self::OscillationAngle,
        Self::NaturalModeOn,
        Self::NaturalModeOff,
        Self::AnionOn,
        Self::AnionOff,
        Self::DelayOff,
        Self::Mode,
    ];

    /// Returns the service name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BuzzerOn => "set_buzzer_on",
            Self::BuzzerOff => "set_buzzer_off",
            Self::ChildLockOn => "set_child_lock_on",
            Self::ChildLockOff => "set_child_lock_off",
            Self::LedOn => "set_led_on",
            Self::LedOff => "set_led_off",
            Self::LedBrightness => "set_led_brightness",
            Self::OscillationAngle => "set_oscillation_angle",
            Self::NaturalModeOn => "set_natural_mode_on",
            Self::NaturalModeOff => "set_natural_mode_off",
            Self::AnionOn => "set_anion_on",
            Self::AnionOff => "set_anion_off",
            Self::DelayOff => "set_delay_off",
            Self::Mode => "set_mode",
        }
    }

    /// Returns the feature a fan needs for this service, if any.
    #[must_use]
    pub const fn required_feature(&self) -> Option<FeatureFlags> {
        match self {
            Self::BuzzerOn | Self::BuzzerOff => Some(FeatureFlags::BUZZER),
            Self::ChildLockOn | Self::ChildLockOff => Some(FeatureFlags::CHILD_LOCK),
            Self::LedOn | Self::LedOff => Some(FeatureFlags::LED),
            Self::LedBrightness => Some(FeatureFlags::LED_BRIGHTNESS),
            Self::OscillationAngle => Some(FeatureFlags::OSCILLATION_ANGLE),
            Self::NaturalModeOn | Self::NaturalModeOff => Some(FeatureFlags::NATURAL_MODE),
            Self::AnionOn | Self::AnionOff => Some(FeatureFlags::ANION),
            Self::DelayOff => Some(FeatureFlags::DELAY_OFF),
            Self::Mode => None,
        }
    }

    fn parse_call(self, params: &Map<String, Value>) -> Result<Call, Error> {
        Ok(match self {
            Self::BuzzerOn => Call::Buzzer(true),
            Self::BuzzerOff => Call::Buzzer(false),
            Self::ChildLockOn => Call::ChildLock(true),
            Self::ChildLockOff => Call::ChildLock(false),
            Self::LedOn => Call::Led(true),
            Self::LedOff => Call::Led(false),
            Self::LedBrightness => {
                let BrightnessParams { brightness } = self.params(params)?;
                Call::LedBrightness(brightness)
            }
            Self::OscillationAngle => {
                let AngleParams { angle } = self.params(params)?;
                Call::OscillationAngle(angle)
            }
            Self::NaturalModeOn => Call::NaturalMode(true),
            Self::NaturalModeOff => Call::NaturalMode(false),
            Self::AnionOn => Call::Anion(true),
            Self::AnionOff => Call::Anion(false),
            Self::DelayOff => {
                let DelayOffParams { minutes } = self.params(params)?;
                Call::DelayOff(minutes)
            }
            Self::Mode => {
                let ModeParams { mode } = self.params(params)?;
                let mode = mode
                    .parse::<OperationMode>()
                    .map_err(|e| self.invalid(e.to_string()))?;
                Call::Mode(mode)
            }
        })
    }

    fn params<T: DeserializeOwned>(self, params: &Map<String, Value>) -> Result<T, Error> {
        serde_json::from_value(Value::Object(params.clone())).map_err(|e| self.invalid(e.to_string()))
    }

    fn invalid(self, message: String) -> Error {
        Error::InvalidParameters {
            service: self.as_str().to_string(),
            message,
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == s)
            .ok_or_else(|| Error::UnknownService(s.to_string()))
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct BrightnessParams {
    brightness: u8,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AngleParams {
    angle: u16,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DelayOffParams {
    minutes: u32,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct ModeParams {
    mode: String,
}

/// A service with its parameters parsed.
#[derive(Debug, Clone, Copy)]
enum Call {
    Buzzer(bool),
    ChildLock(bool),
    Led(bool),
    LedBrightness(u8),
    OscillationAngle(u16),
    NaturalMode(bool),
    Anion(bool),
    DelayOff(u32),
    Mode(OperationMode),
}

impl Call {
    async fn invoke(self, entity: &FanEntity) -> Result<bool, CommandError> {
        match self {
            Self::Buzzer(on) => entity.set_buzzer(on).await,
            Self::ChildLock(on) => entity.set_child_lock(on).await,
            Self::Led(on) => entity.set_led(on).await,
            Self::LedBrightness(level) => entity.set_led_brightness(level).await,
            Self::OscillationAngle(angle) => entity.set_oscillation_angle(angle).await,
            Self::NaturalMode(on) => entity.set_natural_mode(on).await,
            Self::Anion(on) => entity.set_anion(on).await,
            Self::DelayOff(minutes) => entity.set_delay_off(minutes).await,
            Self::Mode(mode) => entity.set_operation_mode(mode).await,
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Fans the operation was called on.
    pub invoked: Vec<DeviceId>,
    /// Fans skipped because they lack the feature.
    pub skipped: Vec<DeviceId>,
    /// Rejected values, per fan.
    pub errors: Vec<(DeviceId, CommandError)>,
}

impl DispatchReport {
    /// Returns `true` if no fan rejected the call.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fans named services out to registered fans.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use miio_fan_lib::manager::{FanRegistry, ServiceRouter};
///
/// async fn example(registry: Arc<FanRegistry>) -> miio_fan_lib::Result<()> {
///     let router = ServiceRouter::new(registry);
///     let params = serde_json::json!({ "angle": 90 });
///     let report = router
///         .dispatch("set_oscillation_angle", None, params.as_object().unwrap())
///         .await?;
///     assert!(report.is_success());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ServiceRouter {
    registry: Arc<FanRegistry>,
}

impl ServiceRouter {
    /// Creates a router over a registry.
    #[must_use]
    pub fn new(registry: Arc<FanRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<FanRegistry> {
        &self.registry
    }

    /// Calls `service` on the targeted fans, or on every fan if `targets`
    /// is `None`.
    ///
    /// Each fan the operation was called on is refreshed and its state
    /// republished as [`FanEvent::StateRefreshed`]. Unknown target ids are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownService` or `Error::InvalidParameters` before
    /// any fan is touched. Per-fan value errors are collected in the
    /// report instead.
    pub async fn dispatch(
        &self,
        service: &str,
        targets: Option<&[DeviceId]>,
        params: &Map<String, Value>,
    ) -> Result<DispatchReport, Error> {
        let service: Service = service.parse()?;
        let call = service.parse_call(params)?;

        let mut entities = self.registry.entities().await;
        if let Some(targets) = targets {
            entities.retain(|entity| targets.contains(&entity.id()));
        }

        tracing::debug!(service = %service, fans = entities.len(), "Dispatching service");

        let mut report = DispatchReport::default();
        for entity in entities {
            let id = entity.id();
            if let Some(feature) = service.required_feature()
                && !entity.features().contains(feature)
            {
                report.skipped.push(id);
                continue;
            }

            if let Err(e) = call.invoke(&entity).await {
                tracing::warn!(host = %entity.host(), service = %service, error = %e, "Service call rejected");
                report.errors.push((id, e));
            }
            report.invoked.push(id);

            entity.update().await;
            self.registry.events().publish(FanEvent::StateRefreshed {
                id,
                state: Box::new(entity.state()),
            });
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn service_names_round_trip() {
        for service in Service::ALL {
            assert_eq!(service.as_str().parse::<Service>().unwrap(), service);
        }
    }

    #[test]
    fn unknown_service_name() {
        assert!(matches!(
            "set_turbo_on".parse::<Service>(),
            Err(Error::UnknownService(name)) if name == "set_turbo_on"
        ));
    }

    #[test]
    fn parses_parameters() {
        assert!(matches!(
            Service::LedBrightness.parse_call(&params(json!({"brightness": 1}))),
            Ok(Call::LedBrightness(1))
        ));
        assert!(matches!(
            Service::Mode.parse_call(&params(json!({"mode": "Nature"}))),
            Ok(Call::Mode(OperationMode::Nature))
        ));
        assert!(matches!(
            Service::BuzzerOn.parse_call(&Map::new()),
            Ok(Call::Buzzer(true))
        ));
    }

    #[test]
    fn rejects_missing_or_mistyped_parameters() {
        assert!(matches!(
            Service::OscillationAngle.parse_call(&Map::new()),
            Err(Error::InvalidParameters { service, .. }) if service == "set_oscillation_angle"
        ));
        assert!(matches!(
            Service::DelayOff.parse_call(&params(json!({"minutes": "soon"}))),
            Err(Error::InvalidParameters { .. })
        ));
        assert!(matches!(
            Service::Mode.parse_call(&params(json!({"mode": "turbo"}))),
            Err(Error::InvalidParameters { .. })
        ));
    }

    #[test]
    fn feature_requirements() {
        assert_eq!(
            Service::AnionOn.required_feature(),
            Some(FeatureFlags::ANION)
        );
        assert_eq!(Service::Mode.required_feature(), None);
    }
}
