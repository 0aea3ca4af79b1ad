// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The fan capability entity.
//!
//! A [`FanEntity`] exposes the uniform operation set for one physical
//! device and drives its poll cycle. It is a single type parameterized by
//! a [`FamilyProfile`]; every per-family difference lives in the profile.
//!
//! # Availability
//!
//! An entity starts unavailable. A successful poll makes it available and
//! resets the retry counter. A failed poll increments the counter and only
//! flips availability once the counter reaches the retry limit. A failed
//! command flips availability immediately.
//!
//! # Optimistic updates
//!
//! Devices report the old state for a moment after a write. A successful
//! command therefore applies its expected result locally and marks the
//! next poll to be skipped. The skip suppresses exactly one cycle.
//!
//! # Serialization
//!
//! Polls and commands on the same entity never overlap; each holds the
//! entity's operation lock for its whole duration, including multi-step
//! commands. Different entities run fully independently.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use miio_fan_lib::entity::FanEntity;
//! use miio_fan_lib::family::FamilyProfile;
//! use miio_fan_lib::transport::DeviceTransport;
//! use miio_fan_lib::types::{DeviceModel, PresetMode};
//!
//! async fn example(transport: Arc<dyn DeviceTransport>) -> miio_fan_lib::Result<()> {
//!     let fan = FanEntity::builder(FamilyProfile::for_model(DeviceModel::ZhimiZa4), transport)
//!         .host("192.168.1.40")
//!         .build()?;
//!
//!     fan.update().await;
//!     if fan.set_preset_mode(PresetMode::Level2).await? {
//!         assert_eq!(fan.state().preset_mode(), Some(PresetMode::Level2));
//!     }
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::command::{AdapterResult, CommandAdapter};
use crate::error::{AdapterError, CommandError, SetupError};
use crate::event::{DeviceId, EventBus, FanEvent};
use crate::family::{FamilyProfile, NaturalControl};
use crate::state::{FanState, StateChange};
use crate::transport::{DeviceTransport, offload};
use crate::types::{
    DeviceModel, Family, FeatureFlags, LedBrightness, OperationMode, OrderedPresets, Percentage,
    PresetMode, PresetStrategy, PresetTable, RotateDirection,
};

/// Default number of consecutive failed polls before a fan is marked
/// unavailable.
pub const DEFAULT_RETRIES: u32 = 20;

/// Result of one poll cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The device was read and the state replaced.
    Updated,
    /// The cycle was suppressed after an optimistic update.
    Skipped,
    /// The read failed; `retry_count` consecutive polls have now failed.
    Failed {
        /// Consecutive failures so far.
        retry_count: u32,
    },
    /// The entity was removed; nothing was read or stored.
    Discarded,
}

/// Runtime object for one configured fan.
pub struct FanEntity {
    id: DeviceId,
    name: String,
    host: String,
    unique_id: String,
    profile: FamilyProfile,
    transport: Arc<dyn DeviceTransport>,
    retry_limit: u32,
    preset_override: Vec<PresetMode>,
    events: EventBus,
    state: RwLock<FanState>,
    op_lock: Mutex<()>,
    retired: AtomicBool,
}

impl FanEntity {
    /// Starts building an entity for a family profile and transport.
    #[must_use]
    pub fn builder(profile: FamilyProfile, transport: Arc<dyn DeviceTransport>) -> FanEntityBuilder {
        FanEntityBuilder::new(profile, transport)
    }

    // ========== Identity ==========

    /// Returns the registry identifier.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the device address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the hardware-derived unique id.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    /// Returns the model.
    #[must_use]
    pub fn model(&self) -> DeviceModel {
        self.profile.model()
    }

    /// Returns the family profile.
    #[must_use]
    pub fn profile(&self) -> &FamilyProfile {
        &self.profile
    }

    /// Returns the poll retry limit.
    #[must_use]
    pub fn retry_limit(&self) -> u32 {
        self.retry_limit
    }

    // ========== Exposed State ==========

    /// Returns a copy of the current state.
    #[must_use]
    pub fn state(&self) -> FanState {
        self.state.read().clone()
    }

    /// Returns `true` if the fan is available.
    #[must_use]
    pub fn available(&self) -> bool {
        self.state.read().available()
    }

    /// Returns the exposed attributes.
    #[must_use]
    pub fn attributes(&self) -> Map<String, Value> {
        self.state.read().attributes(self.model())
    }

    /// Returns the preset modes offered to callers, `off` included.
    ///
    /// A configured override replaces the family list.
    #[must_use]
    pub fn preset_modes(&self) -> Vec<PresetMode> {
        if self.preset_override.is_empty() {
            self.profile.presets().presets()
        } else {
            self.preset_override.clone()
        }
    }

    // ========== Supported Features ==========

    /// Returns the optional capability flags.
    #[must_use]
    pub fn features(&self) -> FeatureFlags {
        self.profile.features()
    }

    /// Returns `true`; every family accepts a speed.
    #[must_use]
    pub fn supports_set_speed(&self) -> bool {
        true
    }

    /// Returns `true` if any preset is offered.
    #[must_use]
    pub fn supports_preset_mode(&self) -> bool {
        !self.preset_modes().is_empty()
    }

    /// Returns `true`; every family can oscillate.
    #[must_use]
    pub fn supports_oscillate(&self) -> bool {
        true
    }

    /// Returns `true` if the head can be rotated one step.
    #[must_use]
    pub fn supports_direction(&self) -> bool {
        self.features().contains(FeatureFlags::ROTATE)
    }

    // ========== Lifecycle ==========

    /// Returns `true` once the entity has been removed.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Marks the entity removed. Calls in flight complete but their
    /// results are no longer stored.
    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }

    // ========== Poll Cycle ==========

    /// Runs one poll cycle.
    pub async fn update(&self) -> PollOutcome {
        let _guard = self.op_lock.lock().await;
        if self.is_retired() {
            return PollOutcome::Discarded;
        }

        if self.state.write().take_skip_next_poll() {
            tracing::debug!(host = %self.host, "Skipping poll after optimistic update");
            return PollOutcome::Skipped;
        }

        let adapter = Arc::clone(self.profile.adapter());
        let transport = Arc::clone(&self.transport);
        let result = offload(move || adapter.status(transport.as_ref())).await;

        if self.is_retired() {
            tracing::debug!(host = %self.host, "Discarding poll result of removed fan");
            return PollOutcome::Discarded;
        }

        match result {
            Ok(properties) => {
                let parsed = self.profile.normalizer().parse(&properties);
                for anomaly in &parsed.anomalies {
                    tracing::warn!(host = %self.host, model = %self.model(), error = %anomaly, "Unrecognized value in status");
                }
                let became_available = {
                    let mut state = self.state.write();
                    let was_available = state.available();
                    state.record_poll(
                        parsed,
                        self.profile.presets(),
                        self.profile.natural_control(),
                        Utc::now(),
                    );
                    tracing::debug!(host = %self.host, snapshot = ?state.snapshot(), "Got new state");
                    !was_available
                };
                if became_available {
                    self.publish_availability(true);
                }
                PollOutcome::Updated
            }
            Err(fault) => {
                let (retry_count, became_unavailable) = {
                    let mut state = self.state.write();
                    let retry_count = state.record_failure();
                    if retry_count < self.retry_limit {
                        tracing::info!(host = %self.host, error = %fault, retry = retry_count, "Got exception while fetching the state");
                        (retry_count, false)
                    } else {
                        let was_available = state.available();
                        state.set_available(false);
                        tracing::error!(host = %self.host, error = %fault, retry = retry_count, "Got exception while fetching the state");
                        (retry_count, was_available)
                    }
                };
                if became_unavailable {
                    self.publish_availability(false);
                }
                PollOutcome::Failed { retry_count }
            }
        }
    }

    // ========== Power and Speed ==========

    /// Switches the fan on, then applies the preset or percentage if
    /// given. The preset wins if both are given.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if the preset or percentage is rejected.
    /// Nothing is written in that case.
    pub async fn turn_on(
        &self,
        percentage: Option<u8>,
        preset: Option<PresetMode>,
    ) -> Result<bool, CommandError> {
        let _guard = self.op_lock.lock().await;
        if let Some(preset) = preset {
            self.check_preset(preset)?;
        }
        let percentage = percentage.map(Percentage::new).transpose()?;
        if let (None, Some(percentage)) = (preset, percentage) {
            self.check_percentage(percentage)?;
        }

        let on = self
            .execute("Turning the miio device on failed.", Some(StateChange::power_on()), |adapter, transport| {
                adapter.power_on(transport)
            })
            .await?;
        if !on {
            return Ok(false);
        }

        match (preset, percentage) {
            (Some(preset), _) => self.apply_preset(preset).await,
            (None, Some(percentage)) => self.apply_percentage(percentage).await,
            (None, None) => Ok(true),
        }
    }

    /// Switches the fan off.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn turn_off(&self) -> Result<bool, CommandError> {
        let _guard = self.op_lock.lock().await;
        self.power_off().await
    }

    /// Sets the speed; `0` is the same as [`turn_off`](Self::turn_off).
    ///
    /// # Errors
    ///
    /// Returns `CommandError::Value` above 100, or
    /// `CommandError::UnknownPresetMode` if a fixed-level family maps the
    /// percentage to a level that is not offered.
    pub async fn set_percentage(&self, percentage: u8) -> Result<bool, CommandError> {
        let percentage = Percentage::new(percentage)?;
        self.check_percentage(percentage)?;
        let _guard = self.op_lock.lock().await;
        self.apply_percentage(percentage).await
    }

    /// Selects a preset; `off` is the same as [`turn_off`](Self::turn_off).
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnknownPresetMode` if the preset is not in
    /// [`preset_modes`](Self::preset_modes).
    pub async fn set_preset_mode(&self, preset: PresetMode) -> Result<bool, CommandError> {
        self.check_preset(preset)?;
        let _guard = self.op_lock.lock().await;
        self.apply_preset(preset).await
    }

    /// Switches oscillation.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn oscillate(&self, on: bool) -> Result<bool, CommandError> {
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Setting oscillate of the miio device failed.",
            Some(StateChange::Oscillating(on)),
            move |adapter, transport| adapter.set_oscillate(transport, on),
        )
        .await
    }

    /// Rotates the head one step, switching oscillation off first if it is
    /// running.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn set_direction(&self, direction: RotateDirection) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::ROTATE) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        if self.state.read().oscillating() == Some(true) {
            let stopped = self
                .execute(
                    "Setting oscillate off of the miio device failed.",
                    Some(StateChange::Oscillating(false)),
                    |adapter, transport| adapter.set_oscillate(transport, false),
                )
                .await?;
            if !stopped {
                return Ok(false);
            }
        }
        self.execute(
            "Setting move direction of the miio device failed.",
            None,
            move |adapter, transport| adapter.set_rotate_direction(transport, direction),
        )
        .await
    }

    // ========== Feature-gated Operations ==========

    /// Sets the oscillation angle in degrees.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedAngle` if the family does not
    /// accept `angle`. Nothing is written in that case.
    pub async fn set_oscillation_angle(&self, angle: u16) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::OSCILLATION_ANGLE) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Setting angle of the miio device failed.",
            Some(StateChange::Angle(angle)),
            move |adapter, transport| adapter.set_oscillation_angle(transport, angle),
        )
        .await
    }

    /// Switches natural wind.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` if the family rejects the mode.
    pub async fn set_natural_mode(&self, on: bool) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::NATURAL_MODE) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.apply_natural_mode(on).await
    }

    /// Sets the operation mode.
    ///
    /// On families where natural wind is a speed channel, `Nature` and
    /// `Normal` select the channel.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::UnsupportedMode` if the family has no such
    /// mode.
    pub async fn set_operation_mode(&self, mode: OperationMode) -> Result<bool, CommandError> {
        let _guard = self.op_lock.lock().await;
        match (self.profile.natural_control(), mode) {
            (NaturalControl::SpeedChannel, OperationMode::Nature) => {
                self.apply_natural_mode(true).await
            }
            (NaturalControl::SpeedChannel, OperationMode::Normal) => {
                self.apply_natural_mode(false).await
            }
            (NaturalControl::SpeedChannel, other) => {
                Err(CommandError::UnsupportedMode(other.to_string()))
            }
            (NaturalControl::OperationMode, mode) => {
                self.execute(
                    "Setting operation mode of the miio device failed.",
                    Some(StateChange::Mode(mode)),
                    move |adapter, transport| adapter.set_mode(transport, mode),
                )
                .await
            }
        }
    }

    /// Switches the buzzer.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn set_buzzer(&self, on: bool) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::BUZZER) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Turning the buzzer of the miio device failed.",
            Some(StateChange::Buzzer(on)),
            move |adapter, transport| adapter.set_buzzer(transport, on),
        )
        .await
    }

    /// Switches the child lock.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn set_child_lock(&self, on: bool) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::CHILD_LOCK) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Turning the child lock of the miio device failed.",
            Some(StateChange::ChildLock(on)),
            move |adapter, transport| adapter.set_child_lock(transport, on),
        )
        .await
    }

    /// Switches the status LED.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn set_led(&self, on: bool) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::LED) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Turning the led of the miio device failed.",
            Some(StateChange::Led(on)),
            move |adapter, transport| adapter.set_led(transport, on),
        )
        .await
    }

    /// Sets the LED brightness: `0` bright, `1` dim, `2` off.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidLedBrightness` for other levels.
    pub async fn set_led_brightness(&self, level: u8) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::LED_BRIGHTNESS) {
            return Ok(true);
        }
        let brightness =
            LedBrightness::from_level(level).map_err(|_| CommandError::InvalidLedBrightness {
                level,
                allowed: LedBrightness::LEVELS.to_vec(),
            })?;
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Setting the led brightness of the miio device failed.",
            Some(StateChange::LedBrightness(brightness)),
            move |adapter, transport| adapter.set_led_brightness(transport, brightness),
        )
        .await
    }

    /// Switches the anion generator.
    ///
    /// # Errors
    ///
    /// Never fails with a command error; a transport fault returns `Ok(false)`.
    pub async fn set_anion(&self, on: bool) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::ANION) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Turning the anion of the miio device failed.",
            Some(StateChange::Anion(on)),
            move |adapter, transport| adapter.set_anion(transport, on),
        )
        .await
    }

    /// Schedules power-off after `minutes`; `0` cancels the timer.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::DelayOffOutOfRange` above the family maximum.
    pub async fn set_delay_off(&self, minutes: u32) -> Result<bool, CommandError> {
        if !self.features().contains(FeatureFlags::DELAY_OFF) {
            return Ok(true);
        }
        let _guard = self.op_lock.lock().await;
        self.execute(
            "Setting delay off of the miio device failed.",
            Some(StateChange::delay_off_minutes(minutes)),
            move |adapter, transport| adapter.set_delay_off(transport, minutes),
        )
        .await
    }

    // ========== Internals (operation lock held) ==========

    fn check_preset(&self, preset: PresetMode) -> Result<(), CommandError> {
        if self.preset_modes().contains(&preset) {
            Ok(())
        } else {
            Err(CommandError::UnknownPresetMode(preset.to_string()))
        }
    }

    /// Whether the family switches itself on when a speed is written.
    fn speed_implies_power(&self) -> bool {
        matches!(self.model().family(), Family::OneC | Family::Leshow)
    }

    fn speed_change(&self, percentage: u8, preset: Option<PresetMode>) -> StateChange {
        let speed = StateChange::speed(percentage, preset);
        if self.speed_implies_power() {
            StateChange::batch(vec![StateChange::power_on(), speed])
        } else {
            speed
        }
    }

    async fn power_off(&self) -> Result<bool, CommandError> {
        self.execute(
            "Turning the miio device off failed.",
            Some(StateChange::power_off()),
            |adapter, transport| adapter.power_off(transport),
        )
        .await
    }

    async fn apply_percentage(&self, percentage: Percentage) -> Result<bool, CommandError> {
        if percentage.is_off() {
            return self.power_off().await;
        }
        match self.profile.presets() {
            PresetStrategy::Ranged(table) => {
                let natural = self.state.read().natural_mode() == Some(true);
                self.write_ranged_speed(table, percentage, natural, None).await
            }
            PresetStrategy::Ordered(levels) => {
                let preset = levels.preset_for(percentage.value());
                self.check_preset(preset)?;
                self.write_level(levels, preset).await
            }
        }
    }

    async fn apply_preset(&self, preset: PresetMode) -> Result<bool, CommandError> {
        if preset == PresetMode::Off {
            return self.power_off().await;
        }
        match self.profile.presets() {
            PresetStrategy::Ranged(table) => {
                let value = table
                    .value_of(preset)
                    .ok_or_else(|| CommandError::UnknownPresetMode(preset.to_string()))?;
                let natural = self.state.read().natural_mode() == Some(true);
                self.write_ranged_speed(table, Percentage::clamped(value), natural, None)
                    .await
            }
            PresetStrategy::Ordered(levels) => self.write_level(levels, preset).await,
        }
    }

    /// Rejects a percentage whose fixed level is hidden by the preset
    /// override.
    fn check_percentage(&self, percentage: Percentage) -> Result<(), CommandError> {
        match self.profile.presets() {
            PresetStrategy::Ordered(levels) if !percentage.is_off() => {
                self.check_preset(levels.preset_for(percentage.value()))
            }
            _ => Ok(()),
        }
    }

    /// Writes a continuous speed on the natural or the direct channel.
    ///
    /// `prefix` is applied before the speed change on success only.
    async fn write_ranged_speed(
        &self,
        table: &PresetTable,
        percentage: Percentage,
        natural: bool,
        prefix: Option<StateChange>,
    ) -> Result<bool, CommandError> {
        let speed = self.speed_change(percentage.value(), table.classify(percentage.value()));
        let change = match prefix {
            Some(prefix) => StateChange::batch(vec![prefix, speed]),
            None => speed,
        };
        if natural && self.profile.natural_control() == NaturalControl::SpeedChannel {
            self.execute(
                "Setting fan speed of the miio device failed.",
                Some(change),
                move |adapter, transport| adapter.set_natural_speed(transport, percentage),
            )
            .await
        } else {
            self.execute(
                "Setting fan speed of the miio device failed.",
                Some(change),
                move |adapter, transport| adapter.set_speed_percentage(transport, percentage),
            )
            .await
        }
    }

    async fn write_level(
        &self,
        levels: &OrderedPresets,
        preset: PresetMode,
    ) -> Result<bool, CommandError> {
        let (Some(level), Some(percentage)) =
            (levels.raw_level(preset), levels.percentage_of(preset))
        else {
            return Err(CommandError::UnknownPresetMode(preset.to_string()));
        };
        self.execute(
            "Setting preset mode of the miio device failed.",
            Some(self.speed_change(percentage, Some(preset))),
            move |adapter, transport| adapter.set_preset_level(transport, level),
        )
        .await
    }

    async fn apply_natural_mode(&self, on: bool) -> Result<bool, CommandError> {
        match self.profile.natural_control() {
            NaturalControl::SpeedChannel => {
                let percentage = self
                    .state
                    .read()
                    .percentage()
                    .and_then(|p| Percentage::new(p).ok())
                    .filter(|p| !p.is_off());
                match (self.profile.presets(), percentage) {
                    (PresetStrategy::Ranged(table), Some(percentage)) => {
                        self.write_ranged_speed(
                            table,
                            percentage,
                            on,
                            Some(StateChange::NaturalMode(on)),
                        )
                        .await
                    }
                    _ => {
                        self.apply_local(Some(StateChange::NaturalMode(on)));
                        Ok(true)
                    }
                }
            }
            NaturalControl::OperationMode => {
                let mode = if on {
                    OperationMode::Nature
                } else {
                    OperationMode::Normal
                };
                self.execute(
                    "Setting natural mode of the miio device failed.",
                    Some(StateChange::Mode(mode)),
                    move |adapter, transport| adapter.set_mode(transport, mode),
                )
                .await
            }
        }
    }

    /// Runs one adapter call on the blocking pool and folds its result
    /// into the entity state.
    ///
    /// Success applies `change` and marks the next poll skipped. A
    /// transport fault marks the entity unavailable and returns
    /// `Ok(false)`. A command error is returned unchanged.
    async fn execute<F>(
        &self,
        failure: &'static str,
        change: Option<StateChange>,
        call: F,
    ) -> Result<bool, CommandError>
    where
        F: FnOnce(&dyn CommandAdapter, &dyn DeviceTransport) -> AdapterResult + Send + 'static,
    {
        if self.is_retired() {
            tracing::debug!(host = %self.host, "Ignoring command for removed fan");
            return Ok(false);
        }

        let adapter = Arc::clone(self.profile.adapter());
        let transport = Arc::clone(&self.transport);
        let result = offload(move || call(adapter.as_ref(), transport.as_ref())).await;

        if self.is_retired() {
            tracing::debug!(host = %self.host, "Discarding command result of removed fan");
            return Ok(result.is_ok());
        }

        match result {
            Ok(()) => {
                tracing::debug!(host = %self.host, ?change, "Command acknowledged");
                self.apply_local(change);
                Ok(true)
            }
            Err(AdapterError::Command(err)) => Err(err),
            Err(AdapterError::Transport(fault)) => {
                tracing::error!(host = %self.host, error = %fault, "{failure}");
                let was_available = {
                    let mut state = self.state.write();
                    let was_available = state.available();
                    state.set_available(false);
                    was_available
                };
                if was_available {
                    self.publish_availability(false);
                }
                Ok(false)
            }
        }
    }

    /// Applies an optimistic change and suppresses the next poll.
    fn apply_local(&self, change: Option<StateChange>) {
        {
            let mut state = self.state.write();
            if let Some(change) = &change {
                state.apply(change);
            }
            state.mark_skip_next_poll();
        }
        if let Some(change) = change {
            self.events.publish(FanEvent::StateChanged { id: self.id, change });
        }
    }

    fn publish_availability(&self, available: bool) {
        self.events.publish(FanEvent::AvailabilityChanged {
            id: self.id,
            available,
        });
    }
}

impl std::fmt::Debug for FanEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanEntity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("host", &self.host)
            .field("model", &self.model())
            .field("available", &self.available())
            .finish_non_exhaustive()
    }
}

/// Builder for [`FanEntity`].
pub struct FanEntityBuilder {
    profile: FamilyProfile,
    transport: Arc<dyn DeviceTransport>,
    name: Option<String>,
    host: String,
    unique_id: Option<String>,
    retry_limit: u32,
    preset_override: Vec<PresetMode>,
    events: Option<EventBus>,
}

impl FanEntityBuilder {
    fn new(profile: FamilyProfile, transport: Arc<dyn DeviceTransport>) -> Self {
        Self {
            profile,
            transport,
            name: None,
            host: String::new(),
            unique_id: None,
            retry_limit: DEFAULT_RETRIES,
            preset_override: Vec::new(),
            events: None,
        }
    }

    /// Sets the display name. Defaults to the model's product name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the device address used in logs and as the registry key.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the unique id. Defaults to the host.
    #[must_use]
    pub fn unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Sets the number of consecutive failed polls tolerated.
    #[must_use]
    pub fn retry_limit(mut self, retry_limit: u32) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    /// Replaces the offered preset list.
    #[must_use]
    pub fn preset_modes_override(mut self, presets: Vec<PresetMode>) -> Self {
        self.preset_override = presets;
        self
    }

    /// Publishes entity events on `events`.
    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Builds the entity.
    ///
    /// # Errors
    ///
    /// Returns `SetupError::InvalidPresetOverride` if the override names a
    /// preset the family does not have.
    pub fn build(self) -> Result<FanEntity, SetupError> {
        let model = self.profile.model();
        let family_presets = self.profile.presets();
        if let Some(preset) = self
            .preset_override
            .iter()
            .find(|preset| !family_presets.contains(**preset))
        {
            return Err(SetupError::InvalidPresetOverride {
                preset: preset.to_string(),
                model: model.to_string(),
            });
        }

        Ok(FanEntity {
            id: DeviceId::new(),
            name: self
                .name
                .unwrap_or_else(|| model.display_name().to_string()),
            unique_id: self.unique_id.unwrap_or_else(|| self.host.clone()),
            host: self.host,
            profile: self.profile,
            transport: self.transport,
            retry_limit: self.retry_limit.max(1),
            preset_override: self.preset_override,
            events: self.events.unwrap_or_default(),
            state: RwLock::new(FanState::new()),
            op_lock: Mutex::new(()),
            retired: AtomicBool::new(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::PropertyId;
    use crate::transport::testing::RecordingTransport;
    use serde_json::json;

    fn entity(model: DeviceModel, transport: Arc<RecordingTransport>) -> FanEntity {
        FanEntity::builder(FamilyProfile::for_model(model), transport)
            .host("10.0.0.2")
            .retry_limit(3)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn starts_unavailable_and_becomes_available_on_poll() {
        let transport = Arc::new(RecordingTransport::with(&[(
            PropertyId::Named("power"),
            json!("on"),
        )]));
        let fan = entity(DeviceModel::ZhimiZa4, transport);
        assert!(!fan.available());
        assert_eq!(fan.update().await, PollOutcome::Updated);
        assert!(fan.available());
        assert_eq!(fan.state().is_on(), Some(true));
    }

    #[tokio::test]
    async fn gated_operation_writes_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let fan = entity(DeviceModel::DmakerP5, Arc::clone(&transport));
        assert_eq!(fan.set_anion(true).await, Ok(true));
        assert_eq!(fan.set_led_brightness(1).await, Ok(true));
        assert!(transport.writes().is_empty());
        assert!(!fan.state().skip_next_poll());
    }

    #[tokio::test]
    async fn invalid_led_level_is_rejected_before_writing() {
        let transport = Arc::new(RecordingTransport::default());
        let fan = entity(DeviceModel::ZhimiZa1, Arc::clone(&transport));
        assert!(matches!(
            fan.set_led_brightness(3).await,
            Err(CommandError::InvalidLedBrightness { level: 3, .. })
        ));
        assert!(transport.writes().is_empty());
    }

    #[tokio::test]
    async fn classic_natural_mode_resends_speed_on_natural_channel() {
        let transport = Arc::new(RecordingTransport::with(&[
            (PropertyId::Named("speed_level"), json!(45)),
            (PropertyId::Named("natural_level"), json!(0)),
        ]));
        let fan = entity(DeviceModel::ZhimiZa4, Arc::clone(&transport));
        fan.update().await;
        assert_eq!(fan.state().percentage(), Some(45));

        assert_eq!(fan.set_natural_mode(true).await, Ok(true));
        let writes = transport.writes();
        assert_eq!(
            writes.last(),
            Some(&(PropertyId::Named("natural_level"), json!(45)))
        );
        assert_eq!(fan.state().natural_mode(), Some(true));
    }

    #[tokio::test]
    async fn mode_family_switches_natural_by_mode() {
        let transport = Arc::new(RecordingTransport::default());
        let fan = entity(DeviceModel::DmakerP5, Arc::clone(&transport));
        assert_eq!(fan.set_natural_mode(true).await, Ok(true));
        assert_eq!(
            transport.writes(),
            vec![(PropertyId::Named("mode"), json!("nature"))]
        );
        assert_eq!(fan.state().natural_mode(), Some(true));
    }

    #[tokio::test]
    async fn direction_stops_oscillation_first() {
        let transport = Arc::new(RecordingTransport::with(&[(
            PropertyId::Named("roll_enable"),
            json!(true),
        )]));
        let fan = entity(DeviceModel::DmakerP5, Arc::clone(&transport));
        fan.update().await;
        assert_eq!(fan.state().oscillating(), Some(true));

        assert_eq!(fan.set_direction(RotateDirection::Right).await, Ok(true));
        assert_eq!(
            transport.writes(),
            vec![
                (PropertyId::Named("roll_enable"), json!(false)),
                (PropertyId::Named("m_roll"), json!("right")),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_preset_is_an_error() {
        let transport = Arc::new(RecordingTransport::default());
        let fan = entity(DeviceModel::Dmaker1C, Arc::clone(&transport));
        assert_eq!(
            fan.set_preset_mode(PresetMode::Level4).await,
            Err(CommandError::UnknownPresetMode("level-4".into()))
        );
        assert!(transport.writes().is_empty());
    }

    #[test]
    fn override_must_be_subset_of_family_presets() {
        let result = FanEntity::builder(
            FamilyProfile::for_model(DeviceModel::Dmaker1C),
            Arc::new(RecordingTransport::default()),
        )
        .preset_modes_override(vec![PresetMode::Level1, PresetMode::Level4])
        .build();
        assert!(matches!(
            result,
            Err(SetupError::InvalidPresetOverride { preset, .. }) if preset == "level-4"
        ));
    }

    #[test]
    fn override_replaces_offered_presets() {
        let fan = FanEntity::builder(
            FamilyProfile::for_model(DeviceModel::ZhimiV3),
            Arc::new(RecordingTransport::default()),
        )
        .preset_modes_override(vec![PresetMode::Off, PresetMode::Level4])
        .build()
        .unwrap();
        assert_eq!(fan.preset_modes(), vec![PresetMode::Off, PresetMode::Level4]);
        assert_eq!(fan.name(), "Pedestal Fan V3");
    }
}
