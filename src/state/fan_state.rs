// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan state tracking.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::DecodeError;
use crate::family::NaturalControl;
use crate::status::{ParsedStatus, StatusSnapshot};
use crate::types::{DeviceModel, OperationMode, PresetMode, PresetStrategy};

use super::StateChange;

/// Exposed state of a fan entity.
///
/// All derived fields are optional because they are unknown until the
/// first successful poll. An entity starts unavailable.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::state::FanState;
///
/// let state = FanState::new();
/// assert!(!state.available());
/// assert_eq!(state.retry_count(), 0);
/// assert_eq!(state.preset_mode(), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FanState {
    available: bool,
    is_on: Option<bool>,
    percentage: Option<u8>,
    preset_mode: Option<PresetMode>,
    oscillating: Option<bool>,
    natural_mode: Option<bool>,
    snapshot: StatusSnapshot,
    retry_count: u32,
    skip_next_poll: bool,
    last_updated: Option<DateTime<Utc>>,
    #[serde(skip)]
    decode_errors: Vec<DecodeError>,
}

impl FanState {
    /// Creates the initial, unavailable state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Availability ==========

    /// Returns `true` if the device answered recently enough.
    #[must_use]
    pub fn available(&self) -> bool {
        self.available
    }

    /// Returns the number of consecutive failed polls.
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Returns `true` if the next poll will be skipped.
    #[must_use]
    pub fn skip_next_poll(&self) -> bool {
        self.skip_next_poll
    }

    /// Returns the time of the last successful poll.
    #[must_use]
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub(crate) fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub(crate) fn mark_skip_next_poll(&mut self) {
        self.skip_next_poll = true;
    }

    /// Clears the skip flag, returning whether it was set.
    pub(crate) fn take_skip_next_poll(&mut self) -> bool {
        std::mem::take(&mut self.skip_next_poll)
    }

    /// Counts a failed poll and returns the new count.
    pub(crate) fn record_failure(&mut self) -> u32 {
        self.retry_count = self.retry_count.saturating_add(1);
        self.retry_count
    }

    // ========== Derived Fields ==========

    /// Returns `true` if the fan is running.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    /// Returns the speed as a percentage.
    #[must_use]
    pub fn percentage(&self) -> Option<u8> {
        self.percentage
    }

    /// Returns the preset matching the current speed.
    #[must_use]
    pub fn preset_mode(&self) -> Option<PresetMode> {
        self.preset_mode
    }

    /// Returns `true` if the head oscillates.
    #[must_use]
    pub fn oscillating(&self) -> Option<bool> {
        self.oscillating
    }

    /// Returns `true` if natural wind is active.
    #[must_use]
    pub fn natural_mode(&self) -> Option<bool> {
        self.natural_mode
    }

    // ========== Snapshot ==========

    /// Returns the last normalized snapshot, including optimistic updates.
    #[must_use]
    pub fn snapshot(&self) -> &StatusSnapshot {
        &self.snapshot
    }

    /// Returns the decode anomalies of the last successful poll.
    #[must_use]
    pub fn decode_errors(&self) -> &[DecodeError] {
        &self.decode_errors
    }

    /// Replaces the snapshot with a successful poll and recomputes the
    /// derived fields.
    pub(crate) fn record_poll(
        &mut self,
        parsed: ParsedStatus,
        presets: PresetStrategy,
        natural: NaturalControl,
        now: DateTime<Utc>,
    ) {
        self.available = true;
        self.retry_count = 0;
        self.snapshot = parsed.snapshot;
        self.decode_errors = parsed.anomalies;
        self.last_updated = Some(now);
        self.derive(presets, natural);
    }

    fn derive(&mut self, presets: PresetStrategy, natural: NaturalControl) {
        let snapshot = &self.snapshot;
        self.is_on = snapshot.power;
        self.oscillating = snapshot.oscillate;
        self.natural_mode = match natural {
            NaturalControl::SpeedChannel => snapshot.natural_speed.map(|speed| speed != 0),
            NaturalControl::OperationMode => {
                snapshot.mode.map(|mode| mode == OperationMode::Nature)
            }
        };

        match presets {
            PresetStrategy::Ranged(table) => {
                let active = match natural {
                    NaturalControl::SpeedChannel => {
                        if self.natural_mode == Some(true) {
                            snapshot.natural_speed
                        } else {
                            snapshot.direct_speed
                        }
                    }
                    NaturalControl::OperationMode => snapshot.speed,
                };
                self.percentage = active;
                self.preset_mode = active.and_then(|speed| table.classify(speed));
            }
            PresetStrategy::Ordered(levels) => {
                self.preset_mode = snapshot.fan_level.and_then(|level| levels.preset_at(level));
                self.percentage = self.preset_mode.and_then(|preset| levels.percentage_of(preset));
            }
        }
    }

    // ========== Changes ==========

    /// Applies a change, returning `true` if anything differed.
    pub fn apply(&mut self, change: &StateChange) -> bool {
        match change {
            StateChange::Power(on) => {
                let changed = replace(&mut self.is_on, *on);
                replace(&mut self.snapshot.power, *on) || changed
            }
            StateChange::Speed { percentage, preset } => {
                let changed = replace(&mut self.percentage, *percentage);
                let preset_changed = self.preset_mode != *preset;
                self.preset_mode = *preset;
                changed || preset_changed
            }
            StateChange::Oscillating(on) => {
                let changed = replace(&mut self.oscillating, *on);
                replace(&mut self.snapshot.oscillate, *on) || changed
            }
            StateChange::NaturalMode(on) => replace(&mut self.natural_mode, *on),
            StateChange::Mode(mode) => {
                let changed = replace(&mut self.snapshot.mode, *mode);
                replace(&mut self.natural_mode, *mode == OperationMode::Nature) || changed
            }
            StateChange::Angle(angle) => replace(&mut self.snapshot.angle, *angle),
            StateChange::Buzzer(on) => replace(&mut self.snapshot.buzzer, *on),
            StateChange::ChildLock(on) => replace(&mut self.snapshot.child_lock, *on),
            StateChange::Led(on) => replace(&mut self.snapshot.led, *on),
            StateChange::LedBrightness(level) => {
                replace(&mut self.snapshot.led_brightness, *level)
            }
            StateChange::Anion(on) => replace(&mut self.snapshot.anion, *on),
            StateChange::DelayOff { seconds } => {
                replace(&mut self.snapshot.delay_off_countdown, *seconds)
            }
            StateChange::Batch(changes) => changes
                .iter()
                .fold(false, |changed, change| self.apply(change) || changed),
        }
    }

    // ========== Attributes ==========

    /// Returns the exposed attributes: the model plus every present
    /// snapshot field.
    #[must_use]
    pub fn attributes(&self, model: DeviceModel) -> Map<String, Value> {
        let mut attributes = Map::new();
        attributes.insert("model".to_string(), Value::from(model.as_str()));
        attributes.extend(self.snapshot.to_attributes());
        attributes
    }
}

fn replace<T: PartialEq>(slot: &mut Option<T>, value: T) -> bool {
    let changed = slot.as_ref() != Some(&value);
    *slot = Some(value);
    changed
}
