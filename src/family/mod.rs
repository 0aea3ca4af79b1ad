// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-family command adapters and status normalizers.
//!
//! A [`FamilyProfile`] bundles everything that differs between hardware
//! families: the adapter, the normalizer, the preset strategy, the feature
//! flags and how natural wind is controlled. The entity is a single type
//! parameterized by this bundle.
//!
//! # Families
//!
//! | Family | Models | Notes |
//! |--------|--------|-------|
//! | [`ClassicFan`] | zhimi V2, V3, SA1, ZA1, ZA3, ZA4 | two speed channels, seconds timer |
//! | [`P5Fan`] | dmaker P5 | string mode |
//! | [`OneCFan`] | dmaker 1C, P8 | three fixed levels |
//! | [`LeshowFan`] | leshow SS4 | four modes, 540 minute timer |
//! | [`MiotFan`] | zhimi ZA5, FA1, FB1, dmaker P9-P39 | property mapping |
//!
//! # Examples
//!
//! ```
//! use miio_fan_lib::family::FamilyProfile;
//! use miio_fan_lib::types::{DeviceModel, FeatureFlags, PresetStrategy};
//!
//! let profile = FamilyProfile::for_model(DeviceModel::Dmaker1C);
//! assert!(matches!(profile.presets(), PresetStrategy::Ordered(_)));
//! assert!(!profile.features().contains(FeatureFlags::OSCILLATION_ANGLE));
//! ```

mod classic;
mod leshow;
mod miot;
mod one_c;
mod p5;

pub use classic::ClassicFan;
pub use leshow::LeshowFan;
pub use miot::{DelayUnit, LightEncoding, MiotFan, MiotLayout, MoveEncoding};
pub use one_c::OneCFan;
pub use p5::P5Fan;

use std::fmt;
use std::sync::Arc;

use crate::command::CommandAdapter;
use crate::status::StatusNormalizer;
use crate::types::{
    DeviceModel, Family, FeatureFlags, OrderedPresets, PresetStrategy, PresetTable,
};

/// How natural wind is switched on a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaturalControl {
    /// The current speed is re-sent through the natural or direct channel.
    SpeedChannel,
    /// The device operation mode is switched between normal and nature.
    OperationMode,
}

/// Everything that differs between hardware families.
#[derive(Clone)]
pub struct FamilyProfile {
    model: DeviceModel,
    adapter: Arc<dyn CommandAdapter>,
    normalizer: Arc<dyn StatusNormalizer>,
    presets: PresetStrategy,
    features: FeatureFlags,
    natural: NaturalControl,
}

impl FamilyProfile {
    /// Builds the profile for a model.
    #[must_use]
    pub fn for_model(model: DeviceModel) -> Self {
        let features = model.features();
        match model.family() {
            Family::Classic => {
                let fan = Arc::new(ClassicFan::new(model));
                Self::new(model, fan.clone(), fan, PresetStrategy::Ranged(&PresetTable::CLASSIC))
                    .with_natural_control(NaturalControl::SpeedChannel)
                    .with_features(features)
            }
            Family::P5 => {
                let fan = Arc::new(P5Fan);
                Self::new(model, fan.clone(), fan, PresetStrategy::Ranged(&PresetTable::STANDARD))
                    .with_features(features)
            }
            Family::OneC => {
                let fan = Arc::new(OneCFan);
                Self::new(model, fan.clone(), fan, PresetStrategy::Ordered(&OrderedPresets::ONE_C))
                    .with_features(features)
            }
            Family::Leshow => {
                let fan = Arc::new(LeshowFan);
                Self::new(model, fan.clone(), fan, PresetStrategy::Ranged(&PresetTable::STANDARD))
                    .with_features(features)
            }
            Family::Miot => {
                let layout = MiotLayout::for_model(model).unwrap_or(&miot::P39);
                let fan = Arc::new(MiotFan::new(layout));
                Self::new(model, fan.clone(), fan, PresetStrategy::Ranged(&PresetTable::STANDARD))
                    .with_features(features)
            }
        }
    }

    /// Assembles a profile from parts.
    ///
    /// Features default to the model's flags and natural wind to the
    /// operation mode; use the `with_*` methods to change them.
    #[must_use]
    pub fn new(
        model: DeviceModel,
        adapter: Arc<dyn CommandAdapter>,
        normalizer: Arc<dyn StatusNormalizer>,
        presets: PresetStrategy,
    ) -> Self {
        Self {
            model,
            adapter,
            normalizer,
            presets,
            features: model.features(),
            natural: NaturalControl::OperationMode,
        }
    }

    /// Replaces the feature flags.
    #[must_use]
    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Replaces the natural wind control.
    #[must_use]
    pub fn with_natural_control(mut self, natural: NaturalControl) -> Self {
        self.natural = natural;
        self
    }

    /// Returns the model.
    #[must_use]
    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// Returns the command adapter.
    #[must_use]
    pub fn adapter(&self) -> &Arc<dyn CommandAdapter> {
        &self.adapter
    }

    /// Returns the status normalizer.
    #[must_use]
    pub fn normalizer(&self) -> &Arc<dyn StatusNormalizer> {
        &self.normalizer
    }

    /// Returns the preset strategy.
    #[must_use]
    pub fn presets(&self) -> PresetStrategy {
        self.presets
    }

    /// Returns the feature flags.
    #[must_use]
    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    /// Returns how natural wind is switched.
    #[must_use]
    pub fn natural_control(&self) -> NaturalControl {
        self.natural
    }
}

impl fmt::Debug for FamilyProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyProfile")
            .field("model", &self.model)
            .field("presets", &self.presets)
            .field("features", &self.features)
            .field("natural", &self.natural)
            .finish_non_exhaustive()
    }
}

/// Legacy string encoding of a switch.
pub(crate) const fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_uses_speed_channels_and_classic_table() {
        let profile = FamilyProfile::for_model(DeviceModel::ZhimiZa4);
        assert_eq!(profile.natural_control(), NaturalControl::SpeedChannel);
        assert_eq!(
            profile.presets(),
            PresetStrategy::Ranged(&PresetTable::CLASSIC)
        );
    }

    #[test]
    fn every_model_has_a_profile() {
        for model in DeviceModel::ALL {
            let profile = FamilyProfile::for_model(model);
            assert_eq!(profile.model(), model);
            assert_eq!(profile.features(), model.features());
            assert!(profile.presets().contains(crate::types::PresetMode::Off));
        }
    }

    #[test]
    fn leshow_switches_natural_by_mode() {
        let profile = FamilyProfile::for_model(DeviceModel::LeshowSs4);
        assert_eq!(profile.natural_control(), NaturalControl::OperationMode);
    }
}
