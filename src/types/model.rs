// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Supported hardware models.

use std::fmt;
use std::str::FromStr;

use crate::error::SetupError;

use super::FeatureFlags;

/// A group of models sharing one command and status protocol shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Zhimi pedestal fans with separate direct and natural speed channels.
    Classic,
    /// Dmaker P5 with a string operation mode.
    P5,
    /// Dmaker 1C line with three fixed speed levels.
    OneC,
    /// Leshow SS4 ventilator.
    Leshow,
    /// Fans addressed through a property mapping table.
    Miot,
}

/// A supported fan model, identified by its vendor model string.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::{DeviceModel, Family};
///
/// let model: DeviceModel = "dmaker.fan.1c".parse().unwrap();
/// assert_eq!(model, DeviceModel::Dmaker1C);
/// assert_eq!(model.family(), Family::OneC);
/// assert_eq!(model.as_str(), "dmaker.fan.1c");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceModel {
    /// `zhimi.fan.v2`
    ZhimiV2,
    /// `zhimi.fan.v3`
    ZhimiV3,
    /// `zhimi.fan.sa1`
    ZhimiSa1,
    /// `zhimi.fan.za1`
    ZhimiZa1,
    /// `zhimi.fan.za3`
    ZhimiZa3,
    /// `zhimi.fan.za4`
    ZhimiZa4,
    /// `zhimi.fan.za5`
    ZhimiZa5,
    /// `zhimi.fan.fa1`
    ZhimiFa1,
    /// `zhimi.fan.fb1`
    ZhimiFb1,
    /// `dmaker.fan.p5`
    DmakerP5,
    /// `dmaker.fan.p8`
    DmakerP8,
    /// `dmaker.fan.p9`
    DmakerP9,
    /// `dmaker.fan.p10`
    DmakerP10,
    /// `dmaker.fan.p11`
    DmakerP11,
    /// `dmaker.fan.p15`
    DmakerP15,
    /// `dmaker.fan.p18`
    DmakerP18,
    /// `dmaker.fan.p33`
    DmakerP33,
    /// `dmaker.fan.p39`
    DmakerP39,
    /// `dmaker.fan.1c`
    Dmaker1C,
    /// `leshow.fan.ss4`
    LeshowSs4,
}

impl DeviceModel {
    /// Every supported model.
    pub const ALL: [Self; 20] = [
        Self::ZhimiV2,
        Self::ZhimiV3,
        Self::ZhimiSa1,
        Self::ZhimiZa1,
        Self::ZhimiZa3,
        Self::ZhimiZa4,
        Self::ZhimiZa5,
        Self::ZhimiFa1,
        Self::ZhimiFb1,
        Self::DmakerP5,
        Self::DmakerP8,
        Self::DmakerP9,
        Self::DmakerP10,
        Self::DmakerP11,
        Self::DmakerP15,
        Self::DmakerP18,
        Self::DmakerP33,
        Self::DmakerP39,
        Self::Dmaker1C,
        Self::LeshowSs4,
    ];

    /// Returns the vendor model string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ZhimiV2 => "zhimi.fan.v2",
            Self::ZhimiV3 => "zhimi.fan.v3",
            Self::ZhimiSa1 => "zhimi.fan.sa1",
            Self::ZhimiZa1 => "zhimi.fan.za1",
            Self::ZhimiZa3 => "zhimi.fan.za3",
            Self::ZhimiZa4 => "zhimi.fan.za4",
            Self::ZhimiZa5 => "zhimi.fan.za5",
            Self::ZhimiFa1 => "zhimi.fan.fa1",
            Self::ZhimiFb1 => "zhimi.fan.fb1",
            Self::DmakerP5 => "dmaker.fan.p5",
            Self::DmakerP8 => "dmaker.fan.p8",
            Self::DmakerP9 => "dmaker.fan.p9",
            Self::DmakerP10 => "dmaker.fan.p10",
            Self::DmakerP11 => "dmaker.fan.p11",
            Self::DmakerP15 => "dmaker.fan.p15",
            Self::DmakerP18 => "dmaker.fan.p18",
            Self::DmakerP33 => "dmaker.fan.p33",
            Self::DmakerP39 => "dmaker.fan.p39",
            Self::Dmaker1C => "dmaker.fan.1c",
            Self::LeshowSs4 => "leshow.fan.ss4",
        }
    }

    /// Returns the human-readable product name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::ZhimiV2 => "Pedestal Fan V2",
            Self::ZhimiV3 => "Pedestal Fan V3",
            Self::ZhimiSa1 => "Pedestal Fan SA1",
            Self::ZhimiZa1 => "Pedestal Fan A1",
            Self::ZhimiZa3 => "Pedestal Fan ZA3",
            Self::ZhimiZa4 => "Pedestal Fan ZA4",
            Self::ZhimiZa5 => "Pedestal Fan ZA5",
            Self::ZhimiFa1 => "Xiaomi Circulating Fan",
            Self::ZhimiFb1 => "Xiaomi Circulating Fan (Global)",
            Self::DmakerP5 => "Pedestal Fan P5",
            Self::DmakerP8 => "Pedestal Fan P8",
            Self::DmakerP9 => "Pedestal Fan P9",
            Self::DmakerP10 => "Pedestal Fan P10",
            Self::DmakerP11 => "Pedestal Fan P11",
            Self::DmakerP15 => "Pedestal Fan P15",
            Self::DmakerP18 => "Pedestal Fan P18",
            Self::DmakerP33 => "Pedestal Fan P33",
            Self::DmakerP39 => "Pedestal Fan P39",
            Self::Dmaker1C => "Pedestal Fan Fan 1C",
            Self::LeshowSs4 => "Rosou SS4 Ventilator",
        }
    }

    /// Returns the protocol family of this model.
    #[must_use]
    pub const fn family(&self) -> Family {
        match self {
            Self::ZhimiV2
            | Self::ZhimiV3
            | Self::ZhimiSa1
            | Self::ZhimiZa1
            | Self::ZhimiZa3
            | Self::ZhimiZa4 => Family::Classic,
            Self::DmakerP5 => Family::P5,
            Self::Dmaker1C | Self::DmakerP8 => Family::OneC,
            Self::LeshowSs4 => Family::Leshow,
            Self::ZhimiZa5
            | Self::ZhimiFa1
            | Self::ZhimiFb1
            | Self::DmakerP9
            | Self::DmakerP10
            | Self::DmakerP11
            | Self::DmakerP15
            | Self::DmakerP18
            | Self::DmakerP33
            | Self::DmakerP39 => Family::Miot,
        }
    }

    /// Returns the optional capabilities of this model.
    #[must_use]
    pub const fn features(&self) -> FeatureFlags {
        match self {
            // Only the V2 has a switchable LED next to the brightness levels.
            Self::ZhimiV2 => FeatureFlags::CLASSIC.union(FeatureFlags::LED),
            Self::ZhimiV3
            | Self::ZhimiSa1
            | Self::ZhimiZa1
            | Self::ZhimiZa3
            | Self::ZhimiZa4 => FeatureFlags::CLASSIC,
            Self::DmakerP5
            | Self::DmakerP9
            | Self::DmakerP10
            | Self::DmakerP11
            | Self::DmakerP15
            | Self::DmakerP18
            | Self::DmakerP33
            | Self::DmakerP39 => FeatureFlags::DMAKER,
            Self::Dmaker1C | Self::DmakerP8 => FeatureFlags::ONE_C,
            Self::ZhimiZa5 => FeatureFlags::ZA5,
            Self::ZhimiFa1 | Self::ZhimiFb1 => FeatureFlags::CIRCULATOR,
            Self::LeshowSs4 => FeatureFlags::LESHOW,
        }
    }
}

impl fmt::Display for DeviceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceModel {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| SetupError::UnsupportedModel(s.to_string()))
    }
}

impl serde::Serialize for DeviceModel {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How the model of a configured device is determined.
///
/// Stored as a plain string: `"auto.detect"` or a vendor model string.
/// Model strings are resolved at setup so that an unsupported model is
/// reported as a setup failure rather than a malformed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelSelection {
    /// Query the device for its model during setup.
    #[default]
    AutoDetect,
    /// Use the given model string without querying the device.
    Named(String),
}

impl ModelSelection {
    /// The stored value selecting auto-detection.
    pub const AUTO_DETECT: &'static str = "auto.detect";
}

impl From<String> for ModelSelection {
    fn from(value: String) -> Self {
        if value.is_empty() || value == Self::AUTO_DETECT {
            Self::AutoDetect
        } else {
            Self::Named(value)
        }
    }
}

impl From<ModelSelection> for String {
    fn from(value: ModelSelection) -> Self {
        match value {
            ModelSelection::AutoDetect => ModelSelection::AUTO_DETECT.to_string(),
            ModelSelection::Named(model) => model,
        }
    }
}

impl From<DeviceModel> for ModelSelection {
    fn from(model: DeviceModel) -> Self {
        Self::Named(model.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_strings_round_trip() {
        for model in DeviceModel::ALL {
            assert_eq!(model.as_str().parse::<DeviceModel>(), Ok(model));
        }
    }

    #[test]
    fn unknown_model_is_unsupported() {
        assert_eq!(
            "zhimi.airpurifier.v7".parse::<DeviceModel>(),
            Err(SetupError::UnsupportedModel("zhimi.airpurifier.v7".into()))
        );
    }

    #[test]
    fn families() {
        assert_eq!(DeviceModel::ZhimiZa4.family(), Family::Classic);
        assert_eq!(DeviceModel::DmakerP8.family(), Family::OneC);
        assert_eq!(DeviceModel::DmakerP39.family(), Family::Miot);
        assert_eq!(DeviceModel::LeshowSs4.family(), Family::Leshow);
    }

    #[test]
    fn only_v2_has_led_switch_among_classics() {
        assert!(DeviceModel::ZhimiV2.features().contains(FeatureFlags::LED));
        assert!(!DeviceModel::ZhimiV3.features().contains(FeatureFlags::LED));
    }

    #[test]
    fn model_selection_from_stored_string() {
        assert_eq!(
            ModelSelection::from("auto.detect".to_string()),
            ModelSelection::AutoDetect
        );
        assert_eq!(
            ModelSelection::from("dmaker.fan.p5".to_string()),
            ModelSelection::Named("dmaker.fan.p5".into())
        );
        assert_eq!(String::from(ModelSelection::AutoDetect), "auto.detect");
    }
}
