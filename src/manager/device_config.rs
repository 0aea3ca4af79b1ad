// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stored configuration for one fan.

use std::net::IpAddr;

use crate::entity::DEFAULT_RETRIES;
use crate::error::ConfigError;
use crate::types::{DeviceModel, ModelSelection, PresetMode};

/// Name used when neither a name nor a model is known.
pub const DEFAULT_NAME: &str = "Xiaomi Miio Fan";

/// Length of the device token in hex characters.
pub const TOKEN_LENGTH: usize = 32;

/// Configuration for a fan.
///
/// This is the opaque record the host platform stores. It is checked with
/// [`validate`](Self::validate) before setup.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::manager::DeviceConfig;
/// use miio_fan_lib::types::{DeviceModel, PresetMode};
///
/// let config = DeviceConfig::new("192.168.1.40", "0123456789abcdef0123456789abcdef")
///     .with_model(DeviceModel::DmakerP5)
///     .with_name("Bedroom Fan")
///     .with_retries(5)
///     .with_preset_modes_override(vec![PresetMode::Level1, PresetMode::Level2]);
///
/// assert!(config.validate().is_ok());
///
/// let stored = r#"{"host": "192.168.1.41", "token": "0123456789abcdef0123456789abcdef"}"#;
/// let config = DeviceConfig::from_json(stored).unwrap();
/// assert_eq!(config.retries, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DeviceConfig {
    /// The device IP address.
    pub host: String,
    /// The 32 character hex token.
    pub token: String,
    /// The configured model, or auto-detection.
    #[serde(default)]
    pub model: ModelSelection,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Consecutive failed polls tolerated before the fan is unavailable.
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Replacement for the family preset list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preset_modes_override: Vec<PresetMode>,
}

fn default_retries() -> u32 {
    DEFAULT_RETRIES
}

impl DeviceConfig {
    /// Creates a configuration that auto-detects the model.
    #[must_use]
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            model: ModelSelection::AutoDetect,
            name: None,
            retries: DEFAULT_RETRIES,
            preset_modes_override: Vec::new(),
        }
    }

    /// Parses the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Malformed` if the JSON does not describe a
    /// configuration. The values themselves are not checked; call
    /// [`validate`](Self::validate) for that.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Serializes to the stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Malformed` if serialization fails.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string(self).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<ModelSelection>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the retry limit.
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the preset override list.
    #[must_use]
    pub fn with_preset_modes_override(mut self, presets: Vec<PresetMode>) -> Self {
        self.preset_modes_override = presets;
        self
    }

    /// Checks the host, token and retry limit.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ip_addr()?;
        if self.token.len() != TOKEN_LENGTH || hex::decode(&self.token).is_err() {
            return Err(ConfigError::InvalidToken(format!(
                "expected {TOKEN_LENGTH} hex characters"
            )));
        }
        if self.retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        Ok(())
    }

    /// Parses the host as an IP address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidHost` if it is not one.
    pub fn ip_addr(&self) -> Result<IpAddr, ConfigError> {
        self.host
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.host.clone()))
    }

    /// Returns the configured name, else the display name of the detected
    /// or configured model, else [`DEFAULT_NAME`].
    #[must_use]
    pub fn display_name(&self, detected: Option<DeviceModel>) -> &str {
        if let Some(name) = self.name.as_deref() {
            return name;
        }
        let model = detected.or_else(|| match &self.model {
            ModelSelection::Named(name) => name.parse().ok(),
            ModelSelection::AutoDetect => None,
        });
        model.map_or(DEFAULT_NAME, |model| model.display_name())
    }

    /// Returns `true` if the model is resolved by asking the device.
    #[must_use]
    pub fn is_auto_detect(&self) -> bool {
        self.model == ModelSelection::AutoDetect
    }
}
