// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the fan library.
//!
//! The hierarchy follows the lifetime of a fan entity: configuration and
//! setup errors abort integration of a device, command errors reject
//! caller-supplied values before anything reaches the network, transport
//! faults are recovered by the availability state machine, and decode
//! errors flag anomalies inside otherwise valid status payloads.

use std::fmt;

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value was rejected for the device family.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// The device transport failed.
    #[error("transport fault: {0}")]
    Transport(#[from] TransportFault),

    /// A status payload contained an unrecognized value.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// The device configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Setting up the device failed.
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    /// A value did not satisfy its type constraints.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The entity was not found in the registry.
    #[error("entity not found")]
    EntityNotFound,

    /// The requested service name is not known to the router.
    #[error("unknown service: {0}")]
    UnknownService(String),

    /// The service parameters could not be parsed.
    #[error("invalid parameters for {service}: {message}")]
    InvalidParameters {
        /// The service that was called.
        service: String,
        /// Description of the parameter problem.
        message: String,
    },
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u32,
        /// Maximum allowed value.
        max: u32,
        /// The actual value that was provided.
        actual: u32,
    },

    /// An unknown preset mode name was provided.
    #[error("invalid preset mode: {0}")]
    InvalidPresetMode(String),

    /// An unknown operation mode name was provided.
    #[error("invalid operation mode: {0}")]
    InvalidOperationMode(String),

    /// An unknown direction name was provided.
    #[error("invalid direction: {0}")]
    InvalidDirection(String),
}

/// A caller supplied an out-of-range or unsupported value for a family.
///
/// Always raised before any network call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The oscillation angle is not in the family's discrete set.
    #[error("unsupported angle {angle}, supported values: {}", join(.allowed))]
    UnsupportedAngle {
        /// The rejected angle.
        angle: u16,
        /// The angles this family accepts.
        allowed: Vec<u16>,
    },

    /// The LED brightness level is not accepted by the family.
    #[error("unsupported LED brightness {level}, supported values: {}", join(.allowed))]
    InvalidLedBrightness {
        /// The rejected level.
        level: u8,
        /// The levels this family accepts.
        allowed: Vec<u8>,
    },

    /// The delay-off duration exceeds what the firmware accepts.
    #[error("delay-off of {minutes} minutes exceeds the maximum of {max_minutes}")]
    DelayOffOutOfRange {
        /// The requested duration in minutes.
        minutes: u32,
        /// The longest duration this family accepts.
        max_minutes: u32,
    },

    /// A raw fan level is outside the family's range.
    #[error("fan level {level} is out of range [{min}, {max}]")]
    LevelOutOfRange {
        /// The rejected level.
        level: u8,
        /// Lowest accepted level.
        min: u8,
        /// Highest accepted level.
        max: u8,
    },

    /// The family has no encoding for the requested operation mode.
    #[error("operation mode {0} is not supported by this device")]
    UnsupportedMode(String),

    /// The preset mode is not offered by this entity.
    #[error("preset mode {0} is not offered by this device")]
    UnknownPresetMode(String),

    /// A value failed its type constraints.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The family has no command for the requested operation.
    #[error("{operation} is not supported by this device family")]
    Unsupported {
        /// The operation that was requested.
        operation: &'static str,
    },
}

/// Failure of a single adapter operation.
///
/// The entity treats the two cases differently: a command error is
/// returned to the caller, a transport fault marks the device unavailable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// The value was rejected before any write was issued.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// The transport failed while issuing the write.
    #[error(transparent)]
    Transport(#[from] TransportFault),
}

impl From<ValueError> for AdapterError {
    fn from(err: ValueError) -> Self {
        Self::Command(err.into())
    }
}

/// Network or protocol failure reported by the device transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportFault {
    /// The device did not answer.
    #[error("device unavailable: {0}")]
    Unavailable(String),

    /// The device answered with something the transport could not handle.
    #[error("device protocol error: {0}")]
    Protocol(String),

    /// The blocking worker running the call was lost.
    #[error("transport worker lost: {0}")]
    WorkerLost(String),
}

/// An unrecognized value inside a status payload.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    /// An enum-valued property carried a code with no known meaning.
    #[error("unknown {field} code {code}")]
    UnknownCode {
        /// The snapshot field being decoded.
        field: &'static str,
        /// The raw value as reported.
        code: serde_json::Value,
    },

    /// A property carried a value of an unexpected type or range.
    #[error("invalid {field} value {value}")]
    InvalidValue {
        /// The snapshot field being decoded.
        field: &'static str,
        /// The raw value as reported.
        value: serde_json::Value,
    },
}

/// Errors related to device configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The host is not an IP address.
    #[error("invalid host address: {0}")]
    InvalidHost(String),

    /// The token is not a 32 character hex string.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The poll retry limit must be at least one.
    #[error("retry limit must be greater than zero")]
    ZeroRetries,

    /// The stored configuration could not be parsed.
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Errors that abort setting up a device.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// The device reports, or was configured with, a model this library
    /// does not support.
    #[error("unsupported device model: {0}")]
    UnsupportedModel(String),

    /// The device could not be reached while resolving its model.
    #[error("device not ready: {0}")]
    DeviceNotReady(TransportFault),

    /// A device with this host is already registered.
    #[error("a device at {0} is already configured")]
    AlreadyConfigured(String),

    /// The preset override names a preset the device family lacks.
    #[error("preset override {preset} is not available for {model}")]
    InvalidPresetOverride {
        /// The offending preset name.
        preset: String,
        /// The resolved model.
        model: String,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

fn join<T: fmt::Display>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
