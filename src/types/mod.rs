// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for fan control.
//!
//! This module provides type-safe representations of the values that cross
//! the boundary between the uniform capability surface and the per-family
//! device firmware. Vendor codes never leave a family module; everything
//! here is the semantic form.
//!
//! # Types
//!
//! - [`DeviceModel`] - Supported hardware models and their family
//! - [`FeatureFlags`] - Optional capabilities of a model
//! - [`PresetMode`], [`PresetTable`], [`OrderedPresets`] - Preset/percentage mapping
//! - [`OperationMode`], [`RotateDirection`], [`LedBrightness`] - Semantic enums
//! - [`Percentage`] - Fan speed percentage (0-100)
//! - [`RawCode`], [`EnumCodec`] - Per-family encode/decode tables

mod codec;
mod features;
mod mode;
mod model;
mod percentage;
mod preset;

pub use codec::{EnumCodec, RawCode};
pub use features::FeatureFlags;
pub use mode::{LedBrightness, OperationMode, RotateDirection};
pub use model::{DeviceModel, Family, ModelSelection};
pub use percentage::Percentage;
pub use preset::{OrderedPresets, PresetMode, PresetRange, PresetStrategy, PresetTable};
