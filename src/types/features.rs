// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional capability flags.

bitflags::bitflags! {
    /// Optional capabilities of a fan model.
    ///
    /// An operation guarded by a flag that is not set is a silent no-op on
    /// the entity: automations calling it on hardware without the feature
    /// succeed without touching the device.
    ///
    /// # Examples
    ///
    /// ```
    /// use miio_fan_lib::types::FeatureFlags;
    ///
    /// let flags = FeatureFlags::GENERIC | FeatureFlags::ANION;
    /// assert!(flags.contains(FeatureFlags::BUZZER));
    /// assert!(!flags.contains(FeatureFlags::LED_BRIGHTNESS));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
    pub struct FeatureFlags: u16 {
        /// Buzzer can be switched.
        const BUZZER = 1;
        /// Status LED can be switched.
        const LED = 1 << 1;
        /// Child lock can be switched.
        const CHILD_LOCK = 1 << 2;
        /// LED brightness has discrete levels.
        const LED_BRIGHTNESS = 1 << 3;
        /// Oscillation angle can be set.
        const OSCILLATION_ANGLE = 1 << 4;
        /// Natural wind mode is available.
        const NATURAL_MODE = 1 << 5;
        /// Anion generator can be switched.
        const ANION = 1 << 6;
        /// Head can be rotated one step left or right.
        const ROTATE = 1 << 7;
        /// Scheduled power-off timer is available.
        const DELAY_OFF = 1 << 8;

        /// Flags shared by every family with a buzzer and child lock.
        const GENERIC = Self::BUZZER.bits() | Self::CHILD_LOCK.bits();
    }
}

impl FeatureFlags {
    /// Classic zhimi pedestal fans.
    pub const CLASSIC: Self = Self::GENERIC
        .union(Self::LED_BRIGHTNESS)
        .union(Self::OSCILLATION_ANGLE)
        .union(Self::NATURAL_MODE)
        .union(Self::ROTATE)
        .union(Self::DELAY_OFF);

    /// Dmaker P5 and the property-mapped dmaker fans.
    pub const DMAKER: Self = Self::GENERIC
        .union(Self::NATURAL_MODE)
        .union(Self::OSCILLATION_ANGLE)
        .union(Self::LED)
        .union(Self::ROTATE)
        .union(Self::DELAY_OFF);

    /// Dmaker 1C line (fixed levels, no angle or rotation).
    pub const ONE_C: Self = Self::GENERIC
        .union(Self::NATURAL_MODE)
        .union(Self::LED)
        .union(Self::DELAY_OFF);

    /// Zhimi ZA5 with anion generator and dimmable LED.
    pub const ZA5: Self = Self::GENERIC
        .union(Self::NATURAL_MODE)
        .union(Self::OSCILLATION_ANGLE)
        .union(Self::LED)
        .union(Self::LED_BRIGHTNESS)
        .union(Self::ANION)
        .union(Self::ROTATE)
        .union(Self::DELAY_OFF);

    /// Zhimi circulating fans FA1/FB1.
    pub const CIRCULATOR: Self = Self::GENERIC
        .union(Self::NATURAL_MODE)
        .union(Self::OSCILLATION_ANGLE)
        .union(Self::LED)
        .union(Self::DELAY_OFF);

    /// Leshow SS4 (buzzer only, modes via operation mode).
    pub const LESHOW: Self = Self::BUZZER
        .union(Self::NATURAL_MODE)
        .union(Self::DELAY_OFF);
}
