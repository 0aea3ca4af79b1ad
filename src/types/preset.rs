// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Preset mode and percentage mapping.
//!
//! Two strategies exist. Families with a continuous 1-100 speed use a
//! [`PresetTable`]: each preset owns a half-open range used to classify an
//! observed speed, plus the control value written when the preset is
//! selected. Families with a few fixed levels use [`OrderedPresets`], where
//! the preset is an index into an ordered list and the percentage is
//! derived from that index.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::ValueError;

/// A named discrete fan speed level.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::PresetMode;
///
/// let preset: PresetMode = "Level 2".parse().unwrap();
/// assert_eq!(preset, PresetMode::Level2);
/// assert_eq!(preset.to_string(), "level-2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PresetMode {
    /// Fan off.
    Off,
    /// Lowest level.
    Level1,
    /// Second level.
    Level2,
    /// Third level.
    Level3,
    /// Highest level.
    Level4,
}

impl PresetMode {
    /// Every preset in declared order.
    pub const ALL: [Self; 5] = [
        Self::Off,
        Self::Level1,
        Self::Level2,
        Self::Level3,
        Self::Level4,
    ];

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Level1 => "level-1",
            Self::Level2 => "level-2",
            Self::Level3 => "level-3",
            Self::Level4 => "level-4",
        }
    }
}

impl fmt::Display for PresetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresetMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '_' { '-' } else { c })
            .collect::<String>()
            .to_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == normalized)
            .ok_or_else(|| ValueError::InvalidPresetMode(s.to_string()))
    }
}

impl TryFrom<String> for PresetMode {
    type Error = ValueError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PresetMode> for String {
    fn from(value: PresetMode) -> Self {
        value.as_str().to_string()
    }
}

/// One row of a [`PresetTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetRange {
    /// The preset this row describes.
    pub preset: PresetMode,
    /// Observed speeds classified as this preset.
    pub range: Range<u16>,
    /// Speed written when this preset is selected.
    pub value: u8,
}

impl PresetRange {
    const fn new(preset: PresetMode, start: u16, end: u16, value: u8) -> Self {
        Self {
            preset,
            range: start..end,
            value,
        }
    }
}

/// Range-based preset table for continuous-speed families.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::{PresetMode, PresetTable};
///
/// let table = &PresetTable::CLASSIC;
/// assert_eq!(table.classify(30), Some(PresetMode::Level2));
/// assert_eq!(table.value_of(PresetMode::Level2), Some(45));
/// assert!(table.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetTable {
    entries: &'static [PresetRange],
}

impl PresetTable {
    /// Classic zhimi fans.
    pub const CLASSIC: Self = Self {
        entries: &[
            PresetRange::new(PresetMode::Off, 0, 1, 0),
            PresetRange::new(PresetMode::Level1, 1, 26, 1),
            PresetRange::new(PresetMode::Level2, 26, 51, 45),
            PresetRange::new(PresetMode::Level3, 51, 76, 74),
            PresetRange::new(PresetMode::Level4, 76, 101, 100),
        ],
    };

    /// P5, Leshow and property-mapped fans.
    pub const STANDARD: Self = Self {
        entries: &[
            PresetRange::new(PresetMode::Off, 0, 1, 0),
            PresetRange::new(PresetMode::Level1, 1, 26, 1),
            PresetRange::new(PresetMode::Level2, 26, 51, 35),
            PresetRange::new(PresetMode::Level3, 51, 76, 70),
            PresetRange::new(PresetMode::Level4, 76, 101, 100),
        ],
    };

    /// Creates a table from rows in declared order.
    #[must_use]
    pub const fn new(entries: &'static [PresetRange]) -> Self {
        Self { entries }
    }

    /// Returns the rows in declared order.
    #[must_use]
    pub const fn entries(&self) -> &'static [PresetRange] {
        self.entries
    }

    /// Classifies an observed speed; the first matching row wins.
    #[must_use]
    pub fn classify(&self, speed: u8) -> Option<PresetMode> {
        let speed = u16::from(speed);
        self.entries
            .iter()
            .find(|entry| entry.range.contains(&speed))
            .map(|entry| entry.preset)
    }

    /// Returns the speed written for `preset`.
    #[must_use]
    pub fn value_of(&self, preset: PresetMode) -> Option<u8> {
        self.entries
            .iter()
            .find(|entry| entry.preset == preset)
            .map(|entry| entry.value)
    }

    /// Returns the presets in declared order.
    pub fn presets(&self) -> impl Iterator<Item = PresetMode> + '_ {
        self.entries.iter().map(|entry| entry.preset)
    }

    /// Checks that the rows partition `[0, 100]` in ascending order, that
    /// `off` is exactly `0`, and that every control value classifies back
    /// to its own preset.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` naming the first offending bound.
    pub fn validate(&self) -> Result<(), ValueError> {
        let mut expected_start = 0u16;
        for entry in self.entries {
            if entry.range.start != expected_start || entry.range.end <= entry.range.start {
                return Err(ValueError::OutOfRange {
                    min: u32::from(expected_start),
                    max: u32::from(expected_start),
                    actual: u32::from(entry.range.start),
                });
            }
            if entry.preset == PresetMode::Off && (entry.range != (0..1) || entry.value != 0) {
                return Err(ValueError::OutOfRange {
                    min: 0,
                    max: 0,
                    actual: u32::from(entry.value),
                });
            }
            if !entry.range.contains(&u16::from(entry.value)) {
                return Err(ValueError::OutOfRange {
                    min: u32::from(entry.range.start),
                    max: u32::from(entry.range.end - 1),
                    actual: u32::from(entry.value),
                });
            }
            expected_start = entry.range.end;
        }
        if expected_start == 101 {
            Ok(())
        } else {
            Err(ValueError::OutOfRange {
                min: 101,
                max: 101,
                actual: u32::from(expected_start),
            })
        }
    }
}

/// Index-based preset list for fixed-level families.
///
/// `off` is implicit and never part of the list. The raw device level of a
/// preset is its index plus one.
///
/// # Examples
///
/// ```
/// use miio_fan_lib::types::{OrderedPresets, PresetMode};
///
/// let levels = &OrderedPresets::ONE_C;
/// assert_eq!(levels.percentage_of(PresetMode::Level2), Some(66));
/// assert_eq!(levels.preset_for(50), PresetMode::Level2);
/// assert_eq!(levels.raw_level(PresetMode::Level3), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPresets {
    levels: &'static [PresetMode],
}

impl OrderedPresets {
    /// Dmaker 1C and P8: three fixed levels.
    pub const ONE_C: Self = Self {
        levels: &[PresetMode::Level1, PresetMode::Level2, PresetMode::Level3],
    };

    /// Creates an ordered list.
    #[must_use]
    pub const fn new(levels: &'static [PresetMode]) -> Self {
        Self { levels }
    }

    /// Returns the number of levels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if there are no levels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns the levels in order.
    #[must_use]
    pub const fn levels(&self) -> &'static [PresetMode] {
        self.levels
    }

    fn index_of(&self, preset: PresetMode) -> Option<usize> {
        self.levels.iter().position(|level| *level == preset)
    }

    fn upper_bound(&self, index: usize) -> u8 {
        // Index and length are tiny, so the quotient always fits in 0..=100.
        u8::try_from((index + 1) * 100 / self.levels.len()).unwrap_or(100)
    }

    /// Returns the percentage representing `preset`.
    #[must_use]
    pub fn percentage_of(&self, preset: PresetMode) -> Option<u8> {
        if preset == PresetMode::Off {
            return Some(0);
        }
        self.index_of(preset).map(|index| self.upper_bound(index))
    }

    /// Returns the preset for a percentage: the first level whose upper
    /// bound is at least `percentage`.
    #[must_use]
    pub fn preset_for(&self, percentage: u8) -> PresetMode {
        if percentage == 0 {
            return PresetMode::Off;
        }
        (0..self.levels.len())
            .find(|&index| percentage <= self.upper_bound(index))
            .and_then(|index| self.levels.get(index).copied())
            .or_else(|| self.levels.last().copied())
            .unwrap_or(PresetMode::Off)
    }

    /// Returns the raw device level for `preset`.
    #[must_use]
    pub fn raw_level(&self, preset: PresetMode) -> Option<u8> {
        self.index_of(preset)
            .and_then(|index| u8::try_from(index + 1).ok())
    }

    /// Returns the preset reported by a raw device level.
    #[must_use]
    pub fn preset_at(&self, raw_level: u8) -> Option<PresetMode> {
        usize::from(raw_level)
            .checked_sub(1)
            .and_then(|index| self.levels.get(index).copied())
    }
}

/// How a family maps between presets and percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetStrategy {
    /// Continuous speed classified through a range table.
    Ranged(&'static PresetTable),
    /// Fixed levels addressed by index.
    Ordered(&'static OrderedPresets),
}

impl PresetStrategy {
    /// Returns every preset the strategy offers, `off` first.
    #[must_use]
    pub fn presets(&self) -> Vec<PresetMode> {
        match self {
            Self::Ranged(table) => table.presets().collect(),
            Self::Ordered(levels) => std::iter::once(PresetMode::Off)
                .chain(levels.levels().iter().copied())
                .collect(),
        }
    }

    /// Returns `true` if the strategy offers `preset`.
    #[must_use]
    pub fn contains(&self, preset: PresetMode) -> bool {
        self.presets().contains(&preset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_partition_the_percentage_scale() {
        assert_eq!(PresetTable::CLASSIC.validate(), Ok(()));
        assert_eq!(PresetTable::STANDARD.validate(), Ok(()));
    }

    #[test]
    fn off_is_exactly_zero() {
        for table in [&PresetTable::CLASSIC, &PresetTable::STANDARD] {
            assert_eq!(table.classify(0), Some(PresetMode::Off));
            assert_eq!(table.value_of(PresetMode::Off), Some(0));
            assert_eq!(table.classify(1), Some(PresetMode::Level1));
        }
    }

    #[test]
    fn every_speed_has_exactly_one_preset() {
        for table in [&PresetTable::CLASSIC, &PresetTable::STANDARD] {
            for speed in 0..=100u8 {
                let matches = table
                    .entries()
                    .iter()
                    .filter(|entry| entry.range.contains(&u16::from(speed)))
                    .count();
                assert_eq!(matches, 1, "speed {speed}");
            }
        }
    }

    #[test]
    fn control_values_classify_back() {
        for table in [&PresetTable::CLASSIC, &PresetTable::STANDARD] {
            for preset in table.presets() {
                let value = table.value_of(preset).unwrap();
                assert_eq!(table.classify(value), Some(preset));
            }
        }
    }

    #[test]
    fn range_boundaries() {
        let table = &PresetTable::CLASSIC;
        assert_eq!(table.classify(25), Some(PresetMode::Level1));
        assert_eq!(table.classify(26), Some(PresetMode::Level2));
        assert_eq!(table.classify(75), Some(PresetMode::Level3));
        assert_eq!(table.classify(76), Some(PresetMode::Level4));
        assert_eq!(table.classify(100), Some(PresetMode::Level4));
    }

    #[test]
    fn table_with_gap_is_rejected() {
        static GAPPY: [PresetRange; 2] = [
            PresetRange::new(PresetMode::Off, 0, 1, 0),
            PresetRange::new(PresetMode::Level1, 2, 101, 50),
        ];
        assert!(PresetTable::new(&GAPPY).validate().is_err());
    }

    #[test]
    fn ordered_round_trip() {
        let levels = &OrderedPresets::ONE_C;
        for preset in levels.levels() {
            let percentage = levels.percentage_of(*preset).unwrap();
            assert_eq!(levels.preset_for(percentage), *preset);
        }
    }

    #[test]
    fn ordered_percentages() {
        let levels = &OrderedPresets::ONE_C;
        assert_eq!(levels.percentage_of(PresetMode::Level1), Some(33));
        assert_eq!(levels.percentage_of(PresetMode::Level3), Some(100));
        assert_eq!(levels.percentage_of(PresetMode::Level4), None);
        assert_eq!(levels.preset_for(0), PresetMode::Off);
        assert_eq!(levels.preset_for(1), PresetMode::Level1);
        assert_eq!(levels.preset_for(34), PresetMode::Level2);
        assert_eq!(levels.preset_for(67), PresetMode::Level3);
    }

    #[test]
    fn ordered_raw_levels() {
        let levels = &OrderedPresets::ONE_C;
        assert_eq!(levels.raw_level(PresetMode::Level1), Some(1));
        assert_eq!(levels.preset_at(2), Some(PresetMode::Level2));
        assert_eq!(levels.preset_at(0), None);
        assert_eq!(levels.preset_at(4), None);
    }

    #[test]
    fn preset_name_variants() {
        assert_eq!("level_3".parse::<PresetMode>(), Ok(PresetMode::Level3));
        assert_eq!("OFF".parse::<PresetMode>(), Ok(PresetMode::Off));
        assert!("level-9".parse::<PresetMode>().is_err());
    }

    #[test]
    fn strategy_lists_off_first() {
        let ordered = PresetStrategy::Ordered(&OrderedPresets::ONE_C);
        assert_eq!(
            ordered.presets(),
            vec![
                PresetMode::Off,
                PresetMode::Level1,
                PresetMode::Level2,
                PresetMode::Level3
            ]
        );
        assert!(!ordered.contains(PresetMode::Level4));
        assert!(PresetStrategy::Ranged(&PresetTable::STANDARD).contains(PresetMode::Level4));
    }
}
