/*
 * This file is part of Galaxybook Extras.
 *
 * Copyright (C) 2025 Galaxybook Extras contributors
 *
 * Galaxybook Extras is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Galaxybook Extras is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Galaxybook Extras. If not, see <https://www.gnu.org/licenses/>.
 */

//! Platform profiles and their mapping to device performance modes

use std::fmt;
use std::str::FromStr;

use gb_error::GalaxybookError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::performance_mode::mode;

/// OS-level power profile slots, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformProfile {
    LowPower,
    Quiet,
    Balanced,
    BalancedPerformance,
    Performance,
}

impl PlatformProfile {
    pub const ALL: [PlatformProfile; 5] = [
        PlatformProfile::LowPower,
        PlatformProfile::Quiet,
        PlatformProfile::Balanced,
        PlatformProfile::BalancedPerformance,
        PlatformProfile::Performance,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            PlatformProfile::LowPower => "low-power",
            PlatformProfile::Quiet => "quiet",
            PlatformProfile::Balanced => "balanced",
            PlatformProfile::BalancedPerformance => "balanced-performance",
            PlatformProfile::Performance => "performance",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PlatformProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlatformProfile {
    type Err = GalaxybookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim_end_matches('\n');
        Self::ALL
            .into_iter()
            .find(|p| p.name() == trimmed)
            .ok_or_else(|| GalaxybookError::invalid_input(s, "unknown platform profile"))
    }
}

/// Last known profile for devices that cannot report their current mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "profile")]
pub enum ProfileState {
    #[default]
    Unknown,
    Known(PlatformProfile),
}

/// Profile slot to performance mode byte, built once at attach
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileMap {
    modes: [Option<u8>; 5],
}

impl ProfileMap {
    /// Map the device's supported mode values onto profile slots.
    ///
    /// Values are walked from last to first so that legacy fallbacks, which the
    /// firmware lists before the modern values, only fill slots left empty.
    pub fn from_supported_modes(values: &[u8]) -> Self {
        let mut map = Self::default();
        for &value in values.iter().rev() {
            let slot = match value {
                mode::ULTRA => Some(PlatformProfile::Performance),
                mode::PERFORMANCE => {
                    if map.get(PlatformProfile::Performance).is_some() {
                        Some(PlatformProfile::BalancedPerformance)
                    } else {
                        Some(PlatformProfile::Performance)
                    }
                }
                mode::SILENT => Some(PlatformProfile::LowPower),
                mode::QUIET => {
                    if map.get(PlatformProfile::LowPower).is_some() {
                        Some(PlatformProfile::Quiet)
                    } else {
                        Some(PlatformProfile::LowPower)
                    }
                }
                mode::OPTIMIZED => Some(PlatformProfile::Balanced),
                mode::PERFORMANCE_LEGACY => {
                    map.get(PlatformProfile::Performance)
                        .is_none()
                        .then_some(PlatformProfile::Performance)
                }
                mode::OPTIMIZED_LEGACY => {
                    map.get(PlatformProfile::Balanced)
                        .is_none()
                        .then_some(PlatformProfile::Balanced)
                }
                _ => None,
            };

            match slot {
                Some(profile) => {
                    map.modes[profile.index()] = Some(value);
                    info!(
                        "will support platform profile '{}' with performance mode value 0x{:x}",
                        profile, value
                    );
                }
                None => debug!("unmapped performance mode value 0x{:x} will be ignored", value),
            }
        }
        map
    }

    /// Mode byte for a slot, `None` when the slot is not supported
    pub fn get(&self, profile: PlatformProfile) -> Option<u8> {
        self.modes[profile.index()]
    }

    /// Reverse lookup from a device mode byte
    pub fn profile_for(&self, value: u8) -> Option<PlatformProfile> {
        PlatformProfile::ALL
            .into_iter()
            .find(|p| self.get(*p) == Some(value))
    }

    /// Supported slots in cycle order
    pub fn choices(&self) -> Vec<PlatformProfile> {
        PlatformProfile::ALL
            .into_iter()
            .filter(|p| self.get(*p).is_some())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.modes.iter().filter(|m| m.is_some()).count()
    }

    /// Next supported slot after `current`, wrapping to the first.
    /// With no current profile the first supported slot is returned.
    pub fn next_after(&self, current: Option<PlatformProfile>) -> Option<PlatformProfile> {
        let choices = self.choices();
        let first = *choices.first()?;
        match current {
            Some(current) => Some(
                choices
                    .into_iter()
                    .find(|p| *p > current)
                    .unwrap_or(first),
            ),
            None => Some(first),
        }
    }
}
