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

//! Performance mode, exposed as a platform profile

use gb_error::{GalaxybookError, Result};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::constants::performance_mode;
use crate::executor::{AcpiMethod, Executor};
use crate::negotiator::negotiate_profiles;
use crate::profile::{PlatformProfile, ProfileMap, ProfileState};
use crate::sawb::Sawb;

/// Profile applied at attach when none is configured
pub const DEFAULT_PLATFORM_PROFILE: PlatformProfile = PlatformProfile::Balanced;

pub struct PerformanceMode {
    map: ProfileMap,
    readback: bool,
    state: Mutex<ProfileState>,
}

impl PerformanceMode {
    /// Wrap an already negotiated profile map.
    ///
    /// `readback` is false on devices whose current mode cannot be queried; those
    /// report the last profile set through this handle.
    pub fn new(map: ProfileMap, readback: bool) -> Self {
        Self {
            map,
            readback,
            state: Mutex::new(ProfileState::Unknown),
        }
    }

    /// Negotiate the profile map and bring the device into a mapped mode
    pub fn init(
        exec: &Executor,
        legacy_fallback: bool,
        readback: bool,
        startup: Option<PlatformProfile>,
    ) -> Result<Self> {
        let map = negotiate_profiles(exec, legacy_fallback)?;
        let mode = Self::new(map, readback);
        mode.apply_startup_profile(exec, startup)?;
        Ok(mode)
    }

    fn apply_startup_profile(&self, exec: &Executor, startup: Option<PlatformProfile>) -> Result<()> {
        if !self.readback {
            return match startup {
                Some(profile) => self.set(exec, self.startup_target(Some(profile))?),
                None => {
                    debug!("device cannot report its performance mode; profile stays unknown");
                    Ok(())
                }
            };
        }

        match self.read_mode(exec) {
            Ok(value) => {
                if let Some(profile) = self.map.profile_for(value) {
                    *self.state.lock() = ProfileState::Known(profile);
                    return Ok(());
                }
                debug!(
                    "initial performance mode value 0x{:x} is not supported by device; setting to default",
                    value
                );
            }
            Err(err) => warn!("failed fetching initial performance mode: {}", err),
        }
        self.set(exec, self.startup_target(startup)?)
    }

    fn startup_target(&self, startup: Option<PlatformProfile>) -> Result<PlatformProfile> {
        let wanted = startup.unwrap_or(DEFAULT_PLATFORM_PROFILE);
        if self.map.get(wanted).is_some() {
            return Ok(wanted);
        }
        let fallback = self
            .map
            .next_after(None)
            .ok_or_else(|| GalaxybookError::capability("no platform profile is mapped"))?;
        warn!(
            "startup profile '{}' is not supported; using '{}' instead",
            wanted, fallback
        );
        Ok(fallback)
    }

    pub fn map(&self) -> &ProfileMap {
        &self.map
    }

    pub fn choices(&self) -> Vec<PlatformProfile> {
        self.map.choices()
    }

    pub fn has_readback(&self) -> bool {
        self.readback
    }

    /// Last profile set or read, without touching the device
    pub fn cached(&self) -> ProfileState {
        *self.state.lock()
    }

    fn read_mode(&self, exec: &Executor) -> Result<u8> {
        let request = Sawb::performance_request(
            &performance_mode::GUID,
            performance_mode::FNCN,
            performance_mode::SUBN_GET,
            &[],
        );
        let response = exec.call(AcpiMethod::PerformanceMode, &request, "getting performance_mode")?;
        Ok(response.iob(0))
    }

    fn write_mode(&self, exec: &Executor, value: u8) -> Result<()> {
        let request = Sawb::performance_request(
            &performance_mode::GUID,
            performance_mode::FNCN,
            performance_mode::SUBN_SET,
            &[value],
        );
        exec.call(AcpiMethod::PerformanceMode, &request, "setting performance_mode")?;
        Ok(())
    }

    pub fn set(&self, exec: &Executor, profile: PlatformProfile) -> Result<()> {
        let value = self.map.get(profile).ok_or_else(|| {
            GalaxybookError::not_supported(format!("platform profile '{}'", profile))
        })?;
        self.write_mode(exec, value)?;
        *self.state.lock() = ProfileState::Known(profile);
        debug!(
            "set platform profile to '{}' (performance mode 0x{:x})",
            profile, value
        );
        Ok(())
    }

    /// Current profile. Without read-back this is the tracked state.
    pub fn get(&self, exec: &Executor) -> Result<ProfileState> {
        if !self.readback {
            return Ok(self.cached());
        }
        let value = self.read_mode(exec)?;
        let profile = self
            .map
            .profile_for(value)
            .ok_or(GalaxybookError::UnmappedPerformanceMode(value))?;
        *self.state.lock() = ProfileState::Known(profile);
        debug!(
            "platform profile is currently '{}' (performance mode 0x{:x})",
            profile, value
        );
        Ok(ProfileState::Known(profile))
    }

    /// Advance to the next supported profile, wrapping at the end
    pub fn cycle(&self, exec: &Executor) -> Result<PlatformProfile> {
        let current = match self.get(exec) {
            Ok(ProfileState::Known(profile)) => Some(profile),
            Ok(ProfileState::Unknown) => None,
            Err(err) => {
                warn!("could not read current platform profile: {}", err);
                None
            }
        };
        let next = self
            .map
            .next_after(current)
            .ok_or_else(|| GalaxybookError::capability("no platform profile is mapped"))?;
        self.set(exec, next)?;
        Ok(next)
    }
}
