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

//! Feature capability negotiation
//!
//! Each vendor feature block must be switched on with a handshake before it
//! answers get/set requests. Performance mode support is discovered by asking the
//! device for its list of mode values.

use gb_error::{GalaxybookError, Result};
use tracing::{debug, warn};

use crate::constants::{gunm, performance_mode, sasb};
use crate::executor::{AcpiMethod, Executor};
use crate::profile::ProfileMap;
use crate::sawb::{Sawb, IOB_LEN};

/// Run the enable handshake for the feature block `sasb`
pub fn enable_feature(exec: &Executor, sasb: u16) -> Result<()> {
    let purpose = format!("enabling feature 0x{:x}", sasb);
    let request = Sawb::settings_request(
        sasb,
        gunm::feature_enable::GUNM,
        &[gunm::feature_enable::GUDS],
    );
    let response = exec.call(AcpiMethod::Settings, &request, &purpose)?;

    if response.gunm() != gunm::feature_enable::GUNM_SUCCESS
        && response.guds(0) != gunm::feature_enable::GUDS_SUCCESS
    {
        warn!(
            "failed {}; device did not respond with success code 0x{:x}",
            purpose,
            gunm::feature_enable::GUNM_SUCCESS
        );
        return Err(GalaxybookError::capability(format!(
            "feature 0x{:x} did not acknowledge enable",
            sasb
        )));
    }
    debug!("enabled feature 0x{:x}", sasb);
    Ok(())
}

/// Ask the device to start raising ACPI notifications for hotkeys and events
pub fn enable_notifications(exec: &Executor) -> Result<()> {
    enable_feature(exec, sasb::NOTIFICATIONS)?;
    let request = Sawb::settings_request(
        sasb::NOTIFICATIONS,
        gunm::acpi_notify::GUNM,
        &[gunm::acpi_notify::GUDS],
    );
    exec.call(AcpiMethod::Settings, &request, "activating ACPI notifications")?;
    Ok(())
}

/// Read the list of performance mode values the device supports
pub fn query_performance_modes(exec: &Executor) -> Result<Vec<u8>> {
    let request = Sawb::performance_request(
        &performance_mode::GUID,
        performance_mode::FNCN,
        performance_mode::SUBN_LIST,
        &[],
    );
    let response = exec.call(
        AcpiMethod::PerformanceMode,
        &request,
        "get supported performance modes",
    )?;

    let reported = response.iob(0) as usize;
    let count = reported.min(IOB_LEN - 1);
    if count < reported {
        warn!(
            "device reported {} performance modes; only {} fit in the response",
            reported, count
        );
    }
    Ok((1..=count).map(|i| response.iob(i)).collect())
}

/// Build the profile map for this device.
///
/// When the mode list cannot be read and `legacy_fallback` is set, the fixed
/// list of early models is used instead.
pub fn negotiate_profiles(exec: &Executor, legacy_fallback: bool) -> Result<ProfileMap> {
    let modes = match query_performance_modes(exec) {
        Ok(modes) => modes,
        Err(err) if legacy_fallback => {
            warn!(
                "could not read supported performance modes ({}); using legacy mode table",
                err
            );
            performance_mode::LEGACY_MODES.to_vec()
        }
        Err(err) => return Err(err),
    };

    let map = ProfileMap::from_supported_modes(&modes);
    if map.is_empty() {
        return Err(GalaxybookError::capability(
            "no supported performance mode maps to a platform profile",
        ));
    }
    Ok(map)
}
