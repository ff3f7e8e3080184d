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

//! Power management block (`sasb` 0x7a): start on lid open and battery charge threshold
//!
//! Both features share one opcode and are told apart by the first payload byte.

use gb_error::{GalaxybookError, Result};
use tracing::debug;

use super::{check_echo, on_off};
use crate::constants::{battery, gunm, sasb};
use crate::executor::{AcpiMethod, Executor};
use crate::sawb::Sawb;

fn power_request(guds: &[u8]) -> Sawb {
    Sawb::settings_request(sasb::POWER_MANAGEMENT, gunm::POWER_MANAGEMENT, guds)
}

/// Power on when the lid is opened
#[derive(Debug, Default, Clone, Copy)]
pub struct StartOnLidOpen;

impl StartOnLidOpen {
    /// Verify the setting can be read
    pub fn init(exec: &Executor) -> Result<Self> {
        let feature = Self;
        feature.get(exec)?;
        Ok(feature)
    }

    pub fn get(&self, exec: &Executor) -> Result<bool> {
        let request = power_request(&[
            gunm::start_on_lid_open::GUDS,
            gunm::start_on_lid_open::GET,
        ]);
        let response = exec.call(AcpiMethod::Settings, &request, "getting start_on_lid_open")?;
        let value = response.guds(1) != 0;
        debug!("start_on_lid_open is currently {}", on_off(value));
        Ok(value)
    }

    pub fn set(&self, exec: &Executor, value: bool) -> Result<()> {
        let request = power_request(&[
            gunm::start_on_lid_open::GUDS,
            gunm::start_on_lid_open::SET,
            value as u8,
        ]);
        let response = exec.call(AcpiMethod::Settings, &request, "setting start_on_lid_open")?;
        check_echo("start_on_lid_open", value as u8, response.guds(2));
        debug!("turned start_on_lid_open {}", on_off(value));
        Ok(())
    }
}

/// Battery charge end threshold in percent; 0 means charging to full
#[derive(Debug, Default, Clone, Copy)]
pub struct BatteryThreshold;

impl BatteryThreshold {
    /// Verify the threshold can be read
    pub fn init(exec: &Executor) -> Result<Self> {
        let feature = Self;
        feature.get(exec)?;
        Ok(feature)
    }

    pub fn get(&self, exec: &Executor) -> Result<u8> {
        let request = power_request(&[
            gunm::battery_charge_control::GUDS,
            gunm::battery_charge_control::GET,
        ]);
        let response = exec.call(
            AcpiMethod::Settings,
            &request,
            "getting battery charge_control_end_threshold",
        )?;
        let value = response.guds(1);
        if value > battery::MAX_PERCENT {
            return Err(GalaxybookError::unexpected(
                "battery charge_control_end_threshold",
                value as u64,
            ));
        }
        debug!(
            "battery charge control is currently {}; battery charge_control_end_threshold is {}",
            if value > 0 { "on" } else { "off" },
            value
        );
        Ok(value)
    }

    /// Set the threshold. 100 is sent as 0, the device's "no threshold" value.
    pub fn set(&self, exec: &Executor, value: u8) -> Result<()> {
        if value > battery::MAX_PERCENT {
            return Err(GalaxybookError::invalid_value(
                "charge_control_end_threshold",
                format!("{} is above {}", value, battery::MAX_PERCENT),
            ));
        }
        let device_value = if value == battery::MAX_PERCENT {
            battery::THRESHOLD_DISABLED
        } else {
            value
        };
        let request = power_request(&[
            gunm::battery_charge_control::GUDS,
            gunm::battery_charge_control::SET,
            device_value,
        ]);
        let response = exec.call(
            AcpiMethod::Settings,
            &request,
            "setting battery charge_control_end_threshold",
        )?;
        check_echo(
            "battery charge_control_end_threshold",
            device_value,
            response.guds(2),
        );
        debug!("set battery charge_control_end_threshold to {}", device_value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::*;
    use gb_error::ErrorKind;

    #[test]
    fn test_start_on_lid_open_round_trip() {
        let (scai, exec) = simulated_executor();
        let lid = StartOnLidOpen::init(&exec).unwrap();
        lid.set(&exec, false).unwrap();
        assert_eq!(
            &scai.last_request().unwrap()[5..9],
            &[0x82, 0xa3, 0x80, 0x00]
        );
        assert!(!lid.get(&exec).unwrap());
        lid.set(&exec, true).unwrap();
        assert!(lid.get(&exec).unwrap());
    }

    #[test]
    fn test_threshold_set_and_get() {
        let (scai, exec) = simulated_executor();
        let threshold = BatteryThreshold::init(&exec).unwrap();
        threshold.set(&exec, 80).unwrap();
        assert_eq!(
            &scai.last_request().unwrap()[5..9],
            &[0x82, 0xe9, 0x90, 80]
        );
        assert_eq!(threshold.get(&exec).unwrap(), 80);
    }

    #[test]
    fn test_threshold_hundred_sent_as_zero() {
        let (scai, exec) = simulated_executor();
        let threshold = BatteryThreshold;
        threshold.set(&exec, 80).unwrap();
        threshold.set(&exec, 100).unwrap();
        assert_eq!(scai.last_request().unwrap()[8], 0);
        assert_eq!(threshold.get(&exec).unwrap(), 0);
    }

    #[test]
    fn test_threshold_above_hundred_makes_no_call() {
        let (scai, exec) = simulated_executor();
        let err = BatteryThreshold.set(&exec, 101).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(scai.call_count(), 0);
    }

    #[test]
    fn test_threshold_read_out_of_range() {
        let mut state = FirmwareState::default();
        state.battery_threshold = 150;
        let (_scai, exec) = simulated_executor_with(state);
        let err = BatteryThreshold.get(&exec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[test]
    fn test_power_block_failure() {
        let mut state = FirmwareState::default();
        state.failing_subsystems.insert(sasb::POWER_MANAGEMENT);
        let (_scai, exec) = simulated_executor_with(state);
        let err = StartOnLidOpen::init(&exec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Envelope);
    }

    #[test]
    fn test_mismatched_echo_still_succeeds() {
        let mut state = FirmwareState::default();
        state.echo_mismatch = true;
        let (scai, exec) = simulated_executor_with(state);
        StartOnLidOpen.set(&exec, false).unwrap();
        BatteryThreshold.set(&exec, 60).unwrap();
        let state = scai.state.lock();
        assert_eq!(state.start_on_lid_open, 0);
        assert_eq!(state.battery_threshold, 60);
    }
}
