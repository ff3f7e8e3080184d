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

//! USB charging while the laptop is off

use gb_error::Result;
use tracing::debug;

use super::{check_echo, on_off};
use crate::constants::{gunm, sasb};
use crate::executor::{AcpiMethod, Executor};
use crate::sawb::Sawb;

#[derive(Debug, Default, Clone, Copy)]
pub struct UsbCharge;

impl UsbCharge {
    pub fn init(exec: &Executor) -> Result<Self> {
        let feature = Self;
        feature.get(exec)?;
        Ok(feature)
    }

    pub fn get(&self, exec: &Executor) -> Result<bool> {
        let request = Sawb::settings_request(sasb::USB_CHARGE_GET, gunm::usb_charge::GET, &[]);
        let response = exec.call(AcpiMethod::Settings, &request, "getting usb_charge")?;
        let value = response.gunm() != 0;
        debug!("usb_charge is currently {}", on_off(value));
        Ok(value)
    }

    pub fn set(&self, exec: &Executor, value: bool) -> Result<()> {
        let opcode = if value {
            gunm::usb_charge::ON
        } else {
            gunm::usb_charge::OFF
        };
        let request = Sawb::settings_request(sasb::USB_CHARGE_SET, opcode, &[]);
        let response = exec.call(AcpiMethod::Settings, &request, "setting usb_charge")?;
        check_echo("usb_charge", value as u8, response.gunm() & 1);
        debug!("turned usb_charge {}", on_off(value));
        Ok(())
    }
}
