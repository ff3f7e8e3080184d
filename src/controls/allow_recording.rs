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

//! Camera and microphone access switch

use gb_error::Result;
use tracing::debug;

use super::{check_echo, on_off};
use crate::constants::{gunm, sasb};
use crate::executor::{AcpiMethod, Executor};
use crate::negotiator::enable_feature;
use crate::sawb::Sawb;

#[derive(Debug, Default, Clone, Copy)]
pub struct AllowRecording;

impl AllowRecording {
    /// Enable the feature block and verify the setting can be read
    pub fn init(exec: &Executor) -> Result<Self> {
        enable_feature(exec, sasb::ALLOW_RECORDING)?;
        let feature = Self;
        feature.get(exec)?;
        Ok(feature)
    }

    pub fn get(&self, exec: &Executor) -> Result<bool> {
        let request = Sawb::settings_request(sasb::ALLOW_RECORDING, gunm::GET, &[]);
        let response = exec.call(AcpiMethod::Settings, &request, "getting allow_recording")?;
        let value = response.gunm() != 0;
        debug!("allow_recording is currently {}", on_off(value));
        Ok(value)
    }

    pub fn set(&self, exec: &Executor, value: bool) -> Result<()> {
        let request = Sawb::settings_request(sasb::ALLOW_RECORDING, gunm::SET, &[value as u8]);
        let response = exec.call(AcpiMethod::Settings, &request, "setting allow_recording")?;
        check_echo("allow_recording", value as u8, response.guds(0));
        debug!("turned allow_recording {}", on_off(value));
        Ok(())
    }

    /// Flip the current setting, returning the new value
    pub fn toggle(&self, exec: &Executor) -> Result<bool> {
        let value = !self.get(exec)?;
        self.set(exec, value)?;
        Ok(value)
    }
}
