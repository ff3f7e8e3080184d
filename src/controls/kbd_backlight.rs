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

//! Keyboard backlight brightness

use std::sync::atomic::{AtomicU8, Ordering};

use gb_error::{GalaxybookError, Result};
use tracing::debug;

use crate::constants::{gunm, kbd_backlight, sasb};
use crate::executor::{AcpiMethod, Executor};
use crate::negotiator::enable_feature;
use crate::sawb::Sawb;

/// Keyboard backlight with a mirror of the last known level
#[derive(Debug, Default)]
pub struct KbdBacklight {
    brightness: AtomicU8,
}

impl KbdBacklight {
    /// Enable the feature block and verify the level can be read
    pub fn init(exec: &Executor) -> Result<Self> {
        enable_feature(exec, sasb::KBD_BACKLIGHT)?;
        let backlight = Self::default();
        backlight.get(exec)?;
        Ok(backlight)
    }

    pub const fn max_brightness(&self) -> u8 {
        kbd_backlight::MAX_BRIGHTNESS
    }

    /// Last level read or written, without touching the device
    pub fn cached(&self) -> u8 {
        self.brightness.load(Ordering::Relaxed)
    }

    pub fn get(&self, exec: &Executor) -> Result<u8> {
        let request = Sawb::settings_request(sasb::KBD_BACKLIGHT, gunm::GET, &[]);
        let response = exec.call(
            AcpiMethod::Settings,
            &request,
            "getting kbd_backlight brightness",
        )?;
        let level = response.gunm();
        if level > kbd_backlight::MAX_BRIGHTNESS {
            return Err(GalaxybookError::unexpected(
                "kbd_backlight brightness",
                level as u64,
            ));
        }
        self.brightness.store(level, Ordering::Relaxed);
        debug!("current kbd_backlight brightness is {}", level);
        Ok(level)
    }

    pub fn set(&self, exec: &Executor, level: u8) -> Result<()> {
        if level > kbd_backlight::MAX_BRIGHTNESS {
            return Err(GalaxybookError::invalid_value(
                "kbd_backlight brightness",
                format!("{} exceeds maximum of {}", level, kbd_backlight::MAX_BRIGHTNESS),
            ));
        }
        let request = Sawb::settings_request(sasb::KBD_BACKLIGHT, gunm::SET, &[level]);
        exec.call(
            AcpiMethod::Settings,
            &request,
            "setting kbd_backlight brightness",
        )?;
        self.brightness.store(level, Ordering::Relaxed);
        debug!("set kbd_backlight brightness to {}", level);
        Ok(())
    }

    /// Step to the next level from the mirror, wrapping to off after the maximum
    pub fn cycle(&self, exec: &Executor) -> Result<u8> {
        let current = self.cached();
        let next = if current >= kbd_backlight::MAX_BRIGHTNESS {
            0
        } else {
            current + 1
        };
        self.set(exec, next)?;
        Ok(next)
    }
}
