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

//! hwmon adapter for discovered fans
//!
//! Exposes each fan as an hwmon `fan` channel with `fanN_input` (RPM) and
//! `fanN_label` (ACPI description) attributes, numbered from 1 as hwmon does.

use gb_error::{GalaxybookError, Result};
use serde::Serialize;

use crate::constants::driver;
use crate::fan::FanResolver;

/// Read-only attribute mode
pub const MODE_READ_ONLY: u32 = 0o444;

/// Per-fan sysfs attribute carrying the raw speed
pub const FAN_SPEED_RPM: &str = "fan_speed_rpm";

/// Attributes offered per fan channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanAttr {
    Input,
    Label,
}

impl FanAttr {
    fn suffix(self) -> &'static str {
        match self {
            FanAttr::Input => "_input",
            FanAttr::Label => "_label",
        }
    }
}

/// Parse an hwmon file name like `fan2_input` into a zero-based channel
pub fn parse_attr_name(fname: &str) -> Option<(usize, FanAttr)> {
    [FanAttr::Input, FanAttr::Label].into_iter().find_map(|attr| {
        extract_index(fname, "fan", attr.suffix())
            .filter(|idx| *idx > 0)
            .map(|idx| (idx - 1, attr))
    })
}

/// hwmon file name for a zero-based channel
pub fn attr_name(channel: usize, attr: FanAttr) -> String {
    format!("fan{}{}", channel + 1, attr.suffix())
}

pub fn extract_index(fname: &str, prefix: &str, suffix: &str) -> Option<usize> {
    if fname.len() >= prefix.len() + suffix.len()
        && fname.starts_with(prefix)
        && fname.ends_with(suffix)
    {
        let mid = &fname[prefix.len()..fname.len() - suffix.len()];
        mid.parse().ok()
    } else {
        None
    }
}

/// Chip name as the hwmon core would sanitize it (no `-`, `*`, spaces, tabs or newlines)
pub fn chip_name() -> String {
    driver::CLASS
        .chars()
        .map(|c| if matches!(c, '-' | '*' | ' ' | '\t' | '\n') { '_' } else { c })
        .collect()
}

/// One fan reading, as a monitoring tool would list it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanReading {
    pub label: String,
    pub rpm: u32,
}

/// hwmon view over a [`FanResolver`]
pub struct FanHwmon<'a> {
    fans: &'a FanResolver,
}

impl<'a> FanHwmon<'a> {
    pub fn new(fans: &'a FanResolver) -> Self {
        Self { fans }
    }

    /// Mode for a channel attribute, 0 when hidden
    pub fn is_visible(&self, channel: usize, _attr: FanAttr) -> u32 {
        if channel < self.fans.len() {
            MODE_READ_ONLY
        } else {
            0
        }
    }

    /// RPM for `fanN_input`
    pub fn read(&self, channel: usize, attr: FanAttr) -> Result<u32> {
        match attr {
            FanAttr::Input if channel < self.fans.len() => self.fans.speed(channel),
            _ => Err(GalaxybookError::not_supported(attr_name(channel, attr))),
        }
    }

    /// Text for `fanN_label`
    pub fn read_label(&self, channel: usize, attr: FanAttr) -> Result<&'a str> {
        match (attr, self.fans.fan(channel)) {
            (FanAttr::Label, Some(fan)) => Ok(fan.description()),
            _ => Err(GalaxybookError::not_supported(attr_name(channel, attr))),
        }
    }

    /// Read an attribute by its hwmon file name, formatted as sysfs would show it
    pub fn show(&self, fname: &str) -> Result<String> {
        let (channel, attr) = parse_attr_name(fname)
            .ok_or_else(|| GalaxybookError::not_supported(fname.to_string()))?;
        match attr {
            FanAttr::Input => Ok(format!("{}\n", self.read(channel, attr)?)),
            FanAttr::Label => Ok(format!("{}\n", self.read_label(channel, attr)?)),
        }
    }

    /// `fan_speed_rpm` text for one fan device
    pub fn fan_speed_rpm(&self, channel: usize) -> Result<String> {
        Ok(format!("{}\n", self.fans.speed(channel)?))
    }

    /// Every fan with its current speed. Fans that fail to read are left out.
    pub fn read_all(&self) -> Vec<FanReading> {
        self.fans
            .fans()
            .iter()
            .enumerate()
            .filter_map(|(i, fan)| {
                self.fans.speed(i).ok().map(|rpm| FanReading {
                    label: fan.description().to_string(),
                    rpm,
                })
            })
            .collect()
    }
}
