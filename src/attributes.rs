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

//! Text attribute parsing and formatting
//!
//! Attribute writes arrive as raw text from userspace, usually with a trailing
//! newline. Booleans follow the kernel `kstrtobool` rules and integers the
//! `kstrtou8` rules with automatic base detection.

use std::fmt;
use std::str::FromStr;

use gb_error::{GalaxybookError, Result};

/// Device attributes exposed as text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAttribute {
    StartOnLidOpen,
    UsbCharge,
    AllowRecording,
    ChargeControlEndThreshold,
}

impl DeviceAttribute {
    pub const ALL: [DeviceAttribute; 4] = [
        DeviceAttribute::StartOnLidOpen,
        DeviceAttribute::UsbCharge,
        DeviceAttribute::AllowRecording,
        DeviceAttribute::ChargeControlEndThreshold,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            DeviceAttribute::StartOnLidOpen => "start_on_lid_open",
            DeviceAttribute::UsbCharge => "usb_charge",
            DeviceAttribute::AllowRecording => "allow_recording",
            DeviceAttribute::ChargeControlEndThreshold => "charge_control_end_threshold",
        }
    }
}

impl fmt::Display for DeviceAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceAttribute {
    type Err = GalaxybookError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| GalaxybookError::not_supported(format!("attribute {}", s)))
    }
}

/// Parse a boolean: `y`/`Y`/`1`/`on` are true, `n`/`N`/`0`/`off` are false.
/// Only the leading characters are examined.
pub fn parse_bool(input: &str) -> Result<bool> {
    let bytes = input.as_bytes();
    match bytes.first() {
        Some(b'y' | b'Y' | b'1') => Ok(true),
        Some(b'n' | b'N' | b'0') => Ok(false),
        Some(b'o' | b'O') => match bytes.get(1) {
            Some(b'n' | b'N') => Ok(true),
            Some(b'f' | b'F') => Ok(false),
            _ => Err(GalaxybookError::invalid_input(input, "not a boolean")),
        },
        _ => Err(GalaxybookError::invalid_input(input, "not a boolean")),
    }
}

/// Parse an unsigned byte with base detection (`0x` hex, leading `0` octal,
/// otherwise decimal). A single trailing newline is accepted.
pub fn parse_u8(input: &str) -> Result<u8> {
    let s = input.strip_suffix('\n').unwrap_or(input);
    let s = s.strip_prefix('+').unwrap_or(s);
    let (digits, radix) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (hex, 16)
    } else if s.len() > 1 && s.starts_with('0') {
        (&s[1..], 8)
    } else {
        (s, 10)
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(GalaxybookError::invalid_input(input, "not an unsigned integer"));
    }
    u8::from_str_radix(digits, radix)
        .map_err(|_| GalaxybookError::invalid_input(input, "out of range for u8"))
}

/// Boolean as shown by a read of the attribute
pub fn format_bool(value: bool) -> String {
    format!("{}\n", value as u8)
}

pub fn format_u8(value: u8) -> String {
    format!("{}\n", value)
}
