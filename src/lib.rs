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

//! Galaxybook Extras - driver core for the Samsung Galaxy Book SCAI ACPI device
//!
//! This library speaks Samsung's vendor ACPI protocol (`CSFI`, `CSXI`, `SDLS` on
//! the `SCAI` device) and exposes keyboard backlight, platform profile, battery
//! charge threshold, fan speed and hotkeys through plain Rust types. The host
//! provides the firmware through the [`acpi`] traits and receives events through
//! [`input::EventSink`].

pub mod acpi;
pub mod attributes;
pub mod config;
pub mod constants;
pub mod controls;
pub mod driver;
pub mod executor;
pub mod fan;
pub mod hotkey;
pub mod hwmon;
pub mod input;
pub mod logger;
pub mod negotiator;
pub mod profile;
pub mod quirks;
pub mod sawb;
pub mod workqueue;

#[cfg(test)]
pub mod test_utils;

pub use driver::{DriverSnapshot, Galaxybook};
pub use gb_error::{ErrorKind, GalaxybookError, Result};
