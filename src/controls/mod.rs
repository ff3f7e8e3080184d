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

//! Device control modules
//!
//! One module per vendor feature. Each builds its request frames, sends them
//! through the executor and interprets the response fields it cares about.

pub mod allow_recording;
pub mod kbd_backlight;
pub mod performance;
pub mod power;
pub mod usb_charge;

pub use allow_recording::AllowRecording;
pub use kbd_backlight::KbdBacklight;
pub use performance::PerformanceMode;
pub use power::{BatteryThreshold, StartOnLidOpen};
pub use usb_charge::UsbCharge;

use tracing::warn;

/// Compare the value the device echoed back with the one requested.
///
/// Some firmware revisions do not echo reliably, so a mismatch is only logged.
pub(crate) fn check_echo(what: &str, requested: u8, echoed: u8) {
    if requested != echoed {
        warn!(
            "{} set to {} but device echoed {}; keeping requested value",
            what, requested, echoed
        );
    }
}

/// Render a boolean the way the firmware log lines do
pub(crate) fn on_off(value: bool) -> &'static str {
    if value {
        "on (1)"
    } else {
        "off (0)"
    }
}
