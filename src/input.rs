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

//! Downstream event sink and the notification keymap

use crate::constants::{keys, notify};
use crate::profile::PlatformProfile;

/// Name of the input device carrying notification keys
pub const INPUT_NAME: &str = "Samsung Galaxy Book Extra Buttons";

/// Key codes the driver reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Battery,
    Prog3,
    F14,
    F15,
}

impl KeyCode {
    /// Linux input event code
    pub const fn code(self) -> u16 {
        match self {
            KeyCode::Battery => keys::KEY_BATTERY,
            KeyCode::Prog3 => keys::KEY_PROG3,
            KeyCode::F14 => keys::KEY_F14,
            KeyCode::F15 => keys::KEY_F15,
        }
    }
}

/// Sparse keymap from ACPI notification code to key
pub const KEYMAP: &[(u32, KeyCode)] = &[
    (notify::BATTERY_STATE_CHANGED, KeyCode::Battery),
    (notify::HOTKEY_PERFORMANCE_MODE, KeyCode::Prog3),
    (notify::DEVICE_ON_TABLE, KeyCode::F14),
    (notify::DEVICE_OFF_TABLE, KeyCode::F15),
];

pub fn key_for_event(event: u32) -> Option<KeyCode> {
    KEYMAP
        .iter()
        .find(|(code, _)| *code == event)
        .map(|(_, key)| *key)
}

/// Receiver for input, LED and platform profile change signals.
///
/// Every method has an empty default so hosts implement only what they expose.
pub trait EventSink: Send + Sync {
    /// Report a press-and-release of `key`
    fn report_key(&self, _key: KeyCode) {}

    /// The keyboard backlight level changed through the hotkey
    fn kbd_backlight_changed(&self, _level: u8) {}

    /// The platform profile changed through the hotkey
    fn platform_profile_changed(&self, _profile: PlatformProfile) {}
}
