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

//! Constants for the Samsung SCAI ACPI protocol
//!
//! Every value here was reverse-engineered from firmware traffic and must be
//! reproduced byte-for-byte. Byte offsets inside a frame are not listed here;
//! they belong to the `sawb` codec alone.

/// Driver identity
pub mod driver {
    /// Device class name used for LED, hwmon and input naming
    pub const CLASS: &str = "samsung-galaxybook";

    /// Human readable driver name
    pub const NAME: &str = "Samsung Galaxy Book Extras";

    /// ACPI hardware ids of the SCAI device handled by this driver
    pub const DEVICE_IDS: &[&str] = &["SAM0427", "SAM0428", "SAM0429", "SAM0430"];
}

/// ACPI control methods on the SCAI device
pub mod methods {
    /// Device enable switch, takes a single integer argument
    pub const ENABLE: &str = "SDLS";
    pub const ENABLE_ON: u64 = 1;
    pub const ENABLE_OFF: u64 = 0;

    /// General settings method (21 byte frames)
    pub const SETTINGS: &str = "CSFI";

    /// Performance mode method (256 byte frames)
    pub const PERFORMANCE_MODE: &str = "CSXI";
}

/// SAWB frame signature and envelope values
pub mod sawb {
    /// Protocol family signature, transmitted little endian as `43 58`
    pub const SAFN: u16 = 0x5843;

    /// Declared length of a settings frame
    pub const LEN_SETTINGS: usize = 0x15;

    /// Declared length of a performance mode frame
    pub const LEN_PERFORMANCE_MODE: usize = 0x100;

    /// Success flag the device writes into `rflg`
    pub const RFLG_SUCCESS: u8 = 0xaa;

    /// Failure code the device writes into `gunm`
    pub const GUNM_FAIL: u8 = 0xff;
}

/// Subsystem ids (`sasb`) selecting a feature block
pub mod sasb {
    pub const KBD_BACKLIGHT: u16 = 0x78;
    pub const POWER_MANAGEMENT: u16 = 0x7a;
    pub const USB_CHARGE_GET: u16 = 0x67;
    pub const USB_CHARGE_SET: u16 = 0x68;
    pub const NOTIFICATIONS: u16 = 0x86;
    pub const ALLOW_RECORDING: u16 = 0x8a;
    pub const PERFORMANCE_MODE: u16 = 0x91;
}

/// Opcodes (`gunm`) and payload values (`guds`) for settings frames
pub mod gunm {
    /// Feature enable handshake
    pub mod feature_enable {
        pub const GUNM: u8 = 0xbb;
        pub const GUDS: u8 = 0xaa;
        pub const GUNM_SUCCESS: u8 = 0xdd;
        pub const GUDS_SUCCESS: u8 = 0xcc;
    }

    pub const GET: u8 = 0x81;
    pub const SET: u8 = 0x82;

    /// Opcode shared by every power management request
    pub const POWER_MANAGEMENT: u8 = 0x82;

    pub mod usb_charge {
        pub const GET: u8 = 0x80;
        pub const ON: u8 = 0x81;
        pub const OFF: u8 = 0x80;
    }

    pub mod start_on_lid_open {
        pub const GUDS: u8 = 0xa3;
        pub const GET: u8 = 0x81;
        pub const SET: u8 = 0x80;
    }

    pub mod battery_charge_control {
        pub const GUDS: u8 = 0xe9;
        pub const GET: u8 = 0x91;
        pub const SET: u8 = 0x90;
    }

    pub mod acpi_notify {
        pub const GUNM: u8 = 0x80;
        pub const GUDS: u8 = 0x02;
    }
}

/// Performance mode feature block (layout B frames)
pub mod performance_mode {
    /// GUID 8246028d-8bca-4a55-ba0f-6f1e6b921b8f in its exported byte order
    pub const GUID: [u8; 16] = [
        0x8d, 0x02, 0x46, 0x82, 0xca, 0x8b, 0x55, 0x4a, 0xba, 0x0f, 0x6f, 0x1e, 0x6b, 0x92, 0x1b,
        0x8f,
    ];

    pub const FNCN: u8 = 0x51;
    pub const SUBN_LIST: u8 = 0x01;
    pub const SUBN_GET: u8 = 0x02;
    pub const SUBN_SET: u8 = 0x03;

    /// Device mode values
    pub mod mode {
        pub const ULTRA: u8 = 0x16;
        pub const PERFORMANCE: u8 = 0x15;
        pub const SILENT: u8 = 0x0b;
        pub const QUIET: u8 = 0x0a;
        pub const OPTIMIZED: u8 = 0x02;
        pub const PERFORMANCE_LEGACY: u8 = 0x01;
        pub const OPTIMIZED_LEGACY: u8 = 0x00;
    }

    /// Fixed mode list used only for models that cannot answer the list query
    pub const LEGACY_MODES: &[u8] = &[mode::OPTIMIZED, mode::QUIET, mode::SILENT, mode::PERFORMANCE];
}

/// Keyboard backlight
pub mod kbd_backlight {
    pub const MAX_BRIGHTNESS: u8 = 3;
}

/// Battery charge control
pub mod battery {
    pub const MAX_PERCENT: u8 = 100;

    /// Device value meaning "no charge threshold"
    pub const THRESHOLD_DISABLED: u8 = 0;
}

/// ACPI fan devices and the EC speed register
pub mod fan {
    /// Fan device class id
    pub const DEVICE_ID: &str = "PNP0C0B";

    /// Per-fan speed level table
    pub const SPEED_LIST: &str = "FANT";

    /// Shared EC field holding the current speed level
    pub const SPEED_VALUE: &str = "\\_SB.PC00.LPCB.H_EC.FANS";

    /// Standard ACPI 4.0 fan methods
    pub const FIF: &str = "_FIF";
    pub const FPS: &str = "_FPS";
    pub const FSL: &str = "_FSL";
    pub const FST: &str = "_FST";

    /// Number of elements in a `_FST` package, and the index of the speed
    pub const FST_PACKAGE_LEN: usize = 3;
    pub const FST_SPEED_INDEX: usize = 2;

    /// Correction added to every `FANT` entry
    pub const SPEED_LIST_OFFSET: u32 = 0x0a;

    /// Increment for the synthesized top level above the highest `FANT` entry
    pub const TOP_LEVEL_INCREMENT: u32 = 1000;

    pub const MAX_FAN_COUNT: usize = 5;
}

/// ACPI notification codes delivered to the SCAI device
pub mod notify {
    pub const BATTERY_STATE_CHANGED: u32 = 0x61;
    pub const DEVICE_ON_TABLE: u32 = 0x6c;
    pub const DEVICE_OFF_TABLE: u32 = 0x6d;
    pub const HOTKEY_PERFORMANCE_MODE: u32 = 0x70;
}

/// i8042 keyboard scancodes
pub mod scancode {
    /// Extended scancode prefix
    pub const EXTENDED: u8 = 0xe0;

    /// Status register bit marking AUX (mouse) data
    pub const STR_AUXDATA: u8 = 0x20;

    pub const KBD_BACKLIGHT_KEYDOWN: u8 = 0x2c;
    pub const KBD_BACKLIGHT_KEYUP: u8 = 0xac;
    pub const ALLOW_RECORDING_KEYDOWN: u8 = 0x1f;
    pub const ALLOW_RECORDING_KEYUP: u8 = 0x9f;
}

/// Linux input key codes reported for notifications
pub mod keys {
    pub const KEY_F14: u16 = 184;
    pub const KEY_F15: u16 = 185;
    pub const KEY_PROG3: u16 = 202;
    pub const KEY_BATTERY: u16 = 236;
}

/// Configuration paths
pub mod paths {
    /// System wide configuration directory
    pub const CONFIG_DIR: &str = "/etc/galaxybook";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Application directory under the user config base
    pub const APP_DIR: &str = "galaxybook";
}

/// Limits for untrusted configuration input
pub mod limits {
    /// Maximum config file size (64KB)
    pub const MAX_CONFIG_SIZE: u64 = 64 * 1024;

    /// Maximum number of per-model quirk entries in a config file
    pub const MAX_QUIRKS: usize = 64;
}
