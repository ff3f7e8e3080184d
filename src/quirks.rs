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

//! Per-model capability overrides
//!
//! Features default to on. A built-in table entry for the device's hardware id
//! can change that, a config file quirk for the same id overrides the table, and
//! the explicit feature toggles in the config override both.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Optional override for each capability; `None` leaves the lower layer in effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CapabilityOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kbd_backlight: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_threshold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_recording: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan_speed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i8042_filter: Option<bool>,
    /// Fall back to the fixed early-model mode list when the list query fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub legacy_performance_modes: Option<bool>,
    /// The device can report its current performance mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance_readback: Option<bool>,
}

impl CapabilityOverrides {
    pub const NONE: CapabilityOverrides = CapabilityOverrides {
        kbd_backlight: None,
        battery_threshold: None,
        performance_mode: None,
        allow_recording: None,
        fan_speed: None,
        i8042_filter: None,
        legacy_performance_modes: None,
        performance_readback: None,
    };

    /// Layer `higher` on top of `self`
    pub fn merged_with(self, higher: &CapabilityOverrides) -> CapabilityOverrides {
        CapabilityOverrides {
            kbd_backlight: higher.kbd_backlight.or(self.kbd_backlight),
            battery_threshold: higher.battery_threshold.or(self.battery_threshold),
            performance_mode: higher.performance_mode.or(self.performance_mode),
            allow_recording: higher.allow_recording.or(self.allow_recording),
            fan_speed: higher.fan_speed.or(self.fan_speed),
            i8042_filter: higher.i8042_filter.or(self.i8042_filter),
            legacy_performance_modes: higher
                .legacy_performance_modes
                .or(self.legacy_performance_modes),
            performance_readback: higher.performance_readback.or(self.performance_readback),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Built-in quirk for one ACPI hardware id
#[derive(Debug, Clone, Copy)]
pub struct ModelQuirk {
    pub hardware_id: &'static str,
    pub overrides: CapabilityOverrides,
}

/// Built-in quirks. No supported model currently needs one; entries are added
/// here as models with broken firmware features are reported.
pub const MODEL_QUIRKS: &[ModelQuirk] = &[];

fn builtin_quirk(table: &[ModelQuirk], hardware_id: &str) -> CapabilityOverrides {
    table
        .iter()
        .find(|q| q.hardware_id.eq_ignore_ascii_case(hardware_id))
        .map(|q| q.overrides)
        .unwrap_or_default()
}

/// Resolved feature switches for one attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub kbd_backlight: bool,
    pub battery_threshold: bool,
    pub performance_mode: bool,
    pub allow_recording: bool,
    pub fan_speed: bool,
    pub i8042_filter: bool,
    pub legacy_performance_modes: bool,
    pub performance_readback: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            kbd_backlight: true,
            battery_threshold: true,
            performance_mode: true,
            allow_recording: true,
            fan_speed: true,
            i8042_filter: true,
            legacy_performance_modes: false,
            performance_readback: true,
        }
    }
}

impl Capabilities {
    /// Resolve switches for `hardware_id` from the built-in table, config quirks and user toggles
    pub fn resolve(
        hardware_id: Option<&str>,
        config_quirks: &HashMap<String, CapabilityOverrides>,
        user: &CapabilityOverrides,
    ) -> Self {
        Self::resolve_with_table(MODEL_QUIRKS, hardware_id, config_quirks, user)
    }

    fn resolve_with_table(
        table: &[ModelQuirk],
        hardware_id: Option<&str>,
        config_quirks: &HashMap<String, CapabilityOverrides>,
        user: &CapabilityOverrides,
    ) -> Self {
        let mut layered = CapabilityOverrides::NONE;
        if let Some(id) = hardware_id {
            layered = layered.merged_with(&builtin_quirk(table, id));
            if let Some(quirk) = config_quirks
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(id))
                .map(|(_, quirk)| quirk)
            {
                layered = layered.merged_with(quirk);
            }
        }
        layered = layered.merged_with(user);
        Self::default().apply(&layered)
    }

    fn apply(self, o: &CapabilityOverrides) -> Self {
        Self {
            kbd_backlight: o.kbd_backlight.unwrap_or(self.kbd_backlight),
            battery_threshold: o.battery_threshold.unwrap_or(self.battery_threshold),
            performance_mode: o.performance_mode.unwrap_or(self.performance_mode),
            allow_recording: o.allow_recording.unwrap_or(self.allow_recording),
            fan_speed: o.fan_speed.unwrap_or(self.fan_speed),
            i8042_filter: o.i8042_filter.unwrap_or(self.i8042_filter),
            legacy_performance_modes: o
                .legacy_performance_modes
                .unwrap_or(self.legacy_performance_modes),
            performance_readback: o.performance_readback.unwrap_or(self.performance_readback),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_all_on() {
        let caps = Capabilities::resolve(Some("SAM0429"), &HashMap::new(), &CapabilityOverrides::NONE);
        assert_eq!(caps, Capabilities::default());
        assert!(caps.kbd_backlight && caps.fan_speed && caps.performance_readback);
        assert!(!caps.legacy_performance_modes);
    }

    #[test]
    fn test_precedence() {
        let table = [ModelQuirk {
            hardware_id: "SAM0427",
            overrides: CapabilityOverrides {
                performance_readback: Some(false),
                fan_speed: Some(false),
                kbd_backlight: Some(false),
                ..CapabilityOverrides::NONE
            },
        }];
        let mut config = HashMap::new();
        config.insert(
            "sam0427".to_string(),
            CapabilityOverrides {
                fan_speed: Some(true),
                legacy_performance_modes: Some(true),
                kbd_backlight: Some(true),
                ..Default::default()
            },
        );
        let user = CapabilityOverrides {
            kbd_backlight: Some(false),
            ..Default::default()
        };

        let caps = Capabilities::resolve_with_table(&table, Some("SAM0427"), &config, &user);
        assert!(!caps.performance_readback);
        assert!(caps.fan_speed);
        assert!(caps.legacy_performance_modes);
        assert!(!caps.kbd_backlight);

        let other = Capabilities::resolve_with_table(&table, Some("SAM0430"), &config, &user);
        assert!(other.performance_readback);
        assert!(!other.kbd_backlight);
    }

    #[test]
    fn test_unknown_hardware_id_uses_user_toggles_only() {
        let user = CapabilityOverrides {
            i8042_filter: Some(false),
            ..Default::default()
        };
        let caps = Capabilities::resolve(None, &HashMap::new(), &user);
        assert!(!caps.i8042_filter);
        assert!(caps.allow_recording);
    }

    #[test]
    fn test_overrides_reject_unknown_fields() {
        assert!(serde_json::from_str::<CapabilityOverrides>(r#"{"turbo": true}"#).is_err());
        let o: CapabilityOverrides = serde_json::from_str(r#"{"fan_speed": false}"#).unwrap();
        assert_eq!(o.fan_speed, Some(false));
        assert!(!o.is_empty());
        assert!(CapabilityOverrides::default().is_empty());
    }
}
