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

use std::collections::HashMap;
use std::env;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use gb_error::{GalaxybookError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::{limits, paths};
use crate::logger::DEFAULT_LOG_LEVEL;
use crate::profile::PlatformProfile;
use crate::quirks::CapabilityOverrides;

/// Driver configuration, the equivalent of the module parameters.
/// Every field is optional; an empty file means defaults everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DriverConfig {
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
    /// Profile applied at attach when the device is in an unmapped mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_profile: Option<PlatformProfile>,
    /// tracing filter directive, e.g. `debug` or `galaxybook=trace`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    /// Extra per-model overrides keyed by ACPI hardware id
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub quirks: HashMap<String, CapabilityOverrides>,
}

impl DriverConfig {
    /// The explicit feature toggles as the top override layer
    pub fn feature_overrides(&self) -> CapabilityOverrides {
        CapabilityOverrides {
            kbd_backlight: self.kbd_backlight,
            battery_threshold: self.battery_threshold,
            performance_mode: self.performance_mode,
            allow_recording: self.allow_recording,
            fan_speed: self.fan_speed,
            i8042_filter: self.i8042_filter,
            ..CapabilityOverrides::NONE
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }
}

/// Candidate config locations, most specific first
pub fn config_search_paths() -> Vec<PathBuf> {
    let mut out = Vec::new();
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        out.push(Path::new(&xdg).join(paths::APP_DIR).join(paths::CONFIG_FILE));
    }
    if let Ok(home) = env::var("HOME") {
        out.push(
            Path::new(&home)
                .join(".config")
                .join(paths::APP_DIR)
                .join(paths::CONFIG_FILE),
        );
    }
    out.push(system_config_path());
    out
}

pub fn system_config_path() -> PathBuf {
    Path::new(paths::CONFIG_DIR).join(paths::CONFIG_FILE)
}

/// Path a new user config would be written to
pub fn config_path() -> PathBuf {
    config_search_paths()
        .into_iter()
        .next()
        .unwrap_or_else(system_config_path)
}

/// Load the first config file found, or defaults when there is none
pub fn load_config() -> Result<DriverConfig> {
    for path in config_search_paths() {
        if path.is_file() {
            debug!("loading config from {}", path.display());
            return load_config_from(&path);
        }
    }
    debug!("no config file found; using defaults");
    Ok(DriverConfig::default())
}

pub fn load_config_from(path: &Path) -> Result<DriverConfig> {
    let meta = fs::metadata(path).map_err(|e| GalaxybookError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    if meta.len() > limits::MAX_CONFIG_SIZE {
        return Err(GalaxybookError::config(format!(
            "{} is larger than {} bytes",
            path.display(),
            limits::MAX_CONFIG_SIZE
        )));
    }
    let data = fs::read_to_string(path).map_err(|e| GalaxybookError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    let cfg: DriverConfig = serde_json::from_str(&data)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

fn is_safe_hardware_id(s: &str) -> bool {
    !s.is_empty() && s.len() <= 16 && s.chars().all(|c| c.is_ascii_alphanumeric())
}

fn is_safe_filter(s: &str) -> bool {
    if s.is_empty() || s.len() > 256 {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '=' | ',' | '_' | ':' | '.' | '-'))
}

pub fn validate_config(cfg: &DriverConfig) -> Result<()> {
    if let Some(level) = &cfg.log_level {
        if !is_safe_filter(level) {
            return Err(GalaxybookError::invalid_value(
                "log_level",
                "invalid characters or length",
            ));
        }
    }
    if cfg.quirks.len() > limits::MAX_QUIRKS {
        return Err(GalaxybookError::invalid_value(
            "quirks",
            format!("too many entries (max {})", limits::MAX_QUIRKS),
        ));
    }
    for (id, quirk) in &cfg.quirks {
        if !is_safe_hardware_id(id) {
            return Err(GalaxybookError::invalid_value(
                "quirks",
                format!("invalid hardware id {:?}", id),
            ));
        }
        if quirk.is_empty() {
            return Err(GalaxybookError::invalid_value(
                "quirks",
                format!("entry for {} sets nothing", id),
            ));
        }
    }
    Ok(())
}

pub fn save_config_to(cfg: &DriverConfig, path: &Path) -> Result<()> {
    validate_config(cfg)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| GalaxybookError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).map_err(|e| GalaxybookError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o644)) {
        warn!("failed to set permissions on {}: {}", path.display(), e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn create_test_config() -> DriverConfig {
        let mut quirks = HashMap::new();
        quirks.insert(
            "SAM0427".to_string(),
            CapabilityOverrides {
                legacy_performance_modes: Some(true),
                ..Default::default()
            },
        );
        DriverConfig {
            kbd_backlight: Some(false),
            startup_profile: Some(PlatformProfile::Quiet),
            log_level: Some("debug".to_string()),
            quirks,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_config_is_default() {
        let cfg: DriverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, DriverConfig::default());
        assert_eq!(cfg.log_level(), "info");
        assert!(cfg.feature_overrides().is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(serde_json::from_str::<DriverConfig>(r#"{"fan_curve": []}"#).is_err());
    }

    #[test]
    fn test_feature_overrides() {
        let cfg = create_test_config();
        let o = cfg.feature_overrides();
        assert_eq!(o.kbd_backlight, Some(false));
        assert_eq!(o.fan_speed, None);
        assert_eq!(o.legacy_performance_modes, None);
    }

    #[test]
    fn test_validate_config() {
        let mut cfg = create_test_config();
        assert!(validate_config(&cfg).is_ok());

        cfg.log_level = Some("debug; rm -rf".to_string());
        assert!(validate_config(&cfg).is_err());

        let mut cfg = create_test_config();
        cfg.quirks.insert("SAM/0427".to_string(), CapabilityOverrides {
            fan_speed: Some(false),
            ..Default::default()
        });
        assert!(validate_config(&cfg).is_err());

        let mut cfg = create_test_config();
        cfg.quirks.insert("SAM0430".to_string(), CapabilityOverrides::default());
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_too_many_quirks() {
        let mut cfg = DriverConfig::default();
        cfg.quirks = (0..65)
            .map(|i| {
                (
                    format!("SAM{:04}", i),
                    CapabilityOverrides {
                        fan_speed: Some(false),
                        ..Default::default()
                    },
                )
            })
            .collect();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let cfg = create_test_config();
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, cfg);
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"startup_profile\": \"quiet\""));
    }

    #[test]
    fn test_save_resets_permissions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
        save_config_to(&create_test_config(), &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_load_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(matches!(err, GalaxybookError::JsonParse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config_from(Path::new("/nonexistent/galaxybook.json")).unwrap_err();
        assert!(matches!(err, GalaxybookError::FileRead { .. }));
    }

    #[test]
    fn test_load_oversized_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&vec![b' '; 70 * 1024]).unwrap();
        assert!(load_config_from(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn test_config_path_with_xdg() {
        let old = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", "/custom/config");
        let path = config_path();
        assert_eq!(path, PathBuf::from("/custom/config/galaxybook/config.json"));
        match old {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_search_paths_end_with_system() {
        let paths = config_search_paths();
        assert_eq!(paths.last().unwrap(), &PathBuf::from("/etc/galaxybook/config.json"));
    }

    #[test]
    #[serial]
    fn test_load_config_prefers_xdg() {
        let dir = TempDir::new().unwrap();
        let old = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", dir.path());
        let path = dir.path().join("galaxybook").join("config.json");
        save_config_to(&create_test_config(), &path).unwrap();

        let loaded = load_config().unwrap();
        assert_eq!(loaded.startup_profile, Some(PlatformProfile::Quiet));

        match old {
            Some(v) => env::set_var("XDG_CONFIG_HOME", v),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
    }
}
