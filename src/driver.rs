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

//! Device lifecycle
//!
//! [`Galaxybook::attach`] brings up every feature the device supports, in the
//! order the firmware expects, and [`Galaxybook::detach`] unwinds them. Optional
//! features that fail to initialize are logged and left out; only a failure to
//! switch the device on aborts the attach.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gb_error::{GalaxybookError, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::acpi::{AcpiHandle, AcpiNamespace};
use crate::attributes::{format_bool, format_u8, parse_bool, parse_u8, DeviceAttribute};
use crate::config::DriverConfig;
use crate::constants::sasb;
use crate::controls::{
    AllowRecording, BatteryThreshold, KbdBacklight, PerformanceMode, StartOnLidOpen, UsbCharge,
};
use crate::executor::Executor;
use crate::fan::{FanInfo, FanResolver};
use crate::hotkey::{HotkeyActions, HotkeyDispatcher};
use crate::hwmon::{self, FanHwmon, FanReading};
use crate::input::{self, EventSink};
use crate::negotiator::{enable_feature, enable_notifications};
use crate::profile::{PlatformProfile, ProfileState};
use crate::quirks::Capabilities;
use crate::workqueue::WorkItem;

/// Everything the deferred hotkey work needs, shared with the work closures
pub struct DeviceContext {
    exec: Executor,
    sink: Arc<dyn EventSink>,
    capabilities: Capabilities,
    kbd_backlight: Option<KbdBacklight>,
    start_on_lid_open: Option<StartOnLidOpen>,
    usb_charge: Option<UsbCharge>,
    allow_recording: Option<AllowRecording>,
    battery: Option<BatteryThreshold>,
    performance: Option<PerformanceMode>,
    fans: Option<FanResolver>,
}

impl DeviceContext {
    fn kbd_backlight_hotkey(&self) {
        let Some(kbd) = &self.kbd_backlight else {
            return;
        };
        match kbd.cycle(&self.exec) {
            Ok(level) => self.sink.kbd_backlight_changed(level),
            Err(err) => warn!("failed to cycle keyboard backlight: {}", err),
        }
    }

    fn allow_recording_hotkey(&self) {
        if let Some(recording) = &self.allow_recording {
            if let Err(err) = recording.toggle(&self.exec) {
                warn!("failed to toggle allow_recording: {}", err);
            }
        }
    }

    fn performance_mode_hotkey(&self) {
        let Some(performance) = &self.performance else {
            return;
        };
        match performance.cycle(&self.exec) {
            Ok(profile) => self.sink.platform_profile_changed(profile),
            Err(err) => warn!("failed to cycle platform profile: {}", err),
        }
    }
}

/// Initialize an optional feature; a failure disables it instead of failing the attach
fn optional<T>(name: &str, enabled: bool, init: impl FnOnce() -> Result<T>) -> Option<T> {
    if !enabled {
        debug!("{} is disabled", name);
        return None;
    }
    match init() {
        Ok(feature) => {
            debug!("initialized {}", name);
            Some(feature)
        }
        Err(err) => {
            warn!("failed to initialize {}; it will not be available: {}", name, err);
            None
        }
    }
}

fn require<'a, T>(feature: &'a Option<T>, name: &str) -> Result<&'a T> {
    feature
        .as_ref()
        .ok_or_else(|| GalaxybookError::not_supported(name.to_string()))
}

/// Platform profile part of a [`DriverSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSnapshot {
    pub choices: Vec<PlatformProfile>,
    pub modes: Vec<(PlatformProfile, u8)>,
    pub readback: bool,
    pub state: ProfileState,
}

/// Serializable view of an attached device, for diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct DriverSnapshot {
    pub device: String,
    pub hardware_id: Option<String>,
    pub capabilities: Capabilities,
    pub features: Vec<&'static str>,
    pub attributes: Vec<&'static str>,
    pub kbd_backlight_brightness: Option<u8>,
    pub platform_profile: Option<ProfileSnapshot>,
    pub fans: Vec<FanInfo>,
    pub native_fans: Vec<String>,
    /// hwmon chip name, when fan speed is exposed
    pub hwmon_name: Option<String>,
    /// input device name, when notification keys are reported
    pub input_name: Option<&'static str>,
    pub i8042_filter: bool,
    pub notifications: bool,
}

/// An attached SCAI device
pub struct Galaxybook {
    ctx: Arc<DeviceContext>,
    dispatcher: HotkeyDispatcher,
    detached: AtomicBool,
}

impl Galaxybook {
    /// Switch the device on and initialize every available feature.
    ///
    /// `namespace` is used for fan discovery, `sink` receives key presses and
    /// hotkey driven changes.
    pub fn attach(
        device: Arc<dyn AcpiHandle>,
        namespace: Arc<dyn AcpiNamespace>,
        sink: Arc<dyn EventSink>,
        config: &DriverConfig,
    ) -> Result<Self> {
        let hardware_id = device.hardware_id();
        let mut caps = Capabilities::resolve(
            hardware_id.as_deref(),
            &config.quirks,
            &config.feature_overrides(),
        );
        debug!("resolved capabilities for {:?}: {:?}", hardware_id, caps);

        let exec = Executor::new(device);
        exec.set_device_enabled(true)?;

        if let Err(err) = enable_feature(&exec, sasb::POWER_MANAGEMENT) {
            warn!(
                "failed to initialize ACPI power management features; \
                 performance mode and battery threshold will not be available: {}",
                err
            );
            caps.performance_mode = false;
            caps.battery_threshold = false;
        }

        let performance = optional("performance_mode", caps.performance_mode, || {
            PerformanceMode::init(
                &exec,
                caps.legacy_performance_modes,
                caps.performance_readback,
                config.startup_profile,
            )
        });
        let battery = optional("battery charge_control_end_threshold", caps.battery_threshold, || {
            BatteryThreshold::init(&exec)
        });
        let start_on_lid_open = optional("start_on_lid_open", true, || StartOnLidOpen::init(&exec));
        let usb_charge = optional("usb_charge", true, || UsbCharge::init(&exec));
        let allow_recording = optional("allow_recording", caps.allow_recording, || {
            AllowRecording::init(&exec)
        });
        let kbd_backlight = optional("kbd_backlight", caps.kbd_backlight, || KbdBacklight::init(&exec));
        let fans = optional("fan speed", caps.fan_speed, || FanResolver::discover(namespace));

        let filter_enabled =
            caps.i8042_filter && (kbd_backlight.is_some() || allow_recording.is_some());
        if caps.i8042_filter && !filter_enabled {
            debug!("no hotkey features available; i8042 filter will not be installed");
        }

        let ctx = Arc::new(DeviceContext {
            exec,
            sink,
            capabilities: caps,
            kbd_backlight,
            start_on_lid_open,
            usb_charge,
            allow_recording,
            battery,
            performance,
            fans,
        });

        let notifications = match enable_notifications(&ctx.exec) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    "failed to enable ACPI notifications; hotkey events will not be reported: {}",
                    err
                );
                false
            }
        };

        let mut actions = HotkeyActions::default();
        if filter_enabled {
            if ctx.kbd_backlight.is_some() {
                let ctx = Arc::clone(&ctx);
                actions.kbd_backlight = Some(WorkItem::new("kbd_backlight_hotkey", move || {
                    ctx.kbd_backlight_hotkey()
                }));
            }
            if ctx.allow_recording.is_some() {
                let ctx = Arc::clone(&ctx);
                actions.allow_recording = Some(WorkItem::new("allow_recording_hotkey", move || {
                    ctx.allow_recording_hotkey()
                }));
            }
        }
        if notifications && ctx.performance.is_some() {
            let ctx = Arc::clone(&ctx);
            actions.performance_mode = Some(WorkItem::new("performance_mode_hotkey", move || {
                ctx.performance_mode_hotkey()
            }));
        }

        let dispatcher = match HotkeyDispatcher::new(actions, filter_enabled) {
            Ok(dispatcher) => dispatcher,
            Err(err) => {
                if let Err(off) = ctx.exec.set_device_enabled(false) {
                    warn!("failed to disable device after aborted attach: {}", off);
                }
                return Err(err);
            }
        };
        dispatcher.set_notify_enabled(notifications);

        let galaxybook = Self {
            ctx,
            dispatcher,
            detached: AtomicBool::new(false),
        };
        info!(
            "attached {} with features: {}",
            galaxybook.ctx.exec.handle().device_name(),
            galaxybook.features().join(", ")
        );
        Ok(galaxybook)
    }

    /// Stop event intake, wait for pending work and switch the device off.
    /// Errors are logged; calling this more than once does nothing.
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatcher.shutdown();
        if let Err(err) = self.ctx.exec.set_device_enabled(false) {
            warn!("failed to disable device: {}", err);
        }
        info!("detached {}", self.ctx.exec.handle().device_name());
    }

    pub fn is_detached(&self) -> bool {
        self.detached.load(Ordering::Acquire)
    }

    fn context(&self) -> Result<&DeviceContext> {
        if self.is_detached() {
            return Err(GalaxybookError::not_supported("device is detached"));
        }
        Ok(&self.ctx)
    }

    // ------------------------------------------------------------------------
    // Event entry points
    // ------------------------------------------------------------------------

    /// ACPI notify handler for the SCAI device
    pub fn notify(&self, event: u32) {
        self.dispatcher.on_notify(event, self.ctx.sink.as_ref());
    }

    /// i8042 filter. Never consumes the byte.
    pub fn i8042_filter(&self, data: u8, status: u8) -> bool {
        self.dispatcher.on_scancode(data, status)
    }

    /// Wait until all scheduled hotkey work has run
    pub fn flush_hotkeys(&self) {
        self.dispatcher.flush();
    }

    // ------------------------------------------------------------------------
    // Features
    // ------------------------------------------------------------------------

    pub fn capabilities(&self) -> Capabilities {
        self.ctx.capabilities
    }

    /// Names of the features that came up at attach
    pub fn features(&self) -> Vec<&'static str> {
        let ctx = &self.ctx;
        [
            ("kbd_backlight", ctx.kbd_backlight.is_some()),
            ("platform_profile", ctx.performance.is_some()),
            ("charge_control_end_threshold", ctx.battery.is_some()),
            ("start_on_lid_open", ctx.start_on_lid_open.is_some()),
            ("usb_charge", ctx.usb_charge.is_some()),
            ("allow_recording", ctx.allow_recording.is_some()),
            ("fan_speed", ctx.fans.is_some()),
            ("i8042_filter", self.dispatcher.filter_enabled()),
            ("acpi_notify", self.dispatcher.notify_enabled()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .collect()
    }

    pub fn kbd_backlight_max_brightness(&self) -> Result<u8> {
        Ok(require(&self.context()?.kbd_backlight, "kbd_backlight")?.max_brightness())
    }

    pub fn kbd_backlight_brightness(&self) -> Result<u8> {
        let ctx = self.context()?;
        require(&ctx.kbd_backlight, "kbd_backlight")?.get(&ctx.exec)
    }

    pub fn set_kbd_backlight_brightness(&self, level: u8) -> Result<()> {
        let ctx = self.context()?;
        require(&ctx.kbd_backlight, "kbd_backlight")?.set(&ctx.exec, level)
    }

    pub fn platform_profile(&self) -> Result<ProfileState> {
        let ctx = self.context()?;
        require(&ctx.performance, "platform_profile")?.get(&ctx.exec)
    }

    pub fn set_platform_profile(&self, profile: PlatformProfile) -> Result<()> {
        let ctx = self.context()?;
        require(&ctx.performance, "platform_profile")?.set(&ctx.exec, profile)
    }

    pub fn platform_profile_choices(&self) -> Result<Vec<PlatformProfile>> {
        Ok(require(&self.context()?.performance, "platform_profile")?.choices())
    }

    pub fn cycle_platform_profile(&self) -> Result<PlatformProfile> {
        let ctx = self.context()?;
        require(&ctx.performance, "platform_profile")?.cycle(&ctx.exec)
    }

    pub fn charge_control_end_threshold(&self) -> Result<u8> {
        let ctx = self.context()?;
        require(&ctx.battery, "charge_control_end_threshold")?.get(&ctx.exec)
    }

    pub fn set_charge_control_end_threshold(&self, value: u8) -> Result<()> {
        let ctx = self.context()?;
        require(&ctx.battery, "charge_control_end_threshold")?.set(&ctx.exec, value)
    }

    /// hwmon view of the discovered fans
    pub fn hwmon(&self) -> Result<FanHwmon<'_>> {
        Ok(FanHwmon::new(require(&self.context()?.fans, "fan_speed")?))
    }

    /// `fan_speed_rpm` attribute of fan `index`
    pub fn fan_speed_rpm(&self, index: usize) -> Result<String> {
        self.hwmon()?.fan_speed_rpm(index)
    }

    /// Current speed of every fan that can be read
    pub fn fan_readings(&self) -> Result<Vec<FanReading>> {
        Ok(self.hwmon()?.read_all())
    }

    // ------------------------------------------------------------------------
    // Text attributes
    // ------------------------------------------------------------------------

    /// Whether `attr` was created at attach
    pub fn has_attribute(&self, attr: DeviceAttribute) -> bool {
        let ctx = &self.ctx;
        match attr {
            DeviceAttribute::StartOnLidOpen => ctx.start_on_lid_open.is_some(),
            DeviceAttribute::UsbCharge => ctx.usb_charge.is_some(),
            DeviceAttribute::AllowRecording => ctx.allow_recording.is_some(),
            DeviceAttribute::ChargeControlEndThreshold => ctx.battery.is_some(),
        }
    }

    pub fn attributes(&self) -> Vec<&'static str> {
        DeviceAttribute::ALL
            .into_iter()
            .filter(|attr| self.has_attribute(*attr))
            .map(DeviceAttribute::name)
            .collect()
    }

    /// Read an attribute as its sysfs text
    pub fn attribute_show(&self, attr: DeviceAttribute) -> Result<String> {
        let ctx = self.context()?;
        let name = attr.name();
        match attr {
            DeviceAttribute::StartOnLidOpen => {
                Ok(format_bool(require(&ctx.start_on_lid_open, name)?.get(&ctx.exec)?))
            }
            DeviceAttribute::UsbCharge => Ok(format_bool(require(&ctx.usb_charge, name)?.get(&ctx.exec)?)),
            DeviceAttribute::AllowRecording => {
                Ok(format_bool(require(&ctx.allow_recording, name)?.get(&ctx.exec)?))
            }
            DeviceAttribute::ChargeControlEndThreshold => {
                Ok(format_u8(require(&ctx.battery, name)?.get(&ctx.exec)?))
            }
        }
    }

    /// Write an attribute from its sysfs text; returns the number of bytes consumed
    pub fn attribute_store(&self, attr: DeviceAttribute, input: &str) -> Result<usize> {
        let ctx = self.context()?;
        if input.is_empty() {
            return Err(GalaxybookError::invalid_input(input, "empty write"));
        }
        let name = attr.name();
        match attr {
            DeviceAttribute::StartOnLidOpen => {
                let feature = require(&ctx.start_on_lid_open, name)?;
                feature.set(&ctx.exec, parse_bool(input)?)?;
            }
            DeviceAttribute::UsbCharge => {
                let feature = require(&ctx.usb_charge, name)?;
                feature.set(&ctx.exec, parse_bool(input)?)?;
            }
            DeviceAttribute::AllowRecording => {
                let feature = require(&ctx.allow_recording, name)?;
                feature.set(&ctx.exec, parse_bool(input)?)?;
            }
            DeviceAttribute::ChargeControlEndThreshold => {
                let feature = require(&ctx.battery, name)?;
                feature.set(&ctx.exec, parse_u8(input)?)?;
            }
        }
        Ok(input.len())
    }

    // ------------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------------

    /// Collect cached state without calling the firmware
    pub fn snapshot(&self) -> DriverSnapshot {
        let ctx = &self.ctx;
        let handle = ctx.exec.handle();
        DriverSnapshot {
            device: handle.device_name(),
            hardware_id: handle.hardware_id(),
            capabilities: ctx.capabilities,
            features: self.features(),
            attributes: self.attributes(),
            kbd_backlight_brightness: ctx.kbd_backlight.as_ref().map(KbdBacklight::cached),
            platform_profile: ctx.performance.as_ref().map(|perf| ProfileSnapshot {
                choices: perf.choices(),
                modes: perf
                    .choices()
                    .into_iter()
                    .filter_map(|p| perf.map().get(p).map(|v| (p, v)))
                    .collect(),
                readback: perf.has_readback(),
                state: perf.cached(),
            }),
            fans: ctx.fans.as_ref().map(FanResolver::info).unwrap_or_default(),
            native_fans: ctx
                .fans
                .as_ref()
                .map(|fans| fans.native_fans().to_vec())
                .unwrap_or_default(),
            hwmon_name: ctx.fans.as_ref().map(|_| hwmon::chip_name()),
            input_name: self.dispatcher.notify_enabled().then_some(input::INPUT_NAME),
            i8042_filter: self.dispatcher.filter_enabled(),
            notifications: self.dispatcher.notify_enabled(),
        }
    }

    pub fn snapshot_to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshot())?)
    }
}

impl Drop for Galaxybook {
    fn drop(&mut self) {
        self.detach();
    }
}
