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

//! Hotkey and ACPI notification dispatch
//!
//! The keyboard filter and the notify handler run in event context. They decode
//! the event and schedule deferred work; they never call firmware themselves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gb_error::Result;
use tracing::{debug, warn};

use crate::constants::{notify, scancode};
use crate::input::{key_for_event, EventSink};
use crate::workqueue::{WorkItem, WorkQueue};

/// Keys handled through the i8042 filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hotkey {
    KbdBacklight,
    AllowRecording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Down,
    Up,
}

/// Decoder for the extended scancodes of the vendor hotkeys
#[derive(Debug, Default)]
pub struct ScancodeFilter {
    extended: AtomicBool,
}

impl ScancodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte from the keyboard controller
    pub fn feed(&self, data: u8, status: u8) -> Option<(Hotkey, KeyTransition)> {
        if status & scancode::STR_AUXDATA != 0 {
            return None;
        }
        if data == scancode::EXTENDED {
            self.extended.store(true, Ordering::Relaxed);
            return None;
        }
        if !self.extended.swap(false, Ordering::Relaxed) {
            return None;
        }
        let key = match data {
            scancode::KBD_BACKLIGHT_KEYDOWN => (Hotkey::KbdBacklight, KeyTransition::Down),
            scancode::KBD_BACKLIGHT_KEYUP => (Hotkey::KbdBacklight, KeyTransition::Up),
            scancode::ALLOW_RECORDING_KEYDOWN => (Hotkey::AllowRecording, KeyTransition::Down),
            scancode::ALLOW_RECORDING_KEYUP => (Hotkey::AllowRecording, KeyTransition::Up),
            _ => return None,
        };
        debug!("hotkey: {:?} {:?}", key.0, key.1);
        Some(key)
    }
}

/// ACPI notifications raised by the SCAI device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyEvent {
    BatteryStateChanged,
    PerformanceModeHotkey,
    DeviceOnTable,
    DeviceOffTable,
    Unknown(u32),
}

impl NotifyEvent {
    pub fn from_code(code: u32) -> Self {
        match code {
            notify::BATTERY_STATE_CHANGED => NotifyEvent::BatteryStateChanged,
            notify::HOTKEY_PERFORMANCE_MODE => NotifyEvent::PerformanceModeHotkey,
            notify::DEVICE_ON_TABLE => NotifyEvent::DeviceOnTable,
            notify::DEVICE_OFF_TABLE => NotifyEvent::DeviceOffTable,
            other => NotifyEvent::Unknown(other),
        }
    }
}

/// Deferred actions for each hotkey; `None` when the feature is unavailable
#[derive(Default)]
pub struct HotkeyActions {
    pub kbd_backlight: Option<Arc<WorkItem>>,
    pub allow_recording: Option<Arc<WorkItem>>,
    pub performance_mode: Option<Arc<WorkItem>>,
}

impl HotkeyActions {
    fn items(&self) -> impl Iterator<Item = &Arc<WorkItem>> {
        [
            self.kbd_backlight.as_ref(),
            self.allow_recording.as_ref(),
            self.performance_mode.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Routes decoded events to deferred work and the input sink
pub struct HotkeyDispatcher {
    queue: WorkQueue,
    actions: HotkeyActions,
    filter: ScancodeFilter,
    filter_enabled: bool,
    notify_enabled: AtomicBool,
    accepting: AtomicBool,
}

impl HotkeyDispatcher {
    pub fn new(actions: HotkeyActions, filter_enabled: bool) -> Result<Self> {
        Ok(Self {
            queue: WorkQueue::new("galaxybook-hotkeys")?,
            actions,
            filter: ScancodeFilter::new(),
            filter_enabled,
            notify_enabled: AtomicBool::new(false),
            accepting: AtomicBool::new(true),
        })
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    /// Mark the notification path active once the device has acknowledged it
    pub fn set_notify_enabled(&self, enabled: bool) {
        self.notify_enabled.store(enabled, Ordering::Release);
    }

    pub fn notify_enabled(&self) -> bool {
        self.notify_enabled.load(Ordering::Acquire)
    }

    /// i8042 filter hook. Always returns false so the byte reaches the keyboard driver.
    pub fn on_scancode(&self, data: u8, status: u8) -> bool {
        if !self.filter_enabled || !self.accepting.load(Ordering::Acquire) {
            return false;
        }
        let action = match self.filter.feed(data, status) {
            Some((Hotkey::KbdBacklight, KeyTransition::Up)) => self.actions.kbd_backlight.as_ref(),
            Some((Hotkey::AllowRecording, KeyTransition::Up)) => {
                self.actions.allow_recording.as_ref()
            }
            _ => None,
        };
        if let Some(item) = action {
            self.queue.schedule(item);
        }
        false
    }

    /// ACPI notify hook
    pub fn on_notify(&self, code: u32, sink: &dyn EventSink) {
        if !self.notify_enabled() || !self.accepting.load(Ordering::Acquire) {
            debug!("ignoring notification 0x{:x}; notifications are not active", code);
            return;
        }
        let event = NotifyEvent::from_code(code);
        if let NotifyEvent::Unknown(code) = event {
            warn!("unknown ACPI notification event: 0x{:x}", code);
            return;
        }
        if event == NotifyEvent::PerformanceModeHotkey {
            if let Some(item) = self.actions.performance_mode.as_ref() {
                self.queue.schedule(item);
            }
        }
        debug!("input notification event: 0x{:x}", code);
        match key_for_event(code) {
            Some(key) => sink.report_key(key),
            None => warn!("unknown input notification event: 0x{:x}", code),
        }
    }

    /// Stop intake, cancel and wait for all work, then stop the worker
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
        for item in self.actions.items() {
            self.queue.cancel_sync(item);
        }
        self.queue.shutdown();
    }

    /// Wait for queued hotkey work to complete
    pub fn flush(&self) {
        self.queue.flush();
    }
}
