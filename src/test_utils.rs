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

//! Test utilities: a simulated SCAI firmware and fan namespace

#[cfg(test)]
pub mod fixtures {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use parking_lot::Mutex;

    use crate::acpi::{AcpiHandle, AcpiNamespace, AcpiObject, AcpiStatus};
    use crate::constants::{gunm, methods, performance_mode, sasb, sawb};
    use crate::sawb::{FrameLayout, Sawb};

    /// Mutable state of the simulated device
    #[derive(Debug, Clone)]
    pub struct FirmwareState {
        pub enabled: Option<bool>,
        pub kbd_level: u8,
        pub start_on_lid_open: u8,
        pub usb_charge: u8,
        pub allow_recording: u8,
        pub battery_threshold: u8,
        pub performance_mode: u8,
        pub supported_modes: Vec<u8>,
        /// Feature blocks that accept the enable handshake
        pub features: HashSet<u16>,
        pub performance_readback: bool,
        pub mode_list_available: bool,
        pub notifications_enabled: bool,
        /// Methods that report AE_NOT_FOUND
        pub missing_methods: HashSet<String>,
        /// Subsystems that answer every settings request with the failure sentinel
        pub failing_subsystems: HashSet<u16>,
        /// Echo the opposite bit of every accepted write
        pub echo_mismatch: bool,
        /// Raw request frames in call order
        pub calls: Vec<(String, Vec<u8>)>,
    }

    impl Default for FirmwareState {
        fn default() -> Self {
            Self {
                enabled: None,
                kbd_level: 0,
                start_on_lid_open: 1,
                usb_charge: 0,
                allow_recording: 0,
                battery_threshold: 0,
                performance_mode: performance_mode::mode::OPTIMIZED,
                supported_modes: vec![
                    performance_mode::mode::OPTIMIZED,
                    performance_mode::mode::QUIET,
                    performance_mode::mode::SILENT,
                    performance_mode::mode::PERFORMANCE,
                ],
                features: [
                    sasb::KBD_BACKLIGHT,
                    sasb::POWER_MANAGEMENT,
                    sasb::NOTIFICATIONS,
                    sasb::ALLOW_RECORDING,
                ]
                .into_iter()
                .collect(),
                performance_readback: true,
                mode_list_available: true,
                notifications_enabled: false,
                missing_methods: HashSet::new(),
                failing_subsystems: HashSet::new(),
                echo_mismatch: false,
                calls: Vec::new(),
            }
        }
    }

    /// Simulated SCAI device answering `CSFI`, `CSXI` and `SDLS`
    #[derive(Default)]
    pub struct SimulatedScai {
        pub state: Mutex<FirmwareState>,
    }

    impl SimulatedScai {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn with_state(state: FirmwareState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
            })
        }

        /// Number of vendor method calls seen so far
        pub fn call_count(&self) -> usize {
            self.state.lock().calls.len()
        }

        pub fn last_request(&self) -> Option<Vec<u8>> {
            self.state.lock().calls.last().map(|(_, bytes)| bytes.clone())
        }

        fn settings(state: &mut FirmwareState, req: &Sawb) -> Sawb {
            let mut resp = req.clone();
            resp.set_rflg(sawb::RFLG_SUCCESS);

            if state.failing_subsystems.contains(&req.sasb()) {
                resp.set_gunm(sawb::GUNM_FAIL);
                return resp;
            }

            if req.gunm() == gunm::feature_enable::GUNM {
                if state.features.contains(&req.sasb()) {
                    resp.set_gunm(gunm::feature_enable::GUNM_SUCCESS);
                }
                return resp;
            }

            match (req.sasb(), req.gunm()) {
                (sasb::KBD_BACKLIGHT, gunm::GET) => resp.set_gunm(state.kbd_level),
                (sasb::KBD_BACKLIGHT, gunm::SET) => state.kbd_level = req.guds(0),
                (sasb::POWER_MANAGEMENT, gunm::POWER_MANAGEMENT) => {
                    let (value, readback) = match (req.guds(0), req.guds(1)) {
                        (gunm::start_on_lid_open::GUDS, gunm::start_on_lid_open::GET) => {
                            (&mut state.start_on_lid_open, true)
                        }
                        (gunm::start_on_lid_open::GUDS, gunm::start_on_lid_open::SET) => {
                            (&mut state.start_on_lid_open, false)
                        }
                        (gunm::battery_charge_control::GUDS, gunm::battery_charge_control::GET) => {
                            (&mut state.battery_threshold, true)
                        }
                        (gunm::battery_charge_control::GUDS, gunm::battery_charge_control::SET) => {
                            (&mut state.battery_threshold, false)
                        }
                        _ => {
                            resp.set_gunm(sawb::GUNM_FAIL);
                            return resp;
                        }
                    };
                    if readback {
                        resp.set_guds(1, *value);
                    } else {
                        *value = req.guds(2);
                        if state.echo_mismatch {
                            resp.set_guds(2, req.guds(2) ^ 1);
                        }
                    }
                }
                (sasb::USB_CHARGE_GET, gunm::usb_charge::GET) => resp.set_gunm(state.usb_charge),
                (sasb::USB_CHARGE_SET, value) => {
                    state.usb_charge = value & 1;
                    if state.echo_mismatch {
                        resp.set_gunm(value ^ 1);
                    }
                }
                (sasb::ALLOW_RECORDING, gunm::GET) => resp.set_gunm(state.allow_recording),
                (sasb::ALLOW_RECORDING, gunm::SET) => {
                    state.allow_recording = req.guds(0);
                    if state.echo_mismatch {
                        resp.set_guds(0, req.guds(0) ^ 1);
                    }
                }
                (sasb::NOTIFICATIONS, gunm::acpi_notify::GUNM) => state.notifications_enabled = true,
                _ => resp.set_gunm(sawb::GUNM_FAIL),
            }
            resp
        }

        fn performance(state: &mut FirmwareState, req: &Sawb) -> Sawb {
            let mut resp = req.clone();
            resp.set_rflg(sawb::RFLG_SUCCESS);
            match req.subn() {
                performance_mode::SUBN_LIST if state.mode_list_available => {
                    resp.set_iob(0, state.supported_modes.len() as u8);
                    for (i, mode) in state.supported_modes.iter().take(9).enumerate() {
                        resp.set_iob(i + 1, *mode);
                    }
                }
                performance_mode::SUBN_GET if state.performance_readback => {
                    resp.set_iob(0, state.performance_mode)
                }
                performance_mode::SUBN_SET => state.performance_mode = req.iob(0),
                _ => resp.set_gunm(sawb::GUNM_FAIL),
            }
            resp
        }
    }

    impl AcpiHandle for SimulatedScai {
        fn evaluate(&self, method: &str, args: &[AcpiObject]) -> Result<AcpiObject, AcpiStatus> {
            let mut state = self.state.lock();
            if state.missing_methods.contains(method) {
                return Err(AcpiStatus::NotFound);
            }

            if method == methods::ENABLE {
                state.enabled = match args.first().and_then(AcpiObject::as_integer) {
                    Some(v) => Some(v != 0),
                    None => return Err(AcpiStatus::Failure("AE_AML_OPERAND_TYPE".into())),
                };
                return Ok(AcpiObject::Integer(0));
            }

            let layout = match method {
                methods::SETTINGS => FrameLayout::Settings,
                methods::PERFORMANCE_MODE => FrameLayout::PerformanceMode,
                _ => return Err(AcpiStatus::NotFound),
            };
            let bytes = args
                .first()
                .and_then(AcpiObject::as_buffer)
                .ok_or_else(|| AcpiStatus::Failure("AE_AML_OPERAND_TYPE".into()))?;
            state.calls.push((method.to_string(), bytes.to_vec()));
            let req = Sawb::from_response(layout, bytes)
                .ok_or_else(|| AcpiStatus::Failure("AE_AML_BUFFER_LIMIT".into()))?;

            let resp = match layout {
                FrameLayout::Settings => Self::settings(&mut state, &req),
                FrameLayout::PerformanceMode => Self::performance(&mut state, &req),
            };
            Ok(AcpiObject::Buffer(resp.into_bytes()))
        }

        fn has_method(&self, method: &str) -> bool {
            !self.state.lock().missing_methods.contains(method)
        }

        fn device_name(&self) -> String {
            "SCAI".to_string()
        }

        fn single_name(&self) -> Option<String> {
            None
        }

        fn hardware_id(&self) -> Option<String> {
            Some("SAM0429".to_string())
        }
    }

    /// Simulated fan device with a fixed set of method results
    pub struct SimulatedFan {
        pub name: String,
        pub description: Option<String>,
        pub methods: Mutex<HashMap<String, Result<AcpiObject, AcpiStatus>>>,
    }

    impl SimulatedFan {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                description: Some(format!("{} description", name)),
                methods: Mutex::new(HashMap::new()),
            }
        }

        pub fn with_method(self, method: &str, result: Result<AcpiObject, AcpiStatus>) -> Self {
            self.methods.lock().insert(method.to_string(), result);
            self
        }

        /// Fan reporting `speed` through `_FST`
        pub fn standard(name: &str, speed: u64) -> Self {
            Self::new(name).with_method("_FST", Ok(fst_package(speed)))
        }

        /// Fan whose speed must come from the `FANT` level table
        pub fn table(name: &str, levels: &[u64]) -> Self {
            Self::new(name)
                .with_method("_FST", Err(AcpiStatus::Failure("AE_ERROR".into())))
                .with_method(
                    "FANT",
                    Ok(AcpiObject::Package(
                        levels.iter().map(|v| AcpiObject::Integer(*v)).collect(),
                    )),
                )
        }
    }

    pub fn fst_package(speed: u64) -> AcpiObject {
        AcpiObject::Package(vec![
            AcpiObject::Integer(0),
            AcpiObject::Integer(0),
            AcpiObject::Integer(speed),
        ])
    }

    impl AcpiHandle for SimulatedFan {
        fn evaluate(&self, method: &str, _args: &[AcpiObject]) -> Result<AcpiObject, AcpiStatus> {
            self.methods
                .lock()
                .get(method)
                .cloned()
                .unwrap_or(Err(AcpiStatus::NotFound))
        }

        fn has_method(&self, method: &str) -> bool {
            self.methods.lock().contains_key(method)
        }

        fn device_name(&self) -> String {
            self.name.clone()
        }

        fn single_name(&self) -> Option<String> {
            self.description.clone()
        }
    }

    /// Namespace holding fan devices and absolute path values
    #[derive(Default)]
    pub struct SimulatedNamespace {
        pub fans: Vec<Arc<SimulatedFan>>,
        pub paths: Mutex<HashMap<String, AcpiObject>>,
    }

    impl SimulatedNamespace {
        pub fn new(fans: Vec<SimulatedFan>) -> Self {
            Self {
                fans: fans.into_iter().map(Arc::new).collect(),
                paths: Mutex::new(HashMap::new()),
            }
        }

        pub fn with_path(self, path: &str, value: AcpiObject) -> Self {
            self.paths.lock().insert(path.to_string(), value);
            self
        }

        pub fn set_path(&self, path: &str, value: AcpiObject) {
            self.paths.lock().insert(path.to_string(), value);
        }
    }

    impl AcpiNamespace for SimulatedNamespace {
        fn get_devices(&self, hid: &str) -> Vec<Arc<dyn AcpiHandle>> {
            if hid != crate::constants::fan::DEVICE_ID {
                return Vec::new();
            }
            self.fans
                .iter()
                .map(|fan| Arc::clone(fan) as Arc<dyn AcpiHandle>)
                .collect()
        }

        fn evaluate_path(&self, path: &str) -> Result<AcpiObject, AcpiStatus> {
            self.paths.lock().get(path).cloned().ok_or(AcpiStatus::NotFound)
        }

        fn has_path(&self, path: &str) -> bool {
            self.paths.lock().contains_key(path)
        }
    }

    /// Executor bound to a fresh simulated device
    pub fn simulated_executor() -> (Arc<SimulatedScai>, crate::executor::Executor) {
        let scai = SimulatedScai::new();
        let exec = crate::executor::Executor::new(scai.clone());
        (scai, exec)
    }

    pub fn simulated_executor_with(
        state: FirmwareState,
    ) -> (Arc<SimulatedScai>, crate::executor::Executor) {
        let scai = SimulatedScai::with_state(state);
        let exec = crate::executor::Executor::new(scai.clone());
        (scai, exec)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use crate::acpi::{AcpiHandle, AcpiObject};
    use crate::executor::AcpiMethod;
    use crate::sawb::Sawb;

    #[test]
    fn test_simulated_kbd_round_trip() {
        let (scai, exec) = simulated_executor();
        exec.call(AcpiMethod::Settings, &Sawb::settings_request(0x78, 0x82, &[2]), "set")
            .unwrap();
        let resp = exec
            .call(AcpiMethod::Settings, &Sawb::settings_request(0x78, 0x81, &[]), "get")
            .unwrap();
        assert_eq!(resp.gunm(), 2);
        assert_eq!(scai.call_count(), 2);
    }

    #[test]
    fn test_simulated_missing_method() {
        let scai = SimulatedScai::new();
        scai.state.lock().missing_methods.insert("SDLS".into());
        assert!(scai.evaluate("SDLS", &[AcpiObject::Integer(1)]).is_err());
        assert!(!scai.has_method("SDLS"));
    }
}
