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

//! ACPI transaction executor
//!
//! Sends one SAWB frame to `CSFI` or `CSXI` and validates the response envelope.
//! Calls are not serialized here; the firmware tolerates concurrent use.

use std::sync::Arc;

use gb_error::{GalaxybookError, Result};
use tracing::{debug, error};

use crate::acpi::{AcpiHandle, AcpiObject};
use crate::constants::{methods, sawb};
use crate::logger::{debug_buffer, hex_dump};
use crate::sawb::{FrameLayout, Sawb};

/// Vendor methods that accept SAWB frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcpiMethod {
    Settings,
    PerformanceMode,
}

impl AcpiMethod {
    pub const fn name(self) -> &'static str {
        match self {
            AcpiMethod::Settings => methods::SETTINGS,
            AcpiMethod::PerformanceMode => methods::PERFORMANCE_MODE,
        }
    }

    pub const fn layout(self) -> FrameLayout {
        match self {
            AcpiMethod::Settings => FrameLayout::Settings,
            AcpiMethod::PerformanceMode => FrameLayout::PerformanceMode,
        }
    }
}

/// Executes SAWB transactions against the SCAI device
pub struct Executor {
    handle: Arc<dyn AcpiHandle>,
}

impl Executor {
    pub fn new(handle: Arc<dyn AcpiHandle>) -> Self {
        Self { handle }
    }

    pub fn handle(&self) -> &Arc<dyn AcpiHandle> {
        &self.handle
    }

    /// Send `request` and return the validated response.
    ///
    /// `purpose` is a short phrase such as `"setting kbd_backlight brightness"` used in
    /// log and error messages.
    pub fn call(&self, method: AcpiMethod, request: &Sawb, purpose: &str) -> Result<Sawb> {
        let name = method.name();
        let layout = method.layout();
        debug_assert_eq!(request.layout(), layout);

        debug_buffer(&format!("{} request for {}", name, purpose), request.as_bytes());

        let result = self
            .handle
            .evaluate(name, &[AcpiObject::Buffer(request.as_bytes().to_vec())])
            .map_err(|status| {
                error!("failed {} with ACPI method {}; got {}", purpose, name, status);
                status.into_error(name)
            })?;

        let bytes = match result.as_buffer() {
            Some(bytes) => bytes,
            None => {
                error!(
                    "failed {} with ACPI method {}; response was a {}, not a buffer",
                    purpose,
                    name,
                    result.type_name()
                );
                return Err(GalaxybookError::NotABuffer {
                    method: name.to_string(),
                    purpose: purpose.to_string(),
                });
            }
        };

        debug_buffer(&format!("{} response for {}", name, purpose), bytes);

        let response = match Sawb::from_response(layout, bytes) {
            Some(response) => response,
            None => {
                error!(
                    "failed {} with ACPI method {}; response length mismatch, raw response:\n{}",
                    purpose,
                    name,
                    hex_dump(bytes)
                );
                return Err(GalaxybookError::LengthMismatch {
                    method: name.to_string(),
                    purpose: purpose.to_string(),
                    expected: layout.len(),
                    actual: bytes.len(),
                });
            }
        };

        if response.rflg() != sawb::RFLG_SUCCESS {
            error!(
                "failed {} with ACPI method {}; device did not respond with success code 0x{:02x}, raw response:\n{}",
                purpose,
                name,
                sawb::RFLG_SUCCESS,
                hex_dump(bytes)
            );
            return Err(GalaxybookError::MissingSuccessFlag {
                method: name.to_string(),
                purpose: purpose.to_string(),
                expected: sawb::RFLG_SUCCESS,
                found: response.rflg(),
            });
        }

        if response.gunm() == sawb::GUNM_FAIL {
            error!(
                "failed {} with ACPI method {}; device responded with failure code 0x{:02x}, raw response:\n{}",
                purpose,
                name,
                sawb::GUNM_FAIL,
                hex_dump(bytes)
            );
            return Err(GalaxybookError::DeviceFailure {
                method: name.to_string(),
                purpose: purpose.to_string(),
                code: sawb::GUNM_FAIL,
            });
        }

        Ok(response)
    }

    /// Switch the SCAI device on or off with `SDLS`
    pub fn set_device_enabled(&self, enabled: bool) -> Result<()> {
        let arg = if enabled {
            methods::ENABLE_ON
        } else {
            methods::ENABLE_OFF
        };
        debug!("evaluating {} with {}", methods::ENABLE, arg);
        self.handle
            .evaluate(methods::ENABLE, &[AcpiObject::Integer(arg)])
            .map(|_| ())
            .map_err(|status| {
                error!(
                    "failed to {} device with ACPI method {}; got {}",
                    if enabled { "enable" } else { "disable" },
                    methods::ENABLE,
                    status
                );
                status.into_error(methods::ENABLE)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acpi::{AcpiStatus, MockAcpiHandle};
    use gb_error::ErrorKind;

    fn response(len: usize, rflg: u8, gunm: u8) -> AcpiObject {
        let mut buf = vec![0u8; len];
        buf[0] = 0x43;
        buf[1] = 0x58;
        buf[4] = rflg;
        buf[5] = gunm;
        AcpiObject::Buffer(buf)
    }

    fn executor_returning(result: std::result::Result<AcpiObject, AcpiStatus>) -> Executor {
        let mut mock = MockAcpiHandle::new();
        mock.expect_evaluate()
            .times(1)
            .returning(move |_, _| result.clone());
        Executor::new(Arc::new(mock))
    }

    fn request() -> Sawb {
        Sawb::settings_request(0x78, 0x81, &[])
    }

    #[test]
    fn test_call_success() {
        let exec = executor_returning(Ok(response(21, 0xaa, 0x02)));
        let resp = exec.call(AcpiMethod::Settings, &request(), "getting kbd_backlight").unwrap();
        assert_eq!(resp.gunm(), 0x02);
    }

    #[test]
    fn test_call_passes_request_buffer() {
        let mut mock = MockAcpiHandle::new();
        mock.expect_evaluate()
            .withf(|method, args| {
                method.to_string() == "CSFI"
                    && matches!(args, [AcpiObject::Buffer(b)] if b.len() == 21 && b[5] == 0x81)
            })
            .times(1)
            .returning(|_, _| Ok(response(21, 0xaa, 0x00)));
        let exec = Executor::new(Arc::new(mock));
        exec.call(AcpiMethod::Settings, &request(), "getting kbd_backlight").unwrap();
    }

    #[test]
    fn test_call_method_not_found() {
        let exec = executor_returning(Err(AcpiStatus::NotFound));
        let err = exec.call(AcpiMethod::Settings, &request(), "x").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[test]
    fn test_call_not_a_buffer() {
        let exec = executor_returning(Ok(AcpiObject::Integer(0)));
        let err = exec.call(AcpiMethod::Settings, &request(), "x").unwrap_err();
        assert!(matches!(err, GalaxybookError::NotABuffer { .. }));
    }

    #[test]
    fn test_call_length_mismatch() {
        let exec = executor_returning(Ok(response(20, 0xaa, 0x00)));
        let err = exec.call(AcpiMethod::Settings, &request(), "x").unwrap_err();
        assert!(matches!(
            err,
            GalaxybookError::LengthMismatch { expected: 21, actual: 20, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::Envelope);
    }

    #[test]
    fn test_call_missing_success_flag() {
        let exec = executor_returning(Ok(response(21, 0x00, 0x00)));
        let err = exec.call(AcpiMethod::Settings, &request(), "x").unwrap_err();
        assert!(matches!(err, GalaxybookError::MissingSuccessFlag { found: 0x00, .. }));
    }

    #[test]
    fn test_call_failure_sentinel() {
        let exec = executor_returning(Ok(response(21, 0xaa, 0xff)));
        let err = exec.call(AcpiMethod::Settings, &request(), "x").unwrap_err();
        assert!(matches!(err, GalaxybookError::DeviceFailure { code: 0xff, .. }));
    }

    #[test]
    fn test_performance_layout_length() {
        let exec = executor_returning(Ok(response(21, 0xaa, 0x00)));
        let req = Sawb::performance_request(&crate::constants::performance_mode::GUID, 0x51, 0x02, &[]);
        let err = exec.call(AcpiMethod::PerformanceMode, &req, "x").unwrap_err();
        assert!(matches!(err, GalaxybookError::LengthMismatch { expected: 256, .. }));
    }

    #[test]
    fn test_set_device_enabled_argument() {
        let mut mock = MockAcpiHandle::new();
        mock.expect_evaluate()
            .withf(|method, args| {
                method.to_string() == "SDLS" && args.len() == 1 && args[0] == AcpiObject::Integer(1)
            })
            .times(1)
            .returning(|_, _| Ok(AcpiObject::Integer(0)));
        mock.expect_evaluate()
            .withf(|method, args| {
                method.to_string() == "SDLS" && args.len() == 1 && args[0] == AcpiObject::Integer(0)
            })
            .times(1)
            .returning(|_, _| Ok(AcpiObject::Integer(0)));
        let exec = Executor::new(Arc::new(mock));
        exec.set_device_enabled(true).unwrap();
        exec.set_device_enabled(false).unwrap();
    }

    #[test]
    fn test_set_device_enabled_missing() {
        let exec = executor_returning(Err(AcpiStatus::NotFound));
        assert!(exec.set_device_enabled(true).unwrap_err().is_not_found());
    }
}
