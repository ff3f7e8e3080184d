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

//! Firmware boundary
//!
//! The host supplies the ACPI interpreter. The driver core only sees these two
//! traits: a handle bound to one enumerated device, and the namespace used for
//! device enumeration and absolute path lookups.

use std::sync::Arc;

use gb_error::GalaxybookError;

/// Value produced or consumed by an ACPI method evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcpiObject {
    Integer(u64),
    Buffer(Vec<u8>),
    Package(Vec<AcpiObject>),
    String(String),
}

impl AcpiObject {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            AcpiObject::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_buffer(&self) -> Option<&[u8]> {
        match self {
            AcpiObject::Buffer(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_package(&self) -> Option<&[AcpiObject]> {
        match self {
            AcpiObject::Package(p) => Some(p),
            _ => None,
        }
    }

    /// Short type name used in log messages
    pub fn type_name(&self) -> &'static str {
        match self {
            AcpiObject::Integer(_) => "integer",
            AcpiObject::Buffer(_) => "buffer",
            AcpiObject::Package(_) => "package",
            AcpiObject::String(_) => "string",
        }
    }
}

/// Failure status returned by the interpreter
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AcpiStatus {
    #[error("AE_NOT_FOUND")]
    NotFound,
    #[error("{0}")]
    Failure(String),
}

impl AcpiStatus {
    /// Convert into the driver error for a named method or path
    pub fn into_error(self, method: &str) -> GalaxybookError {
        match self {
            AcpiStatus::NotFound => GalaxybookError::MethodNotFound {
                method: method.to_string(),
            },
            AcpiStatus::Failure(reason) => GalaxybookError::transport(method, reason),
        }
    }
}

/// Firmware call primitive bound to one ACPI device
#[cfg_attr(test, mockall::automock)]
pub trait AcpiHandle: Send + Sync {
    /// Evaluate a method relative to this device
    fn evaluate(&self, method: &str, args: &[AcpiObject]) -> Result<AcpiObject, AcpiStatus>;

    /// Whether a child object with this name exists under the device
    fn has_method(&self, method: &str) -> bool;

    /// Device name, e.g. `FAN0`
    fn device_name(&self) -> String;

    /// Optional description from the device's `_STR` or equivalent
    fn single_name(&self) -> Option<String>;

    /// ACPI hardware id (`_HID`), used to look up model quirks
    fn hardware_id(&self) -> Option<String> {
        None
    }
}

/// Device enumeration and absolute path evaluation
pub trait AcpiNamespace: Send + Sync {
    /// All present devices with the given hardware id
    fn get_devices(&self, hid: &str) -> Vec<Arc<dyn AcpiHandle>>;

    /// Evaluate an absolute namespace path such as `\_SB.PC00.LPCB.H_EC.FANS`
    fn evaluate_path(&self, path: &str) -> Result<AcpiObject, AcpiStatus>;

    fn has_path(&self, path: &str) -> bool;
}
