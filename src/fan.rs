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

//! Fan discovery and speed resolution
//!
//! Fans are ACPI `PNP0C0B` devices. Fans that implement the full ACPI 4.0 fan
//! interface are left to the OS fan driver. The rest report their speed either
//! through `_FST` or, on firmware where `_FST` is broken, as a level index in the
//! shared EC field `FANS` that is translated through the fan's `FANT` table.

use std::sync::Arc;

use gb_error::{GalaxybookError, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::acpi::{AcpiHandle, AcpiNamespace, AcpiObject};
use crate::constants::fan;

/// Where a fan's speed comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "levels")]
pub enum FanSpeedSource {
    /// The fan's own `_FST` method
    Fst,
    /// RPM per speed level, indexed by the EC `FANS` value
    LevelTable(Vec<u32>),
}

/// One discovered fan
pub struct FanDescriptor {
    handle: Arc<dyn AcpiHandle>,
    name: String,
    description: String,
    source: FanSpeedSource,
}

impl FanDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> &FanSpeedSource {
        &self.source
    }

    pub fn uses_fst(&self) -> bool {
        matches!(self.source, FanSpeedSource::Fst)
    }
}

impl std::fmt::Debug for FanDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("source", &self.source)
            .finish()
    }
}

/// Serializable view of a fan for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanInfo {
    pub name: String,
    pub description: String,
    pub source: FanSpeedSource,
}

impl From<&FanDescriptor> for FanInfo {
    fn from(fan: &FanDescriptor) -> Self {
        Self {
            name: fan.name.clone(),
            description: fan.description.clone(),
            source: fan.source.clone(),
        }
    }
}

fn integer(obj: &AcpiObject, what: &str) -> Result<u64> {
    obj.as_integer().ok_or_else(|| {
        GalaxybookError::invalid_value(what, format!("expected integer, got {}", obj.type_name()))
    })
}

/// Read the speed reported by `_FST`
fn read_fst(handle: &dyn AcpiHandle) -> Result<u32> {
    let obj = handle
        .evaluate(fan::FST, &[])
        .map_err(|status| status.into_error(fan::FST))?;
    let speed = match obj.as_package() {
        Some(pkg) if pkg.len() == fan::FST_PACKAGE_LEN => {
            integer(&pkg[fan::FST_SPEED_INDEX], "_FST speed")?
        }
        _ => {
            return Err(GalaxybookError::invalid_value(
                "_FST",
                format!("expected package of {}", fan::FST_PACKAGE_LEN),
            ))
        }
    };
    u32::try_from(speed).map_err(|_| GalaxybookError::unexpected("_FST speed", speed))
}

/// Build the RPM table from `FANT`: a leading 0, each entry plus 0x0a, then a
/// synthesized top level 1000 above the highest entry.
fn read_level_table(handle: &dyn AcpiHandle) -> Result<Vec<u32>> {
    let obj = handle
        .evaluate(fan::SPEED_LIST, &[])
        .map_err(|status| status.into_error(fan::SPEED_LIST))?;
    let entries = match obj.as_package() {
        Some(pkg) if !pkg.is_empty() => pkg,
        _ => {
            return Err(GalaxybookError::invalid_value(
                "FANT",
                "expected a non-empty package",
            ))
        }
    };

    let mut levels = Vec::with_capacity(entries.len() + 2);
    levels.push(0);
    for (i, entry) in entries.iter().enumerate() {
        let value = integer(entry, &format!("FANT[{}]", i))?;
        let rpm = u32::try_from(value)
            .ok()
            .and_then(|v| v.checked_add(fan::SPEED_LIST_OFFSET))
            .ok_or_else(|| GalaxybookError::unexpected(format!("FANT[{}]", i), value))?;
        levels.push(rpm);
    }

    // levels always holds at least one FANT entry here
    let highest = levels[levels.len() - 1];
    let top = highest
        .checked_add(fan::TOP_LEVEL_INCREMENT)
        .ok_or_else(|| GalaxybookError::unexpected("FANT top level", highest as u64))?;
    levels.push(top);
    Ok(levels)
}

/// Translate the current `FANS` level through a level table
fn read_table_speed(namespace: &dyn AcpiNamespace, levels: &[u32]) -> Result<(u32, usize)> {
    let obj = namespace
        .evaluate_path(fan::SPEED_VALUE)
        .map_err(|status| status.into_error(fan::SPEED_VALUE))?;
    let level = integer(&obj, "FANS")?;
    let speed = usize::try_from(level)
        .ok()
        .and_then(|i| levels.get(i).map(|rpm| (*rpm, i)))
        .ok_or_else(|| GalaxybookError::unexpected("FANS speed level", level))?;
    Ok(speed)
}

/// A fan with the full ACPI 4.0 method set is handled by the generic ACPI fan driver
fn is_acpi4_fan(handle: &dyn AcpiHandle) -> bool {
    [fan::FIF, fan::FPS, fan::FSL, fan::FST]
        .iter()
        .all(|m| handle.has_method(m))
}

/// All fans the driver reports speed for
pub struct FanResolver {
    namespace: Arc<dyn AcpiNamespace>,
    fans: Vec<FanDescriptor>,
    native_fans: Vec<String>,
}

impl std::fmt::Debug for FanResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanResolver")
            .field("fans", &self.fans)
            .field("native_fans", &self.native_fans)
            .finish_non_exhaustive()
    }
}

impl FanResolver {
    /// Enumerate fan devices and classify each one.
    ///
    /// Individual fans that cannot be set up are logged and skipped. Fails only
    /// when no fan at all could be added.
    pub fn discover(namespace: Arc<dyn AcpiNamespace>) -> Result<Self> {
        let mut resolver = Self {
            namespace,
            fans: Vec::new(),
            native_fans: Vec::new(),
        };

        for handle in resolver.namespace.get_devices(fan::DEVICE_ID) {
            let name = handle.device_name();
            info!("found fan device {}", name);
            if is_acpi4_fan(handle.as_ref()) {
                info!(
                    "fan device {} should already be available as an ACPI fan; skipping",
                    name
                );
                resolver.native_fans.push(name);
                continue;
            }
            if resolver.fans.len() >= fan::MAX_FAN_COUNT {
                error!(
                    "maximum number of {} fans has already been reached",
                    fan::MAX_FAN_COUNT
                );
                continue;
            }
            match resolver.add_fan(handle) {
                Ok(fan) => resolver.fans.push(fan),
                Err(err) => error!("unable to initialize fan speed for fan device {}: {}", name, err),
            }
        }

        if resolver.fans.is_empty() {
            return Err(GalaxybookError::capability("no usable fan devices"));
        }
        Ok(resolver)
    }

    fn add_fan(&self, handle: Arc<dyn AcpiHandle>) -> Result<FanDescriptor> {
        let name = handle.device_name();
        let description = handle.single_name().unwrap_or_else(|| name.clone());

        let use_table = match read_fst(handle.as_ref()) {
            Err(err) => {
                debug!(
                    "_FST failed on fan device {} ({}): {}; will attempt FANT and FANS",
                    name, description, err
                );
                true
            }
            Ok(0) if handle.has_method(fan::SPEED_LIST)
                && self.namespace.has_path(fan::SPEED_VALUE) =>
            {
                debug!(
                    "_FST on fan device {} ({}) returned 0; will attempt FANT and FANS",
                    name, description
                );
                true
            }
            Ok(_) => false,
        };

        let source = if use_table {
            if let Some(owner) = self.fans.iter().find(|f| !f.uses_fst()) {
                return Err(GalaxybookError::SharedRegisterInUse {
                    fan: name,
                    owner: owner.name.clone(),
                });
            }
            let levels = read_level_table(handle.as_ref())?;
            read_table_speed(self.namespace.as_ref(), &levels)?;
            info!(
                "initialized fan speed reporting for device {} ({}) with levels {:?}",
                name, description, levels
            );
            FanSpeedSource::LevelTable(levels)
        } else {
            info!(
                "initialized fan speed reporting for device {} ({}) using method _FST",
                name, description
            );
            FanSpeedSource::Fst
        };

        Ok(FanDescriptor {
            handle,
            name,
            description,
            source,
        })
    }

    pub fn fans(&self) -> &[FanDescriptor] {
        &self.fans
    }

    /// Fan devices left to the generic ACPI fan driver
    pub fn native_fans(&self) -> &[String] {
        &self.native_fans
    }

    pub fn len(&self) -> usize {
        self.fans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fans.is_empty()
    }

    pub fn fan(&self, index: usize) -> Option<&FanDescriptor> {
        self.fans.get(index)
    }

    /// Current speed in RPM of the fan at `index`
    pub fn speed(&self, index: usize) -> Result<u32> {
        let fan = self
            .fan(index)
            .ok_or_else(|| GalaxybookError::invalid_value("fan", format!("no fan {}", index)))?;
        match &fan.source {
            FanSpeedSource::Fst => {
                let speed = read_fst(fan.handle.as_ref())?;
                debug!(
                    "fan device {} ({}) reporting fan speed of {}",
                    fan.name, fan.description, speed
                );
                Ok(speed)
            }
            FanSpeedSource::LevelTable(levels) => {
                let (speed, level) = read_table_speed(self.namespace.as_ref(), levels)?;
                debug!(
                    "fan device {} ({}) reporting fan speed of {} (level {})",
                    fan.name, fan.description, speed, level
                );
                Ok(speed)
            }
        }
    }

    pub fn info(&self) -> Vec<FanInfo> {
        self.fans.iter().map(FanInfo::from).collect()
    }
}
