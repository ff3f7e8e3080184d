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

//! Logging setup and buffer formatting helpers

use std::fmt::Write;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_LEVEL: &str = "info";

const HEX_DUMP_WIDTH: usize = 16;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` takes precedence over `level`. Calling this more than once is
/// harmless; later calls keep the subscriber that is already installed.
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter {:?}", level))?,
    };

    if tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        tracing::debug!("global subscriber already installed");
    }
    Ok(())
}

/// Render a buffer as offset-prefixed hex, 16 bytes per line
pub fn hex_dump(buf: &[u8]) -> String {
    let mut out = String::with_capacity(buf.len() * 3 + buf.len() / HEX_DUMP_WIDTH * 10);
    for (line, chunk) in buf.chunks(HEX_DUMP_WIDTH).enumerate() {
        if line > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{:08x}:", line * HEX_DUMP_WIDTH);
        for byte in chunk {
            let _ = write!(out, " {:02x}", byte);
        }
    }
    out
}

/// Emit a labelled hex dump at debug level
pub fn debug_buffer(label: &str, buf: &[u8]) {
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!("{} ({} bytes):\n{}", label, buf.len(), hex_dump(buf));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_dump_single_line() {
        assert_eq!(hex_dump(&[0x43, 0x58, 0x7a]), "00000000: 43 58 7a");
    }

    #[test]
    fn test_hex_dump_wraps_at_sixteen() {
        let buf: Vec<u8> = (0u8..21).collect();
        let dump = hex_dump(&buf);
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("0e 0f"));
        assert_eq!(lines[1], "00000010: 10 11 12 13 14");
    }

    #[test]
    fn test_hex_dump_empty() {
        assert_eq!(hex_dump(&[]), "");
    }

    #[test]
    fn test_init_logging_twice() {
        assert!(init_logging("debug").is_ok());
        assert!(init_logging("warn").is_ok());
    }
}
