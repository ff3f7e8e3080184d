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

//! SAWB transaction frames
//!
//! Every request to the `CSFI` and `CSXI` methods is a fixed-length buffer with a
//! shared five byte header. This module is the only place that knows where each
//! field lives inside the buffer.

use std::fmt;

use crate::constants::{sasb, sawb};

// Header
const SAFN_OFFSET: usize = 0;
const SASB_OFFSET: usize = 2;
const RFLG_OFFSET: usize = 4;

// Settings layout
const GUNM_OFFSET: usize = 5;
const GUDS_OFFSET: usize = 6;

// Performance mode layout
const CAID_OFFSET: usize = 5;
const CAID_LEN: usize = 16;
const FNCN_OFFSET: usize = 21;
const SUBN_OFFSET: usize = 22;
const IOB_OFFSET: usize = 23;

/// Number of `guds` bytes that fit in a settings frame
pub const GUDS_LEN: usize = sawb::LEN_SETTINGS - GUDS_OFFSET;

/// Number of `iob` slots in a performance mode frame
pub const IOB_LEN: usize = 10;

/// The two frame layouts understood by the firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameLayout {
    /// 21 byte frames carrying an opcode and payload (`CSFI`)
    Settings,
    /// 256 byte frames addressed by GUID, function and subfunction (`CSXI`)
    PerformanceMode,
}

impl FrameLayout {
    /// Declared buffer length for this layout
    pub const fn len(self) -> usize {
        match self {
            FrameLayout::Settings => sawb::LEN_SETTINGS,
            FrameLayout::PerformanceMode => sawb::LEN_PERFORMANCE_MODE,
        }
    }
}

/// A request or response frame
#[derive(Clone, PartialEq, Eq)]
pub struct Sawb {
    layout: FrameLayout,
    buf: Vec<u8>,
}

impl Sawb {
    fn empty(layout: FrameLayout, sasb: u16) -> Self {
        let mut buf = vec![0u8; layout.len()];
        buf[SAFN_OFFSET..SAFN_OFFSET + 2].copy_from_slice(&sawb::SAFN.to_le_bytes());
        buf[SASB_OFFSET..SASB_OFFSET + 2].copy_from_slice(&sasb.to_le_bytes());
        Self { layout, buf }
    }

    /// Build a settings request. Panics if `guds` does not fit in the frame.
    pub fn settings_request(sasb: u16, gunm: u8, guds: &[u8]) -> Self {
        assert!(guds.len() <= GUDS_LEN, "guds payload of {} bytes does not fit", guds.len());
        let mut frame = Self::empty(FrameLayout::Settings, sasb);
        frame.buf[GUNM_OFFSET] = gunm;
        frame.buf[GUDS_OFFSET..GUDS_OFFSET + guds.len()].copy_from_slice(guds);
        frame
    }

    /// Build a performance mode request. Panics if `iob` has more than 10 entries.
    pub fn performance_request(guid: &[u8; CAID_LEN], fncn: u8, subn: u8, iob: &[u8]) -> Self {
        assert!(iob.len() <= IOB_LEN, "iob payload of {} bytes does not fit", iob.len());
        let mut frame = Self::empty(FrameLayout::PerformanceMode, sasb::PERFORMANCE_MODE);
        frame.buf[CAID_OFFSET..CAID_OFFSET + CAID_LEN].copy_from_slice(guid);
        frame.buf[FNCN_OFFSET] = fncn;
        frame.buf[SUBN_OFFSET] = subn;
        frame.buf[IOB_OFFSET..IOB_OFFSET + iob.len()].copy_from_slice(iob);
        frame
    }

    /// Wrap a response buffer. Returns `None` when its length does not match the layout.
    pub fn from_response(layout: FrameLayout, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != layout.len() {
            return None;
        }
        Some(Self {
            layout,
            buf: bytes.to_vec(),
        })
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn safn(&self) -> u16 {
        u16::from_le_bytes([self.buf[SAFN_OFFSET], self.buf[SAFN_OFFSET + 1]])
    }

    pub fn sasb(&self) -> u16 {
        u16::from_le_bytes([self.buf[SASB_OFFSET], self.buf[SASB_OFFSET + 1]])
    }

    /// Return flag, `0xaa` on a successful response
    pub fn rflg(&self) -> u8 {
        self.buf[RFLG_OFFSET]
    }

    /// Opcode byte. Both layouts carry the failure sentinel at this position.
    pub fn gunm(&self) -> u8 {
        self.buf[GUNM_OFFSET]
    }

    /// Payload byte `i` of a settings frame
    pub fn guds(&self, i: usize) -> u8 {
        assert!(i < GUDS_LEN, "guds index {} out of range", i);
        self.buf[GUDS_OFFSET + i]
    }

    pub fn caid(&self) -> [u8; CAID_LEN] {
        self.expect_performance_layout();
        let mut guid = [0u8; CAID_LEN];
        guid.copy_from_slice(&self.buf[CAID_OFFSET..CAID_OFFSET + CAID_LEN]);
        guid
    }

    pub fn fncn(&self) -> u8 {
        self.expect_performance_layout();
        self.buf[FNCN_OFFSET]
    }

    pub fn subn(&self) -> u8 {
        self.expect_performance_layout();
        self.buf[SUBN_OFFSET]
    }

    /// I/O byte `i` of a performance mode frame
    pub fn iob(&self, i: usize) -> u8 {
        self.expect_performance_layout();
        assert!(i < IOB_LEN, "iob index {} out of range", i);
        self.buf[IOB_OFFSET + i]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn set_rflg(&mut self, value: u8) {
        self.buf[RFLG_OFFSET] = value;
    }

    pub fn set_gunm(&mut self, value: u8) {
        self.buf[GUNM_OFFSET] = value;
    }

    pub fn set_guds(&mut self, i: usize, value: u8) {
        assert!(i < GUDS_LEN, "guds index {} out of range", i);
        self.buf[GUDS_OFFSET + i] = value;
    }

    pub fn set_iob(&mut self, i: usize, value: u8) {
        self.expect_performance_layout();
        assert!(i < IOB_LEN, "iob index {} out of range", i);
        self.buf[IOB_OFFSET + i] = value;
    }

    fn expect_performance_layout(&self) {
        assert_eq!(
            self.layout,
            FrameLayout::PerformanceMode,
            "field only exists in performance mode frames"
        );
    }
}

impl fmt::Debug for Sawb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sawb")
            .field("layout", &self.layout)
            .field("sasb", &format_args!("{:#06x}", self.sasb()))
            .field("rflg", &format_args!("{:#04x}", self.rflg()))
            .field("gunm", &format_args!("{:#04x}", self.gunm()))
            .finish()
    }
}
