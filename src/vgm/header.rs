//! VGM header parsing
//!
//! Fixed-layout little-endian header at offset 0. All offsets stored in the
//! file are relative to their own field position; this module resolves them
//! to absolute positions and validates the identity fields.

use crate::reader::FileReader;
use crate::{Result, VgmError};

/// "Vgm " identity word
pub const VGM_IDENT: u32 = 0x206D_6756;

/// First version whose data offset field is honored
const VERSION_RELATIVE_DATA: u32 = 0x0000_0150;

/// Data start for pre-1.50 files
const LEGACY_DATA_OFFSET: u64 = 0x40;

// Field positions (also the base each relative offset is added to)
const OFS_EOF: u64 = 0x04;
const OFS_VERSION: u64 = 0x08;
const OFS_GD3: u64 = 0x14;
const OFS_TOTAL_SAMPLES: u64 = 0x18;
const OFS_LOOP: u64 = 0x1C;
const OFS_LOOP_SAMPLES: u64 = 0x20;
const OFS_RATE: u64 = 0x24;
const OFS_DATA: u64 = 0x34;
const OFS_NES_APU_CLOCK: u64 = 0x84;

/// Validated VGM header with offsets resolved to absolute positions
#[derive(Debug, Clone)]
pub struct VgmHeader {
    /// BCD-coded version, e.g. `0x0161` for 1.61
    pub version: u32,
    /// Playback rate hint in Hz; 0 in the file defaults to 60
    pub rate: u32,
    /// NES APU clock in Hz; nonzero, or parsing fails
    pub nes_apu_clock: u32,
    /// Sample count of the non-looping stream portion (44.1 kHz units)
    pub total_samples: u32,
    /// Sample count of one loop pass
    pub loop_samples: u32,
    /// Absolute offset where the command stream begins
    pub data_offset: u64,
    /// Absolute loop re-entry offset, when the file declares a loop
    pub loop_offset: Option<u64>,
    /// Absolute GD3 trailer offset, if present
    pub gd3_offset: Option<u64>,
}

impl VgmHeader {
    /// Parse and validate the header
    ///
    /// Fails with [`VgmError::BadHeader`] on identity, size or chip-support
    /// violations; no partially-valid header is ever returned.
    pub fn parse(reader: &mut dyn FileReader) -> Result<Self> {
        let ident = reader.read_u32_le(0)?;
        if ident != VGM_IDENT {
            return Err(VgmError::BadHeader(format!(
                "bad identity word 0x{ident:08X}"
            )));
        }

        let eof_offset = reader.read_u32_le(OFS_EOF)?;
        let actual = reader.size();
        if eof_offset as u64 + 4 != actual {
            return Err(VgmError::BadHeader(format!(
                "EOF offset declares {} bytes, file has {actual}",
                eof_offset as u64 + 4
            )));
        }

        let version = reader.read_u32_le(OFS_VERSION)?;

        let mut rate = reader.read_u32_le(OFS_RATE)?;
        if rate == 0 {
            rate = 60;
        }

        // Data starts at 0x40 for pre-1.50 files, otherwise where the
        // relative data offset field points
        let data_field = reader.read_u32_le(OFS_DATA)?;
        let data_offset = if version >= VERSION_RELATIVE_DATA && data_field != 0 {
            OFS_DATA + data_field as u64
        } else {
            LEGACY_DATA_OFFSET
        };

        // The NES APU clock field only exists in headers long enough to
        // reach it; anything shorter cannot carry NES data
        let nes_apu_clock = if data_offset >= OFS_NES_APU_CLOCK + 4 {
            reader.read_u32_le(OFS_NES_APU_CLOCK)?
        } else {
            0
        };
        if nes_apu_clock == 0 {
            return Err(VgmError::BadHeader(
                "no NES APU clock (unsupported chip set)".into(),
            ));
        }

        let total_samples = reader.read_u32_le(OFS_TOTAL_SAMPLES)?;
        let loop_field = reader.read_u32_le(OFS_LOOP)?;
        let loop_samples = reader.read_u32_le(OFS_LOOP_SAMPLES)?;
        let loop_offset = if loop_field != 0 && loop_samples != 0 {
            Some(OFS_LOOP + loop_field as u64)
        } else {
            None
        };

        let gd3_field = reader.read_u32_le(OFS_GD3)?;
        let gd3_offset = if gd3_field != 0 {
            Some(OFS_GD3 + gd3_field as u64)
        } else {
            None
        };

        Ok(VgmHeader {
            version,
            rate,
            nes_apu_clock,
            total_samples,
            loop_samples,
            data_offset,
            loop_offset,
            gd3_offset,
        })
    }
}
