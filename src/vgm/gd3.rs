//! GD3 metadata trailer parsing
//!
//! The trailer holds eleven null-terminated UTF-16LE strings in fixed
//! order, with each display name doubled as an English/localized pair.
//! Only the English slot of each pair is kept. Absent or damaged trailers
//! are not an error; the tags simply stay empty.

use crate::reader::FileReader;
use crate::{Result, VgmError};

/// "Gd3 " identity word
pub const GD3_IDENT: u32 = 0x2033_6447;

/// Only supported trailer version
const GD3_VERSION: u32 = 0x0000_0100;

/// Strings longer than this many UTF-16 units are truncated
const MAX_STRING_UNITS: usize = 256;

/// Song metadata from the GD3 trailer
///
/// All fields are optional; files commonly leave some slots empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gd3Tags {
    /// Track title
    pub track_name: Option<String>,
    /// Game the track is from
    pub game_name: Option<String>,
    /// System/hardware name
    pub system_name: Option<String>,
    /// Composer credit
    pub author: Option<String>,
    /// Release date, free text
    pub release_date: Option<String>,
    /// Person who logged the track
    pub ripper: Option<String>,
    /// Free-text notes
    pub notes: Option<String>,
}

impl Gd3Tags {
    /// Parse a trailer at `offset`
    ///
    /// Callers treat any `Err` as "no metadata"; the command stream does
    /// not depend on this block.
    pub fn parse(reader: &mut dyn FileReader, offset: u64) -> Result<Self> {
        let ident = reader.read_u32_le(offset)?;
        if ident != GD3_IDENT {
            return Err(VgmError::BadHeader(format!(
                "bad GD3 identity word 0x{ident:08X}"
            )));
        }
        let version = reader.read_u32_le(offset + 4)?;
        if version != GD3_VERSION {
            return Err(VgmError::BadHeader(format!(
                "unsupported GD3 version 0x{version:08X}"
            )));
        }
        let length = reader.read_u32_le(offset + 8)?;
        if length == 0 {
            return Err(VgmError::BadHeader("empty GD3 block".into()));
        }

        let mut cursor = offset + 12;
        let end = cursor + length as u64;
        let mut next = || read_string(reader, &mut cursor, end);

        let track_name = next();
        let _ = next(); // localized track name
        let game_name = next();
        let _ = next(); // localized game name
        let system_name = next();
        let _ = next(); // localized system name
        let author = next();
        let _ = next(); // localized author
        let release_date = next();
        let ripper = next();
        let notes = next();

        Ok(Gd3Tags {
            track_name,
            game_name,
            system_name,
            author,
            release_date,
            ripper,
            notes,
        })
    }

    /// True when every slot is empty
    pub fn is_empty(&self) -> bool {
        self.track_name.is_none()
            && self.game_name.is_none()
            && self.system_name.is_none()
            && self.author.is_none()
            && self.release_date.is_none()
            && self.ripper.is_none()
            && self.notes.is_none()
    }
}

/// Read one null-terminated UTF-16LE string, stopping at the block end.
///
/// Returns `None` for empty strings. Over-long strings are truncated at
/// [`MAX_STRING_UNITS`] units but still consumed to their terminator.
fn read_string(reader: &mut dyn FileReader, cursor: &mut u64, end: u64) -> Option<String> {
    let mut units: Vec<u16> = Vec::new();
    while *cursor < end {
        let mut buf = [0u8; 2];
        if reader.read_at(*cursor, &mut buf) != 2 {
            break;
        }
        *cursor += 2;
        let unit = u16::from_le_bytes(buf);
        if unit == 0 {
            break;
        }
        if units.len() < MAX_STRING_UNITS {
            units.push(unit);
        }
    }
    if units.is_empty() {
        None
    } else {
        Some(String::from_utf16_lossy(&units))
    }
}
