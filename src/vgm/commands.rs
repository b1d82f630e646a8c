//! VGM command stream decoding
//!
//! Commands are opcode-prefixed records with fixed or length-prefixed
//! operands. Only NES APU writes, waits, the end marker and data blocks
//! carry meaning here; every other chip's opcodes are classified just far
//! enough to skip their operands. Classification is a 256-entry table
//! built at compile time, not a branch per opcode value.

use crate::reader::FileReader;
use crate::{Result, VgmError};

/// One decoded command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// NES APU register write; `reg` is the offset from `$4000`
    ApuWrite {
        /// Register offset
        reg: u8,
        /// Value written
        value: u8,
    },
    /// Wait for the given number of output samples
    Wait(u16),
    /// End-of-sound-data marker; the player may loop here
    End,
    /// Input exhausted before an end marker
    Eof,
    /// Embedded data block, skipped over
    DataBlockSkip {
        /// Block type tag
        kind: u8,
        /// Payload length in bytes
        len: u32,
    },
    /// Opcode for an out-of-scope chip; operands skipped
    Skipped,
}

/// Opcode classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    /// Not in the dispatch table: decode error
    Unknown,
    /// Out-of-scope opcode with this many operand bytes
    Skip(u8),
    /// NES APU register write: address + value operands
    ApuWrite,
    /// 16-bit little-endian sample count
    Wait16,
    /// Fixed 735-sample wait (one 60 Hz frame)
    WaitFrame60,
    /// Fixed 882-sample wait (one 50 Hz frame)
    WaitFrame50,
    /// Low nibble encodes a 1..=16 sample wait
    WaitShort,
    /// End of sound data
    End,
    /// Type-tagged, length-prefixed data block
    DataBlock,
    /// PCM RAM write record (fixed 11 operand bytes)
    PcmRam,
}

/// Samples in one 60 Hz frame at 44.1 kHz
const FRAME_SAMPLES_60: u16 = 735;
/// Samples in one 50 Hz frame at 44.1 kHz
const FRAME_SAMPLES_50: u16 = 882;

static OPCODE_TABLE: [OpKind; 256] = build_opcode_table();

const fn build_opcode_table() -> [OpKind; 256] {
    let mut table = [OpKind::Unknown; 256];
    let mut op = 0usize;
    while op < 256 {
        table[op] = match op as u8 {
            // Dual-chip selectors and reserved one-operand range
            0x30..=0x3F => OpKind::Skip(1),
            // Reserved two-operand range
            0x40..=0x4E => OpKind::Skip(2),
            // Game Gear stereo, SN76489 write
            0x4F | 0x50 => OpKind::Skip(1),
            // FM chip address/data pairs (YM2413..YMF262)
            0x51..=0x5F => OpKind::Skip(2),
            0x61 => OpKind::Wait16,
            0x62 => OpKind::WaitFrame60,
            0x63 => OpKind::WaitFrame50,
            0x66 => OpKind::End,
            0x67 => OpKind::DataBlock,
            0x68 => OpKind::PcmRam,
            0x70..=0x7F => OpKind::WaitShort,
            // YM2612 DAC shortcut writes, no operands
            0x80..=0x8F => OpKind::Skip(0),
            // DAC stream control
            0x90 | 0x91 => OpKind::Skip(4),
            0x92 => OpKind::Skip(5),
            0x93 => OpKind::Skip(10),
            0x94 => OpKind::Skip(1),
            0x95 => OpKind::Skip(4),
            0xB4 => OpKind::ApuWrite,
            // PSG-family and misc address/data pairs
            0xA0..=0xB3 | 0xB5..=0xBF => OpKind::Skip(2),
            // Three-operand memory writes and reserved range
            0xC0..=0xDF => OpKind::Skip(3),
            // Four-operand seeks, C352 and reserved range
            0xE0..=0xFF => OpKind::Skip(4),
            _ => OpKind::Unknown,
        };
        op += 1;
    }
    table
}

/// Decode one command at `*pos`, advancing the cursor past it.
///
/// Failing to read the opcode byte is end of input ([`Command::Eof`]), but
/// a command torn off mid-operand is a truncation error, and an opcode
/// outside the table aborts decoding with [`VgmError::UnknownOpcode`].
pub fn decode_one(reader: &mut dyn FileReader, pos: &mut u64) -> Result<Command> {
    let mut opcode = [0u8; 1];
    if reader.read_at(*pos, &mut opcode) != 1 {
        return Ok(Command::Eof);
    }
    let opcode = opcode[0];
    *pos += 1;

    match OPCODE_TABLE[opcode as usize] {
        OpKind::Unknown => Err(VgmError::UnknownOpcode(opcode)),
        OpKind::Skip(operands) => {
            *pos += operands as u64;
            Ok(Command::Skipped)
        }
        OpKind::ApuWrite => {
            let reg = reader.read_u8(*pos)?;
            let value = reader.read_u8(*pos + 1)?;
            *pos += 2;
            Ok(Command::ApuWrite { reg, value })
        }
        OpKind::Wait16 => {
            let n = reader.read_u16_le(*pos)?;
            *pos += 2;
            Ok(Command::Wait(n))
        }
        OpKind::WaitFrame60 => Ok(Command::Wait(FRAME_SAMPLES_60)),
        OpKind::WaitFrame50 => Ok(Command::Wait(FRAME_SAMPLES_50)),
        OpKind::WaitShort => Ok(Command::Wait((opcode & 0x0F) as u16 + 1)),
        OpKind::End => Ok(Command::End),
        OpKind::DataBlock => {
            // Layout: 0x67 0x66 tt ss ss ss ss, then ss payload bytes
            let kind = reader.read_u8(*pos + 1)?;
            let len = reader.read_u32_le(*pos + 2)?;
            *pos += 6 + len as u64;
            Ok(Command::DataBlockSkip { kind, len })
        }
        OpKind::PcmRam => {
            *pos += 11;
            Ok(Command::Skipped)
        }
    }
}
