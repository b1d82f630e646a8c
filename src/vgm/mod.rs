//! VGM format parsing
//!
//! A VGM file is a fixed-layout header, an opcode-prefixed command stream
//! and an optional GD3 metadata trailer. This module validates the header,
//! extracts the metadata and exposes the command decoder; driving the
//! stream against the chip model lives in [`crate::player`].

pub mod commands;
pub mod gd3;
pub mod header;

pub use commands::{decode_one, Command};
pub use gd3::Gd3Tags;
pub use header::VgmHeader;

use crate::apu::Region;
use crate::reader::FileReader;
use crate::Result;

/// Parsed VGM file: validated header plus metadata
///
/// Immutable after construction; the playback cursor lives in the player,
/// not here.
#[derive(Debug, Clone)]
pub struct VgmFile {
    header: VgmHeader,
    tags: Gd3Tags,
}

impl VgmFile {
    /// Parse header and metadata trailer
    ///
    /// Header validation failures abort construction. A damaged GD3
    /// trailer only costs the metadata; playback data is unaffected.
    pub fn parse(reader: &mut dyn FileReader) -> Result<Self> {
        let header = VgmHeader::parse(reader)?;
        let tags = match header.gd3_offset {
            Some(offset) => Gd3Tags::parse(reader, offset).unwrap_or_default(),
            None => Gd3Tags::default(),
        };
        Ok(VgmFile { header, tags })
    }

    /// BCD-coded format version
    #[inline]
    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Playback rate hint in Hz (defaulted to 60 when the file says 0)
    #[inline]
    pub fn rate(&self) -> u32 {
        self.header.rate
    }

    /// Region implied by the rate hint: 50 Hz means PAL
    #[inline]
    pub fn region(&self) -> Region {
        if self.header.rate == 50 {
            Region::Pal
        } else {
            Region::Ntsc
        }
    }

    /// NES APU clock in Hz
    #[inline]
    pub fn apu_clock(&self) -> u32 {
        self.header.nes_apu_clock
    }

    /// Sample count of the non-looping portion (44.1 kHz units)
    #[inline]
    pub fn total_samples(&self) -> u32 {
        self.header.total_samples
    }

    /// Sample count of one loop pass
    #[inline]
    pub fn loop_samples(&self) -> u32 {
        self.header.loop_samples
    }

    /// Absolute offset where the command stream begins
    #[inline]
    pub fn data_offset(&self) -> u64 {
        self.header.data_offset
    }

    /// Absolute loop re-entry offset, when the file declares one
    #[inline]
    pub fn loop_offset(&self) -> Option<u64> {
        self.header.loop_offset
    }

    /// GD3 metadata tags
    #[inline]
    pub fn tags(&self) -> &Gd3Tags {
        &self.tags
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Synthetic VGM image builder for unit tests

    use super::gd3::GD3_IDENT;
    use super::header::VGM_IDENT;

    const HEADER_SIZE: usize = 0xC0;

    /// Builds byte-exact VGM images in memory
    pub struct VgmBuilder {
        version: u32,
        rate: u32,
        apu_clock: u32,
        total_samples: u32,
        loop_samples: u32,
        loop_command_index: Option<u32>,
        commands: Vec<u8>,
        gd3_strings: Option<Vec<String>>,
    }

    impl VgmBuilder {
        pub fn new() -> Self {
            VgmBuilder {
                version: 0x0161,
                rate: 0,
                apu_clock: 1_789_773,
                total_samples: 0,
                loop_samples: 0,
                loop_command_index: None,
                commands: Vec::new(),
                gd3_strings: None,
            }
        }

        pub fn rate(mut self, rate: u32) -> Self {
            self.rate = rate;
            self
        }

        pub fn apu_clock(mut self, clock: u32) -> Self {
            self.apu_clock = clock;
            self
        }

        pub fn total_samples(mut self, samples: u32) -> Self {
            self.total_samples = samples;
            self
        }

        /// Declare a loop entering at `commands[index]`
        pub fn loop_to_command(mut self, index: u32, loop_samples: u32) -> Self {
            self.loop_command_index = Some(index);
            self.loop_samples = loop_samples;
            self
        }

        pub fn commands(mut self, bytes: &[u8]) -> Self {
            self.commands.extend_from_slice(bytes);
            self
        }

        /// Attach a GD3 trailer with the canonical 11 strings
        pub fn gd3(mut self, strings: &[&str; 11]) -> Self {
            self.gd3_strings = Some(strings.iter().map(|s| s.to_string()).collect());
            self
        }

        pub fn build(self) -> Vec<u8> {
            let mut image = vec![0u8; HEADER_SIZE];
            let put = |image: &mut Vec<u8>, offset: usize, value: u32| {
                image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
            };

            put(&mut image, 0x00, VGM_IDENT);
            put(&mut image, 0x08, self.version);
            put(&mut image, 0x18, self.total_samples);
            put(&mut image, 0x20, self.loop_samples);
            put(&mut image, 0x24, self.rate);
            put(&mut image, 0x34, (HEADER_SIZE - 0x34) as u32);
            put(&mut image, 0x84, self.apu_clock);
            if let Some(index) = self.loop_command_index {
                put(&mut image, 0x1C, HEADER_SIZE as u32 + index - 0x1C);
            }

            image.extend_from_slice(&self.commands);

            if let Some(strings) = self.gd3_strings {
                let gd3_pos = image.len();
                let mut body: Vec<u8> = Vec::new();
                for s in &strings {
                    for unit in s.encode_utf16() {
                        body.extend_from_slice(&unit.to_le_bytes());
                    }
                    body.extend_from_slice(&0u16.to_le_bytes());
                }
                image.extend_from_slice(&GD3_IDENT.to_le_bytes());
                image.extend_from_slice(&0x0000_0100u32.to_le_bytes());
                image.extend_from_slice(&(body.len() as u32).to_le_bytes());
                image.extend_from_slice(&body);
                let field = (gd3_pos - 0x14) as u32;
                image[0x14..0x18].copy_from_slice(&field.to_le_bytes());
            }

            let eof = (image.len() - 4) as u32;
            image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
            image
        }
    }
}
