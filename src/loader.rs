//! VGM file I/O
//!
//! Opens `.vgm` files through the cached reader and transparently inflates
//! gzip-compressed `.vgz` files into memory. Detection is by content (the
//! gzip magic bytes), not by file extension.

use crate::reader::{CachedFileReader, FileReader, MemoryReader};
use crate::{Result, VgmError};
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::Path;

/// Cache block size for disk readers
const READER_CACHE_SIZE: usize = 4096;

/// gzip magic bytes
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Open a `.vgm`/`.vgz` file for playback
///
/// Plain files are served through a block-cached reader; compressed files
/// are inflated up front and served from memory.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Box<dyn FileReader>> {
    let path = path.as_ref();
    let mut reader = CachedFileReader::open(path, READER_CACHE_SIZE)?;

    let mut magic = [0u8; 2];
    if reader.read_at(0, &mut magic) == 2 && magic == GZIP_MAGIC {
        let compressed = std::fs::read(path)?;
        return Ok(Box::new(MemoryReader::new(inflate(&compressed)?)));
    }
    Ok(Box::new(reader))
}

/// Wrap an in-memory buffer, inflating it first if it is gzip data
pub fn load_bytes(data: Vec<u8>) -> Result<Box<dyn FileReader>> {
    if data.len() >= 2 && data[..2] == GZIP_MAGIC {
        return Ok(Box::new(MemoryReader::new(inflate(&data)?)));
    }
    Ok(Box::new(MemoryReader::new(data)))
}

fn inflate(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(compressed)
        .read_to_end(&mut out)
        .map_err(|e| VgmError::Other(format!("gzip decompression failed: {e}")))?;
    Ok(out)
}
