//! WAV rendering
//!
//! Renders a playback session to a 16-bit mono WAV file in fixed-size
//! chunks, so memory use stays flat regardless of track length.

use crate::player::VgmPlayer;
use crate::{Result, VgmError};
use std::path::Path;

/// Samples rendered per chunk
const SAMPLES_PER_CHUNK: usize = 4096;

/// Render the remainder of a session to a WAV file
///
/// Runs the player to the end of its stream (honoring its loop mode) and
/// returns the number of samples written. Refuses sessions configured for
/// infinite looping, which would never terminate.
pub fn export_wav<P: AsRef<Path>>(player: &mut VgmPlayer, path: P) -> Result<u64> {
    if player.duration_samples().is_none() {
        return Err(VgmError::ConfigError(
            "cannot render an endlessly looping session to a file".into(),
        ));
    }

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: player.sample_rate(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| VgmError::Other(format!("failed to create WAV file: {e}")))?;

    let mut chunk = [0i16; SAMPLES_PER_CHUNK];
    let mut written = 0u64;
    loop {
        let got = player.get_samples(&mut chunk);
        if got == 0 {
            break;
        }
        for &sample in &chunk[..got] {
            writer
                .write_sample(sample)
                .map_err(|e| VgmError::Other(format!("failed to write sample: {e}")))?;
        }
        written += got as u64;
    }

    writer
        .finalize()
        .map_err(|e| VgmError::Other(format!("failed to finalize WAV file: {e}")))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::LoopMode;
    use crate::reader::MemoryReader;
    use crate::vgm::test_support::VgmBuilder;

    #[test]
    fn test_export_writes_every_sample() {
        let image = VgmBuilder::new()
            .total_samples(1000)
            .commands(&[0x61, 0xE8, 0x03, 0x66]) // wait 1000, end
            .build();
        let mut player =
            VgmPlayer::new(Box::new(MemoryReader::new(image)), 44_100, LoopMode::Off).unwrap();

        let mut path = std::env::temp_dir();
        path.push(format!("rp2a03-vgm-export-test-{}.wav", std::process::id()));

        let written = export_wav(&mut player, &path).unwrap();
        assert_eq!(written, 1000);

        let wav = hound::WavReader::open(&path).unwrap();
        assert_eq!(wav.spec().sample_rate, 44_100);
        assert_eq!(wav.len(), 1000);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_export_rejects_infinite_loop() {
        let image = VgmBuilder::new()
            .total_samples(100)
            .loop_to_command(0, 100)
            .commands(&[0x61, 0x64, 0x00, 0x66]) // wait 100, end
            .build();
        let mut player =
            VgmPlayer::new(Box::new(MemoryReader::new(image)), 44_100, LoopMode::Infinite)
                .unwrap();

        let mut path = std::env::temp_dir();
        path.push("rp2a03-vgm-export-reject.wav");
        assert!(export_wav(&mut player, &path).is_err());
        std::fs::remove_file(&path).ok();
    }
}
