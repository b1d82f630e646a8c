//! End-to-end playback tests over synthetic VGM images
//!
//! These tests exercise the public API only: build a byte-exact VGM file
//! in memory, load it, and pull samples the way an audio front-end would.

use rp2a03_vgm::{load_bytes, LoopMode, Region, VgmError, VgmPlayer};

const HEADER_SIZE: usize = 0xC0;
const NTSC_CLOCK: u32 = 1_789_773;

struct Image {
    rate: u32,
    total_samples: u32,
    loop_samples: u32,
    loop_command_index: Option<u32>,
    commands: Vec<u8>,
}

impl Image {
    fn new(commands: Vec<u8>) -> Self {
        Image {
            rate: 0,
            total_samples: 0,
            loop_samples: 0,
            loop_command_index: None,
            commands,
        }
    }

    fn build(self) -> Vec<u8> {
        let mut image = vec![0u8; HEADER_SIZE];
        let put = |image: &mut [u8], offset: usize, value: u32| {
            image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
        };
        put(&mut image, 0x00, 0x206D_6756); // "Vgm "
        put(&mut image, 0x08, 0x0161);
        put(&mut image, 0x18, self.total_samples);
        put(&mut image, 0x20, self.loop_samples);
        put(&mut image, 0x24, self.rate);
        put(&mut image, 0x34, (HEADER_SIZE - 0x34) as u32);
        put(&mut image, 0x84, NTSC_CLOCK);
        if let Some(index) = self.loop_command_index {
            put(&mut image, 0x1C, HEADER_SIZE as u32 + index - 0x1C);
        }
        image.extend_from_slice(&self.commands);
        let eof = (image.len() - 4) as u32;
        image[0x04..0x08].copy_from_slice(&eof.to_le_bytes());
        image
    }
}

fn wait16(n: u16) -> Vec<u8> {
    vec![0x61, (n & 0xFF) as u8, (n >> 8) as u8]
}

fn player(image: Vec<u8>, loop_mode: LoopMode) -> VgmPlayer {
    VgmPlayer::new(load_bytes(image).unwrap(), 44_100, loop_mode).unwrap()
}

fn drain(player: &mut VgmPlayer) -> u64 {
    let mut buf = [0i16; 2048];
    let mut total = 0u64;
    loop {
        let got = player.get_samples(&mut buf);
        if got == 0 {
            return total;
        }
        total += got as u64;
    }
}

#[test]
fn plays_a_stream_with_chip_writes_and_short_waits() {
    let mut commands = Vec::new();
    // Program pulse 1 for a steady tone, then wait with the whole opcode mix
    for (reg, value) in [(0x15u8, 0x01u8), (0x00, 0xBF), (0x02, 0xFD), (0x03, 0x08)] {
        commands.extend_from_slice(&[0xB4, reg, value]);
    }
    commands.extend_from_slice(&wait16(500));
    commands.push(0x62); // 735
    commands.push(0x63); // 882
    commands.push(0x70); // 1
    commands.push(0x7F); // 16
    commands.push(0x66);

    let total: u32 = 500 + 735 + 882 + 1 + 16;
    let mut image = Image::new(commands);
    image.total_samples = total;
    let mut p = player(image.build(), LoopMode::Off);

    let mut buf = vec![0i16; total as usize];
    assert_eq!(p.get_samples(&mut buf), total as usize);
    assert_eq!(p.get_samples(&mut buf), 0);
    assert!(
        buf.iter().any(|&s| s != -32768),
        "the programmed pulse channel should be audible"
    );
}

#[test]
fn loop_accounting_matches_declared_sample_counts() {
    // 300-sample intro, 450-sample loop body
    let mut commands = wait16(300);
    let loop_index = commands.len() as u32;
    commands.extend_from_slice(&wait16(450));
    commands.push(0x66);

    let mut image = Image::new(commands);
    image.total_samples = 750;
    image.loop_samples = 450;
    image.loop_command_index = Some(loop_index);
    let image = image.build();

    // One pass plus n loop passes, for several loop counts
    for (mode, expected) in [
        (LoopMode::Off, 750u64),
        (LoopMode::Count(1), 750 + 450),
        (LoopMode::Count(3), 750 + 3 * 450),
    ] {
        let mut p = player(image.clone(), mode);
        assert_eq!(drain(&mut p), expected, "mode {mode:?}");
        assert!(p.fault().is_none());
    }
}

#[test]
fn rate_hint_zero_defaults_to_ntsc_60() {
    let mut image = Image::new([wait16(10), vec![0x66]].concat());
    image.rate = 0;
    let p = player(image.build(), LoopMode::Off);
    assert_eq!(p.info().rate(), 60);
    assert_eq!(p.info().region(), Region::Ntsc);

    let mut image = Image::new([wait16(10), vec![0x66]].concat());
    image.rate = 50;
    let p = player(image.build(), LoopMode::Off);
    assert_eq!(p.info().region(), Region::Pal);
}

#[test]
fn foreign_chip_commands_and_data_blocks_are_transparent() {
    let mut commands = Vec::new();
    commands.extend_from_slice(&[0x50, 0x9F]); // SN76489 write
    commands.extend_from_slice(&[0x54, 0x28, 0xF0]); // YM2151 write
    // Data block with an 8-byte payload of fake opcodes
    commands.extend_from_slice(&[0x67, 0x66, 0x00, 0x08, 0x00, 0x00, 0x00]);
    commands.extend_from_slice(&[0x66; 8]);
    commands.extend_from_slice(&wait16(100));
    commands.push(0x66);

    let mut image = Image::new(commands);
    image.total_samples = 100;
    let mut p = player(image.build(), LoopMode::Off);
    assert_eq!(drain(&mut p), 100);
    assert!(p.fault().is_none());
}

#[test]
fn decode_fault_surfaces_after_rendered_samples() {
    let mut commands = wait16(64);
    commands.push(0x00); // invalid opcode
    let mut image = Image::new(commands);
    image.total_samples = 64;
    let mut p = player(image.build(), LoopMode::Off);

    assert_eq!(drain(&mut p), 64);
    assert!(matches!(p.fault(), Some(VgmError::UnknownOpcode(0x00))));
}

#[test]
fn gzip_compressed_image_plays_identically() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut commands = wait16(321);
    commands.push(0x66);
    let mut image = Image::new(commands);
    image.total_samples = 321;
    let raw = image.build();

    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(&raw).unwrap();
    let compressed = enc.finish().unwrap();

    let mut plain = player(raw, LoopMode::Off);
    let mut gz = player(compressed, LoopMode::Off);
    assert_eq!(drain(&mut plain), 321);
    assert_eq!(drain(&mut gz), 321);
}

#[test]
fn construction_rejects_non_vgm_data() {
    let result = VgmPlayer::new(
        load_bytes(b"definitely not a vgm file".to_vec()).unwrap(),
        44_100,
        LoopMode::Off,
    );
    assert!(matches!(result, Err(VgmError::BadHeader(_)) | Err(VgmError::Truncated { .. })));
}

#[test]
fn status_write_in_stream_silences_channel_length() {
    use rp2a03_vgm::apu::ChannelMask;

    let mut commands = Vec::new();
    commands.extend_from_slice(&[0xB4, 0x15, 0x01]); // enable pulse 1
    commands.extend_from_slice(&[0xB4, 0x03, 0x08]); // load length 254
    commands.extend_from_slice(&wait16(10));
    commands.extend_from_slice(&[0xB4, 0x15, 0x00]); // disable again
    commands.extend_from_slice(&wait16(10));
    commands.push(0x66);

    let mut image = Image::new(commands);
    image.total_samples = 20;
    let mut p = player(image.build(), LoopMode::Off);

    let mut buf = [0i16; 10];
    assert_eq!(p.get_samples(&mut buf), 10);
    assert!(p.apu().status().contains(ChannelMask::PULSE1));

    assert_eq!(p.get_samples(&mut buf), 10);
    assert_eq!(p.apu().status(), ChannelMask::empty());
}

#[test]
fn progress_reporting_tracks_duration() {
    let mut commands = wait16(1000);
    commands.push(0x66);
    let mut image = Image::new(commands);
    image.total_samples = 1000;
    let mut p = player(image.build(), LoopMode::Off);

    assert_eq!(p.duration_samples(), Some(1000));
    let mut buf = [0i16; 500];
    p.get_samples(&mut buf);
    let position = p.playback_position();
    assert!((0.45..=0.55).contains(&position), "position {position}");
    drain(&mut p);
    assert_eq!(p.playback_position(), 1.0);
}
