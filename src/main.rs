use anyhow::{Context, Result};
use rp2a03_vgm::{load_file, LoopMode, VgmPlayer};
use serde::Serialize;
use std::env;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Metadata summary for `--info` JSON output
#[derive(Serialize)]
struct TrackInfo {
    file: String,
    version: String,
    apu_clock: u32,
    rate: u32,
    total_samples: u32,
    loop_samples: u32,
    duration_seconds: Option<f32>,
    track_name: Option<String>,
    game_name: Option<String>,
    system_name: Option<String>,
    author: Option<String>,
    release_date: Option<String>,
    ripper: Option<String>,
    notes: Option<String>,
}

struct Args {
    file: String,
    info: bool,
    wav: Option<String>,
    loop_mode: LoopMode,
    sample_rate: u32,
}

fn print_usage() {
    eprintln!(
        "Usage:\n  rp2a03-vgm [flags] <file.vgm|file.vgz>\n\nFlags:\n  --info            Print track metadata as JSON and exit\n  --wav <path>      Render to a WAV file instead of playing\n  --loops <n>       Play the looped section n extra times (default 1)\n  --no-loop         Ignore the loop point\n  --loop-forever    Loop until interrupted\n  --rate <hz>       Output sample rate (default 44100)\n  -h, --help        Show this help\n\nExamples:\n  rp2a03-vgm song.vgz\n  rp2a03-vgm --wav out.wav --loops 2 song.vgm"
    );
}

fn parse_args() -> Result<Option<Args>> {
    let mut file = None;
    let mut info = false;
    let mut wav = None;
    let mut loop_mode = LoopMode::default();
    let mut sample_rate = DEFAULT_SAMPLE_RATE;

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            "--info" => info = true,
            "--no-loop" => loop_mode = LoopMode::Off,
            "--loop-forever" => loop_mode = LoopMode::Infinite,
            "--loops" => {
                let value = args.next().context("--loops requires a count")?;
                loop_mode = LoopMode::Count(value.parse().context("--loops expects a number")?);
            }
            "--wav" => {
                wav = Some(args.next().context("--wav requires an output path")?);
            }
            "--rate" => {
                let value = args.next().context("--rate requires a value in Hz")?;
                sample_rate = value.parse().context("--rate expects a number")?;
            }
            _ if arg.starts_with('-') => {
                eprintln!("Unknown flag: {arg}\n");
                print_usage();
                return Ok(None);
            }
            _ => file = Some(arg),
        }
    }

    match file {
        Some(file) => Ok(Some(Args {
            file,
            info,
            wav,
            loop_mode,
            sample_rate,
        })),
        None => {
            print_usage();
            Ok(None)
        }
    }
}

fn format_version(version: u32) -> String {
    format!("{}.{:02X}", version >> 8, version & 0xFF)
}

fn track_info(args: &Args, player: &VgmPlayer) -> TrackInfo {
    let file = player.info();
    let tags = file.tags();
    TrackInfo {
        file: args.file.clone(),
        version: format_version(file.version()),
        apu_clock: file.apu_clock(),
        rate: file.rate(),
        total_samples: file.total_samples(),
        loop_samples: file.loop_samples(),
        duration_seconds: player.duration_seconds(),
        track_name: tags.track_name.clone(),
        game_name: tags.game_name.clone(),
        system_name: tags.system_name.clone(),
        author: tags.author.clone(),
        release_date: tags.release_date.clone(),
        ripper: tags.ripper.clone(),
        notes: tags.notes.clone(),
    }
}

fn print_summary(player: &VgmPlayer) {
    let file = player.info();
    let tags = file.tags();
    println!("VGM version {}", format_version(file.version()));
    println!(
        "Total samples: {}+{} ({:.2}s{})",
        file.total_samples(),
        file.loop_samples(),
        file.total_samples() as f32 / 44_100.0,
        player
            .duration_seconds()
            .map(|d| format!(", {d:.2}s with loops"))
            .unwrap_or_else(|| ", looping forever".into())
    );
    let field = |name: &str, value: &Option<String>| {
        if let Some(value) = value {
            println!("{name:<14}{value}");
        }
    };
    field("Track Name:", &tags.track_name);
    field("Game Name:", &tags.game_name);
    field("System:", &tags.system_name);
    field("Author:", &tags.author);
    field("Release Date:", &tags.release_date);
    field("Ripped by:", &tags.ripper);
    println!();
}

fn main() -> Result<()> {
    let Some(args) = parse_args()? else {
        return Ok(());
    };

    let reader =
        load_file(&args.file).with_context(|| format!("failed to open '{}'", args.file))?;
    let mut player = VgmPlayer::new(reader, args.sample_rate, args.loop_mode)
        .with_context(|| format!("failed to parse '{}'", args.file))?;

    if args.info {
        println!(
            "{}",
            serde_json::to_string_pretty(&track_info(&args, &player))?
        );
        return Ok(());
    }

    print_summary(&player);

    if let Some(wav_path) = args.wav {
        let written = rp2a03_vgm::export::export_wav(&mut player, &wav_path)?;
        println!(
            "Wrote {} samples ({:.2}s) to {}",
            written,
            written as f32 / args.sample_rate as f32,
            wav_path
        );
        check_fault(&player);
        return Ok(());
    }

    play(player)
}

fn check_fault(player: &VgmPlayer) {
    if let Some(fault) = player.fault() {
        eprintln!("Playback aborted: {fault}");
    }
}

#[cfg(feature = "streaming")]
fn play(mut player: VgmPlayer) -> Result<()> {
    use rp2a03_vgm::streaming::{AudioDevice, RingBuffer, StreamConfig, BUFFER_BACKOFF_MICROS};
    use std::sync::Arc;

    let config = StreamConfig::low_latency(player.sample_rate());
    let ring_buffer = Arc::new(RingBuffer::new(config.ring_buffer_size)?);
    let device = AudioDevice::new(config.sample_rate, Arc::clone(&ring_buffer))?;

    println!(
        "Playing at {} Hz ({:.0} ms buffer)",
        config.sample_rate,
        config.latency_ms()
    );

    let mut chunk = [0i16; 1024];
    let mut since_progress = 0usize;
    loop {
        let got = player.get_samples(&mut chunk);
        if got == 0 {
            break;
        }

        let mut pending = &chunk[..got];
        while !pending.is_empty() {
            let written = ring_buffer.write(pending);
            pending = &pending[written..];
            if written == 0 {
                std::thread::sleep(std::time::Duration::from_micros(BUFFER_BACKOFF_MICROS));
            }
        }

        since_progress += got;
        if since_progress >= player.sample_rate() as usize / 4 {
            since_progress = 0;
            let seconds = player.samples_rendered() as f32 / player.sample_rate() as f32;
            print!(
                "\r[{seconds:7.1}s] {:5.1}%",
                player.playback_position() * 100.0
            );
            use std::io::Write;
            std::io::stdout().flush().ok();
        }
    }

    device.finish();
    device.wait_until_done();
    println!(
        "\r[{:7.1}s] done   ",
        player.samples_rendered() as f32 / player.sample_rate() as f32
    );
    check_fault(&player);
    Ok(())
}

#[cfg(not(feature = "streaming"))]
fn play(_player: VgmPlayer) -> Result<()> {
    anyhow::bail!(
        "this build has no audio output; rebuild with `--features streaming` \
         or render with `--wav <path>`"
    );
}
