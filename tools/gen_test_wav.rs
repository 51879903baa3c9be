// specanim/tools/gen_test_wav.rs
//
// Writes a test signal whose spectrum changes halfway through:
// A3 throughout, A5 in the first half, A7 in the second.

use std::f32::consts::PI;
use std::path::PathBuf;

use clap::Parser;
use hound::{SampleFormat, WavSpec, WavWriter};

#[derive(Parser, Debug)]
#[command(about = "Generates a WAV file for trying out specanim")]
struct Args {
    /// Output file
    #[arg(default_value = "test_signal.wav")]
    output: PathBuf,

    /// Length, seconds
    #[arg(short, long, default_value_t = 10)]
    duration: u32,

    #[arg(short = 'r', long, default_value_t = 44100)]
    sample_rate: u32,

    /// Write the same signal to two channels
    #[arg(long)]
    stereo: bool,
}

/// (frequency, amplitude, first second, last second)
fn partials(duration: f32) -> [(f32, f32, f32, f32); 3] {
    let half = duration / 2.0;
    [
        (220.0, 0.4, 0.0, duration),
        (880.0, 0.3, 0.0, half),
        (3520.0, 0.3, half, duration),
    ]
}

fn main() -> Result<(), hound::Error> {
    let args = Args::parse();
    let channels = if args.stereo { 2 } else { 1 };
    let spec = WavSpec {
        channels,
        sample_rate: args.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&args.output, spec)?;
    let duration = args.duration as f32;
    let partials = partials(duration);
    let scale = i16::MAX as f32 * 0.5;

    for i in 0..args.sample_rate * args.duration {
        let time = i as f32 / args.sample_rate as f32;
        let sample: f32 = partials
            .iter()
            .filter(|(_, _, from, to)| time >= *from && time < *to)
            .map(|(freq, amp, _, _)| (2.0 * PI * freq * time).sin() * amp)
            .sum();

        for _ in 0..channels {
            writer.write_sample((sample * scale) as i16)?;
        }
    }

    writer.finalize()?;
    println!(
        "Generated {:?}: {} s, {} Hz, {} ch",
        args.output, args.duration, args.sample_rate, channels
    );
    Ok(())
}
