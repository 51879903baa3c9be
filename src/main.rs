// specanim/src/main.rs

mod audio;
mod config;
mod error;
mod pipeline;
mod pitch;
mod scalc;
mod scene;
mod srend;
mod sview;

use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, ValueEnum};
use log::info;

use config::{AnalysisConfig, DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH};
use scalc::SpectrogramParams;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CliColorScheme {
    Oceanic,
    Grayscale,
    Inferno,
    Viridis,
    Synthwave,
    Sunset,
}

/// Shows the spectrum of an audio file and animates its sliding spectrogram
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Audio file; anything other than WAV/FLAC goes through the converter
    file_name: PathBuf,

    /// Start of the static spectrum, seconds
    #[arg(long, default_value_t = 0.0)]
    fft_start: f64,

    /// End of the static spectrum, seconds
    #[arg(long, default_value_t = 5.0)]
    fft_end: f64,

    /// Write the animation to spectrogram_animation.html instead of opening it
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    export_html: bool,

    /// Label the frequency axis with note names
    #[arg(long, action = ArgAction::Set, default_value_t = true)]
    show_pitch_labels: bool,

    /// Sliding window length, seconds
    #[arg(short = 'w', long, default_value_t = 5.0)]
    window_seconds: f64,

    /// Distance between window starts, seconds
    #[arg(long, default_value_t = 1.0)]
    hop_seconds: f64,

    /// STFT segment length, samples
    #[arg(short = 'f', long, default_value_t = 1024)]
    segment_length: usize,

    /// Playback interval of the animation, ms
    #[arg(long, default_value_t = 500)]
    frame_ms: u64,

    /// Color scheme of heatmaps and the preview image
    #[arg(short = 'c', long = "color-scheme", value_enum, default_value_t = CliColorScheme::Viridis)]
    color_scheme: CliColorScheme,

    /// Directory for exported files
    #[arg(short = 'o', long, default_value = ".")]
    output_dir: PathBuf,

    /// Program used to convert non-WAV input
    #[arg(long, default_value = "ffmpeg")]
    converter: PathBuf,

    /// Also save a PNG preview of the first frame
    #[arg(short = 'p', long = "preview-save")]
    preview_save: bool,

    /// Preview image size in WxH format
    #[arg(short = 'i', long = "image-size", default_value = "2048x512")]
    image_size: String,
}

impl From<CliColorScheme> for srend::ColorScheme {
    fn from(c: CliColorScheme) -> Self {
        match c {
            CliColorScheme::Grayscale => srend::ColorScheme::Grayscale,
            CliColorScheme::Inferno => srend::ColorScheme::Inferno,
            CliColorScheme::Oceanic => srend::ColorScheme::Oceanic,
            CliColorScheme::Sunset => srend::ColorScheme::Sunset,
            CliColorScheme::Synthwave => srend::ColorScheme::Synthwave,
            CliColorScheme::Viridis => srend::ColorScheme::Viridis,
        }
    }
}

/// `WxH`; a missing, zero or unparsable part falls back to its default
fn parse_image_size(s: &str) -> (u32, u32) {
    let part = |p: &str, default: u32| p.parse().ok().filter(|&v| v > 0).unwrap_or(default);

    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() == 2 {
        (
            part(parts[0], DEFAULT_IMAGE_WIDTH),
            part(parts[1], DEFAULT_IMAGE_HEIGHT),
        )
    } else {
        (DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT)
    }
}

impl TryFrom<Args> for AnalysisConfig {
    type Error = error::Error;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let config = AnalysisConfig {
            fft_start: args.fft_start,
            fft_end: args.fft_end,
            export_html: args.export_html,
            show_pitch_labels: args.show_pitch_labels,
            spectrogram: SpectrogramParams {
                window_seconds: args.window_seconds,
                hop_seconds: args.hop_seconds,
                segment_length: args.segment_length,
            },
            frame_ms: args.frame_ms,
            color_scheme: args.color_scheme.into(),
            output_dir: args.output_dir,
            converter: args.converter,
            preview_save: args.preview_save,
            preview_size: parse_image_size(&args.image_size),
            ..AnalysisConfig::new(args.file_name)
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AnalysisConfig::try_from(Args::parse()).context("Invalid arguments")?;
    let summary = pipeline::run(&config)
        .with_context(|| format!("Failed to process {:?}", config.audio_file))?;

    for path in &summary.artifacts {
        info!("Output: {:?}", path);
    }
    info!("Done, {} frames.", summary.frames);
    Ok(())
}

#[cfg(test)]
mod tests {
    include!("main_tests.rs");
}
