use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};

use crate::audio::{load_signal, Converter};
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::pitch::label_frequency;
use crate::scalc::{build_sliding_spectrogram_with_progress, compute_spectrum, frame_count, MAX_FRAMES};
use crate::scene::{animation_scene, spectrum_scene, AnimationOptions, SceneBackend};
use crate::srend::PngBackend;
use crate::sview::{BrowserBackend, HtmlFileBackend};

/// Where each scene of a run goes
pub struct Backends {
    pub spectrum: Box<dyn SceneBackend>,
    pub spectrum_preview: Option<Box<dyn SceneBackend>>,
    pub animation: Box<dyn SceneBackend>,
    pub preview: Option<Box<dyn SceneBackend>>,
}

impl Backends {
    /// Export mode writes both views into `output_dir`; otherwise they are
    /// opened on screen. PNG previews are added when `preview_save` is set.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let (spectrum, animation): (Box<dyn SceneBackend>, Box<dyn SceneBackend>) = if config.export_html {
            (
                Box::new(HtmlFileBackend::new(config.spectrum_path())),
                Box::new(HtmlFileBackend::new(config.animation_path())),
            )
        } else {
            (
                Box::new(BrowserBackend::new("specanim-spectrum.html")),
                Box::new(BrowserBackend::new("specanim-spectrogram.html")),
            )
        };

        let png = |path: PathBuf| {
            config.preview_save.then(|| {
                Box::new(PngBackend {
                    path,
                    width: config.preview_size.0,
                    height: config.preview_size.1,
                    color_scheme: config.color_scheme,
                }) as Box<dyn SceneBackend>
            })
        };

        Self {
            spectrum,
            spectrum_preview: png(config.spectrum_preview_path()),
            animation,
            preview: png(config.preview_path()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    pub artifacts: Vec<PathBuf>,
}

pub fn run(config: &AnalysisConfig) -> Result<RunSummary> {
    run_with(config, &Backends::from_config(config))
}

fn progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(1); // length is set by the callback
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Load, analyse and render `config.audio_file` with the given backends.
pub fn run_with(config: &AnalysisConfig, backends: &Backends) -> Result<RunSummary> {
    config.validate()?;

    info!("Input file: {:?}", config.audio_file);
    info!(
        "Spectrum range: {}s..{}s, window = {}s, hop = {}s, segment = {} samples",
        config.fft_start,
        config.fft_end,
        config.spectrogram.window_seconds,
        config.spectrogram.hop_seconds,
        config.spectrogram.segment_length
    );

    // --- Stage 1: loading ---
    let started = Instant::now();
    let audio = load_signal(&config.audio_file, &Converter::new(&config.converter))?;
    info!(
        "Loaded {} ({} samples) in {:.2?}",
        audio.metadata.to_pretty_string(),
        audio.signal.len(),
        started.elapsed()
    );

    let signal = &audio.signal;
    if signal.is_empty() {
        warn!("{:?} contains no samples", config.audio_file);
    }
    let frames = frame_count(
        signal.duration(),
        config.spectrogram.window_seconds,
        config.spectrogram.hop_seconds,
    );
    if frames > MAX_FRAMES {
        return Err(Error::InvalidConfig(format!(
            "hop of {}s gives {} frames over {:.3}s, at most {} are supported",
            config.spectrogram.hop_seconds,
            frames,
            signal.duration(),
            MAX_FRAMES
        )));
    }

    // --- Stage 2: single-window spectrum ---
    if config.fft_end > signal.duration() {
        warn!(
            "Spectrum range ends at {}s but the signal is only {:.3}s long",
            config.fft_end,
            signal.duration()
        );
    }
    let spectrum = compute_spectrum(signal, config.fft_start, config.fft_end);
    match spectrum.peak() {
        Some((freq, amplitude)) => info!(
            "Spectrum peak at {:.1} Hz ({}), amplitude {:.4}",
            freq,
            label_frequency(freq),
            amplitude
        ),
        None => warn!("Spectrum range contains no samples"),
    }

    let scene = spectrum_scene(&spectrum, config.fft_start, config.fft_end);
    let mut artifacts = vec![backends.spectrum.render(&scene)?];
    if let Some(preview) = &backends.spectrum_preview {
        artifacts.push(preview.render(&scene)?);
    }

    // --- Stage 3: sliding spectrogram ---
    let started = Instant::now();
    let pb = progress_bar();
    let anim = build_sliding_spectrogram_with_progress(signal, &config.spectrogram, |done, total| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    });
    pb.finish_and_clear();

    if anim.is_empty() {
        warn!(
            "Signal is {:.3}s long, no {}s window fits: the animation is empty",
            signal.duration(),
            config.spectrogram.window_seconds
        );
    }
    info!("Generated {} frames in {:.2?}", anim.len(), started.elapsed());

    // --- Stage 4: animation ---
    let started = Instant::now();
    let options = AnimationOptions {
        show_pitch_labels: config.show_pitch_labels,
        frame_ms: config.frame_ms,
        color_scheme: config.color_scheme,
    };
    let scene = animation_scene(&anim, &options);
    artifacts.push(backends.animation.render(&scene)?);

    if let Some(preview) = &backends.preview {
        artifacts.push(preview.render(&scene)?);
    }
    info!("Rendered in {:.2?}", started.elapsed());

    Ok(RunSummary {
        frames: anim.len(),
        artifacts,
    })
}

#[cfg(test)]
mod tests {
    include!("pipeline_tests.rs");
}
