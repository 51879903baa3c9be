use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::scalc::SpectrogramParams;
use crate::scene::DEFAULT_FRAME_MS;
use crate::srend::ColorScheme;
use crate::sview::{ANIMATION_FILE_NAME, SPECTRUM_FILE_NAME};

pub const DEFAULT_IMAGE_WIDTH: u32 = 2048;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 512;

/// Everything one run needs; built once and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    pub audio_file: PathBuf,
    /// Time bounds of the static spectrum view, seconds
    pub fft_start: f64,
    pub fft_end: f64,
    /// Write the animation to a file instead of opening it
    pub export_html: bool,
    pub show_pitch_labels: bool,
    pub spectrogram: SpectrogramParams,
    /// Playback interval of the animation
    pub frame_ms: u64,
    pub color_scheme: ColorScheme,
    pub output_dir: PathBuf,
    /// External program converting non-WAV input
    pub converter: PathBuf,
    pub preview_save: bool,
    pub preview_size: (u32, u32),
}

impl AnalysisConfig {
    pub fn new(audio_file: impl Into<PathBuf>) -> Self {
        Self {
            audio_file: audio_file.into(),
            fft_start: 0.0,
            fft_end: 5.0,
            export_html: true,
            show_pitch_labels: true,
            spectrogram: SpectrogramParams::default(),
            frame_ms: DEFAULT_FRAME_MS,
            color_scheme: ColorScheme::Viridis,
            output_dir: PathBuf::from("."),
            converter: PathBuf::from("ffmpeg"),
            preview_save: false,
            preview_size: (DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if !self.fft_start.is_finite() || !self.fft_end.is_finite() || self.fft_start < 0.0 {
            return invalid(format!(
                "spectrum range {}s..{}s must be finite and non-negative",
                self.fft_start, self.fft_end
            ));
        }
        if self.fft_start >= self.fft_end {
            return invalid(format!(
                "spectrum start {}s must be before end {}s",
                self.fft_start, self.fft_end
            ));
        }

        let SpectrogramParams {
            window_seconds,
            hop_seconds,
            segment_length,
        } = self.spectrogram;
        if !(window_seconds.is_finite() && window_seconds > 0.0) {
            return invalid(format!("window length {}s must be positive", window_seconds));
        }
        if !(hop_seconds.is_finite() && hop_seconds > 0.0) {
            return invalid(format!("hop length {}s must be positive", hop_seconds));
        }
        if segment_length == 0 {
            return invalid("segment length must be at least one sample".to_string());
        }
        if self.frame_ms == 0 {
            return invalid("frame interval must be at least 1 ms".to_string());
        }
        if self.preview_size.0 == 0 || self.preview_size.1 == 0 {
            return invalid(format!(
                "preview size {}x{} must be non-zero",
                self.preview_size.0, self.preview_size.1
            ));
        }

        Ok(())
    }

    /// Where the exported animation is written
    pub fn animation_path(&self) -> PathBuf {
        self.output_dir.join(ANIMATION_FILE_NAME)
    }

    /// Where the exported spectrum is written
    pub fn spectrum_path(&self) -> PathBuf {
        self.output_dir.join(SPECTRUM_FILE_NAME)
    }

    fn output_named(&self, suffix: &str) -> PathBuf {
        let name = self
            .audio_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string());
        self.output_dir.join(format!("{}{}", name, suffix))
    }

    /// `<audio file>.png` next to the output
    pub fn preview_path(&self) -> PathBuf {
        self.output_named(".png")
    }

    /// `<audio file>.spectrum.png` next to the output
    pub fn spectrum_preview_path(&self) -> PathBuf {
        self.output_named(".spectrum.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::new("song.mp3");
        assert!(config.validate().is_ok());
        assert_eq!(config.fft_start, 0.0);
        assert_eq!(config.fft_end, 5.0);
        assert!(config.export_html);
        assert!(config.show_pitch_labels);
        assert_eq!(config.spectrogram.window_seconds, 5.0);
        assert_eq!(config.spectrogram.hop_seconds, 1.0);
        assert_eq!(config.frame_ms, 500);
    }

    #[test]
    fn test_rejects_inverted_spectrum_range() {
        let config = AnalysisConfig {
            fft_start: 5.0,
            fft_end: 1.0,
            ..AnalysisConfig::new("a.wav")
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_non_positive_window_and_hop() {
        let mut config = AnalysisConfig::new("a.wav");
        config.spectrogram.window_seconds = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new("a.wav");
        config.spectrogram.hop_seconds = -1.0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new("a.wav");
        config.spectrogram.hop_seconds = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_sizes() {
        let mut config = AnalysisConfig::new("a.wav");
        config.spectrogram.segment_length = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new("a.wav");
        config.frame_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::new("a.wav");
        config.preview_size = (0, 10);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_paths() {
        let config = AnalysisConfig {
            output_dir: PathBuf::from("out"),
            ..AnalysisConfig::new("music/track.flac")
        };
        assert_eq!(config.animation_path(), PathBuf::from("out/spectrogram_animation.html"));
        assert_eq!(config.spectrum_path(), PathBuf::from("out/fourier_transform.html"));
        assert_eq!(config.preview_path(), PathBuf::from("out/track.flac.png"));
        assert_eq!(
            config.spectrum_preview_path(),
            PathBuf::from("out/track.flac.spectrum.png")
        );
    }
}
