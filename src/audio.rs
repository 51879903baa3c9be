use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info, warn};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I16,
    I24,
    I32,
    F32,
}

#[derive(Debug, Clone)]
pub struct AudioMetadata {
    pub codec: String,
    pub sample_rate: u32,
    /// Number of frames (samples per channel)
    pub total_samples: u64,
    pub channels: u16,
    pub sample_type: SampleType,
}

fn format_duration(duration: f64) -> String {
    if duration < 0.0 {
        return format!("-{}", format_duration(-duration));
    }

    if duration < 1.0 {
        let ms = (duration * 1000.0).round() as u32;
        return format!("{}ms", ms);
    }

    let whole = ((duration * 1000.0).round() as u64) % 1000 == 0;
    if duration < 60.0 {
        return if whole {
            format!("{:.0}s", duration)
        } else {
            format!("{:.3}s", duration)
        };
    }

    let minutes = (duration / 60.0).trunc() as u32;
    let seconds = duration % 60.0;
    if whole {
        format!("{}:{:02.0}m", minutes, seconds)
    } else {
        format!("{}:{:06.3}m", minutes, seconds)
    }
}

impl AudioMetadata {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.total_samples as f64 / self.sample_rate as f64
    }

    pub fn to_pretty_string(&self) -> String {
        format!(
            "'{}', {} Hz, {} ch, {}, {}",
            self.codec,
            self.sample_rate,
            self.channels,
            match self.sample_type {
                SampleType::U8 => "u8",
                SampleType::I16 => "i16",
                SampleType::I24 => "i24",
                SampleType::I32 => "i32",
                SampleType::F32 => "f32",
            },
            format_duration(self.duration())
        )
    }
}

/// Mono signal, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    #[cfg(test)]
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Nearest sample index for a time offset, clamped to `[0, len]`.
    pub fn sample_index(&self, seconds: f64) -> usize {
        let idx = (seconds * self.sample_rate as f64).round();
        if !idx.is_finite() || idx <= 0.0 {
            return 0;
        }
        (idx as usize).min(self.samples.len())
    }

    /// Samples in `[start, end)` seconds. Out-of-range or inverted bounds
    /// give a truncated or empty slice.
    pub fn slice(&self, start_seconds: f64, end_seconds: f64) -> &[f32] {
        let start = self.sample_index(start_seconds);
        let end = self.sample_index(end_seconds);
        if start >= end {
            return &[];
        }
        &self.samples[start..end]
    }
}

pub trait AudioReader {
    fn metadata(&self) -> &AudioMetadata;

    /// Reads the whole stream and keeps only the first channel,
    /// normalized to [-1.0, 1.0].
    fn read_first_channel(&mut self) -> Result<Vec<f32>>;
}

pub fn create_audio_reader(path: &Path) -> Result<Box<dyn AudioReader>> {
    let extension = extension_of(path);

    match extension.as_str() {
        "wav" => Ok(Box::new(WavReader::open(path)?)),
        "flac" => Ok(Box::new(FlacReader::open(path)?)),
        _ => match WavReader::open(path) {
            Ok(reader) => Ok(Box::new(reader)),
            Err(_) => Err(Error::UnsupportedFormat(format!(
                "'{}' from path {:?}",
                extension, path
            ))),
        },
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Formats read natively; everything else goes through the converter.
pub fn needs_conversion(path: &Path) -> bool {
    !matches!(extension_of(path).as_str(), "wav" | "flac")
}

pub struct WavReader {
    metadata: AudioMetadata,
    reader: hound::WavReader<BufReader<File>>,
}

impl WavReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        let metadata = AudioMetadata {
            codec: "wav".to_string(),
            sample_rate: spec.sample_rate,
            total_samples: reader.duration() as u64,
            channels: spec.channels,
            sample_type: match spec.sample_format {
                hound::SampleFormat::Int => match spec.bits_per_sample {
                    8 => SampleType::U8,
                    16 => SampleType::I16,
                    24 => SampleType::I24,
                    _ => SampleType::I32,
                },
                hound::SampleFormat::Float => SampleType::F32,
            },
        };

        Ok(WavReader { metadata, reader })
    }
}

impl AudioReader for WavReader {
    fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }

    fn read_first_channel(&mut self) -> Result<Vec<f32>> {
        let spec = self.reader.spec();
        let channels = spec.channels.max(1) as usize;
        let mut samples = Vec::with_capacity(self.metadata.total_samples as usize);

        match spec.sample_format {
            hound::SampleFormat::Float => {
                for (i, sample) in self.reader.samples::<f32>().enumerate() {
                    let sample = sample?;
                    if i % channels == 0 {
                        samples.push(sample);
                    }
                }
            }
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
                for (i, sample) in self.reader.samples::<i32>().enumerate() {
                    let sample = sample?;
                    if i % channels == 0 {
                        samples.push(sample as f32 / scale);
                    }
                }
            }
        }

        Ok(samples)
    }
}

pub struct FlacReader {
    metadata: AudioMetadata,
    bits_per_sample: u32,
    reader: claxon::FlacReader<File>,
}

impl FlacReader {
    pub fn open(path: &Path) -> Result<Self> {
        let reader = claxon::FlacReader::open(path)?;
        let info = reader.streaminfo();

        let metadata = AudioMetadata {
            codec: "flac".to_string(),
            sample_rate: info.sample_rate,
            total_samples: info.samples.unwrap_or(0),
            channels: info.channels as u16,
            sample_type: match info.bits_per_sample {
                8 => SampleType::U8,
                16 => SampleType::I16,
                24 => SampleType::I24,
                _ => SampleType::I32,
            },
        };

        Ok(FlacReader {
            metadata,
            bits_per_sample: info.bits_per_sample,
            reader,
        })
    }
}

impl AudioReader for FlacReader {
    fn metadata(&self) -> &AudioMetadata {
        &self.metadata
    }

    fn read_first_channel(&mut self) -> Result<Vec<f32>> {
        let channels = self.metadata.channels.max(1) as usize;
        let scale = (1i64 << (self.bits_per_sample.clamp(1, 32) - 1)) as f32;
        let mut samples = Vec::with_capacity(self.metadata.total_samples as usize);

        for (i, sample) in self.reader.samples().enumerate() {
            let sample = sample?;
            if i % channels == 0 {
                samples.push(sample as f32 / scale);
            }
        }

        Ok(samples)
    }
}

/// External format converter, invoked as a blocking subprocess.
#[derive(Debug, Clone)]
pub struct Converter {
    program: PathBuf,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl Converter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Converts `input` into an uncompressed WAV at `output`.
    /// The returned guard removes `output` when dropped.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<DecodedFile> {
        debug!(
            "Running {:?} -y -i {:?} {:?}",
            self.program, input, output
        );

        let decoded = DecodedFile {
            path: output.to_path_buf(),
        };

        let status = Command::new(&self.program)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::DecodeFailed {
                path: input.to_path_buf(),
                reason: format!("cannot run {:?}: {}", self.program, e),
            })?;

        if !status.success() {
            return Err(Error::DecodeFailed {
                path: input.to_path_buf(),
                reason: format!("{:?} exited with {}", self.program, status),
            });
        }

        if !output.exists() {
            return Err(Error::DecodeFailed {
                path: input.to_path_buf(),
                reason: format!("{:?} produced no output", self.program),
            });
        }

        Ok(decoded)
    }
}

/// Temporary decoded file, deleted on drop.
#[derive(Debug)]
pub struct DecodedFile {
    path: PathBuf,
}

impl DecodedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DecodedFile {
    fn drop(&mut self) {
        if !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed temporary file {:?}", self.path),
            Err(e) => warn!("Could not remove temporary file {:?}: {}", self.path, e),
        }
    }
}

/// A loaded signal together with the temporary file it was decoded from,
/// if any. The temporary file lives as long as this value.
#[derive(Debug)]
pub struct LoadedAudio {
    pub signal: Signal,
    pub metadata: AudioMetadata,
    _decoded: Option<DecodedFile>,
}

fn temp_wav_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");
    std::env::temp_dir().join(format!("{}-{}.decoded.wav", stem, std::process::id()))
}

/// Loads the first channel of `path`, converting it to WAV first when the
/// container is not read natively.
pub fn load_signal(path: &Path, converter: &Converter) -> Result<LoadedAudio> {
    let decoded = if needs_conversion(path) {
        let output = temp_wav_path(path);
        info!("Converting {:?} to {:?}", path, output);
        Some(converter.convert(path, &output)?)
    } else {
        None
    };

    let source = decoded.as_ref().map_or(path, DecodedFile::path);
    let mut reader = create_audio_reader(source)?;
    let metadata = reader.metadata().clone();
    if metadata.channels > 1 {
        info!("Using the first of {} channels", metadata.channels);
    }

    let samples = reader.read_first_channel()?;
    let signal = Signal::new(samples, metadata.sample_rate);

    Ok(LoadedAudio {
        signal,
        metadata,
        _decoded: decoded,
    })
}
