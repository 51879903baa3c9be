use std::rc::Rc;

use log::debug;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::Signal;

/// Floor added to power before taking the logarithm
pub const DB_FLOOR: f32 = 1.0e-10;

/// Tukey taper ratio of the analysis window
const TUKEY_ALPHA: f64 = 0.25;

/// Tolerance for frame counting, absorbs float error in `(D - w) / h`
const FRAME_COUNT_EPSILON: f64 = 1.0e-9;

/// Upper bound on the number of sliding windows in one run
pub const MAX_FRAMES: usize = 10_000;

/// Parameters of the sliding spectrogram
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrogramParams {
    /// Length of each sliding window, seconds
    pub window_seconds: f64,
    /// Distance between window starts, seconds
    pub hop_seconds: f64,
    /// STFT segment length inside a window, samples
    pub segment_length: usize,
}

impl Default for SpectrogramParams {
    fn default() -> Self {
        Self {
            window_seconds: 5.0,
            hop_seconds: 1.0,
            segment_length: 1024,
        }
    }
}

/// Single-sided amplitude spectrum of one time slice
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpectrumFrame {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl SpectrumFrame {
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Frequency and amplitude of the strongest bin
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.magnitudes
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, &m)| (self.frequencies[i], m))
    }
}

/// Raw output of the short-time Fourier transform
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StftOutput {
    pub frequencies: Vec<f64>,
    /// Segment centres relative to the first input sample, seconds
    pub times: Vec<f64>,
    /// Power spectral density, `power[freq][time]`
    pub power: Vec<Vec<f32>>,
}

/// Spectrogram of one sliding window, placed on the global time axis
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrogramFrame {
    /// Absolute start of the window, seconds
    pub start: f64,
    pub times: Vec<f64>,
    /// Shared by every frame of one run
    pub frequencies: Rc<[f64]>,
    /// Power in dB, `power_db[freq][time]`
    pub power_db: Vec<Vec<f32>>,
}

/// Sliding spectrogram frames ordered by start time
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedSpectrogram {
    pub frames: Vec<SpectrogramFrame>,
    pub window_seconds: f64,
    pub hop_seconds: f64,
}

impl AnimatedSpectrogram {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frequency axis shared by all frames, empty when there are no frames
    pub fn frequencies(&self) -> &[f64] {
        self.frames.first().map_or(&[], |f| &f.frequencies[..])
    }

    /// Lowest and highest dB value over all frames
    pub fn db_range(&self) -> Option<(f32, f32)> {
        self.frames
            .iter()
            .flat_map(|f| f.power_db.iter())
            .flat_map(|row| row.iter().copied())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// FFT amplitude spectrum of `signal` between `start_seconds` and `end_seconds`.
///
/// Bounds are rounded to the nearest sample and clamped to the signal;
/// an empty slice gives an empty frame.
pub fn compute_spectrum(signal: &Signal, start_seconds: f64, end_seconds: f64) -> SpectrumFrame {
    let slice = signal.slice(start_seconds, end_seconds);
    let n = slice.len();
    if n == 0 {
        return SpectrumFrame::default();
    }

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);

    let mut buffer: Vec<Complex<f64>> = slice
        .iter()
        .map(|&s| Complex::new(s as f64, 0.0))
        .collect();
    fft.process(&mut buffer);

    let sample_rate = signal.sample_rate() as f64;
    let half = n / 2;
    let scale = 2.0 / n as f64;

    let frequencies = (0..half).map(|k| k as f64 * sample_rate / n as f64).collect();
    let magnitudes = buffer[..half].iter().map(|c| c.norm() * scale).collect();

    SpectrumFrame {
        frequencies,
        magnitudes,
    }
}

/// Power spectral density over overlapping segments of `samples`.
///
/// Segments are `segment_length` samples long (clamped to the input length)
/// and overlap by one eighth. Each segment has its mean removed, is tapered
/// with a periodic Tukey window and transformed; the one-sided power is
/// density-scaled.
pub fn stft_power(samples: &[f32], sample_rate: u32, segment_length: usize) -> StftOutput {
    let nperseg = segment_length.min(samples.len());
    if nperseg == 0 || sample_rate == 0 {
        return StftOutput::default();
    }

    let noverlap = nperseg / 8;
    let step = nperseg - noverlap;
    let num_segments = (samples.len() - noverlap) / step;
    let num_bins = nperseg / 2 + 1;
    let fs = sample_rate as f64;

    let window = tukey_window(nperseg, TUKEY_ALPHA);
    let window_power: f64 = window.iter().map(|w| w * w).sum();
    let scale = 1.0 / (fs * window_power);

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(nperseg);
    let mut buffer = vec![Complex::new(0.0, 0.0); nperseg];

    let mut power = vec![Vec::with_capacity(num_segments); num_bins];
    let mut times = Vec::with_capacity(num_segments);

    for j in 0..num_segments {
        let start = j * step;
        let segment = &samples[start..start + nperseg];
        let mean = segment.iter().map(|&s| s as f64).sum::<f64>() / nperseg as f64;

        for (slot, (&s, &w)) in buffer.iter_mut().zip(segment.iter().zip(window.iter())) {
            *slot = Complex::new((s as f64 - mean) * w, 0.0);
        }
        fft.process(&mut buffer);

        for (k, row) in power.iter_mut().enumerate() {
            let mut p = buffer[k].norm_sqr() * scale;
            // DC and, for even lengths, Nyquist have no mirrored bin
            let mirrored = k != 0 && !(nperseg % 2 == 0 && k == num_bins - 1);
            if mirrored {
                p *= 2.0;
            }
            row.push(p as f32);
        }

        times.push((nperseg as f64 / 2.0 + (j * step) as f64) / fs);
    }

    let frequencies = (0..num_bins).map(|k| k as f64 * fs / nperseg as f64).collect();

    StftOutput {
        frequencies,
        times,
        power,
    }
}

/// Power to decibels, floored to avoid `log10(0)`
pub fn power_to_db(power: f32) -> f32 {
    10.0 * (power.max(0.0) + DB_FLOOR).log10()
}

/// Number of sliding windows that fit into `duration`, zero when
/// `duration <= window`. Saturates instead of overflowing for tiny hops.
pub fn frame_count(duration: f64, window_seconds: f64, hop_seconds: f64) -> usize {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(window_seconds) || !valid(hop_seconds) || !duration.is_finite() {
        return 0;
    }
    if duration <= window_seconds {
        return 0;
    }

    let steps = ((duration - window_seconds) / hop_seconds + FRAME_COUNT_EPSILON).floor();
    (steps as usize).saturating_add(1)
}

/// Start offsets of the sliding windows: `0, h, 2h, ...` for as long as a
/// whole window fits into `duration`, at most [`MAX_FRAMES`] of them.
pub fn window_starts(duration: f64, window_seconds: f64, hop_seconds: f64) -> Vec<f64> {
    let count = frame_count(duration, window_seconds, hop_seconds).min(MAX_FRAMES);
    (0..count).map(|k| k as f64 * hop_seconds).collect()
}

/// Builds the sliding spectrogram of `signal`, see [`build_sliding_spectrogram_with_progress`].
#[cfg(test)]
pub fn build_sliding_spectrogram(signal: &Signal, params: &SpectrogramParams) -> AnimatedSpectrogram {
    build_sliding_spectrogram_with_progress(signal, params, |_, _| {})
}

/// Splits `signal` into overlapping windows and computes a dB spectrogram
/// for each one. `progress_callback(done, total)` is called after every frame.
pub fn build_sliding_spectrogram_with_progress<F>(
    signal: &Signal,
    params: &SpectrogramParams,
    mut progress_callback: F,
) -> AnimatedSpectrogram
where
    F: FnMut(usize, usize),
{
    let starts = window_starts(signal.duration(), params.window_seconds, params.hop_seconds);
    let total = starts.len();
    let mut frames: Vec<SpectrogramFrame> = Vec::with_capacity(total);

    // Rounded window bounds may differ by a sample; clamp the segment length
    // to the shortest window so every frame gets the same frequency axis.
    let segment_length = starts
        .iter()
        .map(|&s| signal.slice(s, s + params.window_seconds).len())
        .min()
        .map_or(params.segment_length, |shortest| params.segment_length.min(shortest));
    let mut shared_axis: Option<Rc<[f64]>> = None;

    for (i, &start) in starts.iter().enumerate() {
        let segment = signal.slice(start, start + params.window_seconds);
        let stft = stft_power(segment, signal.sample_rate(), segment_length);

        let frequencies: Rc<[f64]> = match shared_axis.take() {
            Some(axis) if axis[..] == stft.frequencies[..] => axis,
            _ => stft.frequencies.into(),
        };
        shared_axis = Some(Rc::clone(&frequencies));

        let power_db = stft
            .power
            .iter()
            .map(|row| row.iter().map(|&p| power_to_db(p)).collect())
            .collect();
        let times = stft.times.iter().map(|t| t + start).collect();

        debug!(
            "Frame {} at {:.3}s: {} bins x {} segments",
            i,
            start,
            frequencies.len(),
            stft.times.len()
        );

        frames.push(SpectrogramFrame {
            start,
            times,
            frequencies,
            power_db,
        });

        progress_callback(i + 1, total);
    }

    AnimatedSpectrogram {
        frames,
        window_seconds: params.window_seconds,
        hop_seconds: params.hop_seconds,
    }
}

/// Periodic Tukey window: cosine tapers over `alpha / 2` of each end
fn tukey_window(size: usize, alpha: f64) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0; size];
    }

    // periodic form: symmetric window one sample longer, last sample dropped
    let m = size + 1;
    let span = (m - 1) as f64;
    let width = (alpha * span / 2.0).floor() as usize;

    (0..size)
        .map(|n| {
            let x = n as f64;
            if n <= width {
                0.5 * (1.0 + (std::f64::consts::PI * (-1.0 + 2.0 * x / (alpha * span))).cos())
            } else if n >= m - width - 1 {
                0.5 * (1.0
                    + (std::f64::consts::PI * (-2.0 / alpha + 1.0 + 2.0 * x / (alpha * span))).cos())
            } else {
                1.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    include!("scalc_tests.rs");
}
