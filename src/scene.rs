//! Library-neutral description of a plot: named traces plus layout metadata.
//! Backends in `sview` and `srend` turn a [`Scene`] into an artifact.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::Result;
use crate::pitch::label_frequency;
use crate::scalc::{AnimatedSpectrogram, SpectrumFrame};
use crate::srend::{colorscale_hex, ColorScheme};

/// Every n-th frequency of the axis gets a pitch label
pub const PITCH_TICK_STRIDE: usize = 16;

pub const DEFAULT_FRAME_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tick {
    pub value: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub scale: AxisScale,
    /// Explicit ticks replacing the automatic numeric ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks: Option<Vec<Tick>>,
}

impl Axis {
    fn new(title: &str, scale: AxisScale) -> Self {
        Self {
            title: title.to_string(),
            scale,
            ticks: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub x_axis: Axis,
    pub y_axis: Axis,
    /// 256 `#rrggbb` entries, low to high
    pub colorscale: Vec<String>,
    /// Colour range shared by all heatmaps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_range: Option<(f32, f32)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Trace {
    Line {
        name: String,
        x: Vec<f64>,
        y: Vec<f64>,
        visible: bool,
    },
    Heatmap {
        name: String,
        x: Vec<f64>,
        y: Vec<f64>,
        /// `z[y][x]`
        z: Vec<Vec<f32>>,
        visible: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        colorbar_title: Option<String>,
    },
}

impl Trace {
    pub fn name(&self) -> &str {
        match self {
            Trace::Line { name, .. } | Trace::Heatmap { name, .. } => name,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            Trace::Line { visible, .. } | Trace::Heatmap { visible, .. } => *visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliderStep {
    pub label: String,
    /// Index of the only trace visible at this step
    pub trace: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub prefix: String,
    pub active: usize,
    pub steps: Vec<SliderStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Playback {
    pub frame_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub title: String,
    pub layout: Layout,
    pub traces: Vec<Trace>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slider: Option<Slider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback: Option<Playback>,
}

impl Scene {
    pub fn first_visible(&self) -> Option<&Trace> {
        self.traces.iter().find(|t| t.is_visible())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Turns a scene into an artifact and returns where it was written.
pub trait SceneBackend {
    fn render(&self, scene: &Scene) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    pub show_pitch_labels: bool,
    pub frame_ms: u64,
    pub color_scheme: ColorScheme,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            show_pitch_labels: true,
            frame_ms: DEFAULT_FRAME_MS,
            color_scheme: ColorScheme::Viridis,
        }
    }
}

/// Line plot of one amplitude spectrum
pub fn spectrum_scene(frame: &SpectrumFrame, start_seconds: f64, end_seconds: f64) -> Scene {
    Scene {
        title: format!("Fourier Transform ({}s–{}s)", start_seconds, end_seconds),
        layout: Layout {
            width: 1000,
            height: 500,
            x_axis: Axis::new("Frequency (Hz)", AxisScale::Linear),
            y_axis: Axis::new("Amplitude", AxisScale::Linear),
            colorscale: Vec::new(),
            z_range: None,
        },
        traces: vec![Trace::Line {
            name: "spectrum".to_string(),
            x: frame.frequencies.clone(),
            y: frame.magnitudes.clone(),
            visible: true,
        }],
        slider: None,
        playback: None,
    }
}

/// Ticks at every [`PITCH_TICK_STRIDE`]-th frequency, labelled with note names
pub fn pitch_ticks(frequencies: &[f64]) -> Vec<Tick> {
    frequencies
        .iter()
        .step_by(PITCH_TICK_STRIDE)
        .map(|&f| Tick {
            value: f,
            label: label_frequency(f),
        })
        .collect()
}

/// One heatmap per frame, switched by a slider; only the first is visible.
pub fn animation_scene(anim: &AnimatedSpectrogram, options: &AnimationOptions) -> Scene {
    let traces: Vec<Trace> = anim
        .frames
        .iter()
        .enumerate()
        .map(|(i, frame)| Trace::Heatmap {
            name: format!("{:.1}s", frame.start),
            x: frame.times.clone(),
            y: frame.frequencies.to_vec(),
            z: frame.power_db.clone(),
            visible: i == 0,
            colorbar_title: (i == 0).then(|| "dB".to_string()),
        })
        .collect();

    let (slider, playback) = if traces.is_empty() {
        (None, None)
    } else {
        let steps = anim
            .frames
            .iter()
            .enumerate()
            .map(|(i, frame)| SliderStep {
                label: format!("{:.1}s", frame.start),
                trace: i,
            })
            .collect();
        (
            Some(Slider {
                prefix: "Slice: ".to_string(),
                active: 0,
                steps,
            }),
            Some(Playback {
                frame_ms: options.frame_ms,
            }),
        )
    };

    let mut y_axis = Axis::new("Frequency (Hz)", AxisScale::Log);
    if options.show_pitch_labels && !anim.is_empty() {
        y_axis.ticks = Some(pitch_ticks(anim.frequencies()));
    }

    Scene {
        title: "Sliding Spectrogram Animation".to_string(),
        layout: Layout {
            width: 1000,
            height: 600,
            x_axis: Axis::new("Time (s)", AxisScale::Linear),
            y_axis,
            colorscale: colorscale_hex(options.color_scheme),
            z_range: anim.db_range(),
        },
        traces,
        slider,
        playback,
    }
}

#[cfg(test)]
mod tests {
    include!("scene_tests.rs");
}
