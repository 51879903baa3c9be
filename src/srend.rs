use std::path::{Path, PathBuf};

use hsl::HSL;
use image::{Rgb, RgbImage};
use log::info;

use crate::error::Result;
use crate::scene::{AxisScale, Scene, SceneBackend, Trace};

/// RGB color structure for gradients and colormaps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    const fn new(r: u8, g: u8, b: u8) -> Self { Self { r, g, b } }
    const fn new_rgb(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >>  8) & 0xFF) as u8,
            b: (rgb         & 0xFF) as u8,
        }
    }

    fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Supported color schemes for heatmaps
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum ColorScheme {
    Oceanic,   // #01041B, #072e69, #4da4d5, #dcf3ff
    Grayscale, // #000000, #888888, #ffffff
    Inferno,   // #000004, #3b0f70, #ac255e, #f98e09, #fcfd21
    Viridis,   // #440154, #3b528b, #21918c, #5ec962, #fde725
    Synthwave, // #0d0221, #2d134b, #a537fd, #00f6ff
    Sunset,    // #3c031c, #9c1521, #fd6a02, #fec812
}

const OCEANIC: [Color; 4] = [
    Color::new_rgb(0x01041B),
    Color::new_rgb(0x072e69),
    Color::new_rgb(0x4da4d5),
    Color::new_rgb(0xdcf3ff),
];

const GRAYSCALE: [Color; 3] = [
    Color::new_rgb(0x000000),
    Color::new_rgb(0x888888),
    Color::new_rgb(0xffffff),
];

const INFERNO: [Color; 5] = [
    Color::new_rgb(0x000004),
    Color::new_rgb(0x3b0f70),
    Color::new_rgb(0xac255e),
    Color::new_rgb(0xf98e09),
    Color::new_rgb(0xfcfd21),
];

const VIRIDIS: [Color; 5] = [
    Color::new_rgb(0x440154),
    Color::new_rgb(0x3b528b),
    Color::new_rgb(0x21918c),
    Color::new_rgb(0x5ec962),
    Color::new_rgb(0xfde725),
];

const SYNTHWAVE: [Color; 4] = [
    Color::new_rgb(0x0d0221),
    Color::new_rgb(0x2d134b),
    Color::new_rgb(0xa537fd),
    Color::new_rgb(0x00f6ff),
];

const SUNSET: [Color; 4] = [
    Color::new_rgb(0x3c031c),
    Color::new_rgb(0x9c1521),
    Color::new_rgb(0xfd6a02),
    Color::new_rgb(0xfec812),
];

const BACKGROUND: Color = Color::new_rgb(0x111111);
const LINE_COLOR: Color = Color::new_rgb(0x636efa);

fn get_color_stops(scheme: ColorScheme) -> &'static [Color] {
    match scheme {
        ColorScheme::Oceanic   => &OCEANIC,
        ColorScheme::Grayscale => &GRAYSCALE,
        ColorScheme::Inferno   => &INFERNO,
        ColorScheme::Viridis   => &VIRIDIS,
        ColorScheme::Synthwave => &SYNTHWAVE,
        ColorScheme::Sunset    => &SUNSET,
    }
}

const GRADIENT_SIZE: usize = 256;

/// Colour scale of `scheme` as `#rrggbb` strings, for scene layouts
pub fn colorscale_hex(scheme: ColorScheme) -> Vec<String> {
    generate_gradient_hsl(get_color_stops(scheme))
        .iter()
        .map(|c| c.to_hex())
        .collect()
}

/// Generate a smooth HSL gradient from a list of color stops
///
/// - `stops`: Reference colors (at least 2)
///
/// Returns: Array of 256 interpolated Color values
fn generate_gradient_hsl(stops: &[Color]) -> [Color; GRADIENT_SIZE] {
    if stops.is_empty() { panic!("List of reference colors cannot be empty"); }
    if stops.len() == 1 { return [stops[0]; GRADIENT_SIZE]; }

    let hsl_stops: Vec<HSL> = stops.iter()
        .map(|c| HSL::from_rgb(&[c.r, c.g, c.b]))
        .collect();

    let mut gradient = [Color::new(0, 0, 0); GRADIENT_SIZE];
    let num_segments = hsl_stops.len() - 1;

    for (i, slot) in gradient.iter_mut().enumerate() {
        let progress = i as f64 / (GRADIENT_SIZE - 1) as f64;

        let (segment_index, segment_progress) = if progress >= 1.0 {
            (num_segments - 1, 1.0)
        } else {
            let segment_float = progress * num_segments as f64;
            (segment_float.floor() as usize, segment_float.fract())
        };

        let start_hsl = hsl_stops[segment_index];
        let end_hsl = hsl_stops[segment_index + 1];

        let s = start_hsl.s + (end_hsl.s - start_hsl.s) * segment_progress;
        let l = start_hsl.l + (end_hsl.l - start_hsl.l) * segment_progress;

        // Hue takes the short path around the circle
        let mut h_start = start_hsl.h;
        let h_end = end_hsl.h;
        let h_diff = h_end - h_start;

        if h_diff.abs() > 180.0 {
            if h_diff > 0.0 {
                h_start += 360.0;
            } else {
                h_start -= 360.0;
            }
        }
        let h = (h_start + (h_end - h_start) * segment_progress).rem_euclid(360.0);

        let (r, g, b) = HSL { h, s, l }.to_rgb();
        *slot = Color::new(r, g, b);
    }

    gradient
}

/// Index of the value in sorted `axis` closest to `target`
fn nearest_index(axis: &[f64], target: f64) -> usize {
    let idx = axis.partition_point(|&v| v < target);
    if idx == 0 {
        return 0;
    }
    if idx >= axis.len() {
        return axis.len() - 1;
    }
    if (axis[idx] - target).abs() < (target - axis[idx - 1]).abs() {
        idx
    } else {
        idx - 1
    }
}

/// Axis row for each pixel row, top to bottom (low frequencies at the bottom)
fn row_mapping(y: &[f64], height: u32, scale: AxisScale) -> Vec<usize> {
    let rows = y.len();
    let first_positive = y.iter().position(|&v| v > 0.0);

    let log_bounds = match (scale, first_positive) {
        (AxisScale::Log, Some(p)) if y[rows - 1] > y[p] => Some((y[p].ln(), y[rows - 1].ln())),
        _ => None,
    };

    (0..height)
        .map(|py| {
            let from_bottom = (height - 1 - py) as usize;
            match log_bounds {
                Some((lo, hi)) => {
                    let frac = if height > 1 { from_bottom as f64 / (height - 1) as f64 } else { 0.0 };
                    nearest_index(y, (lo + (hi - lo) * frac).exp())
                }
                None => (from_bottom * rows) / height as usize,
            }
        })
        .collect()
}

/// Rasterize a heatmap `z[y][x]` into an image, with given size, color scheme and colour range
///
/// Pixel columns covering several `x` columns show their maximum, which
/// preserves peaks and short events.
pub fn create_heatmap_image(
    z: &[Vec<f32>],
    y: &[f64],
    y_scale: AxisScale,
    z_range: (f32, f32),
    width: u32,
    height: u32,
    color_scheme: ColorScheme,
) -> RgbImage {
    let gradient = generate_gradient_hsl(get_color_stops(color_scheme));
    let mut img = RgbImage::new(width, height);

    let rows = z.len().min(y.len());
    let columns = z.first().map_or(0, Vec::len);
    if rows == 0 || columns == 0 || width == 0 || height == 0 {
        return img;
    }

    let (min_db, max_db) = z_range;
    let span = (max_db - min_db).max(f32::EPSILON);
    let row_for_pixel = row_mapping(&y[..rows], height, y_scale);

    for x in 0..width {
        let start_col = (x as usize * columns) / width as usize;
        let end_col = (((x as usize + 1) * columns) / width as usize).max(start_col + 1);

        for (py, &row) in row_for_pixel.iter().enumerate() {
            let max_val = z[row][start_col..end_col.min(columns)]
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max);

            let normalized_val = (max_val - min_db) / span;
            let idx = (normalized_val.clamp(0.0, 1.0) * (GRADIENT_SIZE as f32 - 1.0)).round() as usize;
            let c = gradient[idx.min(GRADIENT_SIZE - 1)];
            img.put_pixel(x, py as u32, Rgb([c.r, c.g, c.b]));
        }
    }

    img
}

/// Rasterize a line plot scaled to fill the image
pub fn create_line_image(x: &[f64], y: &[f64], width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([BACKGROUND.r, BACKGROUND.g, BACKGROUND.b]));

    let n = x.len().min(y.len());
    if n == 0 || width == 0 || height == 0 {
        return img;
    }

    let (x_min, x_max) = (x[0], x[n - 1]);
    let (y_min, y_max) = y[..n].iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
        (lo.min(v), hi.max(v))
    });
    let x_span = if x_max > x_min { x_max - x_min } else { 1.0 };
    let y_span = if y_max > y_min { y_max - y_min } else { 1.0 };

    let to_pixel = |i: usize| -> (f64, f64) {
        let px = (x[i] - x_min) / x_span * (width - 1) as f64;
        let py = (1.0 - (y[i] - y_min) / y_span) * (height - 1) as f64;
        (px, py)
    };

    let mut previous = to_pixel(0);
    plot_point(&mut img, previous);
    for i in 1..n {
        let current = to_pixel(i);
        draw_segment(&mut img, previous, current);
        previous = current;
    }

    img
}

fn plot_point(img: &mut RgbImage, (x, y): (f64, f64)) {
    let (px, py) = (x.round(), y.round());
    if px >= 0.0 && py >= 0.0 && (px as u32) < img.width() && (py as u32) < img.height() {
        img.put_pixel(px as u32, py as u32, Rgb([LINE_COLOR.r, LINE_COLOR.g, LINE_COLOR.b]));
    }
}

fn draw_segment(img: &mut RgbImage, from: (f64, f64), to: (f64, f64)) {
    let steps = (to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil().max(1.0) as usize;
    for s in 1..=steps {
        let t = s as f64 / steps as f64;
        plot_point(img, (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t));
    }
}

/// Writes the first visible trace of a scene as a PNG image.
#[derive(Debug, Clone)]
pub struct PngBackend {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub color_scheme: ColorScheme,
}

impl PngBackend {
    pub fn rasterize(&self, scene: &Scene) -> RgbImage {
        match scene.first_visible() {
            Some(Trace::Heatmap { y, z, .. }) => {
                let z_range = scene.layout.z_range.unwrap_or_else(|| value_range(z));
                create_heatmap_image(
                    z,
                    y,
                    scene.layout.y_axis.scale,
                    z_range,
                    self.width,
                    self.height,
                    self.color_scheme,
                )
            }
            Some(Trace::Line { x, y, .. }) => create_line_image(x, y, self.width, self.height),
            None => RgbImage::new(self.width, self.height),
        }
    }
}

fn value_range(z: &[Vec<f32>]) -> (f32, f32) {
    z.iter()
        .flatten()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

impl SceneBackend for PngBackend {
    fn render(&self, scene: &Scene) -> Result<PathBuf> {
        let image = self.rasterize(scene);
        save_image(&image, &self.path)?;
        info!("Preview image saved to {:?}", self.path);
        Ok(self.path.clone())
    }
}

fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    image.save(path)?;
    Ok(())
}
