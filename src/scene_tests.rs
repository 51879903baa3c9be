#[allow(unused_imports)]
use super::*;
use crate::scalc::SpectrogramFrame;
use std::rc::Rc;

fn frame(start: f64, frequencies: &Rc<[f64]>, level: f32) -> SpectrogramFrame {
    SpectrogramFrame {
        start,
        times: vec![start + 0.5, start + 1.5],
        frequencies: Rc::clone(frequencies),
        power_db: frequencies.iter().map(|_| vec![level, level + 1.0]).collect(),
    }
}

fn test_animation(frames: usize) -> AnimatedSpectrogram {
    let frequencies: Rc<[f64]> = (0..40).map(|k| k as f64 * 27.5).collect::<Vec<_>>().into();
    AnimatedSpectrogram {
        frames: (0..frames)
            .map(|i| frame(i as f64, &frequencies, -(i as f32) * 10.0))
            .collect(),
        window_seconds: 5.0,
        hop_seconds: 1.0,
    }
}

#[test]
fn test_spectrum_scene() {
    let spectrum = SpectrumFrame {
        frequencies: vec![0.0, 100.0, 200.0],
        magnitudes: vec![0.1, 0.8, 0.2],
    };
    let scene = spectrum_scene(&spectrum, 0.0, 5.0);

    assert_eq!(scene.title, "Fourier Transform (0s–5s)");
    assert_eq!(scene.layout.x_axis.title, "Frequency (Hz)");
    assert_eq!(scene.layout.y_axis.title, "Amplitude");
    assert_eq!(scene.layout.y_axis.scale, AxisScale::Linear);
    assert_eq!((scene.layout.width, scene.layout.height), (1000, 500));
    assert!(scene.slider.is_none());
    assert!(scene.playback.is_none());

    match &scene.traces[..] {
        [Trace::Line { x, y, visible, .. }] => {
            assert_eq!(x, &spectrum.frequencies);
            assert_eq!(y, &spectrum.magnitudes);
            assert!(*visible);
        }
        other => panic!("unexpected traces {:?}", other),
    }
}

#[test]
fn test_spectrum_scene_fractional_title() {
    let scene = spectrum_scene(&SpectrumFrame::default(), 1.5, 2.25);
    assert_eq!(scene.title, "Fourier Transform (1.5s–2.25s)");
}

#[test]
fn test_animation_one_trace_per_frame() {
    let anim = test_animation(6);
    let scene = animation_scene(&anim, &AnimationOptions::default());

    assert_eq!(scene.title, "Sliding Spectrogram Animation");
    assert_eq!(scene.traces.len(), 6);
    assert_eq!(scene.traces.iter().filter(|t| t.is_visible()).count(), 1);
    assert_eq!(scene.first_visible().map(Trace::name), Some("0.0s"));

    for (i, trace) in scene.traces.iter().enumerate() {
        match trace {
            Trace::Heatmap { x, y, z, colorbar_title, .. } => {
                assert_eq!(x, &anim.frames[i].times);
                assert_eq!(y.len(), 40);
                assert_eq!(z, &anim.frames[i].power_db);
                assert_eq!(colorbar_title.is_some(), i == 0);
            }
            other => panic!("expected a heatmap, got {:?}", other),
        }
    }
}

#[test]
fn test_animation_slider_and_playback() {
    let scene = animation_scene(&test_animation(3), &AnimationOptions::default());

    let slider = scene.slider.unwrap();
    assert_eq!(slider.prefix, "Slice: ");
    assert_eq!(slider.active, 0);
    let labels: Vec<&str> = slider.steps.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, ["0.0s", "1.0s", "2.0s"]);
    let targets: Vec<usize> = slider.steps.iter().map(|s| s.trace).collect();
    assert_eq!(targets, [0, 1, 2]);

    assert_eq!(scene.playback, Some(Playback { frame_ms: 500 }));
}

#[test]
fn test_animation_custom_frame_interval() {
    let options = AnimationOptions {
        frame_ms: 120,
        ..AnimationOptions::default()
    };
    let scene = animation_scene(&test_animation(2), &options);
    assert_eq!(scene.playback, Some(Playback { frame_ms: 120 }));
}

#[test]
fn test_animation_pitch_ticks() {
    let scene = animation_scene(&test_animation(2), &AnimationOptions::default());
    let y_axis = &scene.layout.y_axis;

    assert_eq!(y_axis.scale, AxisScale::Log);
    let ticks = y_axis.ticks.as_ref().unwrap();
    // 40 frequencies, every 16th labelled
    assert_eq!(ticks.len(), 3);
    assert_eq!(ticks[0], Tick { value: 0.0, label: String::new() });
    assert_eq!(ticks[1].value, 440.0);
    assert_eq!(ticks[1].label, "A4");
    assert_eq!(ticks[2].value, 880.0);
    assert_eq!(ticks[2].label, "A5");
}

#[test]
fn test_animation_without_pitch_labels() {
    let options = AnimationOptions {
        show_pitch_labels: false,
        ..AnimationOptions::default()
    };
    let scene = animation_scene(&test_animation(2), &options);
    assert!(scene.layout.y_axis.ticks.is_none());
    assert_eq!(scene.layout.y_axis.scale, AxisScale::Log);
}

#[test]
fn test_animation_colour_range() {
    let scene = animation_scene(&test_animation(3), &AnimationOptions::default());
    assert_eq!(scene.layout.z_range, Some((-20.0, 1.0)));
    assert_eq!(scene.layout.colorscale.len(), 256);
}

#[test]
fn test_empty_animation() {
    let scene = animation_scene(&test_animation(0), &AnimationOptions::default());

    assert!(scene.traces.is_empty());
    assert!(scene.first_visible().is_none());
    assert!(scene.slider.is_none());
    assert!(scene.playback.is_none());
    assert!(scene.layout.y_axis.ticks.is_none());
    assert!(scene.layout.z_range.is_none());
}

#[test]
fn test_pitch_ticks_short_axis() {
    assert!(pitch_ticks(&[]).is_empty());
    let ticks = pitch_ticks(&[0.0, 10.0, 20.0]);
    assert_eq!(ticks.len(), 1);
    assert_eq!(ticks[0].label, "");
}

#[test]
fn test_scene_json_tags() {
    let scene = animation_scene(&test_animation(2), &AnimationOptions::default());
    let json: serde_json::Value = serde_json::from_str(&scene.to_json().unwrap()).unwrap();

    assert_eq!(json["traces"][0]["kind"], "heatmap");
    assert_eq!(json["traces"][0]["colorbar_title"], "dB");
    assert!(json["traces"][1].get("colorbar_title").is_none());
    assert_eq!(json["layout"]["y_axis"]["scale"], "log");
    assert_eq!(json["layout"]["x_axis"]["scale"], "linear");
    assert!(json["layout"]["x_axis"].get("ticks").is_none());

    let spectrum = spectrum_scene(&SpectrumFrame::default(), 0.0, 5.0);
    let json: serde_json::Value = serde_json::from_str(&spectrum.to_json().unwrap()).unwrap();
    assert_eq!(json["traces"][0]["kind"], "line");
    assert!(json.get("slider").is_none());
}
