#[allow(unused_imports)]
use super::*;
use crate::audio::Signal;
use crate::scalc::{build_sliding_spectrogram, compute_spectrum, SpectrogramParams};
use crate::scene::{animation_scene, spectrum_scene, AnimationOptions};

fn test_animation() -> Scene {
    let samples: Vec<f32> = (0..8000 * 8).map(|i| (i as f32 * 0.05).sin()).collect();
    let anim = build_sliding_spectrogram(&Signal::new(samples, 8000), &SpectrogramParams::default());
    animation_scene(&anim, &AnimationOptions::default())
}

fn embedded_json(html: &str) -> serde_json::Value {
    let start_tag = "<script id=\"scene-data\" type=\"application/json\">";
    let start = html.find(start_tag).unwrap() + start_tag.len();
    let end = start + html[start..].find("</script>").unwrap();
    serde_json::from_str(&html[start..end]).unwrap()
}

#[test]
fn test_escape_html() {
    assert_eq!(escape_html("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&#39;");
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn test_render_html_is_self_contained() {
    let html = render_html(&test_animation()).unwrap();

    assert!(!html.contains("{{SCENE}}"));
    assert!(!html.contains("{{TITLE}}"));
    assert!(!html.contains("<script src"));
    assert!(!html.contains("<link"));
    assert!(!html.contains("http://"));
    assert!(!html.contains("https://"));
    assert!(html.contains("<title>Sliding Spectrogram Animation</title>"));
}

#[test]
fn test_render_html_embeds_all_frames() {
    let scene = test_animation();
    let html = render_html(&scene).unwrap();
    let json = embedded_json(&html);

    let traces = json["traces"].as_array().unwrap();
    assert_eq!(traces.len(), 4);
    assert_eq!(traces[0]["kind"], "heatmap");
    assert_eq!(traces[0]["visible"], true);
    assert_eq!(traces[1]["visible"], false);
    assert_eq!(json["slider"]["steps"].as_array().unwrap().len(), 4);
    assert_eq!(json["playback"]["frame_ms"], 500);
    assert_eq!(json["layout"]["y_axis"]["scale"], "log");
}

#[test]
fn test_render_html_escapes_script_terminator() {
    let signal = Signal::new(vec![0.0; 100], 100);
    let mut scene = spectrum_scene(&compute_spectrum(&signal, 0.0, 1.0), 0.0, 1.0);
    scene.title = "</script><b>".to_string();

    let html = render_html(&scene).unwrap();
    assert_eq!(html.matches("</script>").count(), 2);
    assert!(html.contains("<title>&lt;/script&gt;&lt;b&gt;</title>"));
    assert_eq!(embedded_json(&html)["title"], "</script><b>");
}

#[test]
fn test_html_file_backend_writes_file() {
    let dir = std::env::temp_dir().join(format!("specanim-sview-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(ANIMATION_FILE_NAME);

    let written = HtmlFileBackend::new(&path).render(&test_animation()).unwrap();
    assert_eq!(written, path);

    let html = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_dir_all(&dir).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
}

#[test]
fn test_html_file_backend_missing_directory() {
    let path = std::env::temp_dir()
        .join("specanim-no-such-dir")
        .join("nested")
        .join(ANIMATION_FILE_NAME);
    let result = HtmlFileBackend::new(path).render(&test_animation());
    assert!(matches!(result, Err(Error::Io(_))));
}

#[cfg(unix)]
#[test]
fn test_browser_backend_runs_opener() {
    let name = format!("specanim-browser-{}.html", std::process::id());
    let backend = BrowserBackend::new(name.clone()).with_opener("true");

    let page = backend.render(&test_animation()).unwrap();
    assert_eq!(page, std::env::temp_dir().join(name));
    assert!(page.exists());
    std::fs::remove_file(page).unwrap();
}

#[cfg(unix)]
#[test]
fn test_browser_backend_reports_opener_failure() {
    let name = format!("specanim-browser-fail-{}.html", std::process::id());
    let backend = BrowserBackend::new(name.clone()).with_opener("false");

    let result = backend.render(&test_animation());
    let _ = std::fs::remove_file(std::env::temp_dir().join(name));
    assert!(matches!(result, Err(Error::Display { .. })));
}
