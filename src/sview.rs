use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::error::{Error, Result};
use crate::scene::{Scene, SceneBackend, Trace};

/// Self-contained viewer page, scene JSON and title are substituted in
const VIEWER_TEMPLATE: &str = include_str!("viewer.html");

pub const ANIMATION_FILE_NAME: &str = "spectrogram_animation.html";
pub const SPECTRUM_FILE_NAME: &str = "fourier_transform.html";

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full HTML page for `scene`; all data is embedded, nothing is fetched.
pub fn render_html(scene: &Scene) -> Result<String> {
    // "</" would close the data <script> element early
    let json = scene.to_json()?.replace("</", "<\\/");
    Ok(VIEWER_TEMPLATE
        .replacen("{{SCENE}}", &json, 1)
        .replacen("{{TITLE}}", &escape_html(&scene.title), 1))
}

fn write_html(scene: &Scene, path: &Path) -> Result<()> {
    let html = render_html(scene)?;
    std::fs::write(path, html)?;
    debug!(
        "Wrote {} traces to {:?}, first visible {:?}",
        scene.traces.len(),
        path,
        scene.first_visible().map(Trace::name)
    );
    Ok(())
}

/// Serializes a scene into a standalone HTML file.
#[derive(Debug, Clone)]
pub struct HtmlFileBackend {
    pub path: PathBuf,
}

impl HtmlFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SceneBackend for HtmlFileBackend {
    fn render(&self, scene: &Scene) -> Result<PathBuf> {
        write_html(scene, &self.path)?;
        info!("Saved '{}' as {:?}", scene.title, self.path);
        Ok(self.path.clone())
    }
}

/// Shows a scene on screen: writes the page to the temp directory and opens
/// it with the platform's default handler.
#[derive(Debug, Clone)]
pub struct BrowserBackend {
    file_name: String,
    opener: Option<PathBuf>,
}

impl BrowserBackend {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            opener: None,
        }
    }

    /// Uses `program <page>` instead of the platform default
    #[cfg(test)]
    pub fn with_opener(mut self, program: impl Into<PathBuf>) -> Self {
        self.opener = Some(program.into());
        self
    }

    fn open_command(&self, page: &Path) -> Command {
        if let Some(program) = &self.opener {
            let mut cmd = Command::new(program);
            cmd.arg(page);
            return cmd;
        }

        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(page);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(page);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(page);
            cmd
        }
    }
}

impl SceneBackend for BrowserBackend {
    fn render(&self, scene: &Scene) -> Result<PathBuf> {
        let page = std::env::temp_dir().join(&self.file_name);
        write_html(scene, &page)?;

        let status = self
            .open_command(&page)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| Error::Display {
                path: page.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            return Err(Error::Display {
                path: page,
                reason: format!("opener exited with {}", status),
            });
        }

        info!("Opened '{}' from {:?}", scene.title, page);
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    include!("sview_tests.rs");
}
