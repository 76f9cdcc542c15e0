// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Application state and orchestration.
//!
//! `App` owns:
//! - the canvas and the captions typed into the form
//! - the enabled state of the form actions
//! - the volume and the speech command
//!
//! Every handler runs to completion synchronously; only speech leaves a child process behind.

use std::path::{Path, PathBuf};
use std::process::Child;

use anyhow::{Context, Result};
use image::DynamicImage;

use crate::canvas::Canvas;
use crate::caption::{CaptionFont, CaptionStyle, draw_captions};
use crate::config::Config;
use crate::controls::{Action, Controls};
use crate::speech::{SpeechCommand, Utterance};
use crate::volume::{self, VolumeLevel};

/// Form field that receives typed characters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Field {
    #[default]
    Top,
    Bottom,
    Path,
}

impl Field {
    /// Cycle `Top` -> `Bottom` -> `Path` -> `Top`.
    pub fn next(self) -> Self {
        match self {
            Field::Top => Field::Bottom,
            Field::Bottom => Field::Path,
            Field::Path => Field::Top,
        }
    }
}

pub struct App {
    pub config: Config,
    pub canvas: Canvas,
    pub top_text: String,
    pub bottom_text: String,
    pub path_input: String,
    pub focus: Field,
    pub controls: Controls,
    pub volume: u8,
    pub image_name: Option<String>,
    pub should_quit: bool,
    message: Option<String>,
    font: Option<CaptionFont>,
    speech: SpeechCommand,
    speaking: Vec<Child>,
    revision: u64,
}

/// Name shown for a loaded image: the file name without its extension.
pub fn image_alt(path: &Path) -> String {
    path.file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

pub fn decode_image(path: &Path) -> Result<DynamicImage> {
    image::ImageReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .with_guessed_format()
        .with_context(|| format!("failed to read {}", path.display()))?
        .decode()
        .with_context(|| format!("failed to decode {}", path.display()))
}

impl App {
    pub fn new(config: Config) -> Self {
        let canvas = Canvas::new(config.canvas_width, config.canvas_height);
        let speech = SpeechCommand::from_config(&config);
        let volume = config.volume.min(volume::MAX_VOLUME);
        App {
            config,
            canvas,
            top_text: String::new(),
            bottom_text: String::new(),
            path_input: String::new(),
            focus: Field::Top,
            controls: Controls::default(),
            volume,
            image_name: None,
            should_quit: false,
            message: None,
            font: None,
            speech,
            speaking: Vec::new(),
            revision: 0,
        }
    }

    /// Bumped whenever the canvas pixels change, so the preview knows to re-encode.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    /// Decode `path` and letterbox it onto the canvas.
    ///
    /// On failure the previous canvas and controls are left untouched.
    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = decode_image(path)?;
        let rect = self.canvas.letterbox(&image, self.config.filter());
        tracing::info!(
            path = %path.display(),
            width = image.width(),
            height = image.height(),
            ?rect,
            "image loaded"
        );
        self.image_name = Some(image_alt(path));
        self.controls.image_loaded();
        self.touch();
        Ok(())
    }

    /// Load whatever path was typed into the path field.
    pub fn load_from_input(&mut self) -> Result<()> {
        let path = PathBuf::from(self.path_input.trim());
        self.load_image(&path)
    }

    fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            size: self.config.font_size,
            margin: self.config.caption_margin,
            outline: self.config.outline_width,
        }
    }

    fn ensure_font(&mut self) -> Result<()> {
        if self.font.is_none() {
            let font = CaptionFont::load(
                self.config.font_family.as_deref(),
                self.config.font_path.as_deref(),
            )?;
            self.font = Some(font);
        }
        Ok(())
    }

    /// Draw the captions onto the canvas. Returns false when generating is not available.
    pub fn generate(&mut self) -> Result<bool> {
        if !self.controls.is_enabled(Action::Generate) {
            tracing::debug!("generate ignored: disabled");
            return Ok(false);
        }
        let style = self.caption_style();
        self.ensure_font()?;
        let font = self.font.as_ref().context("caption font unavailable")?;
        draw_captions(
            &mut self.canvas,
            font,
            &self.top_text,
            &self.bottom_text,
            style,
        );
        tracing::info!(top = %self.top_text, bottom = %self.bottom_text, "captions drawn");
        self.controls.generated();
        self.touch();
        Ok(true)
    }

    /// Wipe the canvas to transparent. Returns false when clearing is not available.
    pub fn clear(&mut self) -> bool {
        if !self.controls.is_enabled(Action::Clear) {
            tracing::debug!("clear ignored: disabled");
            return false;
        }
        self.canvas.clear();
        self.controls.cleared();
        self.touch();
        true
    }

    /// Speak both captions. Returns false when reading is not available.
    pub fn read_aloud(&mut self) -> Result<bool> {
        if !self.controls.is_enabled(Action::Read) {
            tracing::debug!("read ignored: disabled");
            return Ok(false);
        }
        self.reap_speech();
        let utterance = Utterance::from_captions(&self.top_text, &self.bottom_text, self.volume);
        let child = self.speech.speak(&utterance)?;
        self.speaking.push(child);
        Ok(true)
    }

    /// Collect finished speech processes; running ones keep playing, like queued utterances.
    fn reap_speech(&mut self) {
        self.speaking.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                tracing::debug!(%status, "speech finished");
                false
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!(error = %e, "failed to poll speech process");
                false
            }
        });
    }

    /// Block until every running speech process exits.
    pub fn wait_speech(&mut self) {
        for mut child in self.speaking.drain(..) {
            match child.wait() {
                Ok(status) => tracing::debug!(%status, "speech finished"),
                Err(e) => tracing::warn!(error = %e, "failed to wait for speech process"),
            }
        }
    }

    pub fn is_speaking(&mut self) -> bool {
        self.reap_speech();
        !self.speaking.is_empty()
    }

    pub fn set_volume(&mut self, volume: u8) {
        self.volume = volume.min(volume::MAX_VOLUME);
        let level = self.volume_level();
        tracing::debug!(
            volume = self.volume,
            icon = %level.icon_path(),
            alt = %level.alt_text(),
            "volume changed"
        );
    }

    pub fn adjust_volume(&mut self, up: bool) {
        let step = i16::from(self.config.volume_step);
        let delta = if up { step } else { -step };
        self.set_volume(volume::adjust(self.volume, delta));
    }

    pub fn volume_level(&self) -> VolumeLevel {
        VolumeLevel::from_volume(self.volume)
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    fn focused_text_mut(&mut self) -> &mut String {
        match self.focus {
            Field::Top => &mut self.top_text,
            Field::Bottom => &mut self.bottom_text,
            Field::Path => &mut self.path_input,
        }
    }

    pub fn input_char(&mut self, c: char) {
        self.focused_text_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused_text_mut().pop();
    }

    pub fn export(&self, path: &Path) -> Result<()> {
        self.canvas.save(path)?;
        tracing::info!(path = %path.display(), "canvas exported");
        Ok(())
    }

    /// Default export target: `<image name>-meme.png` in the current directory.
    pub fn default_export_path(&self) -> PathBuf {
        let stem = self.image_name.as_deref().unwrap_or("meme");
        PathBuf::from(format!("{stem}-meme.png"))
    }

    /// Run an action, turning failures into a status message instead of propagating them.
    pub fn perform(&mut self, action: Action) {
        let result = match action {
            Action::Generate => self.generate(),
            Action::Clear => Ok(self.clear()),
            Action::Read => self.read_aloud(),
        };
        match result {
            Ok(true) => self.message = None,
            Ok(false) => self.set_message(format!("{} is not available", action.label())),
            Err(e) => self.report(&e),
        }
    }

    pub fn report(&mut self, err: &anyhow::Error) {
        tracing::warn!(error = %format!("{err:#}"), "action failed");
        self.set_message(format!("{err:#}"));
    }

    pub fn set_message(&mut self, message: String) {
        self.message = Some(message);
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn status_text(&self) -> String {
        let level = self.volume_level();
        let mut status = format!(
            "[{}] {} {}%",
            self.image_name.as_deref().unwrap_or("no image"),
            level.glyph(),
            self.volume,
        );

        if self.config.debug {
            status.push_str(&format!(" canvas:{}x{}", self.canvas.width(), self.canvas.height()));
        }

        if let Some(msg) = self.message() {
            status.push_str(" | ");
            status.push_str(msg);
        }

        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{BLACK, TRANSPARENT};
    use image::{Rgba, RgbaImage};

    fn create_test_app() -> App {
        App::new(Config {
            canvas_width: 40,
            canvas_height: 40,
            ..Default::default()
        })
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 255, 255]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_field_cycles() {
        assert_eq!(Field::Top.next(), Field::Bottom);
        assert_eq!(Field::Bottom.next(), Field::Path);
        assert_eq!(Field::Path.next(), Field::Top);
    }

    #[test]
    fn test_image_alt_strips_extension() {
        assert_eq!(image_alt(Path::new("/tmp/cat.photo.png")), "cat.photo");
        assert_eq!(image_alt(Path::new("doge.jpg")), "doge");
    }

    #[test]
    fn test_load_image_letterboxes_and_enables_generate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 80, 40);
        let mut app = create_test_app();
        let before = app.revision();

        app.load_image(&path).unwrap();

        assert_eq!(app.image_name.as_deref(), Some("wide"));
        assert!(app.controls.generate);
        assert!(!app.controls.clear);
        assert!(!app.controls.read);
        assert_ne!(app.revision(), before);
        assert_eq!(*app.canvas.pixels().get_pixel(20, 2), BLACK);
        assert_eq!(app.canvas.pixels().get_pixel(20, 20)[2], 255);
    }

    #[test]
    fn test_load_image_failure_keeps_state() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.png");
        std::fs::write(&bogus, b"not an image").unwrap();
        let mut app = create_test_app();

        assert!(app.load_image(&bogus).is_err());
        assert!(app.load_image(&dir.path().join("missing.png")).is_err());
        assert_eq!(app.controls, Controls::default());
        assert!(app.image_name.is_none());
    }

    #[test]
    fn test_load_from_input_trims() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "tall.png", 10, 20);
        let mut app = create_test_app();
        app.path_input = format!("  {}  ", path.display());
        app.load_from_input().unwrap();
        assert_eq!(app.image_name.as_deref(), Some("tall"));
    }

    #[test]
    fn test_actions_ignored_when_disabled() {
        let mut app = create_test_app();
        assert!(!app.generate().unwrap());
        assert!(!app.clear());
        assert!(!app.read_aloud().unwrap());

        app.perform(Action::Clear);
        assert_eq!(app.message(), Some("Clear is not available"));
    }

    #[test]
    fn test_generate_font_failure_keeps_controls() {
        let mut app = App::new(Config {
            canvas_width: 40,
            canvas_height: 40,
            font_path: Some(PathBuf::from("/nonexistent/font.ttf")),
            ..Default::default()
        });
        app.controls.image_loaded();

        assert!(app.generate().is_err());
        assert!(app.controls.generate);
        assert!(!app.controls.read);

        app.perform(Action::Generate);
        assert!(app.message().unwrap().contains("font"));
    }

    #[test]
    #[ignore = "needs an installed system font; run with --ignored"]
    fn test_generate_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "sq.png", 40, 40);
        let mut app = App::new(Config {
            canvas_width: 200,
            canvas_height: 200,
            ..Default::default()
        });
        app.load_image(&path).unwrap();
        app.top_text = "TOP".to_string();
        app.bottom_text = "BOTTOM".to_string();

        assert!(app.generate().unwrap());
        assert_eq!(
            app.controls,
            Controls {
                generate: false,
                clear: true,
                read: true
            }
        );

        assert!(app.clear());
        assert!(app.canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
        assert!(app.controls.generate);
        assert!(!app.controls.read);
    }

    #[test]
    fn test_read_aloud_spawns_command() {
        let mut app = App::new(Config {
            speech_program: "true".to_string(),
            speech_args: vec!["{text}".to_string()],
            ..Default::default()
        });
        app.controls.generated();
        assert!(app.read_aloud().unwrap());
        // A second read reaps or leaves the first child and starts another.
        assert!(app.read_aloud().unwrap());
    }

    #[test]
    fn test_wait_speech_drains_children() {
        let mut app = App::new(Config {
            speech_program: "sleep".to_string(),
            speech_args: vec!["0.2".to_string()],
            ..Default::default()
        });
        app.controls.generated();
        assert!(app.read_aloud().unwrap());
        assert!(app.is_speaking());

        app.wait_speech();
        assert!(!app.is_speaking());
    }

    #[test]
    fn test_clear_after_generated_state_empties_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "sq.png", 40, 40);
        let mut app = create_test_app();
        app.load_image(&path).unwrap();
        app.controls.generated();

        assert!(app.clear());
        assert!(app.canvas.pixels().pixels().all(|p| *p == TRANSPARENT));
        assert!(app.controls.generate);
        assert!(!app.controls.read);
    }

    #[test]
    fn test_read_aloud_missing_program_reports() {
        let mut app = App::new(Config {
            speech_program: "/nonexistent/memegen-tts".to_string(),
            ..Default::default()
        });
        app.controls.generated();
        app.perform(Action::Read);
        assert!(app.message().unwrap().contains("speech command"));
    }

    #[test]
    fn test_volume_updates_level() {
        let mut app = App::new(Config {
            volume: 50,
            volume_step: 20,
            ..Default::default()
        });
        assert_eq!(app.volume_level(), VolumeLevel::Medium);
        app.adjust_volume(true);
        assert_eq!(app.volume, 70);
        assert_eq!(app.volume_level(), VolumeLevel::High);
        for _ in 0..5 {
            app.adjust_volume(false);
        }
        assert_eq!(app.volume, 0);
        assert_eq!(app.volume_level(), VolumeLevel::Muted);
        app.set_volume(200);
        assert_eq!(app.volume, 100);
    }

    #[test]
    fn test_typing_goes_to_focused_field() {
        let mut app = create_test_app();
        app.input_char('a');
        app.focus_next();
        app.input_char('b');
        app.input_char('c');
        app.backspace();
        app.focus_next();
        app.input_char('/');
        assert_eq!(app.top_text, "a");
        assert_eq!(app.bottom_text, "b");
        assert_eq!(app.path_input, "/");
    }

    #[test]
    fn test_status_text() {
        let mut app = create_test_app();
        assert!(app.status_text().starts_with("[no image]"));
        app.image_name = Some("doge".to_string());
        app.set_message("saved".to_string());
        let status = app.status_text();
        assert!(status.starts_with("[doge]"));
        assert!(status.contains("100%"));
        assert!(status.ends_with("| saved"));
    }

    #[test]
    fn test_export_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_test_app();
        let out = dir.path().join("meme.png");
        app.export(&out).unwrap();
        assert!(out.exists());
        assert_eq!(app.default_export_path(), PathBuf::from("meme-meme.png"));
    }
}
