// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Configuration management.
//!
//! Config values are loaded with the following priority (highest to lowest):
//! 1. Environment variables (MEMEGEN_*)
//! 2. Config file (~/.config/memegen/config.toml)
//! 3. Default values

use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub resize_filter: String,
    pub font_family: Option<String>,
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub caption_margin: u32,
    pub outline_width: u32,
    pub speech_program: String,
    pub speech_args: Vec<String>,
    pub volume: u8,
    pub volume_step: u8,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            canvas_width: 400,
            canvas_height: 400,
            resize_filter: "triangle".to_string(),
            font_family: None,
            font_path: None,
            font_size: 40.0,
            caption_margin: 8,
            outline_width: 2,
            speech_program: "espeak".to_string(),
            speech_args: vec!["-a".to_string(), "{volume}".to_string(), "{text}".to_string()],
            volume: 100,
            volume_step: 5,
            log_file: None,
            debug: false,
        }
    }
}

/// Parse filter type string to image::imageops::FilterType.
/// Returns Triangle as fallback for invalid values.
pub fn parse_filter_type(s: &str) -> image::imageops::FilterType {
    let s = s.trim();
    if s.eq_ignore_ascii_case("nearest") {
        image::imageops::FilterType::Nearest
    } else if s.eq_ignore_ascii_case("triangle") {
        image::imageops::FilterType::Triangle
    } else if s.eq_ignore_ascii_case("catmullrom") || s.eq_ignore_ascii_case("catmull-rom") {
        image::imageops::FilterType::CatmullRom
    } else if s.eq_ignore_ascii_case("gaussian") {
        image::imageops::FilterType::Gaussian
    } else if s.eq_ignore_ascii_case("lanczos3") || s.eq_ignore_ascii_case("lanczos") {
        image::imageops::FilterType::Lanczos3
    } else {
        image::imageops::FilterType::Triangle
    }
}

impl Config {
    /// Load config with priority: env vars > config file > defaults
    pub fn load() -> Self {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides();
        config.clamp_values();
        config
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("memegen").join("config.toml"))
    }

    fn load_from_file() -> Option<Self> {
        let path = Self::config_path()?;
        let content = std::fs::read_to_string(path).ok()?;
        toml::from_str(&content).ok()
    }

    fn apply_env_overrides(&mut self) {
        if let Some(v) = Self::parse_env::<u32>("MEMEGEN_CANVAS_WIDTH") {
            self.canvas_width = v;
        }
        if let Some(v) = Self::parse_env::<u32>("MEMEGEN_CANVAS_HEIGHT") {
            self.canvas_height = v;
        }
        if let Ok(v) = std::env::var("MEMEGEN_RESIZE_FILTER") {
            self.resize_filter = v;
        }
        if let Ok(v) = std::env::var("MEMEGEN_FONT_FAMILY") {
            self.font_family = Some(v);
        }
        if let Some(v) = std::env::var_os("MEMEGEN_FONT_PATH") {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = Self::parse_env::<f32>("MEMEGEN_FONT_SIZE") {
            self.font_size = v;
        }
        if let Some(v) = Self::parse_env::<u32>("MEMEGEN_CAPTION_MARGIN") {
            self.caption_margin = v;
        }
        if let Some(v) = Self::parse_env::<u32>("MEMEGEN_OUTLINE_WIDTH") {
            self.outline_width = v;
        }
        if let Ok(v) = std::env::var("MEMEGEN_SPEECH_PROGRAM") {
            self.speech_program = v;
        }
        if let Ok(v) = std::env::var("MEMEGEN_SPEECH_ARGS") {
            self.speech_args = v.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = Self::parse_env::<u8>("MEMEGEN_VOLUME") {
            self.volume = v;
        }
        if let Some(v) = Self::parse_env::<u8>("MEMEGEN_VOLUME_STEP") {
            self.volume_step = v;
        }
        if let Some(v) = std::env::var_os("MEMEGEN_LOG_FILE") {
            self.log_file = Some(PathBuf::from(v));
        }
        if std::env::var_os("MEMEGEN_DEBUG").is_some() {
            self.debug = true;
        }
    }

    fn clamp_values(&mut self) {
        const MAX_CANVAS_SIDE: u32 = 4096;
        const MAX_VOLUME: u8 = 100;

        self.canvas_width = self.canvas_width.clamp(16, MAX_CANVAS_SIDE);
        self.canvas_height = self.canvas_height.clamp(16, MAX_CANVAS_SIDE);
        self.font_size = self.font_size.clamp(8.0, 256.0);
        self.outline_width = self.outline_width.min(8);
        self.volume = self.volume.min(MAX_VOLUME);
        self.volume_step = self.volume_step.clamp(1, MAX_VOLUME);
    }

    fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok()?.parse().ok()
    }

    pub fn filter(&self) -> image::imageops::FilterType {
        parse_filter_type(&self.resize_filter)
    }

    /// Log destination; falls back to `memegen.log` in the temp dir since the TUI owns stdout.
    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("memegen.log"))
    }
}
