// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Volume level and the icon shown for it.

pub const MAX_VOLUME: u8 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeLevel {
    Muted,
    Low,
    Medium,
    High,
}

impl VolumeLevel {
    /// Map a 0..=100 volume onto one of four icon levels.
    pub fn from_volume(volume: u8) -> Self {
        if volume >= 67 {
            VolumeLevel::High
        } else if volume >= 34 {
            VolumeLevel::Medium
        } else if volume >= 1 {
            VolumeLevel::Low
        } else {
            VolumeLevel::Muted
        }
    }

    pub fn index(self) -> u8 {
        match self {
            VolumeLevel::Muted => 0,
            VolumeLevel::Low => 1,
            VolumeLevel::Medium => 2,
            VolumeLevel::High => 3,
        }
    }

    pub fn icon_path(self) -> String {
        format!("icons/volume-level-{}.svg", self.index())
    }

    pub fn alt_text(self) -> String {
        format!("Volume Level {}", self.index())
    }

    /// Glyph shown in the status bar in place of the SVG icon.
    pub fn glyph(self) -> &'static str {
        match self {
            VolumeLevel::Muted => "🔇",
            VolumeLevel::Low => "🔈",
            VolumeLevel::Medium => "🔉",
            VolumeLevel::High => "🔊",
        }
    }
}

/// Apply a signed step to `volume`, saturating at 0 and [`MAX_VOLUME`].
pub fn adjust(volume: u8, delta: i16) -> u8 {
    (i16::from(volume) + delta).clamp(0, i16::from(MAX_VOLUME)) as u8
}
