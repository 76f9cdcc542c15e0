// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Which of the three form actions are currently available.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Generate,
    Clear,
    Read,
}

impl Action {
    pub fn label(self) -> &'static str {
        match self {
            Action::Generate => "Generate",
            Action::Clear => "Clear",
            Action::Read => "Read Text",
        }
    }
}

/// Enabled flags for the form actions. Nothing is available until an image is loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Controls {
    pub generate: bool,
    pub clear: bool,
    pub read: bool,
}

impl Controls {
    pub fn is_enabled(&self, action: Action) -> bool {
        match action {
            Action::Generate => self.generate,
            Action::Clear => self.clear,
            Action::Read => self.read,
        }
    }

    /// A fresh image is on the canvas: only generating is possible.
    pub fn image_loaded(&mut self) {
        *self = Self {
            generate: true,
            clear: false,
            read: false,
        };
    }

    /// Captions were drawn: clearing and reading become possible.
    pub fn generated(&mut self) {
        *self = Self {
            generate: false,
            clear: true,
            read: true,
        };
    }

    /// Same state as after an image load.
    pub fn cleared(&mut self) {
        self.image_loaded();
    }

    pub fn all() -> [Action; 3] {
        [Action::Generate, Action::Clear, Action::Read]
    }
}
