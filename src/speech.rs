// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Text-to-speech readout of the captions via an external command.

use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};

use crate::config::Config;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utterance {
    pub text: String,
    pub volume: u8,
}

impl Utterance {
    /// Both captions joined by a single space, empty ones included.
    pub fn from_captions(top: &str, bottom: &str, volume: u8) -> Self {
        Self {
            text: format!("{top} {bottom}"),
            volume,
        }
    }
}

/// Program plus argument templates; `{text}` and `{volume}` are substituted per utterance.
#[derive(Clone, Debug)]
pub struct SpeechCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SpeechCommand {
    pub fn from_config(config: &Config) -> Self {
        Self {
            program: config.speech_program.clone(),
            args: config.speech_args.clone(),
        }
    }

    pub fn build(&self, utterance: &Utterance) -> Command {
        let volume = utterance.volume.to_string();
        let mut cmd = Command::new(&self.program);
        for arg in &self.args {
            cmd.arg(
                arg.replace("{volume}", &volume)
                    .replace("{text}", &utterance.text),
            );
        }
        cmd
    }

    /// Start speaking without waiting. Output is discarded so it cannot bleed into the UI.
    pub fn speak(&self, utterance: &Utterance) -> Result<Child> {
        tracing::info!(program = %self.program, volume = utterance.volume, "speaking captions");
        self.build(utterance)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to run speech command `{}`", self.program))
    }
}
