// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Application entry point and event loop.
//!
//! This module:
//! - parses CLI args (image, captions, output)
//! - renders headlessly when `--output` is given
//! - otherwise runs the terminal UI loop and maps keys onto `App` handlers

mod app;
mod canvas;
mod caption;
mod config;
mod controls;
mod fit;
mod logging;
mod speech;
mod ui;
mod volume;

use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui_image::picker::Picker;

use crate::app::{App, Field};
use crate::config::Config;
use crate::controls::Action;

#[derive(Parser, Debug)]
#[command(name = "memegen", about = "Meme Generator in Terminal")]
struct Cli {
    /// Image file to load on start
    image: Option<PathBuf>,

    /// Caption drawn along the top edge
    #[arg(long, default_value = "")]
    top: String,

    /// Caption drawn along the bottom edge
    #[arg(long, default_value = "")]
    bottom: String,

    /// Write the meme to this file and exit instead of starting the UI
    #[arg(short, long, requires = "image")]
    output: Option<PathBuf>,

    /// Speech volume, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    volume: Option<u8>,

    /// Read the captions aloud after generating and wait for speech to finish (headless mode)
    #[arg(long, requires = "output")]
    speak: bool,
}

const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn check_image_path(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("Path does not exist: {:?}", path);
    }
    if !path.is_file() || !is_image_file(path) {
        anyhow::bail!("Not a supported image file: {:?}", path);
    }
    Ok(())
}

fn check_output_path(path: &Path) -> Result<()> {
    if !is_image_file(path) {
        anyhow::bail!("Unsupported output format: {:?}", path);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load();
    if let Some(volume) = cli.volume {
        config.volume = volume;
    }
    if let Err(e) = logging::init(&config.log_path(), config.debug) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let mut app = App::new(config);
    app.top_text = cli.top;
    app.bottom_text = cli.bottom;
    if let Some(path) = &cli.image {
        check_image_path(path)?;
        app.load_image(path)?;
        app.path_input = path.display().to_string();
    } else {
        app.focus = Field::Path;
    }

    if let Some(output) = &cli.output {
        return run_headless(&mut app, output, cli.speak);
    }

    init_terminal()?;
    let result = run(&mut app);
    restore_terminal();

    result
}

fn run_headless(app: &mut App, output: &Path, speak: bool) -> Result<()> {
    check_output_path(output)?;
    if !app.top_text.is_empty() || !app.bottom_text.is_empty() {
        app.generate()?;
    }
    if speak && !app.read_aloud()? {
        tracing::warn!("--speak ignored: no captions were generated");
    }
    app.export(output)?;
    println!("{}", output.display());
    app.wait_speech();
    Ok(())
}

fn run(app: &mut App) -> Result<()> {
    const TICK: Duration = Duration::from_millis(50);

    let picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::from_fontsize((8, 16)));
    tracing::debug!(font_size = ?picker.font_size(), "terminal picker ready");
    let mut preview = ui::Preview::new(picker);
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    loop {
        terminal.draw(|frame| ui::draw(frame, app, &mut preview))?;

        // Drain pending key events before the next redraw.
        if event::poll(TICK)? {
            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()?
                    && key.kind == KeyEventKind::Press
                {
                    handle_key(app, key);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Tab => app.focus_next(),
        KeyCode::Enter if app.focus == Field::Path => open_input(app),
        KeyCode::Enter => app.perform(Action::Generate),
        KeyCode::Char('l') if ctrl => app.perform(Action::Clear),
        KeyCode::Char('r') if ctrl => app.perform(Action::Read),
        KeyCode::Char('o') if ctrl => open_input(app),
        KeyCode::Char('s') if ctrl => {
            let path = app.default_export_path();
            match app.export(&path) {
                Ok(()) => app.set_message(format!("saved {}", path.display())),
                Err(e) => app.report(&e),
            }
        }
        KeyCode::Up => app.adjust_volume(true),
        KeyCode::Down => app.adjust_volume(false),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Char(c) if !ctrl => app.input_char(c),
        _ => {}
    }
}

fn open_input(app: &mut App) {
    match app.load_from_input() {
        Ok(()) => {
            app.focus = Field::Top;
            app.set_message("image loaded".to_string());
        }
        Err(e) => app.report(&e),
    }
}

fn init_terminal() -> std::io::Result<()> {
    use ratatui::crossterm::{
        cursor::Hide,
        execute,
        terminal::{EnterAlternateScreen, enable_raw_mode},
    };

    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen, Hide)?;
    Ok(())
}

fn restore_terminal() {
    use ratatui::crossterm::{
        cursor::Show,
        execute,
        terminal::{LeaveAlternateScreen, disable_raw_mode},
    };

    let _ = disable_raw_mode();
    let _ = execute!(stdout(), LeaveAlternateScreen, Show);
}
