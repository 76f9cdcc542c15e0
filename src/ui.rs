// Copyright 2025 Tomoki Hayashi
// MIT License (https://opensource.org/licenses/MIT)

//! Screen layout: canvas preview on top, caption form, action row, status row.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol;
use ratatui_image::{Image, Resize};

use crate::app::{App, Field};
use crate::controls::Controls;

/// Terminal-encoded copy of the canvas, rebuilt only when the canvas or the area changes.
pub struct Preview {
    picker: Picker,
    cached: Option<(u64, Rect, Protocol)>,
}

impl Preview {
    pub fn new(picker: Picker) -> Self {
        Self {
            picker,
            cached: None,
        }
    }

    fn protocol(&mut self, app: &App, area: Rect) -> Option<&Protocol> {
        let fresh = matches!(
            &self.cached,
            Some((rev, cached_area, _)) if *rev == app.revision() && *cached_area == area
        );
        if !fresh {
            self.cached = match self
                .picker
                .new_protocol(app.canvas.to_dynamic(), area, Resize::Fit(None))
            {
                Ok(protocol) => Some((app.revision(), area, protocol)),
                Err(e) => {
                    tracing::warn!(error = ?e, "failed to encode canvas preview");
                    None
                }
            };
        }
        self.cached.as_ref().map(|(_, _, protocol)| protocol)
    }
}

pub fn draw(frame: &mut Frame, app: &mut App, preview: &mut Preview) {
    let [canvas_area, form_area, actions_area, status_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(5),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let block = Block::bordered().title(" canvas ");
    let inner = block.inner(canvas_area);
    frame.render_widget(block, canvas_area);
    if inner.width > 0
        && inner.height > 0
        && let Some(protocol) = preview.protocol(app, inner)
    {
        frame.render_widget(Image::new(protocol), inner);
    }

    frame.render_widget(form(app), form_area);
    let speaking = app.is_speaking();
    frame.render_widget(
        Paragraph::new(action_line(&app.controls, speaking)),
        actions_area,
    );
    frame.render_widget(
        Paragraph::new(app.status_text()).style(Style::default().add_modifier(Modifier::REVERSED)),
        status_area,
    );
}

fn form(app: &App) -> Paragraph<'static> {
    let rows = [
        (Field::Top, "Top text:    ", app.top_text.clone()),
        (Field::Bottom, "Bottom text: ", app.bottom_text.clone()),
        (Field::Path, "Image path:  ", app.path_input.clone()),
    ];
    let lines: Vec<Line> = rows
        .into_iter()
        .map(|(field, label, value)| {
            let style = if field == app.focus {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let cursor = if field == app.focus { "_" } else { "" };
            Line::from(vec![
                Span::styled(label, style),
                Span::raw(value),
                Span::styled(cursor, style),
            ])
        })
        .collect();
    Paragraph::new(lines).block(Block::bordered().title(" form (Tab: next field) "))
}

/// One span per action: enabled ones are highlighted, disabled ones dimmed.
pub fn action_line(controls: &Controls, speaking: bool) -> Line<'static> {
    let keys = ["Enter", "^L", "^R"];
    let mut spans = Vec::new();
    for (action, key) in Controls::all().into_iter().zip(keys) {
        let style = if controls.is_enabled(action) {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("[{key} {}]", action.label()), style));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw("^O open  ^S save  Up/Down volume  Esc quit"));
    if speaking {
        spans.push(Span::styled("  speaking…", Style::default().fg(Color::Cyan)));
    }
    Line::from(spans)
}
