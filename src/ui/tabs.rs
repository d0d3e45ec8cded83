//! Tab header rendering.
//!
//! Displays the pane strip with the active pane highlighted and the
//! keyboard-focused header underlined.

use crate::app::App;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

/// Render the tab header strip.
///
/// # Details
/// Number keys activate a pane directly; Left/Right move header focus and
/// Enter/Space activate it. The focused header is underlined so the
/// keyboard path is visible.
pub fn render_tabs(app: &App, area: Rect, buf: &mut Buffer) {
    let active = app.tabs.active();
    let focused = app.tabs.focused();

    let mut spans = Vec::new();
    for (index, tab) in app.tabs.panes().iter().enumerate() {
        let is_active = *tab == active;
        let is_focused = *tab == focused;

        let mut style = if is_active {
            Style::default()
                .fg(Color::Yellow)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        if is_focused {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        if index > 0 {
            spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        }
        spans.push(Span::styled(
            format!(" {} {} ", index + 1, tab.title()),
            style,
        ));
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Panes").borders(Borders::ALL))
        .alignment(ratatui::layout::Alignment::Center);

    Widget::render(paragraph, area, buf);
}
