//! Form overlay rendering.
//!
//! A centered popup listing the form's fields, with the focused field
//! highlighted and a cursor marker on its value.

use crate::form::Form;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Render the form overlay centered in `area`.
pub fn render_form(form: &Form, area: Rect, buf: &mut Buffer) {
    let width = (area.width.saturating_sub(8)).min(70).max(30);
    let height = (form.fields.len() as u16 + 4).min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    Widget::render(Clear, popup, buf);

    let block = Block::default()
        .title(form.title.clone())
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    Widget::render(block, popup, buf);

    let mut lines = Vec::new();
    for (index, field) in form.fields.iter().enumerate() {
        let is_focused = index == form.focus;
        let marker = if field.required { "*" } else { " " };
        let label_style = if is_focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let value = if is_focused {
            format!("{}_", field.value)
        } else {
            field.value.clone()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{}: ", marker, field.label), label_style),
            Span::raw(value),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "[Tab] next field  [Enter] submit  [Esc] cancel",
        Style::default().fg(Color::DarkGray),
    )));

    Widget::render(Paragraph::new(lines), inner, buf);
}
