//! Search box and result dropdown rendering.
//!
//! The input line mirrors the bound [`SearchBar`]'s query; the dropdown is
//! a pure function of its [`SearchState`], with distinct loading, empty and
//! failed blocks.

use crate::api::models::StudentHit;
use crate::app::Mode;
use crate::search::{SearchBar, SearchState};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

/// Render the search input line.
pub fn render_search_input(
    title: &str,
    bar: &SearchBar<StudentHit>,
    mode: Mode,
    area: Rect,
    buf: &mut Buffer,
) {
    let is_active = mode == Mode::Input;
    let prompt = if is_active { "> " } else { "Search (press '/'): " };
    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::styled(
            bar.query().to_string(),
            Style::default().fg(if is_active { Color::White } else { Color::Gray }),
        ),
        Span::styled(
            if is_active { "_" } else { "" },
            Style::default().fg(Color::Yellow),
        ),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .style(if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }),
    );
    Widget::render(paragraph, area, buf);
}

/// Whether the dropdown should occupy screen space at all.
pub fn results_visible(bar: &SearchBar<StudentHit>) -> bool {
    !matches!(bar.state(), SearchState::Idle)
}

/// Render the result dropdown under a search input.
pub fn render_search_results(
    bar: &SearchBar<StudentHit>,
    cursor: usize,
    area: Rect,
    buf: &mut Buffer,
) {
    let block = Block::default().title("Results").borders(Borders::ALL);
    let inner = block.inner(area);
    Widget::render(block, area, buf);

    match bar.state() {
        SearchState::Idle => {}
        SearchState::Loading => {
            let loading = Paragraph::new("Searching...").style(Style::default().fg(Color::Gray));
            Widget::render(loading, inner, buf);
        }
        SearchState::Empty => {
            let empty = Paragraph::new("No matching students")
                .style(Style::default().fg(Color::Gray));
            Widget::render(empty, inner, buf);
        }
        SearchState::Failed => {
            let failed = Paragraph::new("Search failed, try again later")
                .style(Style::default().fg(Color::Red));
            Widget::render(failed, inner, buf);
        }
        SearchState::Loaded(hits) => {
            let items: Vec<ListItem> = hits
                .iter()
                .map(|hit| {
                    let name = if hit.alias_name.is_empty() {
                        hit.student_name.clone()
                    } else {
                        format!("{} ({})", hit.student_name, hit.alias_name)
                    };
                    ListItem::new(Line::from(format!(
                        "{:<10} {:<18} {}",
                        hit.student_id,
                        name,
                        hit.groups.join(","),
                    )))
                })
                .collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            );
            let mut state = ListState::default();
            state.select(Some(cursor));
            StatefulWidget::render(list, inner, buf, &mut state);
        }
    }
}

/// Render a plain filter input line (roster/task/visit keyword boxes).
pub fn render_filter_input(title: &str, query: &str, mode: Mode, area: Rect, buf: &mut Buffer) {
    let is_active = mode == Mode::Input;
    let prompt = if is_active { "> " } else { "Filter (press '/'): " };
    let line = Line::from(vec![
        Span::styled(prompt, Style::default().fg(Color::Yellow)),
        Span::styled(
            query.to_string(),
            Style::default().fg(if is_active { Color::White } else { Color::Gray }),
        ),
        Span::styled(
            if is_active { "_" } else { "" },
            Style::default().fg(Color::Yellow),
        ),
    ]);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .title(title.to_string())
            .borders(Borders::ALL)
            .style(if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }),
    );
    Widget::render(paragraph, area, buf);
}
