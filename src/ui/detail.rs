//! Detail drawer rendering.
//!
//! A right-side drawer showing one student's full record: labeled overview
//! fields with per-list "none" placeholders, and a paginated visit-history
//! tab that keeps its own status/keyword filter.

use crate::app::{DetailState, DrawerTab};
use crate::tabs::PaneState;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

/// Render the drawer over the right 60% of `area`.
pub fn render_drawer(detail: &DetailState, area: Rect, buf: &mut Buffer) {
    let width = (area.width as u32 * 60 / 100) as u16;
    let drawer_area = Rect {
        x: area.x + area.width - width,
        y: area.y,
        width,
        height: area.height,
    };
    Widget::render(Clear, drawer_area, buf);

    let tab_label = match detail.tab {
        DrawerTab::Overview => "Overview | [Tab] visit history",
        DrawerTab::Visits => "Visit History | [Tab] overview",
    };
    let block = Block::default()
        .title(format!("Student Detail ({})", tab_label))
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Yellow));
    let inner = block.inner(drawer_area);
    Widget::render(block, drawer_area, buf);

    match detail.tab {
        DrawerTab::Overview => render_overview(detail, inner, buf),
        DrawerTab::Visits => render_visit_history(detail, inner, buf),
    }
}

fn render_overview(detail: &DetailState, area: Rect, buf: &mut Buffer) {
    let student = &detail.student;
    let label = Style::default().fg(Color::Cyan);
    let none = Style::default().fg(Color::DarkGray);

    let mut lines = vec![
        pair("Id: ", &student.student_id, label),
        pair(
            "Name: ",
            &format!(
                "{} ({})",
                student.student_name,
                or_none(&student.alias_name, "no alias")
            ),
            label,
        ),
        pair("Groups: ", &or_none(&student.groups.join(", "), "none"), label),
        pair("Status: ", &or_none(&student.status, "unknown"), label),
        pair("Study hours: ", &format!("{:.1}", student.learning_hours), label),
        pair(
            "Teacher: ",
            student.assigned_teacher_name.as_deref().unwrap_or("unassigned"),
            label,
        ),
        pair("Ops note: ", &or_none(&student.ops_note, "none"), label),
    ];

    lines.push(Line::from(Span::styled("Progress:", label)));
    if student.progress.is_empty() {
        lines.push(Line::from(Span::styled("  none", none)));
    } else {
        for entry in &student.progress {
            lines.push(Line::from(format!("  - {}", entry.display())));
        }
    }

    // Recent feedback prefers the flat comment list, falling back to the
    // structured rows
    lines.push(Line::from(Span::styled("Recent feedback:", label)));
    if !student.feedback_comments.is_empty() {
        for comment in &student.feedback_comments {
            lines.push(Line::from(format!("  - {}", comment)));
        }
    } else if !student.recent_feedbacks.is_empty() {
        for entry in &student.recent_feedbacks {
            lines.push(Line::from(format!(
                "  - [{}] lesson {} / {}: {}",
                entry.feedback_time, entry.lesson_progress, entry.teacher_name, entry.teacher_comment
            )));
        }
    } else {
        lines.push(Line::from(Span::styled("  none", none)));
    }

    lines.push(Line::from(Span::styled("Visit notes:", label)));
    if student.visit_notes.is_empty() {
        lines.push(Line::from(Span::styled("  none", none)));
    } else {
        for note in &student.visit_notes {
            lines.push(Line::from(format!("  - {}", note)));
        }
    }

    let note_style = if detail.editing_note {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    lines.push(Line::from(vec![
        Span::styled(
            if detail.editing_note {
                "Research note (editing, Enter saves): "
            } else {
                "Research note ([e] to edit): "
            },
            label,
        ),
        Span::styled(detail.note_draft.clone(), note_style),
    ]));

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    Widget::render(paragraph, area, buf);
}

fn render_visit_history(detail: &DetailState, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    // Filter line: remembered across page changes
    let status = detail.visits_filter.status.as_deref().unwrap_or("all");
    let keyword = if detail.editing_filter {
        format!("{}_", detail.visits_filter.keyword)
    } else {
        detail.visits_filter.keyword.clone()
    };
    let filter_line = Line::from(vec![
        Span::styled("status [s]: ", Style::default().fg(Color::Cyan)),
        Span::raw(status.to_string()),
        Span::styled("   keyword [/]: ", Style::default().fg(Color::Cyan)),
        Span::raw(keyword),
    ]);
    Widget::render(Paragraph::new(filter_line), chunks[0], buf);

    match detail.visits_state {
        PaneState::NotLoaded | PaneState::Loading => {
            let loading = Paragraph::new("Loading...").style(Style::default().fg(Color::Gray));
            Widget::render(loading, chunks[1], buf);
        }
        PaneState::Failed => {
            let failed = Paragraph::new("Load failed (press 'r' to retry)")
                .style(Style::default().fg(Color::Red));
            Widget::render(failed, chunks[1], buf);
        }
        PaneState::Loaded if detail.visits.is_empty() => {
            let empty = Paragraph::new("No visit records")
                .style(Style::default().fg(Color::Gray));
            Widget::render(empty, chunks[1], buf);
        }
        PaneState::Loaded => {
            let lines: Vec<Line> = detail
                .visits
                .iter()
                .map(|visit| {
                    Line::from(format!(
                        "{:<17} {:<10} #{:<3} {:<14} {}",
                        visit.visit_time,
                        visit.status,
                        visit.visit_count,
                        visit.teacher_name,
                        visit.notes,
                    ))
                })
                .collect();
            Widget::render(Paragraph::new(lines), chunks[1], buf);
        }
    }

    if let Some(pagination) = &detail.visits_pagination {
        let pager = Line::from(format!(
            "Page {}/{}  [p] prev  [n] next",
            pagination.current_page, pagination.total_pages
        ));
        Widget::render(
            Paragraph::new(pager).style(Style::default().fg(Color::Yellow)),
            chunks[2],
            buf,
        );
    }
}

fn pair(label_text: &str, value: &str, label: Style) -> Line<'static> {
    Line::from(vec![
        Span::styled(label_text.to_string(), label),
        Span::raw(value.to_string()),
    ])
}

fn or_none(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}
