//! List rendering for the five panes.
//!
//! One generic table renderer (rows, selection, load/empty states and a
//! pagination strip) plus a row formatter per pane. Every render is a full
//! replacement computed from the pane's current state.

use crate::api::models::Pagination;
use crate::app::{App, AssignmentView, Tab, TeachingView};
use crate::tabs::PaneState;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, StatefulWidget, Widget},
};

/// Everything the generic table needs for one frame.
pub struct TableView<'a> {
    pub title: String,
    pub header: String,
    pub rows: Vec<Line<'a>>,
    pub selected: Option<usize>,
    pub state: PaneState,
    pub pagination: Option<&'a Pagination>,
    pub empty_text: &'a str,
}

/// Render a table region: header, rows and an optional pagination strip.
///
/// # Details
/// Loading, failed and empty states are distinct blocks so a blank page can
/// never be mistaken for "no records".
pub fn render_table(view: TableView, area: Rect, buf: &mut Buffer) {
    let block = Block::default().title(view.title).borders(Borders::ALL);
    let inner = block.inner(area);
    Widget::render(block, area, buf);

    let (body, pager) = if view.pagination.is_some() && inner.height > 1 {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(inner);
        (chunks[0], Some(chunks[1]))
    } else {
        (inner, None)
    };

    match view.state {
        PaneState::NotLoaded | PaneState::Loading => {
            let loading = Paragraph::new("Loading...").style(Style::default().fg(Color::Gray));
            Widget::render(loading, body, buf);
        }
        PaneState::Failed => {
            let failed = Paragraph::new("Load failed (press 'r' to retry)")
                .style(Style::default().fg(Color::Red));
            Widget::render(failed, body, buf);
        }
        PaneState::Loaded if view.rows.is_empty() => {
            let empty = Paragraph::new(view.empty_text).style(Style::default().fg(Color::Gray));
            Widget::render(empty, body, buf);
        }
        PaneState::Loaded => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(0)])
                .split(body);
            let header = Paragraph::new(view.header)
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
            Widget::render(header, chunks[0], buf);

            let items: Vec<ListItem> = view.rows.into_iter().map(ListItem::new).collect();
            let list = List::new(items).highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            );
            let mut list_state = ListState::default();
            list_state.select(view.selected);
            StatefulWidget::render(list, chunks[1], buf, &mut list_state);
        }
    }

    if let (Some(pager_area), Some(pagination)) = (pager, view.pagination) {
        Widget::render(pagination_line(pagination), pager_area, buf);
    }
}

/// The "Page x/y" strip with prev/next affordances dimmed at the edges.
fn pagination_line(pagination: &Pagination) -> Paragraph<'static> {
    let enabled = Style::default().fg(Color::Yellow);
    let disabled = Style::default().fg(Color::DarkGray);
    let line = Line::from(vec![
        Span::styled(
            "[p] prev",
            if pagination.has_previous { enabled } else { disabled },
        ),
        Span::raw(format!(
            "  Page {}/{} ({} records)  ",
            pagination.current_page, pagination.total_pages, pagination.total_count
        )),
        Span::styled(
            "[n] next",
            if pagination.has_next { enabled } else { disabled },
        ),
    ]);
    Paragraph::new(line)
}

/// Render the student roster pane.
pub fn render_students(app: &App, area: Rect, buf: &mut Buffer) {
    let pane = &app.students;
    let mut title = match &pane.stats {
        Some(stats) => format!(
            "Students ({} total / {} active / {} paused)",
            stats.total, stats.active, stats.paused
        ),
        None => "Students".to_string(),
    };
    if let Some(filter) = &pane.status_filter {
        title.push_str(&format!(" [{}]", filter));
    }
    let rows = pane
        .rows
        .iter()
        .map(|student| {
            let mark = if student.status == "paused" { "=" } else { " " };
            Line::from(format!(
                "{} {:<10} {:<18} {:<14} lesson {:<4} {:>6.1}h  {}",
                mark,
                student.student_id,
                student.student_name,
                student.groups.join(","),
                student.learning_progress,
                student.total_study_time,
                student.status,
            ))
        })
        .collect();
    render_table(
        TableView {
            title,
            header: "  user id    name               groups         progress     hours  status"
                .to_string(),
            rows,
            selected: Some(pane.selected),
            state: app.tabs.state(Tab::Students),
            pagination: pane.pagination.as_ref(),
            empty_text: "No students found",
        },
        area,
        buf,
    );
}

/// Render the operations task board.
pub fn render_tasks(app: &App, area: Rect, buf: &mut Buffer) {
    let pane = &app.tasks;
    let filter = pane.status_filter.as_deref().unwrap_or("all");
    let title = format!("Ops Tasks (status: {} | picked: {})", filter, pane.picked.len());
    let rows = pane
        .rows
        .iter()
        .map(|task| {
            let mark = if pane.picked.contains(&task.id) { "x" } else { " " };
            Line::from(format!(
                "[{}] #{:<5} {:<18} {:<10} visits {:<3} {:<9} {}",
                mark,
                task.id,
                task.student_nickname,
                task.status,
                task.visit_count,
                task.source,
                task.created_at,
            ))
        })
        .collect();
    render_table(
        TableView {
            title,
            header: "     id     student            status     visits     source    created"
                .to_string(),
            rows,
            selected: Some(pane.selected),
            state: app.tabs.state(Tab::Tasks),
            pagination: pane.pagination.as_ref(),
            empty_text: "No open tasks",
        },
        area,
        buf,
    );
}

/// Render the visit record pane.
pub fn render_visits(app: &App, area: Rect, buf: &mut Buffer) {
    let pane = &app.visits;
    let filter = pane.filter.status.as_deref().unwrap_or("all");
    let title = format!("Visit Records (status: {})", filter);
    let rows = pane
        .rows
        .iter()
        .map(|visit| {
            Line::from(format!(
                "{:<17} {:<18} {:<10} #{:<3} {:<14} {}",
                visit.visit_time,
                visit.student_nickname,
                visit.status,
                visit.visit_count,
                visit.teacher_name,
                visit.notes,
            ))
        })
        .collect();
    render_table(
        TableView {
            title,
            header: "time              student            status     nth  teacher        notes"
                .to_string(),
            rows,
            selected: Some(pane.selected),
            state: app.tabs.state(Tab::Visits),
            pagination: pane.pagination.as_ref(),
            empty_text: "No visit records",
        },
        area,
        buf,
    );
}

/// Render the teaching pane (day list or completed feedback).
pub fn render_teaching(app: &App, area: Rect, buf: &mut Buffer) {
    let pane = &app.teaching;
    match pane.view {
        TeachingView::Today => {
            let title = format!(
                "Today's Tasks ({} rows | picked: {}) | [v] feedback records",
                pane.tasks.len(),
                pane.picked.len()
            );
            let rows = pane
                .tasks
                .iter()
                .map(|task| {
                    let mark = if pane.picked.contains(&task.student_id) { "x" } else { " " };
                    let difficult = if task.is_difficult { "!" } else { " " };
                    Line::from(format!(
                        "[{}]{} {:<18} {:<16} research: {:<14} ops: {}",
                        mark,
                        difficult,
                        task.student_name,
                        task.student_groups.join(","),
                        placeholder(&task.research_note),
                        placeholder(&task.ops_note),
                    ))
                })
                .collect();
            render_table(
                TableView {
                    title,
                    header: "      student            groups           notes".to_string(),
                    rows,
                    selected: Some(pane.selected),
                    state: app.tabs.state(Tab::Teaching),
                    pagination: None,
                    empty_text: "No tasks for today",
                },
                area,
                buf,
            );
        }
        TeachingView::Completed => {
            let rows = pane
                .completed
                .iter()
                .map(|row| {
                    Line::from(format!(
                        "{:<17} {:<16} {:<10} {:<12} {}",
                        row.reply_time,
                        row.student_name,
                        row.progress.display(),
                        row.teacher_name,
                        row.teacher_comment,
                    ))
                })
                .collect();
            render_table(
                TableView {
                    title: "Completed Feedback | [v] back to day list".to_string(),
                    header: "time              student          progress   teacher      comment"
                        .to_string(),
                    rows,
                    selected: None,
                    state: pane.completed_state,
                    pagination: pane.completed_pagination.as_ref(),
                    empty_text: "No feedback records",
                },
                area,
                buf,
            );
        }
    }
}

/// Render the assignment pane (draft or history view).
pub fn render_assignment(app: &App, area: Rect, buf: &mut Buffer) {
    let pane = &app.assignment;
    match pane.view {
        AssignmentView::Draft => {
            let teacher = pane
                .draft
                .teacher
                .as_ref()
                .map(|t| t.name.as_str())
                .unwrap_or("none ([t] to pick)");
            let title = format!(
                "Assignment Draft (teacher: {} | records: {}) | [h] history",
                teacher,
                pane.records.len()
            );
            let rows = pane
                .draft
                .students
                .iter()
                .map(|student| {
                    let resolved = if student.pk.is_some() { " " } else { "?" };
                    Line::from(format!(
                        "{} {:<10} {:<18} note: {}",
                        resolved,
                        student.student_id,
                        student.name,
                        placeholder(&student.note),
                    ))
                })
                .collect();
            render_table(
                TableView {
                    title,
                    header: "  user id    name               task note".to_string(),
                    rows,
                    selected: Some(pane.draft_cursor),
                    state: app.tabs.state(Tab::Assignment),
                    pagination: None,
                    empty_text: "No students in the draft (search with '/')",
                },
                area,
                buf,
            );
        }
        AssignmentView::History => {
            let rows = pane
                .history
                .iter()
                .map(|group| {
                    let preview: Vec<&str> = group
                        .students
                        .iter()
                        .take(6)
                        .map(|s| s.student_name.as_str())
                        .collect();
                    Line::from(format!(
                        "{:<16} {:>3} students  {}",
                        group.teacher_name,
                        group.students.len(),
                        preview.join(", "),
                    ))
                })
                .collect();
            render_table(
                TableView {
                    title: "Assignment History by Teacher | [h] draft, [Enter] use, [e] edit"
                        .to_string(),
                    header: "teacher             count  students".to_string(),
                    rows,
                    selected: Some(pane.history_cursor),
                    state: app.tabs.state(Tab::Assignment),
                    pagination: None,
                    empty_text: "No assignment history",
                },
                area,
                buf,
            );
        }
    }
}

fn placeholder(text: &str) -> &str {
    if text.is_empty() { "none" } else { text }
}
