//! Music-school back-office admin console.
//!
//! Main entry point and event loop: terminal setup, key dispatch per pane
//! and overlay, and the per-frame pump that drives debounced searches.

mod api;
mod app;
mod assignment;
mod config;
mod cookies;
mod form;
mod notify;
mod search;
mod tabs;
mod ui;

use api::AdminClient;
use app::{App, AssignmentView, DrawerTab, FormKind, Mode, Overlay, Tab};
use config::Config;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use notify::NoticeLevel;
use ratatui::{Terminal, backend::CrosstermBackend};
use search::{SearchState, SubmitOrigin};
use std::fs;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Main application entry point.
///
/// # Returns
/// * `Result<()>` - Success or error
///
/// # Details
/// Loads configuration, points tracing at the log file (stdout belongs to
/// the TUI), fetches the initial roster, and runs the event loop.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load(None)?;
    init_tracing(&config)?;

    if config.cookie.is_empty() {
        let config_path = Config::default_config_path()?;
        if !config_path.exists() {
            config.save(None)?;
        }
        eprintln!("Error: session cookie is not configured.");
        eprintln!(
            "Copy the Cookie header from a logged-in browser session into: {}",
            config_path.display()
        );
        return Err(anyhow::anyhow!("session cookie not configured"));
    }

    let client = AdminClient::new(&config)?;
    let mut app = App::new(config);

    // First pane load happens before the terminal switches modes so a
    // misconfigured backend fails with a readable error
    app.activate_tab(&client, Tab::Students, Instant::now()).await;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let result = run_app(&mut terminal, &mut app, &client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Point the tracing subscriber at the configured log file.
fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let log_path = config.log_file_path()?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Render the complete UI.
///
/// # Details
/// Lays out the pane strip, the active pane's input line, the result
/// dropdown when one is visible, the pane body, and the status line, then
/// draws the active overlay on top.
fn render_ui(f: &mut ratatui::Frame, app: &mut App, now: Instant) {
    let active = app.tabs.active();
    let dropdown = match active {
        Tab::Teaching => ui::results_visible(&app.teaching.bar),
        Tab::Assignment => ui::results_visible(&app.assignment.bar),
        _ => false,
    };
    let chunks = ratatui::layout::Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            ratatui::layout::Constraint::Length(3), // Pane strip
            ratatui::layout::Constraint::Length(3), // Search/filter input
            ratatui::layout::Constraint::Length(if dropdown { 8 } else { 0 }),
            ratatui::layout::Constraint::Min(0),    // Pane body
            ratatui::layout::Constraint::Length(1), // Status line
        ])
        .split(f.area());

    ui::render_tabs(app, chunks[0], f.buffer_mut());

    match active {
        Tab::Students => ui::render_filter_input(
            "Roster filter",
            &app.students.query,
            app.mode,
            chunks[1],
            f.buffer_mut(),
        ),
        Tab::Tasks => ui::render_filter_input(
            "Task filter",
            &app.tasks.query,
            app.mode,
            chunks[1],
            f.buffer_mut(),
        ),
        Tab::Visits => ui::render_filter_input(
            "Visit filter",
            &app.visits.filter.keyword,
            app.mode,
            chunks[1],
            f.buffer_mut(),
        ),
        Tab::Teaching => ui::render_search_input(
            "Student search",
            &app.teaching.bar,
            app.mode,
            chunks[1],
            f.buffer_mut(),
        ),
        Tab::Assignment => ui::render_search_input(
            "Student search",
            &app.assignment.bar,
            app.mode,
            chunks[1],
            f.buffer_mut(),
        ),
    }

    if dropdown {
        match active {
            Tab::Teaching => ui::render_search_results(
                &app.teaching.bar,
                app.teaching.result_cursor,
                chunks[2],
                f.buffer_mut(),
            ),
            Tab::Assignment => ui::render_search_results(
                &app.assignment.bar,
                app.assignment.result_cursor,
                chunks[2],
                f.buffer_mut(),
            ),
            _ => {}
        }
    }

    match active {
        Tab::Students => ui::render_students(app, chunks[3], f.buffer_mut()),
        Tab::Tasks => ui::render_tasks(app, chunks[3], f.buffer_mut()),
        Tab::Visits => ui::render_visits(app, chunks[3], f.buffer_mut()),
        Tab::Teaching => ui::render_teaching(app, chunks[3], f.buffer_mut()),
        Tab::Assignment => ui::render_assignment(app, chunks[3], f.buffer_mut()),
    }

    render_status(app, now, chunks[4], f);

    match &app.overlay {
        Overlay::Detail(detail) => ui::render_drawer(detail, f.area(), f.buffer_mut()),
        Overlay::Form { form, .. } => ui::render_form(form, f.area(), f.buffer_mut()),
        Overlay::None => {}
    }
}

/// Render the status line: the active notice, or key help for the pane.
fn render_status(app: &mut App, now: Instant, area: ratatui::layout::Rect, f: &mut ratatui::Frame) {
    let (text, style) = match app.notifier.current(now) {
        Some(notice) => {
            let color = match notice.level {
                NoticeLevel::Success => ratatui::style::Color::Green,
                NoticeLevel::Error => ratatui::style::Color::Red,
                NoticeLevel::Info => ratatui::style::Color::Yellow,
            };
            (notice.text.clone(), ratatui::style::Style::default().fg(color))
        }
        None => (
            help_text(app).to_string(),
            ratatui::style::Style::default().fg(ratatui::style::Color::DarkGray),
        ),
    };
    let status = ratatui::widgets::Paragraph::new(ratatui::text::Line::from(text)).style(style);
    f.render_widget(status, area);
}

fn help_text(app: &App) -> &'static str {
    match &app.overlay {
        Overlay::Detail(_) => {
            "[Tab] drawer tab  [e] edit note  [s] status  [/] keyword  [n/p] page  [Esc] close"
        }
        Overlay::Form { .. } => "[Tab] next field  [Enter] submit  [Esc] cancel",
        Overlay::None => match app.tabs.active() {
            Tab::Students => {
                "[/] filter  [f] status  [Enter] detail  [a] add  [e] edit  [o] ops note  [v] visit  [m] task  [q] quit"
            }
            Tab::Tasks => {
                "[/] filter  [f] status  [Space] pick  [a] pick all  [u] batch update  [Enter] detail  [q] quit"
            }
            Tab::Visits => "[/] filter  [f] status  [n/p] page  [r] reload  [q] quit",
            Tab::Teaching => {
                "[/] search  [s] search now  [Space] pick  [F] feedback  [R/O] push  [d] delete  [v] records"
            }
            Tab::Assignment => {
                "[/] search  [t] teacher  [S] save  [h] history  [i] quality  [x] export  [R] resolve  [q] quit"
            }
        },
    }
}

/// Main event loop.
///
/// # Details
/// Polls crossterm events with a 100 ms timeout; every iteration also
/// advances the search debounce timers and reaps finished search requests,
/// so results appear without further input.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &AdminClient,
) -> anyhow::Result<()> {
    loop {
        let now = Instant::now();
        app.pump_search(client, now).await;
        terminal.draw(|f| render_ui(f, app, now))?;

        // Use non-blocking event polling with timeout to keep UI responsive
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c')
                && key.modifiers.contains(event::KeyModifiers::CONTROL)
            {
                break;
            }
            let quit = if matches!(app.overlay, Overlay::Form { .. }) {
                handle_form_key(key, app, client).await;
                false
            } else if matches!(app.overlay, Overlay::Detail(_)) {
                handle_drawer_key(key, app, client).await;
                false
            } else if app.mode == Mode::Input {
                handle_input_key(key, app, client).await;
                false
            } else {
                handle_browse_key(key, app, client).await
            };
            if quit {
                break;
            }
        }
        // If no event, continue loop to redraw UI (keeps it responsive)
    }

    Ok(())
}

/// Handle a key in browse mode with no overlay open.
///
/// # Returns
/// * `bool` - true to quit the application
async fn handle_browse_key(key: KeyEvent, app: &mut App, client: &AdminClient) -> bool {
    let now = Instant::now();
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => return true,
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.activate_tab(client, Tab::ALL[index], now).await;
        }
        KeyCode::Left => app.tabs.focus_prev(),
        KeyCode::Right => app.tabs.focus_next(),
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::Char('/') => app.mode = Mode::Input,
        KeyCode::Char('r') => app.reload_active(client, now).await,
        KeyCode::Char('n') => app.change_page(client, 1, now).await,
        KeyCode::Char('p') => app.change_page(client, -1, now).await,
        KeyCode::Char('f') => app.cycle_status_filter(client, now).await,
        KeyCode::Esc => {
            // Esc dismisses an open result dropdown; quitting stays on 'q'
            match app.tabs.active() {
                Tab::Teaching => app.teaching.bar.clear(),
                Tab::Assignment => app.assignment.bar.clear(),
                _ => {}
            }
        }
        KeyCode::Enter => {
            // A focused-but-inactive header takes Enter first, matching the
            // pane strip's keyboard contract
            if app.tabs.focused() != app.tabs.active() {
                app.activate_focused_tab(client, now).await;
            } else {
                handle_enter(app, client, now).await;
            }
        }
        KeyCode::Char(' ') => {
            if app.tabs.focused() != app.tabs.active() {
                app.activate_focused_tab(client, now).await;
            } else {
                match app.tabs.active() {
                    Tab::Tasks => app.tasks_toggle_pick(),
                    Tab::Teaching => app.teaching_toggle_pick(),
                    _ => {}
                }
            }
        }
        code => handle_pane_key(code, app, client, now).await,
    }
    false
}

/// Enter on the active pane: open a detail, add a search hit, or use a
/// history group, depending on what is highlighted.
async fn handle_enter(app: &mut App, client: &AdminClient, now: Instant) {
    match app.tabs.active() {
        Tab::Students => {
            if let Some(student) = app.students.rows.get(app.students.selected) {
                let id = student.id;
                app.open_detail(client, id, now).await;
            }
        }
        Tab::Tasks => {
            if let Some(task) = app.tasks.rows.get(app.tasks.selected) {
                let id = task.student_id;
                app.open_detail(client, id, now).await;
            }
        }
        Tab::Visits => {
            if let Some(visit) = app.visits.rows.get(app.visits.selected) {
                let id = visit.student_id;
                app.open_detail(client, id, now).await;
            }
        }
        Tab::Teaching => {
            if matches!(app.teaching.bar.state(), SearchState::Loaded(_)) {
                app.teaching_add_hit(client, now).await;
            }
        }
        Tab::Assignment => {
            if matches!(app.assignment.bar.state(), SearchState::Loaded(_)) {
                app.assignment_add_hit(now);
            } else if app.assignment.view == AssignmentView::History {
                app.assignment_use_history(now);
            } else if !app.assignment.draft.students.is_empty() {
                app.open_form(FormKind::DraftNote { index: app.assignment.draft_cursor }, now);
            }
        }
    }
}

/// Pane-specific action keys in browse mode.
async fn handle_pane_key(code: KeyCode, app: &mut App, client: &AdminClient, now: Instant) {
    match app.tabs.active() {
        Tab::Students => match code {
            KeyCode::Char('a') => app.open_form(FormKind::CreateStudent, now),
            KeyCode::Char('e') => {
                if let Some(student) = app.students.rows.get(app.students.selected) {
                    let id = student.id;
                    app.open_form(FormKind::EditStudent { id }, now);
                }
            }
            KeyCode::Char('o') => {
                if let Some(student) = app.students.rows.get(app.students.selected) {
                    let id = student.id;
                    app.open_form(FormKind::OperationNote { id }, now);
                }
            }
            KeyCode::Char('v') => {
                if let Some(student) = app.students.rows.get(app.students.selected) {
                    let id = student.id;
                    app.open_form(FormKind::CreateVisit { student_id: id }, now);
                }
            }
            KeyCode::Char('m') => {
                if let Some(student) = app.students.rows.get(app.students.selected) {
                    match client.add_manual_task(student.id).await {
                        Ok(message) => app.notifier.success(
                            message.unwrap_or_else(|| "Task created".to_string()),
                            now,
                        ),
                        Err(err) => {
                            tracing::warn!(error = %err, "manual task creation failed");
                            app.notifier.error(format!("Failed to create task: {}", err), now);
                        }
                    }
                }
            }
            _ => {}
        },
        Tab::Tasks => match code {
            KeyCode::Char('a') => app.tasks_toggle_pick_all(),
            KeyCode::Char('u') => app.open_form(FormKind::TaskStatus, now),
            _ => {}
        },
        Tab::Visits => {}
        Tab::Teaching => match code {
            KeyCode::Char('s') => app.submit_search(client, SubmitOrigin::Button, now),
            KeyCode::Char('d') => app.teaching_delete_picked(client, now).await,
            KeyCode::Char('F') => {
                if let Some(task) = app.teaching.tasks.get(app.teaching.selected) {
                    let id = task.student_id;
                    app.open_form(FormKind::Feedback { student_id: id }, now);
                }
            }
            KeyCode::Char('R') => app.open_form(FormKind::PushResearch, now),
            KeyCode::Char('O') => app.open_form(FormKind::PushOperation, now),
            KeyCode::Char('v') => app.teaching_toggle_view(client, now).await,
            _ => {}
        },
        Tab::Assignment => match code {
            KeyCode::Char('s') => app.submit_search(client, SubmitOrigin::Button, now),
            KeyCode::Char('t') => app.assignment_cycle_teacher(),
            KeyCode::Char('d') | KeyCode::Delete => app.assignment_remove_draft_row(),
            KeyCode::Char('S') => app.assignment_save(client, now).await,
            KeyCode::Char('R') => app.assignment_resolve_pks(client, now).await,
            KeyCode::Char('x') => app.assignment_export(now),
            KeyCode::Char('e') => {
                if app.assignment.view == AssignmentView::History {
                    app.assignment_edit_history(now);
                }
            }
            KeyCode::Char('h') => {
                app.assignment.view = match app.assignment.view {
                    AssignmentView::Draft => AssignmentView::History,
                    AssignmentView::History => AssignmentView::Draft,
                };
            }
            KeyCode::Char('i') => {
                // Quality check on the highlighted hit, or the draft row
                // when no dropdown is open
                let id = match app.assignment.bar.state() {
                    SearchState::Loaded(hits) => {
                        hits.get(app.assignment.result_cursor).map(|hit| hit.id)
                    }
                    _ => app
                        .assignment
                        .draft
                        .students
                        .get(app.assignment.draft_cursor)
                        .and_then(|student| student.pk),
                };
                if let Some(id) = id {
                    app.open_quality_detail(client, id, now).await;
                }
            }
            _ => {}
        },
    }
}

/// Handle a key while the pane's text box has input focus.
async fn handle_input_key(key: KeyEvent, app: &mut App, client: &AdminClient) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => app.mode = Mode::Browse,
        KeyCode::Enter => {
            app.mode = Mode::Browse;
            match app.tabs.active() {
                Tab::Teaching | Tab::Assignment => {
                    app.submit_search(client, SubmitOrigin::Enter, now)
                }
                _ => app.apply_filter(client, now).await,
            }
        }
        KeyCode::Backspace => app.input_backspace(now),
        KeyCode::Char(c) => app.input_char(c, now),
        _ => {}
    }
}

/// Handle a key while the detail drawer is open.
async fn handle_drawer_key(key: KeyEvent, app: &mut App, client: &AdminClient) {
    let now = Instant::now();

    // Text entry sub-modes first: the research note editor and the visit
    // keyword filter both capture typing
    let (editing_note, editing_filter) = match &app.overlay {
        Overlay::Detail(detail) => (detail.editing_note, detail.editing_filter),
        _ => return,
    };
    if editing_note {
        match key.code {
            KeyCode::Enter => app.drawer_save_note(client, now).await,
            KeyCode::Esc => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.editing_note = false;
                    detail.note_draft = detail.student.research_note.clone();
                }
            }
            KeyCode::Backspace => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.note_draft.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.note_draft.push(c);
                }
            }
            _ => {}
        }
        return;
    }
    if editing_filter {
        match key.code {
            KeyCode::Enter => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.editing_filter = false;
                    detail.visits_page = 1;
                }
                app.drawer_load_visits(client, now).await;
            }
            KeyCode::Esc => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.editing_filter = false;
                }
            }
            KeyCode::Backspace => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.visits_filter.keyword.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Overlay::Detail(detail) = &mut app.overlay {
                    detail.visits_filter.keyword.push(c);
                }
            }
            _ => {}
        }
        return;
    }

    let drawer_tab = match &app.overlay {
        Overlay::Detail(detail) => detail.tab,
        _ => return,
    };
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Tab => {
            let next = match drawer_tab {
                DrawerTab::Overview => DrawerTab::Visits,
                DrawerTab::Visits => DrawerTab::Overview,
            };
            app.drawer_switch_tab(client, next, now).await;
        }
        KeyCode::Char('e') if drawer_tab == DrawerTab::Overview => {
            if let Overlay::Detail(detail) = &mut app.overlay {
                detail.editing_note = true;
            }
        }
        KeyCode::Char('n') if drawer_tab == DrawerTab::Visits => {
            app.drawer_change_page(client, 1, now).await;
        }
        KeyCode::Char('p') if drawer_tab == DrawerTab::Visits => {
            app.drawer_change_page(client, -1, now).await;
        }
        KeyCode::Char('s') if drawer_tab == DrawerTab::Visits => {
            app.drawer_cycle_status(client, now).await;
        }
        KeyCode::Char('/') if drawer_tab == DrawerTab::Visits => {
            if let Overlay::Detail(detail) = &mut app.overlay {
                detail.editing_filter = true;
            }
        }
        KeyCode::Char('r') if drawer_tab == DrawerTab::Visits => {
            app.drawer_load_visits(client, now).await;
        }
        _ => {}
    }
}

/// Handle a key while a form overlay is open.
async fn handle_form_key(key: KeyEvent, app: &mut App, client: &AdminClient) {
    let now = Instant::now();
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.mode = Mode::Browse;
        }
        KeyCode::Enter => app.submit_form(client, now).await,
        KeyCode::Tab | KeyCode::Down => {
            if let Overlay::Form { form, .. } = &mut app.overlay {
                form.focus_next();
            }
        }
        KeyCode::BackTab | KeyCode::Up => {
            if let Overlay::Form { form, .. } = &mut app.overlay {
                form.focus_prev();
            }
        }
        KeyCode::Backspace => {
            if let Overlay::Form { form, .. } = &mut app.overlay {
                form.pop_char();
            }
        }
        KeyCode::Char(c) => {
            if let Overlay::Form { form, .. } = &mut app.overlay {
                form.push_char(c);
            }
        }
        _ => {}
    }
}
