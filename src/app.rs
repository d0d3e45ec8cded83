//! Application state management.
//!
//! Owns the tab controller, one state struct per pane, the active overlay
//! (detail drawer or form), and the async plumbing for search requests.
//! Every pane's cursor, page and selection state lives on its own struct so
//! two panes never share mutable state.

use crate::api::models::{
    CompletedFeedback, FeedbackDraft, OpsTask, Pagination, Stats, StudentDetail, StudentHit,
    StudentSummary, TodayTask, VisitFilter, VisitRecord,
};
use crate::api::{AdminClient, ApiError};
use crate::assignment::{
    AssignmentDraft, AssignmentRecord, DraftStudent, HistoryGroup, RecordStudent, TeacherRef,
    group_history, teachers_from_history,
};
use crate::config::Config;
use crate::form::{Field, Form};
use crate::notify::Notifier;
use crate::search::{SearchBar, SearchConfig, SearchIssue, SearchState, SubmitOrigin, SubmitOutcome};
use crate::tabs::{PaneState, TabController};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Task/visit statuses the backend understands, in cycle order.
pub const STATUS_VALUES: [&str; 4] = ["pending", "contacted", "no_reply", "closed"];

/// Roster status filters, in cycle order.
pub const ROSTER_FILTERS: [&str; 2] = ["active", "paused"];

/// Top-level panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Students,
    Tasks,
    Visits,
    Teaching,
    Assignment,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Students,
        Tab::Tasks,
        Tab::Visits,
        Tab::Teaching,
        Tab::Assignment,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Students => "Students",
            Tab::Tasks => "Ops Tasks",
            Tab::Visits => "Visits",
            Tab::Teaching => "Teaching",
            Tab::Assignment => "Assignment",
        }
    }
}

/// Whether keys edit text or navigate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Input,
}

/// A spawned search request; the generation ties the response back to the
/// issuing [`SearchBar`].
#[derive(Debug)]
pub struct SearchJob {
    pub generation: u64,
    pub handle: JoinHandle<Result<Vec<StudentHit>, ApiError>>,
}

/// Student roster pane.
#[derive(Debug, Default)]
pub struct StudentsPane {
    pub rows: Vec<StudentSummary>,
    pub pagination: Option<Pagination>,
    pub stats: Option<Stats>,
    pub page: u32,
    pub query: String,
    pub status_filter: Option<String>,
    pub selected: usize,
}

/// Operations task board pane.
#[derive(Debug, Default)]
pub struct TasksPane {
    pub rows: Vec<OpsTask>,
    pub pagination: Option<Pagination>,
    pub page: u32,
    pub status_filter: Option<String>,
    pub query: String,
    pub selected: usize,
    /// Task ids checked for batch status updates
    pub picked: HashSet<i64>,
}

/// Visit record pane.
#[derive(Debug, Default)]
pub struct VisitsPane {
    pub rows: Vec<VisitRecord>,
    pub pagination: Option<Pagination>,
    pub page: u32,
    pub filter: VisitFilter,
    pub selected: usize,
}

/// Sub-view of the teaching pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeachingView {
    Today,
    Completed,
}

/// Teaching day-list pane.
#[derive(Debug)]
pub struct TeachingPane {
    pub tasks: Vec<TodayTask>,
    pub selected: usize,
    /// Student ids checked for push/delete operations
    pub picked: HashSet<i64>,
    pub bar: SearchBar<StudentHit>,
    pub job: Option<SearchJob>,
    pub result_cursor: usize,
    pub view: TeachingView,
    pub completed: Vec<CompletedFeedback>,
    pub completed_pagination: Option<Pagination>,
    pub completed_page: u32,
    pub completed_state: PaneState,
}

/// Sub-view of the assignment pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentView {
    Draft,
    History,
}

/// Teacher-assignment pane.
#[derive(Debug)]
pub struct AssignmentPane {
    pub bar: SearchBar<StudentHit>,
    pub job: Option<SearchJob>,
    pub result_cursor: usize,
    pub draft: AssignmentDraft,
    pub draft_cursor: usize,
    pub teachers: Vec<TeacherRef>,
    pub teacher_index: Option<usize>,
    pub records: Vec<AssignmentRecord>,
    pub history: Vec<HistoryGroup>,
    pub history_cursor: usize,
    pub view: AssignmentView,
}

/// Which tab of the detail drawer is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawerTab {
    Overview,
    Visits,
}

/// Detail drawer state for one open student.
#[derive(Debug)]
pub struct DetailState {
    pub student: StudentDetail,
    pub tab: DrawerTab,
    pub note_draft: String,
    pub editing_note: bool,
    pub visits: Vec<VisitRecord>,
    pub visits_pagination: Option<Pagination>,
    pub visits_page: u32,
    /// Remembered across page changes so the user never re-enters it
    pub visits_filter: VisitFilter,
    pub visits_state: PaneState,
    pub editing_filter: bool,
}

/// What a form overlay submits to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormKind {
    CreateStudent,
    EditStudent { id: i64 },
    OperationNote { id: i64 },
    CreateVisit { student_id: i64 },
    /// Batch status update over the tasks pane's picked set
    TaskStatus,
    Feedback { student_id: i64 },
    PushResearch,
    PushOperation,
    DraftNote { index: usize },
}

/// The active overlay, if any.
#[derive(Debug)]
pub enum Overlay {
    None,
    Detail(Box<DetailState>),
    Form { kind: FormKind, form: Form },
}

/// Result of a per-id batch operation.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub ok: usize,
    pub failed: Vec<(i64, String)>,
}

impl BatchOutcome {
    /// Human summary: "4 updated, 1 failed: <first failure>".
    pub fn summary(&self, verb: &str) -> String {
        if self.failed.is_empty() {
            format!("{} {}", self.ok, verb)
        } else {
            format!(
                "{} {}, {} failed: {}",
                self.ok,
                verb,
                self.failed.len(),
                self.failed[0].1
            )
        }
    }

    /// Keep only the failed ids selected so the failed subset can be
    /// retried without re-picking.
    pub fn retain_failed(&self, picked: &mut HashSet<i64>) {
        let failed: HashSet<i64> = self.failed.iter().map(|(id, _)| *id).collect();
        picked.retain(|id| failed.contains(id));
    }
}

/// Main application state.
pub struct App {
    pub tabs: TabController<Tab>,
    pub students: StudentsPane,
    pub tasks: TasksPane,
    pub visits: VisitsPane,
    pub teaching: TeachingPane,
    pub assignment: AssignmentPane,
    pub overlay: Overlay,
    pub notifier: Notifier,
    pub mode: Mode,
    pub config: Config,
}

impl App {
    pub fn new(config: Config) -> Self {
        let search_config = Self::search_config(&config);
        Self {
            tabs: TabController::new(&Tab::ALL),
            students: StudentsPane {
                page: 1,
                ..StudentsPane::default()
            },
            tasks: TasksPane {
                page: 1,
                ..TasksPane::default()
            },
            visits: VisitsPane {
                page: 1,
                ..VisitsPane::default()
            },
            teaching: TeachingPane {
                tasks: Vec::new(),
                selected: 0,
                picked: HashSet::new(),
                bar: SearchBar::new(search_config.clone()),
                job: None,
                result_cursor: 0,
                view: TeachingView::Today,
                completed: Vec::new(),
                completed_pagination: None,
                completed_page: 1,
                completed_state: PaneState::NotLoaded,
            },
            assignment: AssignmentPane {
                bar: SearchBar::new(search_config),
                job: None,
                result_cursor: 0,
                draft: AssignmentDraft::default(),
                draft_cursor: 0,
                teachers: Vec::new(),
                teacher_index: None,
                records: Vec::new(),
                history: Vec::new(),
                history_cursor: 0,
                view: AssignmentView::Draft,
            },
            overlay: Overlay::None,
            notifier: Notifier::new(),
            mode: Mode::Browse,
            config,
        }
    }

    fn search_config(config: &Config) -> SearchConfig {
        SearchConfig {
            min_chars: config.search_min_chars,
            debounce: Duration::from_millis(config.search_debounce_ms),
        }
    }

    // ── Tab activation and loading ──

    /// Activate a tab and run its loader if this is the first activation or
    /// a retry after failure.
    pub async fn activate_tab(&mut self, client: &AdminClient, tab: Tab, now: Instant) {
        let activation = self.tabs.activate(tab);
        if activation.needs_load {
            self.load_pane(client, activation.pane, now).await;
        }
    }

    /// Activate the tab under header focus (keyboard path).
    pub async fn activate_focused_tab(&mut self, client: &AdminClient, now: Instant) {
        let tab = self.tabs.focused();
        self.activate_tab(client, tab, now).await;
    }

    /// Reload the active tab's data.
    pub async fn reload_active(&mut self, client: &AdminClient, now: Instant) {
        let pane = self.tabs.active();
        self.tabs.begin_reload(pane);
        self.load_pane(client, pane, now).await;
    }

    async fn load_pane(&mut self, client: &AdminClient, pane: Tab, now: Instant) {
        match pane {
            Tab::Students => self.load_students(client, now).await,
            Tab::Tasks => self.load_tasks(client, now).await,
            Tab::Visits => self.load_visits(client, now).await,
            Tab::Teaching => self.load_today_tasks(client, now).await,
            Tab::Assignment => self.load_assignment_history(client, now).await,
        }
    }

    pub async fn load_students(&mut self, client: &AdminClient, now: Instant) {
        let result = client
            .list_students(
                self.students.page,
                self.config.page_size,
                &self.students.query,
                self.students.status_filter.as_deref(),
            )
            .await;
        match result {
            Ok(page) => {
                self.students.rows = page.data;
                self.students.pagination = page.pagination;
                self.students.stats = page.stats;
                self.students.selected = clamp_cursor(self.students.selected, self.students.rows.len());
                self.tabs.mark_loaded(Tab::Students);
            }
            Err(err) => {
                tracing::warn!(error = %err, "roster load failed");
                self.notifier.error(format!("Failed to load students: {}", err), now);
                self.tabs.mark_failed(Tab::Students);
            }
        }
    }

    pub async fn load_tasks(&mut self, client: &AdminClient, now: Instant) {
        let result = client
            .list_ops_tasks(
                self.tasks.page,
                self.tasks.status_filter.as_deref(),
                &self.tasks.query,
            )
            .await;
        match result {
            Ok(page) => {
                self.tasks.rows = page.data;
                self.tasks.pagination = page.pagination;
                self.tasks.selected = clamp_cursor(self.tasks.selected, self.tasks.rows.len());
                self.tabs.mark_loaded(Tab::Tasks);
            }
            Err(err) => {
                tracing::warn!(error = %err, "task board load failed");
                self.notifier.error(format!("Failed to load tasks: {}", err), now);
                self.tabs.mark_failed(Tab::Tasks);
            }
        }
    }

    pub async fn load_visits(&mut self, client: &AdminClient, now: Instant) {
        let result = client
            .list_visits(self.visits.page, &self.visits.filter, None)
            .await;
        match result {
            Ok(page) => {
                self.visits.rows = page.data;
                self.visits.pagination = page.pagination;
                self.visits.selected = clamp_cursor(self.visits.selected, self.visits.rows.len());
                self.tabs.mark_loaded(Tab::Visits);
            }
            Err(err) => {
                tracing::warn!(error = %err, "visit list load failed");
                self.notifier.error(format!("Failed to load visits: {}", err), now);
                self.tabs.mark_failed(Tab::Visits);
            }
        }
    }

    pub async fn load_today_tasks(&mut self, client: &AdminClient, now: Instant) {
        match client.today_tasks().await {
            Ok(tasks) => {
                let ids: HashSet<i64> = tasks.iter().map(|t| t.student_id).collect();
                self.teaching.picked.retain(|id| ids.contains(id));
                self.teaching.tasks = tasks;
                self.teaching.selected = clamp_cursor(self.teaching.selected, self.teaching.tasks.len());
                self.tabs.mark_loaded(Tab::Teaching);
            }
            Err(err) => {
                tracing::warn!(error = %err, "day list load failed");
                self.notifier.error(format!("Failed to load today's tasks: {}", err), now);
                self.tabs.mark_failed(Tab::Teaching);
            }
        }
    }

    pub async fn load_completed(&mut self, client: &AdminClient, now: Instant) {
        self.teaching.completed_state = PaneState::Loading;
        match client.completed_feedbacks(self.teaching.completed_page).await {
            Ok(page) => {
                self.teaching.completed_pagination = Some(page.pagination());
                self.teaching.completed = page.feedbacks;
                self.teaching.completed_state = PaneState::Loaded;
            }
            Err(err) => {
                tracing::warn!(error = %err, "completed feedback load failed");
                self.notifier.error(format!("Failed to load feedback records: {}", err), now);
                self.teaching.completed_state = PaneState::Failed;
            }
        }
    }

    pub async fn load_assignment_history(&mut self, client: &AdminClient, now: Instant) {
        match client.task_history().await {
            Ok(tasks) => {
                self.assignment.history = group_history(&tasks);
                self.assignment.teachers = teachers_from_history(&tasks);
                if let Some(index) = self.assignment.teacher_index
                    && index >= self.assignment.teachers.len()
                {
                    self.assignment.teacher_index = None;
                }
                self.assignment.history_cursor =
                    clamp_cursor(self.assignment.history_cursor, self.assignment.history.len());
                self.tabs.mark_loaded(Tab::Assignment);
            }
            Err(err) => {
                tracing::warn!(error = %err, "assignment history load failed");
                self.notifier.error(format!("Failed to load assignment history: {}", err), now);
                self.tabs.mark_failed(Tab::Assignment);
            }
        }
    }

    // ── Search plumbing ──

    /// Advance debounce timers and reap finished search tasks.
    pub async fn pump_search(&mut self, client: &AdminClient, now: Instant) {
        if let Some(issue) = self.teaching.bar.tick(now) {
            spawn_teaching_search(&mut self.teaching, client, issue);
        }
        if let Some(issue) = self.assignment.bar.tick(now) {
            spawn_assignment_search(&mut self.assignment, client, issue);
        }

        let teaching_done = self
            .teaching
            .job
            .as_ref()
            .is_some_and(|job| job.handle.is_finished());
        if teaching_done && let Some(job) = self.teaching.job.take() {
            let outcome = join_search(job.handle).await;
            self.teaching.bar.apply(job.generation, outcome);
            self.teaching.result_cursor = 0;
        }
        let assignment_done = self
            .assignment
            .job
            .as_ref()
            .is_some_and(|job| job.handle.is_finished());
        if assignment_done && let Some(job) = self.assignment.job.take() {
            let outcome = join_search(job.handle).await;
            self.assignment.bar.apply(job.generation, outcome);
            self.assignment.result_cursor = 0;
        }
    }

    /// Explicit (non-debounced) search on the active pane's bar.
    pub fn submit_search(&mut self, client: &AdminClient, origin: SubmitOrigin, now: Instant) {
        let outcome = match self.tabs.active() {
            Tab::Teaching => self.teaching.bar.submit(origin),
            Tab::Assignment => self.assignment.bar.submit(origin),
            _ => return,
        };
        match outcome {
            SubmitOutcome::Issued(issue) => match self.tabs.active() {
                Tab::Teaching => spawn_teaching_search(&mut self.teaching, client, issue),
                Tab::Assignment => spawn_assignment_search(&mut self.assignment, client, issue),
                _ => {}
            },
            SubmitOutcome::TooShort { min } => {
                self.notifier
                    .info(format!("Enter at least {} characters to search", min), now);
            }
            SubmitOutcome::Cleared | SubmitOutcome::Ignored => {}
        }
    }

    /// Character input routed to the active pane's text box.
    pub fn input_char(&mut self, ch: char, now: Instant) {
        match self.tabs.active() {
            Tab::Students => self.students.query.push(ch),
            Tab::Tasks => self.tasks.query.push(ch),
            Tab::Visits => self.visits.filter.keyword.push(ch),
            Tab::Teaching => self.teaching.bar.push_char(ch, now),
            Tab::Assignment => self.assignment.bar.push_char(ch, now),
        }
    }

    /// Backspace routed to the active pane's text box.
    pub fn input_backspace(&mut self, now: Instant) {
        match self.tabs.active() {
            Tab::Students => {
                self.students.query.pop();
            }
            Tab::Tasks => {
                self.tasks.query.pop();
            }
            Tab::Visits => {
                self.visits.filter.keyword.pop();
            }
            Tab::Teaching => self.teaching.bar.pop_char(now),
            Tab::Assignment => self.assignment.bar.pop_char(now),
        }
    }

    // ── Cursor movement ──

    /// Move the active list cursor, wrapping at the ends.
    pub fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.tabs.active() {
            Tab::Students => (&mut self.students.selected, self.students.rows.len()),
            Tab::Tasks => (&mut self.tasks.selected, self.tasks.rows.len()),
            Tab::Visits => (&mut self.visits.selected, self.visits.rows.len()),
            Tab::Teaching => {
                if let SearchState::Loaded(hits) = self.teaching.bar.state() {
                    (&mut self.teaching.result_cursor, hits.len())
                } else if self.teaching.view == TeachingView::Completed {
                    // Completed records are read-only; nothing to select
                    return;
                } else {
                    (&mut self.teaching.selected, self.teaching.tasks.len())
                }
            }
            Tab::Assignment => {
                if let SearchState::Loaded(hits) = self.assignment.bar.state() {
                    (&mut self.assignment.result_cursor, hits.len())
                } else if self.assignment.view == AssignmentView::History {
                    (&mut self.assignment.history_cursor, self.assignment.history.len())
                } else {
                    (&mut self.assignment.draft_cursor, self.assignment.draft.students.len())
                }
            }
        };
        if len == 0 {
            return;
        }
        let next = (*cursor as isize + delta).rem_euclid(len as isize);
        *cursor = next as usize;
    }

    /// Change the active pane's page and refetch.
    pub async fn change_page(&mut self, client: &AdminClient, delta: i32, now: Instant) {
        match self.tabs.active() {
            Tab::Students => {
                if let Some(page) = next_page(&self.students.pagination, self.students.page, delta) {
                    self.students.page = page;
                    self.tabs.begin_reload(Tab::Students);
                    self.load_students(client, now).await;
                }
            }
            Tab::Tasks => {
                if let Some(page) = next_page(&self.tasks.pagination, self.tasks.page, delta) {
                    self.tasks.page = page;
                    self.tabs.begin_reload(Tab::Tasks);
                    self.load_tasks(client, now).await;
                }
            }
            Tab::Visits => {
                if let Some(page) = next_page(&self.visits.pagination, self.visits.page, delta) {
                    self.visits.page = page;
                    self.tabs.begin_reload(Tab::Visits);
                    self.load_visits(client, now).await;
                }
            }
            Tab::Teaching => {
                if self.teaching.view == TeachingView::Completed
                    && let Some(page) =
                        next_page(&self.teaching.completed_pagination, self.teaching.completed_page, delta)
                {
                    self.teaching.completed_page = page;
                    self.load_completed(client, now).await;
                }
            }
            Tab::Assignment => {}
        }
    }

    /// Apply the active pane's typed filter: reset to page 1 and refetch.
    pub async fn apply_filter(&mut self, client: &AdminClient, now: Instant) {
        match self.tabs.active() {
            Tab::Students => {
                self.students.page = 1;
                self.tabs.begin_reload(Tab::Students);
                self.load_students(client, now).await;
            }
            Tab::Tasks => {
                self.tasks.page = 1;
                self.tabs.begin_reload(Tab::Tasks);
                self.load_tasks(client, now).await;
            }
            Tab::Visits => {
                self.visits.page = 1;
                self.tabs.begin_reload(Tab::Visits);
                self.load_visits(client, now).await;
            }
            Tab::Teaching | Tab::Assignment => {}
        }
    }

    /// Cycle the status filter on the roster, tasks or visits pane and
    /// refetch.
    pub async fn cycle_status_filter(&mut self, client: &AdminClient, now: Instant) {
        match self.tabs.active() {
            Tab::Students => {
                self.students.status_filter =
                    cycle_value(self.students.status_filter.as_deref(), &ROSTER_FILTERS);
                self.students.page = 1;
                self.tabs.begin_reload(Tab::Students);
                self.load_students(client, now).await;
            }
            Tab::Tasks => {
                self.tasks.status_filter = cycle_status(self.tasks.status_filter.as_deref());
                self.tasks.page = 1;
                self.tabs.begin_reload(Tab::Tasks);
                self.load_tasks(client, now).await;
            }
            Tab::Visits => {
                self.visits.filter.status = cycle_status(self.visits.filter.status.as_deref());
                self.visits.page = 1;
                self.tabs.begin_reload(Tab::Visits);
                self.load_visits(client, now).await;
            }
            _ => {}
        }
    }
}

fn clamp_cursor(cursor: usize, len: usize) -> usize {
    cursor.min(len.saturating_sub(1))
}

/// Next page number for a delta, honoring the pagination edges.
fn next_page(pagination: &Option<Pagination>, current: u32, delta: i32) -> Option<u32> {
    let pagination = pagination.as_ref()?;
    if delta > 0 && pagination.has_next {
        Some(current + 1)
    } else if delta < 0 && pagination.has_previous && current > 1 {
        Some(current - 1)
    } else {
        None
    }
}

/// Cycle None -> pending -> contacted -> no_reply -> closed -> None.
fn cycle_status(current: Option<&str>) -> Option<String> {
    cycle_value(current, &STATUS_VALUES)
}

/// Step through `values`, returning to None past the end.
fn cycle_value(current: Option<&str>, values: &[&str]) -> Option<String> {
    match current {
        None => values.first().map(|s| s.to_string()),
        Some(value) => values
            .iter()
            .position(|s| *s == value)
            .and_then(|index| values.get(index + 1))
            .map(|s| s.to_string()),
    }
}

fn spawn_teaching_search(pane: &mut TeachingPane, client: &AdminClient, issue: SearchIssue) {
    if let Some(job) = pane.job.take() {
        job.handle.abort();
    }
    let client = client.clone();
    let query = issue.query;
    pane.job = Some(SearchJob {
        generation: issue.generation,
        handle: tokio::spawn(async move { client.search_students(&query).await }),
    });
}

fn spawn_assignment_search(pane: &mut AssignmentPane, client: &AdminClient, issue: SearchIssue) {
    if let Some(job) = pane.job.take() {
        job.handle.abort();
    }
    let client = client.clone();
    let query = issue.query;
    pane.job = Some(SearchJob {
        generation: issue.generation,
        handle: tokio::spawn(async move { client.search_assignment_students(&query).await }),
    });
}

async fn join_search(
    handle: JoinHandle<Result<Vec<StudentHit>, ApiError>>,
) -> Result<Vec<StudentHit>, ApiError> {
    let outcome = match handle.await {
        Ok(result) => result,
        Err(err) => Err(ApiError::Rejected(format!("search task failed: {}", err))),
    };
    if let Err(err) = &outcome {
        tracing::warn!(error = %err, "student search failed");
    }
    outcome
}

impl App {
    // ── Row actions ──

    /// Open the detail drawer for a student.
    pub async fn open_detail(&mut self, client: &AdminClient, student_id: i64, now: Instant) {
        match client.student_detail(student_id).await {
            Ok(student) => self.show_detail(student),
            Err(err) => {
                tracing::warn!(error = %err, student_id, "detail load failed");
                self.notifier.error(format!("Failed to load student detail: {}", err), now);
            }
        }
    }

    /// Open the drawer through the research quality endpoint, which carries
    /// the research-side copy of the record.
    pub async fn open_quality_detail(&mut self, client: &AdminClient, student_id: i64, now: Instant) {
        match client.research_student_detail(student_id).await {
            Ok(student) => self.show_detail(student),
            Err(err) => {
                tracing::warn!(error = %err, student_id, "quality detail load failed");
                self.notifier.error(format!("Failed to load student detail: {}", err), now);
            }
        }
    }

    fn show_detail(&mut self, student: StudentDetail) {
        let note_draft = student.research_note.clone();
        self.overlay = Overlay::Detail(Box::new(DetailState {
            student,
            tab: DrawerTab::Overview,
            note_draft,
            editing_note: false,
            visits: Vec::new(),
            visits_pagination: None,
            visits_page: 1,
            visits_filter: VisitFilter::default(),
            visits_state: PaneState::NotLoaded,
            editing_filter: false,
        }));
    }

    /// Switch drawer tabs, lazily loading the visit history.
    pub async fn drawer_switch_tab(&mut self, client: &AdminClient, tab: DrawerTab, now: Instant) {
        let needs_load = match &mut self.overlay {
            Overlay::Detail(detail) => {
                detail.tab = tab;
                tab == DrawerTab::Visits
                    && matches!(detail.visits_state, PaneState::NotLoaded | PaneState::Failed)
            }
            _ => false,
        };
        if needs_load {
            self.drawer_load_visits(client, now).await;
        }
    }

    /// Fetch the drawer's visit-history page using its remembered filter.
    pub async fn drawer_load_visits(&mut self, client: &AdminClient, now: Instant) {
        let (student_id, page, filter) = match &mut self.overlay {
            Overlay::Detail(detail) => {
                detail.visits_state = PaneState::Loading;
                (detail.student.id, detail.visits_page, detail.visits_filter.clone())
            }
            _ => return,
        };
        let result = client.list_visits(page, &filter, Some(student_id)).await;
        let error = match (&mut self.overlay, result) {
            (Overlay::Detail(detail), Ok(page_data)) => {
                detail.visits = page_data.data;
                detail.visits_pagination = page_data.pagination;
                detail.visits_state = PaneState::Loaded;
                None
            }
            (Overlay::Detail(detail), Err(err)) => {
                detail.visits_state = PaneState::Failed;
                Some(err)
            }
            _ => None,
        };
        if let Some(err) = error {
            tracing::warn!(error = %err, student_id, "visit history load failed");
            self.notifier.error(format!("Failed to load visit history: {}", err), now);
        }
    }

    /// Page the drawer's visit history, keeping status/keyword filters.
    pub async fn drawer_change_page(&mut self, client: &AdminClient, delta: i32, now: Instant) {
        let changed = match &mut self.overlay {
            Overlay::Detail(detail) => {
                match next_page(&detail.visits_pagination, detail.visits_page, delta) {
                    Some(page) => {
                        detail.visits_page = page;
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        };
        if changed {
            self.drawer_load_visits(client, now).await;
        }
    }

    /// Cycle the drawer's visit status filter and refetch from page 1.
    pub async fn drawer_cycle_status(&mut self, client: &AdminClient, now: Instant) {
        match &mut self.overlay {
            Overlay::Detail(detail) => {
                detail.visits_filter.status = cycle_status(detail.visits_filter.status.as_deref());
                detail.visits_page = 1;
            }
            _ => return,
        }
        self.drawer_load_visits(client, now).await;
    }

    /// Save the research note edited in the drawer.
    pub async fn drawer_save_note(&mut self, client: &AdminClient, now: Instant) {
        let (student_id, note) = match &mut self.overlay {
            Overlay::Detail(detail) => {
                detail.editing_note = false;
                (detail.student.id, detail.note_draft.clone())
            }
            _ => return,
        };
        match client.set_research_note(student_id, &note).await {
            Ok(message) => {
                if let Overlay::Detail(detail) = &mut self.overlay {
                    detail.student.research_note = note;
                }
                self.notifier
                    .success(message.unwrap_or_else(|| "Note saved".to_string()), now);
            }
            Err(err) => {
                tracing::warn!(error = %err, student_id, "note save failed");
                self.notifier.error(format!("Failed to save note: {}", err), now);
            }
        }
    }

    // ── Teaching actions ──

    /// Add the highlighted search hit to today's day list.
    pub async fn teaching_add_hit(&mut self, client: &AdminClient, now: Instant) {
        let hit = match self.teaching.bar.state() {
            SearchState::Loaded(hits) => hits.get(self.teaching.result_cursor).cloned(),
            _ => None,
        };
        let Some(hit) = hit else { return };
        match client.add_today_task(hit.id).await {
            Ok(message) => {
                // Clear the box and results after a successful add
                self.teaching.bar.clear();
                self.notifier.success(
                    message.unwrap_or_else(|| "Added to today's tasks".to_string()),
                    now,
                );
                self.load_today_tasks(client, now).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, student = hit.id, "day list add failed");
                self.notifier.error(format!("Failed to add student: {}", err), now);
            }
        }
    }

    /// Toggle the pick mark on the highlighted day-list row.
    pub fn teaching_toggle_pick(&mut self) {
        if let Some(task) = self.teaching.tasks.get(self.teaching.selected) {
            let id = task.student_id;
            if !self.teaching.picked.remove(&id) {
                self.teaching.picked.insert(id);
            }
        }
    }

    /// Toggle the teaching pane between the day list and completed feedback.
    ///
    /// # Details
    /// The search region exists only on the day-list view, so its bar is
    /// torn down on the way out and re-created on the way back, the same
    /// lifecycle a re-entered pane gives its widgets.
    pub async fn teaching_toggle_view(&mut self, client: &AdminClient, now: Instant) {
        self.teaching.view = match self.teaching.view {
            TeachingView::Today => TeachingView::Completed,
            TeachingView::Completed => TeachingView::Today,
        };
        match self.teaching.view {
            TeachingView::Completed => {
                self.teaching.bar.destroy();
                if let Some(job) = self.teaching.job.take() {
                    job.handle.abort();
                }
                if matches!(
                    self.teaching.completed_state,
                    PaneState::NotLoaded | PaneState::Failed
                ) {
                    self.load_completed(client, now).await;
                }
            }
            TeachingView::Today => {
                self.teaching.bar = SearchBar::new(Self::search_config(&self.config));
            }
        }
    }

    /// Delete the picked day-list rows.
    pub async fn teaching_delete_picked(&mut self, client: &AdminClient, now: Instant) {
        if self.teaching.picked.is_empty() {
            self.notifier.error("Select at least one task first", now);
            return;
        }
        let ids = sorted_ids(&self.teaching.picked);
        match client.delete_today_tasks(&ids).await {
            Ok(message) => {
                self.teaching.picked.clear();
                self.notifier
                    .success(message.unwrap_or_else(|| "Tasks deleted".to_string()), now);
                self.load_today_tasks(client, now).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "day list delete failed");
                self.notifier.error(format!("Failed to delete tasks: {}", err), now);
            }
        }
    }

    // ── Tasks pane actions ──

    /// Toggle the pick mark on the highlighted task row.
    pub fn tasks_toggle_pick(&mut self) {
        if let Some(task) = self.tasks.rows.get(self.tasks.selected) {
            let id = task.id;
            if !self.tasks.picked.remove(&id) {
                self.tasks.picked.insert(id);
            }
        }
    }

    /// Pick or unpick every row on the current page.
    pub fn tasks_toggle_pick_all(&mut self) {
        let all_picked = !self.tasks.rows.is_empty()
            && self.tasks.rows.iter().all(|t| self.tasks.picked.contains(&t.id));
        if all_picked {
            for task in &self.tasks.rows {
                self.tasks.picked.remove(&task.id);
            }
        } else {
            for task in &self.tasks.rows {
                self.tasks.picked.insert(task.id);
            }
        }
    }

    /// Apply a status to every picked task, one request per id.
    ///
    /// # Details
    /// Successful ids leave the selection; failed ids stay picked so the
    /// failed subset can be retried as-is.
    pub async fn tasks_apply_status(&mut self, client: &AdminClient, status: &str, now: Instant) {
        let ids = sorted_ids(&self.tasks.picked);
        let mut outcome = BatchOutcome::default();
        for id in ids {
            match client.update_task_status(id, status).await {
                Ok(_) => outcome.ok += 1,
                Err(err) => outcome.failed.push((id, err.to_string())),
            }
        }
        outcome.retain_failed(&mut self.tasks.picked);
        let summary = outcome.summary("updated");
        if outcome.failed.is_empty() {
            self.notifier.success(summary, now);
        } else {
            self.notifier.error(summary, now);
        }
        self.tabs.begin_reload(Tab::Tasks);
        self.load_tasks(client, now).await;
    }

    // ── Assignment actions ──

    /// Add the highlighted search hit to the assignment draft.
    pub fn assignment_add_hit(&mut self, now: Instant) {
        let hit = match self.assignment.bar.state() {
            SearchState::Loaded(hits) => hits.get(self.assignment.result_cursor).cloned(),
            _ => None,
        };
        let Some(hit) = hit else { return };
        let added = self.assignment.draft.add(DraftStudent {
            pk: Some(hit.id),
            student_id: hit.student_id.clone(),
            name: hit.student_name.clone(),
            note: String::new(),
        });
        if added {
            self.assignment.bar.clear();
            self.notifier.success(format!("Added {}", hit.student_name), now);
        } else {
            self.notifier.info(format!("{} is already in the draft", hit.student_name), now);
        }
    }

    /// Cycle the draft's target teacher.
    pub fn assignment_cycle_teacher(&mut self) {
        if self.assignment.teachers.is_empty() {
            return;
        }
        let next = match self.assignment.teacher_index {
            None => 0,
            Some(index) => (index + 1) % self.assignment.teachers.len(),
        };
        self.assignment.teacher_index = Some(next);
        self.assignment.draft.teacher = self.assignment.teachers.get(next).cloned();
    }

    /// Remove the highlighted draft row.
    pub fn assignment_remove_draft_row(&mut self) {
        self.assignment.draft.remove(self.assignment.draft_cursor);
        self.assignment.draft_cursor =
            clamp_cursor(self.assignment.draft_cursor, self.assignment.draft.students.len());
    }

    /// Submit the draft as one task-creation call and record it locally.
    pub async fn assignment_save(&mut self, client: &AdminClient, now: Instant) {
        let Some(teacher) = self.assignment.draft.teacher.clone() else {
            self.notifier.error("Pick a teacher first", now);
            return;
        };
        let unresolved = self.assignment.draft.unresolved();
        if !unresolved.is_empty() {
            self.notifier.error(
                format!("Students without a backend id: {}", unresolved.join(", ")),
                now,
            );
            return;
        }
        let assignments = self.assignment.draft.assignments();
        if assignments.is_empty() {
            self.notifier.error("Add at least one student first", now);
            return;
        }
        match client.create_assignment(teacher.id, &assignments).await {
            Ok(message) => {
                let date = chrono::Local::now().format("%Y-%m-%d").to_string();
                self.assignment.records.push(AssignmentRecord {
                    teacher: teacher.name.clone(),
                    date,
                    students: self
                        .assignment
                        .draft
                        .students
                        .iter()
                        .map(|s| RecordStudent {
                            name: s.name.clone(),
                            note: s.note.clone(),
                        })
                        .collect(),
                });
                self.assignment.draft.clear_students();
                self.assignment.draft_cursor = 0;
                self.notifier.success(
                    message.unwrap_or_else(|| format!("Assigned {} tasks", assignments.len())),
                    now,
                );
            }
            Err(err) => {
                tracing::warn!(error = %err, "assignment save failed");
                self.notifier.error(format!("Failed to save assignment: {}", err), now);
            }
        }
    }

    /// Load the selected history group straight into the records list.
    pub fn assignment_use_history(&mut self, now: Instant) {
        let Some(group) = self.assignment.history.get(self.assignment.history_cursor) else {
            self.notifier.error("Select a history group first", now);
            return;
        };
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        self.assignment.records.push(AssignmentRecord {
            teacher: group.teacher_name.clone(),
            date,
            students: group
                .students
                .iter()
                .map(|s| RecordStudent {
                    name: s.student_name.clone(),
                    note: s.task_note.clone(),
                })
                .collect(),
        });
        self.notifier.success(
            format!(
                "Reused {} students for {}",
                group.students.len(),
                group.teacher_name
            ),
            now,
        );
    }

    /// Load the selected history group into the draft for editing.
    pub fn assignment_edit_history(&mut self, now: Instant) {
        let Some(group) = self.assignment.history.get(self.assignment.history_cursor).cloned()
        else {
            self.notifier.error("Select a history group first", now);
            return;
        };
        self.assignment.view = AssignmentView::Draft;
        if let Some(index) = self
            .assignment
            .teachers
            .iter()
            .position(|t| t.id.to_string() == group.teacher_id)
        {
            self.assignment.teacher_index = Some(index);
            self.assignment.draft.teacher = self.assignment.teachers.get(index).cloned();
        }
        self.assignment.draft.clear_students();
        for student in &group.students {
            // History rows carry no backend pk; saving requires a re-search
            self.assignment.draft.add(DraftStudent {
                pk: None,
                student_id: student.student_id.clone(),
                name: student.student_name.clone(),
                note: student.task_note.clone(),
            });
        }
        self.assignment.draft_cursor = 0;
        self.notifier.info("History loaded into the draft", now);
    }

    /// Resolve draft rows that lack a backend pk by exact-id search.
    pub async fn assignment_resolve_pks(&mut self, client: &AdminClient, now: Instant) {
        let pending: Vec<(usize, String)> = self
            .assignment
            .draft
            .students
            .iter()
            .enumerate()
            .filter(|(_, s)| s.pk.is_none())
            .map(|(index, s)| (index, s.student_id.clone()))
            .collect();
        if pending.is_empty() {
            return;
        }
        let mut resolved = 0usize;
        for (index, student_id) in pending {
            match client.search_assignment_students(&student_id).await {
                Ok(hits) => {
                    if let Some(hit) = hits.iter().find(|h| h.student_id == student_id)
                        && let Some(row) = self.assignment.draft.students.get_mut(index)
                    {
                        row.pk = Some(hit.id);
                        resolved += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, %student_id, "pk resolution failed");
                }
            }
        }
        if resolved > 0 {
            self.notifier.success(format!("Resolved {} students", resolved), now);
        }
        let unresolved = self.assignment.draft.unresolved();
        if !unresolved.is_empty() {
            self.notifier.error(
                format!("Still unresolved: {}", unresolved.join(", ")),
                now,
            );
        }
    }

    /// Export the session's assignment records to a text file.
    pub fn assignment_export(&mut self, now: Instant) {
        if self.assignment.records.is_empty() {
            self.notifier.error("No assignment records to export", now);
            return;
        }
        let date = chrono::Local::now().format("%Y-%m-%d").to_string();
        let result = self
            .config
            .export_dir_path()
            .and_then(|dir| crate::assignment::export_to_file(&self.assignment.records, &dir, &date));
        match result {
            Ok(path) => self
                .notifier
                .success(format!("Exported to {}", path.display()), now),
            Err(err) => {
                tracing::warn!(error = %err, "export failed");
                self.notifier.error(format!("Export failed: {}", err), now);
            }
        }
    }

    // ── Form overlays ──

    /// Open a form overlay for the given action.
    pub fn open_form(&mut self, kind: FormKind, now: Instant) {
        // Preconditions that need no round-trip are checked before the
        // overlay opens
        match &kind {
            FormKind::TaskStatus if self.tasks.picked.is_empty() => {
                self.notifier.error("Select at least one task first", now);
                return;
            }
            FormKind::PushResearch | FormKind::PushOperation
                if self.teaching.picked.is_empty() =>
            {
                self.notifier.error("Select at least one student first", now);
                return;
            }
            _ => {}
        }
        let form = self.build_form(&kind);
        self.overlay = Overlay::Form { kind, form };
        self.mode = Mode::Input;
    }

    fn build_form(&self, kind: &FormKind) -> Form {
        match kind {
            FormKind::CreateStudent => Form::new(
                "Add student",
                vec![
                    Field::text("student_name", "Name", true),
                    Field::text("alias_name", "Alias", false),
                    Field::comma_list("groups", "Groups"),
                    Field::text("status", "Status", false).with_value("active"),
                    Field::text("external_user_id", "User id", true),
                ],
            ),
            FormKind::EditStudent { id } => {
                let row = self.students.rows.iter().find(|s| s.id == *id);
                let (name, alias, groups, status, external) = match row {
                    Some(row) => (
                        row.student_name.clone(),
                        row.alias_name.clone(),
                        row.groups.join(", "),
                        row.status.clone(),
                        row.student_id.clone(),
                    ),
                    None => Default::default(),
                };
                Form::new(
                    "Edit student",
                    vec![
                        Field::text("student_name", "Name", true).with_value(name),
                        Field::text("alias_name", "Alias", false).with_value(alias),
                        Field::comma_list("groups", "Groups").with_value(groups),
                        Field::text("status", "Status", false).with_value(status),
                        Field::text("external_user_id", "User id", false).with_value(external),
                    ],
                )
            }
            FormKind::OperationNote { .. } => Form::new(
                "Operations note",
                vec![Field::text("operation_note", "Note", true)],
            ),
            FormKind::CreateVisit { .. } => Form::new(
                "New visit record",
                vec![
                    Field::text("status", "Status", false).with_value("contacted"),
                    Field::text("notes", "Notes", true),
                ],
            ),
            FormKind::TaskStatus => Form::new(
                "Batch status update",
                vec![
                    Field::text("status", "Status (pending/contacted/no_reply/closed)", true)
                        .with_value("contacted"),
                ],
            ),
            FormKind::Feedback { .. } => Form::new(
                "Teacher feedback",
                vec![
                    Field::text("lesson_progress", "Lesson progress", true),
                    Field::text("teacher_comment", "Teacher comment", true),
                ],
            ),
            FormKind::PushResearch => Form::new(
                "Push to research",
                vec![Field::text("research_note", "Note", true)],
            ),
            FormKind::PushOperation => Form::new(
                "Push to operations",
                vec![Field::text("operation_note", "Note", true)],
            ),
            FormKind::DraftNote { index } => {
                let note = self
                    .assignment
                    .draft
                    .students
                    .get(*index)
                    .map(|s| s.note.clone())
                    .unwrap_or_default();
                Form::new(
                    "Task note",
                    vec![Field::text("task_note", "Note", false).with_value(note)],
                )
            }
        }
    }

    /// Validate and submit the open form.
    ///
    /// # Details
    /// Client-side validation failures surface immediately without any
    /// request. A server rejection keeps the overlay open with its input so
    /// the user can correct and resubmit.
    pub async fn submit_form(&mut self, client: &AdminClient, now: Instant) {
        let (kind, form) = match &self.overlay {
            Overlay::Form { kind, form } => (kind.clone(), form.clone()),
            _ => return,
        };
        let payload = match form.payload() {
            Ok(payload) => payload,
            Err(err) => {
                self.notifier.error(err.to_string(), now);
                return;
            }
        };
        let result = match &kind {
            FormKind::CreateStudent => client.create_student(&payload).await,
            FormKind::EditStudent { id } => client.update_student(*id, &payload).await,
            FormKind::OperationNote { id } => {
                let note = form.value("operation_note").unwrap_or_default();
                client.set_operation_note(*id, note).await
            }
            FormKind::CreateVisit { student_id } => {
                let mut payload = payload;
                if let Some(object) = payload.as_object_mut() {
                    object.insert("student_id".to_string(), (*student_id).into());
                }
                client.create_visit(&payload).await
            }
            FormKind::TaskStatus => {
                let status = form.value("status").unwrap_or_default().trim().to_string();
                self.tasks_apply_status(client, &status, now).await;
                self.overlay = Overlay::None;
                self.mode = Mode::Browse;
                return;
            }
            FormKind::Feedback { student_id } => {
                let draft = FeedbackDraft {
                    student_id: *student_id,
                    lesson_progress: form.value("lesson_progress").unwrap_or_default().trim().to_string(),
                    teacher_comment: form.value("teacher_comment").unwrap_or_default().trim().to_string(),
                };
                client.submit_feedbacks(&[draft]).await
            }
            FormKind::PushResearch => {
                let ids = sorted_ids(&self.teaching.picked);
                let note = form.value("research_note").unwrap_or_default();
                client.push_research(&ids, note).await
            }
            FormKind::PushOperation => {
                let ids = sorted_ids(&self.teaching.picked);
                let note = form.value("operation_note").unwrap_or_default();
                client.push_operation(&ids, note).await
            }
            FormKind::DraftNote { index } => {
                if let Some(row) = self.assignment.draft.students.get_mut(*index) {
                    row.note = form.value("task_note").unwrap_or_default().trim().to_string();
                }
                self.overlay = Overlay::None;
                self.mode = Mode::Browse;
                return;
            }
        };
        match result {
            Ok(message) => {
                self.overlay = Overlay::None;
                self.mode = Mode::Browse;
                self.notifier
                    .success(message.unwrap_or_else(|| "Saved".to_string()), now);
                self.refresh_after_form(client, &kind, now).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "form submission rejected");
                self.notifier.error(err.to_string(), now);
            }
        }
    }

    async fn refresh_after_form(&mut self, client: &AdminClient, kind: &FormKind, now: Instant) {
        match kind {
            FormKind::CreateStudent | FormKind::EditStudent { .. } | FormKind::OperationNote { .. } => {
                self.tabs.begin_reload(Tab::Students);
                self.load_students(client, now).await;
            }
            FormKind::CreateVisit { .. } => {
                self.tabs.begin_reload(Tab::Visits);
                self.load_visits(client, now).await;
            }
            FormKind::Feedback { student_id } => {
                self.teaching.picked.remove(student_id);
                self.load_today_tasks(client, now).await;
            }
            FormKind::PushResearch | FormKind::PushOperation => {
                self.teaching.picked.clear();
            }
            FormKind::TaskStatus | FormKind::DraftNote { .. } => {}
        }
    }
}

fn sorted_ids(set: &HashSet<i64>) -> Vec<i64> {
    let mut ids: Vec<i64> = set.iter().copied().collect();
    ids.sort_unstable();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_summary_all_succeeded() {
        let outcome = BatchOutcome {
            ok: 5,
            failed: Vec::new(),
        };
        assert_eq!(outcome.summary("updated"), "5 updated");
    }

    #[test]
    fn test_batch_summary_reports_first_failure() {
        let outcome = BatchOutcome {
            ok: 4,
            failed: vec![(3, "task already closed".to_string())],
        };
        assert_eq!(
            outcome.summary("updated"),
            "4 updated, 1 failed: task already closed"
        );
    }

    #[test]
    fn test_batch_retains_failed_ids_in_selection() {
        // Five picked, one request fails: the failed id stays selected for
        // a retry, the rest are cleared
        let mut picked: HashSet<i64> = [1, 2, 3, 4, 5].into_iter().collect();
        let outcome = BatchOutcome {
            ok: 4,
            failed: vec![(3, "boom".to_string())],
        };
        outcome.retain_failed(&mut picked);
        assert_eq!(picked, [3].into_iter().collect());
    }

    #[test]
    fn test_cycle_status_full_loop() {
        let mut status: Option<String> = None;
        let mut seen = Vec::new();
        for _ in 0..5 {
            status = cycle_status(status.as_deref());
            seen.push(status.clone());
        }
        assert_eq!(seen[0].as_deref(), Some("pending"));
        assert_eq!(seen[3].as_deref(), Some("closed"));
        assert_eq!(seen[4], None);
    }

    #[test]
    fn test_roster_filter_cycle() {
        let first = cycle_value(None, &ROSTER_FILTERS);
        assert_eq!(first.as_deref(), Some("active"));
        let second = cycle_value(first.as_deref(), &ROSTER_FILTERS);
        assert_eq!(second.as_deref(), Some("paused"));
        assert_eq!(cycle_value(second.as_deref(), &ROSTER_FILTERS), None);
    }

    #[test]
    fn test_next_page_honors_edges() {
        let pagination = Some(Pagination {
            current_page: 2,
            total_pages: 3,
            total_count: 50,
            has_next: true,
            has_previous: true,
        });
        assert_eq!(next_page(&pagination, 2, 1), Some(3));
        assert_eq!(next_page(&pagination, 2, -1), Some(1));

        let last = Some(Pagination {
            current_page: 3,
            total_pages: 3,
            total_count: 50,
            has_next: false,
            has_previous: true,
        });
        assert_eq!(next_page(&last, 3, 1), None);
        assert_eq!(next_page(&None, 1, 1), None);
    }

    #[test]
    fn test_tasks_pick_toggle_and_pick_all() {
        let mut app = App::new(Config::default());
        app.tasks.rows = vec![
            OpsTask {
                id: 1,
                student_id: 10,
                student_nickname: "Wren".to_string(),
                student_groups: vec![],
                student_status: String::new(),
                student_progress: 0,
                visit_count: 0,
                source: String::new(),
                status: "pending".to_string(),
                notes: String::new(),
                created_at: String::new(),
            },
            OpsTask {
                id: 2,
                student_id: 11,
                student_nickname: "Ivo".to_string(),
                student_groups: vec![],
                student_status: String::new(),
                student_progress: 0,
                visit_count: 0,
                source: String::new(),
                status: "pending".to_string(),
                notes: String::new(),
                created_at: String::new(),
            },
        ];
        app.tasks_toggle_pick();
        assert!(app.tasks.picked.contains(&1));
        app.tasks_toggle_pick();
        assert!(app.tasks.picked.is_empty());

        app.tasks_toggle_pick_all();
        assert_eq!(app.tasks.picked.len(), 2);
        app.tasks_toggle_pick_all();
        assert!(app.tasks.picked.is_empty());
    }

    #[test]
    fn test_move_cursor_wraps_on_students_pane() {
        let mut app = App::new(Config::default());
        app.students.rows = vec![
            StudentSummary {
                id: 1,
                student_id: "U1".to_string(),
                student_name: "Wren".to_string(),
                alias_name: String::new(),
                groups: vec![],
                status: String::new(),
                learning_progress: 0,
                total_study_time: 0.0,
                research_note: String::new(),
                ops_note: String::new(),
                created_at: String::new(),
            },
            StudentSummary {
                id: 2,
                student_id: "U2".to_string(),
                student_name: "Ivo".to_string(),
                alias_name: String::new(),
                groups: vec![],
                status: String::new(),
                learning_progress: 0,
                total_study_time: 0.0,
                research_note: String::new(),
                ops_note: String::new(),
                created_at: String::new(),
            },
        ];
        app.move_cursor(-1);
        assert_eq!(app.students.selected, 1);
        app.move_cursor(1);
        assert_eq!(app.students.selected, 0);
    }

    #[test]
    fn test_assignment_cycle_teacher() {
        let mut app = App::new(Config::default());
        app.assignment.teachers = vec![
            TeacherRef {
                id: 7,
                name: "Ms. Lin".to_string(),
            },
            TeacherRef {
                id: 9,
                name: "Mr. Okafor".to_string(),
            },
        ];
        app.assignment_cycle_teacher();
        assert_eq!(app.assignment.draft.teacher.as_ref().unwrap().id, 7);
        app.assignment_cycle_teacher();
        assert_eq!(app.assignment.draft.teacher.as_ref().unwrap().id, 9);
        app.assignment_cycle_teacher();
        assert_eq!(app.assignment.draft.teacher.as_ref().unwrap().id, 7);
    }

    #[test]
    fn test_open_form_requires_selection_for_batch_kinds() {
        let now = Instant::now();
        let mut app = App::new(Config::default());
        app.open_form(FormKind::TaskStatus, now);
        assert!(matches!(app.overlay, Overlay::None));

        app.tasks.picked.insert(1);
        app.open_form(FormKind::TaskStatus, now);
        assert!(matches!(app.overlay, Overlay::Form { .. }));
        assert_eq!(app.mode, Mode::Input);
    }

    #[test]
    fn test_edit_student_form_prefills_from_row() {
        let mut app = App::new(Config::default());
        app.students.rows = vec![StudentSummary {
            id: 4,
            student_id: "U100".to_string(),
            student_name: "Wren".to_string(),
            alias_name: "W".to_string(),
            groups: vec!["piano".to_string(), "grade-2".to_string()],
            status: "active".to_string(),
            learning_progress: 6,
            total_study_time: 14.5,
            research_note: String::new(),
            ops_note: String::new(),
            created_at: String::new(),
        }];
        let form = app.build_form(&FormKind::EditStudent { id: 4 });
        assert_eq!(form.value("student_name"), Some("Wren"));
        assert_eq!(form.value("groups"), Some("piano, grade-2"));
        assert_eq!(form.value("external_user_id"), Some("U100"));
    }
}
