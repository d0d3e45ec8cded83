//! Debounced async search component.
//!
//! Drives the student search boxes on the teaching and assignment panes.
//! The component owns query editing, debounce timing, minimum-length gating
//! and a generation counter that guarantees responses are applied in
//! issuance order, never resolution order.

use std::time::{Duration, Instant};

/// Tuning for a search bar instance.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Minimum trimmed query length before a request is issued
    pub min_chars: usize,
    /// Idle period after the last edit before a search fires
    pub debounce: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_chars: 1,
            debounce: Duration::from_millis(300),
        }
    }
}

/// Contents of the result area, rendered as a pure function of this state.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchState<T> {
    /// No search active; the result area is hidden
    Idle,
    /// The newest generation is in flight
    Loading,
    /// Results for the newest generation (never constructed empty)
    Loaded(Vec<T>),
    /// The newest generation returned zero items
    Empty,
    /// The newest generation failed
    Failed,
}

/// A search request the caller must execute.
///
/// The generation must be handed back to [`SearchBar::apply`] together with
/// the outcome so stale responses can be discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIssue {
    /// Issuance counter value for this request
    pub generation: u64,
    /// Trimmed query text
    pub query: String,
}

/// Where an explicit (non-debounced) submit came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOrigin {
    /// Enter pressed in the input
    Enter,
    /// The pane's explicit search key
    Button,
}

/// Outcome of an explicit submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A request was issued; execute it and call `apply`
    Issued(SearchIssue),
    /// Button submit under the minimum length; prompt the user
    TooShort {
        /// Configured minimum the query fell below
        min: usize,
    },
    /// Query under the minimum length; results were cleared silently
    Cleared,
    /// The instance is destroyed or inert
    Ignored,
}

/// Debounced search bar bound to one pane.
///
/// # Details
/// Every edit restarts the debounce deadline. When the deadline elapses (see
/// [`SearchBar::tick`]) a request is issued unless the trimmed query is
/// shorter than `min_chars`, in which case the result area is cleared and no
/// request is made. Responses are applied through [`SearchBar::apply`] with
/// the generation returned at issuance; only the most recently issued
/// generation may render.
#[derive(Debug)]
pub struct SearchBar<T> {
    config: SearchConfig,
    query: String,
    deadline: Option<Instant>,
    issued: u64,
    state: SearchState<T>,
    destroyed: bool,
    /// Set once results have rendered; gates the too-short button prompt
    prompt_armed: bool,
}

impl<T> SearchBar<T> {
    /// Create a new search bar with the given tuning.
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config,
            query: String::new(),
            deadline: None,
            issued: 0,
            state: SearchState::Idle,
            destroyed: false,
            prompt_armed: false,
        }
    }

    /// Create an inert instance that accepts every call and never issues a
    /// request.
    ///
    /// # Details
    /// Used when a pane carries no search region, so shared key handling can
    /// stay unconditional instead of special-casing the missing widget.
    #[allow(dead_code)] // Constructor for panes that ship without a search region
    pub fn inert() -> Self {
        let mut bar = Self::new(SearchConfig::default());
        bar.destroyed = true;
        bar
    }

    /// Current query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Current result-area state.
    pub fn state(&self) -> &SearchState<T> {
        &self.state
    }

    /// Append a character to the query and restart the debounce deadline.
    pub fn push_char(&mut self, ch: char, now: Instant) {
        if self.destroyed {
            return;
        }
        self.query.push(ch);
        self.deadline = Some(now + self.config.debounce);
    }

    /// Remove the last character and restart the debounce deadline.
    pub fn pop_char(&mut self, now: Instant) {
        if self.destroyed {
            return;
        }
        self.query.pop();
        self.deadline = Some(now + self.config.debounce);
    }

    /// Clear the query and hide the result area.
    pub fn clear(&mut self) {
        self.query.clear();
        self.deadline = None;
        self.state = SearchState::Idle;
    }

    /// Advance the debounce timer.
    ///
    /// # Returns
    /// * `Option<SearchIssue>` - A request to execute, if the idle period
    ///   elapsed and the query passes the minimum-length gate
    ///
    /// # Details
    /// A query under `min_chars` at deadline expiry clears the result area
    /// and issues nothing.
    pub fn tick(&mut self, now: Instant) -> Option<SearchIssue> {
        if self.destroyed {
            return None;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.gate_and_issue()
            }
            _ => None,
        }
    }

    /// Issue an immediate search, bypassing the debounce timer.
    ///
    /// # Arguments
    /// * `origin` - Enter keypress or explicit button
    ///
    /// # Details
    /// Under the minimum length, Enter clears silently (matching debounce
    /// gating) while the button path reports `TooShort` so the caller can
    /// prompt, but only after the bar has rendered results at least once.
    pub fn submit(&mut self, origin: SubmitOrigin) -> SubmitOutcome {
        if self.destroyed {
            return SubmitOutcome::Ignored;
        }
        self.deadline = None;
        if self.query.trim().chars().count() < self.config.min_chars {
            self.state = SearchState::Idle;
            if origin == SubmitOrigin::Button && self.prompt_armed {
                return SubmitOutcome::TooShort {
                    min: self.config.min_chars,
                };
            }
            return SubmitOutcome::Cleared;
        }
        match self.issue() {
            Some(issue) => SubmitOutcome::Issued(issue),
            None => SubmitOutcome::Cleared,
        }
    }

    /// Apply the outcome of a previously issued request.
    ///
    /// # Arguments
    /// * `generation` - The generation returned at issuance
    /// * `result` - Items on success, any error on failure
    ///
    /// # Details
    /// Responses for anything but the most recently issued generation are
    /// discarded, so results always reflect issuance order regardless of the
    /// order responses resolve in.
    pub fn apply<E>(&mut self, generation: u64, result: Result<Vec<T>, E>) {
        if self.destroyed || generation != self.issued {
            return;
        }
        match result {
            Ok(items) if items.is_empty() => self.state = SearchState::Empty,
            Ok(items) => {
                self.state = SearchState::Loaded(items);
                self.prompt_armed = true;
            }
            Err(_) => self.state = SearchState::Failed,
        }
    }

    /// Tear the instance down; all further calls are ignored.
    pub fn destroy(&mut self) {
        self.destroyed = true;
        self.deadline = None;
        self.state = SearchState::Idle;
    }

    fn gate_and_issue(&mut self) -> Option<SearchIssue> {
        if self.query.trim().chars().count() < self.config.min_chars {
            self.state = SearchState::Idle;
            return None;
        }
        self.issue()
    }

    fn issue(&mut self) -> Option<SearchIssue> {
        self.issued += 1;
        self.state = SearchState::Loading;
        Some(SearchIssue {
            generation: self.issued,
            query: self.query.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(min_chars: usize) -> SearchBar<String> {
        SearchBar::new(SearchConfig {
            min_chars,
            debounce: Duration::from_millis(300),
        })
    }

    fn type_str(bar: &mut SearchBar<String>, text: &str, now: Instant) {
        for ch in text.chars() {
            bar.push_char(ch, now);
        }
    }

    #[test]
    fn test_short_query_never_issues() {
        let start = Instant::now();
        let mut bar = bar(2);
        type_str(&mut bar, "a", start);
        let issue = bar.tick(start + Duration::from_millis(400));
        assert!(issue.is_none());
        assert_eq!(*bar.state(), SearchState::Idle);
    }

    #[test]
    fn test_debounce_resets_on_each_edit() {
        // min_chars=2, debounce 300ms: "a", then "b" 100ms later, then 300ms
        // idle -> exactly one issue for "ab"
        let start = Instant::now();
        let mut bar = bar(2);
        bar.push_char('a', start);
        assert!(bar.tick(start + Duration::from_millis(100)).is_none());
        bar.push_char('b', start + Duration::from_millis(100));
        // Original deadline has passed but was reset by the second edit
        assert!(bar.tick(start + Duration::from_millis(350)).is_none());
        let issue = bar.tick(start + Duration::from_millis(400)).unwrap();
        assert_eq!(issue.query, "ab");
        assert_eq!(issue.generation, 1);
        // The deadline is consumed; no second issue fires
        assert!(bar.tick(start + Duration::from_millis(800)).is_none());
    }

    #[test]
    fn test_issuance_order_wins() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "al", start);
        let first = bar.tick(start + Duration::from_millis(300)).unwrap();
        type_str(&mut bar, "ice", start + Duration::from_millis(300));
        let second = bar.tick(start + Duration::from_millis(700)).unwrap();
        assert!(second.generation > first.generation);

        // The newer request resolves first and renders
        bar.apply::<()>(second.generation, Ok(vec!["alice".to_string()]));
        // The older response arrives late and must be discarded
        bar.apply::<()>(first.generation, Ok(vec!["albert".to_string()]));
        assert_eq!(
            *bar.state(),
            SearchState::Loaded(vec!["alice".to_string()])
        );
    }

    #[test]
    fn test_pending_issue_clears_stale_results() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "a", start);
        let first = bar.tick(start + Duration::from_millis(300)).unwrap();
        bar.apply::<()>(first.generation, Ok(vec!["a".to_string()]));
        bar.push_char('b', start + Duration::from_millis(400));
        bar.tick(start + Duration::from_millis(700)).unwrap();
        // A newer generation is in flight; the old rows are gone
        assert_eq!(*bar.state(), SearchState::Loading);
    }

    #[test]
    fn test_empty_results_render_empty_state() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "zz", start);
        let issue = bar.tick(start + Duration::from_millis(300)).unwrap();
        bar.apply::<()>(issue.generation, Ok(Vec::new()));
        assert_eq!(*bar.state(), SearchState::Empty);
    }

    #[test]
    fn test_error_renders_failed_state() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "ann", start);
        let first = bar.tick(start + Duration::from_millis(300)).unwrap();
        bar.apply::<()>(first.generation, Ok(vec!["ann".to_string()]));
        // Re-run the same query; this time the backend rejects it
        let second = match bar.submit(SubmitOrigin::Enter) {
            SubmitOutcome::Issued(issue) => issue,
            other => panic!("expected issue, got {:?}", other),
        };
        bar.apply(second.generation, Err("boom"));
        assert_eq!(*bar.state(), SearchState::Failed);
    }

    #[test]
    fn test_loaded_then_empty_replaces_rows() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "x", start);
        let first = bar.tick(start + Duration::from_millis(300)).unwrap();
        bar.apply::<()>(first.generation, Ok(vec!["X".to_string()]));
        assert_eq!(*bar.state(), SearchState::Loaded(vec!["X".to_string()]));

        let second = match bar.submit(SubmitOrigin::Enter) {
            SubmitOutcome::Issued(issue) => issue,
            other => panic!("expected issue, got {:?}", other),
        };
        bar.apply::<()>(second.generation, Ok(Vec::new()));
        assert_eq!(*bar.state(), SearchState::Empty);
    }

    #[test]
    fn test_destroy_stops_all_searches() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "abc", start);
        bar.destroy();
        assert!(bar.tick(start + Duration::from_millis(400)).is_none());
        bar.push_char('d', start + Duration::from_millis(500));
        assert!(bar.tick(start + Duration::from_millis(900)).is_none());
        assert_eq!(bar.submit(SubmitOrigin::Enter), SubmitOutcome::Ignored);
        // A late response for a pre-destroy generation is also ignored
        bar.apply::<()>(1, Ok(vec!["late".to_string()]));
        assert_eq!(*bar.state(), SearchState::Idle);
    }

    #[test]
    fn test_inert_instance_is_safe() {
        let mut bar: SearchBar<String> = SearchBar::inert();
        let now = Instant::now();
        bar.push_char('a', now);
        assert!(bar.tick(now + Duration::from_millis(400)).is_none());
        assert_eq!(bar.submit(SubmitOrigin::Button), SubmitOutcome::Ignored);
    }

    #[test]
    fn test_button_prompt_only_after_first_render() {
        let start = Instant::now();
        let mut bar = bar(2);
        bar.push_char('a', start);
        // No results have rendered yet: silent clear
        assert_eq!(bar.submit(SubmitOrigin::Button), SubmitOutcome::Cleared);

        bar.push_char('b', start);
        let issue = match bar.submit(SubmitOrigin::Button) {
            SubmitOutcome::Issued(issue) => issue,
            other => panic!("expected issue, got {:?}", other),
        };
        bar.apply::<()>(issue.generation, Ok(vec!["ab".to_string()]));

        bar.clear();
        bar.push_char('a', start);
        assert_eq!(
            bar.submit(SubmitOrigin::Button),
            SubmitOutcome::TooShort { min: 2 }
        );
        // Enter under the minimum stays silent either way
        assert_eq!(bar.submit(SubmitOrigin::Enter), SubmitOutcome::Cleared);
    }

    #[test]
    fn test_submit_cancels_pending_debounce() {
        let start = Instant::now();
        let mut bar = bar(1);
        type_str(&mut bar, "ab", start);
        let issue = match bar.submit(SubmitOrigin::Enter) {
            SubmitOutcome::Issued(issue) => issue,
            other => panic!("expected issue, got {:?}", other),
        };
        assert_eq!(issue.query, "ab");
        // The debounce deadline set by typing was consumed by the submit
        assert!(bar.tick(start + Duration::from_millis(400)).is_none());
    }
}
