//! Tab pane controller.
//!
//! Single-selection visibility over a set of panes, with a per-pane load
//! state machine so the first activation (and retry after a failed load)
//! can trigger exactly one fetch.

use std::collections::HashMap;
use std::hash::Hash;

/// Load lifecycle of a pane's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaneState {
    /// Never activated; no data fetched yet
    NotLoaded,
    /// A load is in flight
    Loading,
    /// Data arrived; re-activation does not refetch
    Loaded,
    /// The load failed; re-activation retries
    Failed,
}

/// Outcome of activating a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation<K> {
    /// The pane that is now active
    pub pane: K,
    /// Whether the caller must run the pane's loader
    pub needs_load: bool,
}

/// Mutually-exclusive pane controller with lazy first-activation loads.
///
/// # Details
/// Keyboard activation (Enter/Space on the focused header) and direct
/// activation (number key) both go through [`TabController::activate`], so
/// the two input paths cannot diverge.
#[derive(Debug)]
pub struct TabController<K: Copy + Eq + Hash> {
    order: Vec<K>,
    active: K,
    focused: K,
    states: HashMap<K, PaneState>,
}

impl<K: Copy + Eq + Hash> TabController<K> {
    /// Create a controller over `panes`, with the first pane active.
    ///
    /// # Panics
    /// Panics if `panes` is empty.
    pub fn new(panes: &[K]) -> Self {
        let states = panes.iter().map(|k| (*k, PaneState::NotLoaded)).collect();
        Self {
            order: panes.to_vec(),
            active: panes[0],
            focused: panes[0],
            states,
        }
    }

    /// Currently active pane.
    pub fn active(&self) -> K {
        self.active
    }

    /// Pane with keyboard focus on the header strip.
    pub fn focused(&self) -> K {
        self.focused
    }

    /// Panes in display order.
    pub fn panes(&self) -> &[K] {
        &self.order
    }

    /// Load state of a pane.
    pub fn state(&self, pane: K) -> PaneState {
        self.states
            .get(&pane)
            .copied()
            .unwrap_or(PaneState::NotLoaded)
    }

    /// Move header focus to the next pane, wrapping.
    pub fn focus_next(&mut self) {
        self.focused = self.neighbor(self.focused, 1);
    }

    /// Move header focus to the previous pane, wrapping.
    pub fn focus_prev(&mut self) {
        self.focused = self.neighbor(self.focused, -1);
    }

    /// Activate a pane, deactivating all others.
    ///
    /// # Returns
    /// * `Activation<K>` - `needs_load` is true on the pane's first
    ///   activation and after a failed load; in both cases the pane is moved
    ///   to `Loading` and the caller must run the loader exactly once
    pub fn activate(&mut self, pane: K) -> Activation<K> {
        self.active = pane;
        self.focused = pane;
        let needs_load = matches!(
            self.state(pane),
            PaneState::NotLoaded | PaneState::Failed
        );
        if needs_load {
            self.states.insert(pane, PaneState::Loading);
        }
        Activation { pane, needs_load }
    }

    /// Activate the pane under header focus (keyboard path).
    pub fn activate_focused(&mut self) -> Activation<K> {
        self.activate(self.focused)
    }

    /// Move a pane to `Loading` for an explicit refetch.
    pub fn begin_reload(&mut self, pane: K) {
        self.states.insert(pane, PaneState::Loading);
    }

    /// Record that a pane's load completed.
    pub fn mark_loaded(&mut self, pane: K) {
        self.states.insert(pane, PaneState::Loaded);
    }

    /// Record that a pane's load failed.
    pub fn mark_failed(&mut self, pane: K) {
        self.states.insert(pane, PaneState::Failed);
    }

    fn neighbor(&self, from: K, step: isize) -> K {
        let len = self.order.len() as isize;
        let idx = self
            .order
            .iter()
            .position(|k| *k == from)
            .unwrap_or(0) as isize;
        let next = (idx + step).rem_euclid(len) as usize;
        self.order[next]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Pane {
        A,
        B,
        C,
    }

    const PANES: [Pane; 3] = [Pane::A, Pane::B, Pane::C];

    #[test]
    fn test_first_activation_loads_once() {
        let mut tabs = TabController::new(&PANES);
        let first = tabs.activate(Pane::B);
        assert!(first.needs_load);
        assert_eq!(tabs.state(Pane::B), PaneState::Loading);
        tabs.mark_loaded(Pane::B);

        tabs.activate(Pane::A);
        let again = tabs.activate(Pane::B);
        assert!(!again.needs_load);
        assert_eq!(tabs.state(Pane::B), PaneState::Loaded);
    }

    #[test]
    fn test_failed_load_retries_on_reactivation() {
        let mut tabs = TabController::new(&PANES);
        assert!(tabs.activate(Pane::C).needs_load);
        tabs.mark_failed(Pane::C);

        tabs.activate(Pane::A);
        let retry = tabs.activate(Pane::C);
        assert!(retry.needs_load);
        assert_eq!(tabs.state(Pane::C), PaneState::Loading);
    }

    #[test]
    fn test_keyboard_and_direct_activation_match() {
        let mut direct = TabController::new(&PANES);
        let mut keyed = TabController::new(&PANES);

        let a = direct.activate(Pane::B);
        keyed.focus_next();
        let b = keyed.activate_focused();
        assert_eq!(a, b);
        assert_eq!(direct.active(), keyed.active());
    }

    #[test]
    fn test_focus_wraps() {
        let mut tabs = TabController::new(&PANES);
        tabs.focus_prev();
        assert_eq!(tabs.focused(), Pane::C);
        tabs.focus_next();
        assert_eq!(tabs.focused(), Pane::A);
    }

    #[test]
    fn test_single_active_pane() {
        let mut tabs = TabController::new(&PANES);
        tabs.activate(Pane::B);
        tabs.activate(Pane::C);
        assert_eq!(tabs.active(), Pane::C);
    }
}
