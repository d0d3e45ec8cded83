//! UI components module.
//!
//! Contains ratatui widgets for displaying the application interface.

pub mod detail;
pub mod form;
pub mod list;
pub mod search;
pub mod tabs;

pub use detail::render_drawer;
pub use form::render_form;
pub use list::{render_assignment, render_students, render_tasks, render_teaching, render_visits};
pub use search::{render_filter_input, render_search_input, render_search_results, results_visible};
pub use tabs::render_tabs;
