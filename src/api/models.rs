//! Backend JSON models and the response envelope convention.
//!
//! Every backend response is a `{success, ...}` envelope; success payloads
//! carry their records under a domain key (`data`, `students`, `tasks`, ...)
//! and failures carry `message` (preferred) or `error`. One legacy search
//! endpoint omits the `success` flag entirely; an absent flag on a 200
//! response counts as success.

use serde::{Deserialize, Deserializer, Serialize};

fn default_true() -> bool {
    true
}

/// The `{success, message|error}` wrapper around every response body.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(flatten)]
    pub body: T,
}

impl<T> Envelope<T> {
    /// The server's failure text: `message`, then `error`, then a generic
    /// fallback.
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "request rejected by server".to_string())
    }
}

/// Page cursor metadata attached to list responses.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

/// Roster counters shown above the student list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Stats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub paused: u64,
}

/// One roster row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StudentSummary {
    pub id: i64,
    #[serde(default, alias = "external_user_id")]
    pub student_id: String,
    #[serde(default, alias = "name")]
    pub student_name: String,
    #[serde(default, alias = "nickname")]
    pub alias_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "current_progress")]
    pub learning_progress: u32,
    #[serde(default)]
    pub total_study_time: f64,
    #[serde(default, alias = "research_notes")]
    #[allow(dead_code)] // Part of the roster payload; notes render from the detail fetch
    pub research_note: String,
    #[serde(default, alias = "operation_notes", alias = "operation_note")]
    pub ops_note: String,
    #[serde(default)]
    #[allow(dead_code)] // Part of API response structure
    pub created_at: String,
}

/// A student search result row.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StudentHit {
    pub id: i64,
    #[serde(default)]
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub alias_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// One entry of a student's progress list: either plain text or a key/value
/// map, depending on how the record was captured.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ProgressEntry {
    Text(String),
    Fields(serde_json::Map<String, serde_json::Value>),
}

impl ProgressEntry {
    /// Flatten the entry to display text; an empty map becomes "[empty]".
    pub fn display(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Fields(map) if map.is_empty() => "[empty]".to_string(),
            Self::Fields(map) => map
                .iter()
                .map(|(key, value)| match value {
                    serde_json::Value::String(s) => format!("{}: {}", key, s),
                    other => format!("{}: {}", key, other),
                })
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// One feedback row nested in a student detail.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct FeedbackEntry {
    #[serde(default)]
    pub feedback_time: String,
    #[serde(default)]
    pub lesson_progress: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_comment: String,
}

/// A student's full record as shown in the detail drawer.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StudentDetail {
    pub id: i64,
    #[serde(default, alias = "external_user_id")]
    pub student_id: String,
    #[serde(default, alias = "name")]
    pub student_name: String,
    #[serde(default, alias = "nickname")]
    pub alias_name: String,
    #[serde(default)]
    pub groups: Vec<String>,
    #[serde(default)]
    pub progress: Vec<ProgressEntry>,
    #[serde(default)]
    pub status: String,
    #[serde(default, alias = "total_study_time")]
    pub learning_hours: f64,
    #[serde(default, alias = "research_notes")]
    pub research_note: String,
    #[serde(default, alias = "operation_notes", alias = "operation_note")]
    pub ops_note: String,
    #[serde(default)]
    pub feedback_comments: Vec<String>,
    #[serde(default)]
    pub recent_feedbacks: Vec<FeedbackEntry>,
    #[serde(default)]
    pub visit_notes: Vec<String>,
    #[serde(default)]
    pub assigned_teacher_name: Option<String>,
}

/// One operations task board row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpsTask {
    pub id: i64,
    #[serde(default)]
    pub student_id: i64,
    #[serde(default)]
    pub student_nickname: String,
    #[serde(default)]
    pub student_groups: Vec<String>,
    #[serde(default)]
    #[allow(dead_code)] // Part of API response structure
    pub student_status: String,
    #[serde(default)]
    #[allow(dead_code)] // Part of API response structure
    pub student_progress: u32,
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: String,
}

/// One row of the teaching day list.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TodayTask {
    pub student_id: i64,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub student_groups: Vec<String>,
    #[serde(default)]
    pub is_difficult: bool,
    #[serde(default)]
    pub research_note: String,
    #[serde(default)]
    pub ops_note: String,
}

/// One visit record row.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct VisitRecord {
    pub id: i64,
    #[serde(default)]
    pub student_id: i64,
    #[serde(default)]
    pub student_nickname: String,
    #[serde(default)]
    pub visit_time: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub visit_count: u32,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub notes: String,
}

/// Progress as it appears on completed feedback rows: a list of lesson
/// markers or a single preformatted string.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ProgressText {
    List(Vec<String>),
    Text(String),
}

impl Default for ProgressText {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl ProgressText {
    pub fn display(&self) -> String {
        match self {
            Self::List(items) => items.join(", "),
            Self::Text(text) => text.clone(),
        }
    }
}

/// One completed feedback row.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct CompletedFeedback {
    #[serde(default)]
    pub reply_time: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default)]
    pub progress: ProgressText,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default)]
    pub teacher_comment: String,
    #[serde(default)]
    #[allow(dead_code)] // Part of API response structure
    pub push_research: String,
    #[serde(default)]
    #[allow(dead_code)] // Part of API response structure
    pub push_ops: String,
}

/// One assignment-history row; ids arrive as numbers or strings depending
/// on the endpoint revision, so both are normalized to strings.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HistoryTask {
    #[serde(default, deserialize_with = "id_string")]
    pub teacher_id: String,
    #[serde(default)]
    pub teacher_name: String,
    #[serde(default, deserialize_with = "id_string")]
    pub student_id: String,
    #[serde(default)]
    pub student_name: String,
    #[serde(default, deserialize_with = "null_string")]
    pub task_note: String,
}

fn null_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(i64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => n.to_string(),
        Some(Raw::Text(s)) => s,
        None => String::new(),
    })
}

/// One feedback line in a batch submission.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FeedbackDraft {
    pub student_id: i64,
    pub lesson_progress: String,
    pub teacher_comment: String,
}

/// Filter state for visit-record fetches; the detail drawer keeps its own
/// copy so page changes re-use the last status/keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitFilter {
    pub status: Option<String>,
    pub keyword: String,
}

// ── Response bodies (flattened into Envelope) ──

/// Roster page: records plus pagination and stats.
#[derive(Debug, Default, Deserialize)]
pub struct StudentPage {
    #[serde(default)]
    pub data: Vec<StudentSummary>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
    #[serde(default)]
    pub stats: Option<Stats>,
}

/// Ops task page.
#[derive(Debug, Default, Deserialize)]
pub struct TaskPage {
    #[serde(default)]
    pub data: Vec<OpsTask>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Visit record page.
#[derive(Debug, Default, Deserialize)]
pub struct VisitPage {
    #[serde(default)]
    pub data: Vec<VisitRecord>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

/// Search results under the `students` key.
#[derive(Debug, Default, Deserialize)]
pub struct StudentHits {
    #[serde(default)]
    pub students: Vec<StudentHit>,
}

/// Detail response under the `student` key; optional so failure envelopes
/// without the key still decode.
#[derive(Debug, Default, Deserialize)]
pub struct StudentBody {
    #[serde(default)]
    pub student: Option<StudentDetail>,
}

/// Day list under the `tasks` key.
#[derive(Debug, Default, Deserialize)]
pub struct TodayTasks {
    #[serde(default)]
    pub tasks: Vec<TodayTask>,
}

/// Completed feedback page; this endpoint predates the nested pagination
/// object and returns flat page fields.
#[derive(Debug, Default, Deserialize)]
pub struct CompletedPage {
    #[serde(default)]
    pub feedbacks: Vec<CompletedFeedback>,
    #[serde(default)]
    pub current_page: u32,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
}

impl CompletedPage {
    /// Normalize the flat page fields to the shared pagination shape.
    pub fn pagination(&self) -> Pagination {
        Pagination {
            current_page: self.current_page,
            total_pages: self.total_pages,
            total_count: 0,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Assignment history under the `tasks` key.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryTasks {
    #[serde(default)]
    pub tasks: Vec<HistoryTask>,
}

/// Body of a bare acknowledgment; the interesting part (`message`) lives on
/// the envelope.
#[derive(Debug, Default, Deserialize)]
pub struct Ack {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_prefers_message_over_error() {
        let raw = r#"{"success": false, "message": "name taken", "error": "e"}"#;
        let envelope: Envelope<Ack> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.failure_message(), "name taken");

        let raw = r#"{"success": false, "error": "boom"}"#;
        let envelope: Envelope<Ack> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.failure_message(), "boom");

        let raw = r#"{"success": false}"#;
        let envelope: Envelope<Ack> = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.failure_message(), "request rejected by server");
    }

    #[test]
    fn test_missing_success_flag_counts_as_success() {
        // The legacy assignment search endpoint returns a bare student list
        let raw = r#"{"students": [{"id": 3, "student_id": "S1", "student_name": "Wren", "groups": ["piano"]}]}"#;
        let envelope: Envelope<StudentHits> = serde_json::from_str(raw).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.body.students.len(), 1);
        assert_eq!(envelope.body.students[0].student_name, "Wren");
    }

    #[test]
    fn test_student_page_decodes_pagination_and_stats() {
        let raw = r#"{
            "success": true,
            "data": [{
                "id": 1,
                "external_user_id": "U100",
                "student_name": "Wren",
                "alias_name": "W",
                "groups": ["piano", "grade-2"],
                "learning_progress": 6,
                "total_study_time": 14.5,
                "status": "active",
                "research_note": "",
                "ops_note": "call back",
                "created_at": "2026-08-01 10:00"
            }],
            "pagination": {
                "current_page": 2,
                "total_pages": 7,
                "total_count": 134,
                "has_next": true,
                "has_previous": true
            },
            "stats": {"total": 134, "active": 120, "paused": 14}
        }"#;
        let envelope: Envelope<StudentPage> = serde_json::from_str(raw).unwrap();
        let page = envelope.body;
        assert_eq!(page.data[0].student_id, "U100");
        assert_eq!(page.data[0].ops_note, "call back");
        let pagination = page.pagination.unwrap();
        assert_eq!(pagination.current_page, 2);
        assert!(pagination.has_previous);
        assert_eq!(page.stats.unwrap().paused, 14);
    }

    #[test]
    fn test_progress_entry_untagged_variants() {
        let raw = r#"["6.1", {"lesson": "6.2", "grade": 4}, {}]"#;
        let entries: Vec<ProgressEntry> = serde_json::from_str(raw).unwrap();
        assert_eq!(entries[0].display(), "6.1");
        assert_eq!(entries[1].display(), "grade: 4, lesson: 6.2");
        assert_eq!(entries[2].display(), "[empty]");
    }

    #[test]
    fn test_completed_feedback_progress_forms() {
        let raw = r#"{"progress": ["6.1", "6.2"], "student_name": "Wren"}"#;
        let row: CompletedFeedback = serde_json::from_str(raw).unwrap();
        assert_eq!(row.progress.display(), "6.1, 6.2");

        let raw = r#"{"progress": "6.1", "student_name": "Wren"}"#;
        let row: CompletedFeedback = serde_json::from_str(raw).unwrap();
        assert_eq!(row.progress.display(), "6.1");
    }

    #[test]
    fn test_history_task_ids_normalize_to_strings() {
        let raw = r#"{"teacher_id": 7, "teacher_name": "Ms. Lin", "student_id": "U100", "student_name": "Wren", "task_note": null}"#;
        let task: HistoryTask = serde_json::from_str(raw).unwrap();
        assert_eq!(task.teacher_id, "7");
        assert_eq!(task.student_id, "U100");
    }

    #[test]
    fn test_completed_page_pagination_bridge() {
        let raw = r#"{"success": true, "feedbacks": [], "current_page": 3, "total_pages": 5, "has_next": true, "has_previous": true}"#;
        let envelope: Envelope<CompletedPage> = serde_json::from_str(raw).unwrap();
        let pagination = envelope.body.pagination();
        assert_eq!(pagination.current_page, 3);
        assert!(pagination.has_next);
    }

    #[test]
    fn test_failure_envelope_decodes_without_student_key() {
        let raw = r#"{"success": false, "message": "student not found"}"#;
        let envelope: Envelope<StudentBody> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.success);
        assert!(envelope.body.student.is_none());
        assert_eq!(envelope.failure_message(), "student not found");
    }

    #[test]
    fn test_student_detail_aliases_and_defaults() {
        let raw = r#"{
            "id": 3,
            "name": "Wren",
            "nickname": "W",
            "progress": ["6.1"],
            "total_study_time": 12.0,
            "operation_notes": "call back"
        }"#;
        let detail: StudentDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.student_name, "Wren");
        assert_eq!(detail.alias_name, "W");
        assert_eq!(detail.learning_hours, 12.0);
        assert_eq!(detail.ops_note, "call back");
        assert!(detail.feedback_comments.is_empty());
        assert!(detail.visit_notes.is_empty());
    }
}
