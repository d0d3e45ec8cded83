//! HTTP client for the back-office API.
//!
//! One thin method per endpoint; every call goes through the shared
//! envelope check so application failures surface as [`ApiError::Rejected`]
//! with the server's own message.

use crate::api::models::{
    Ack, CompletedPage, Envelope, FeedbackDraft, HistoryTask, StudentDetail, StudentHit,
    StudentPage, TaskPage, TodayTask, VisitFilter, VisitPage,
};
use crate::config::Config;
use crate::cookies;
use reqwest::header::{COOKIE, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Header carrying the CSRF token on mutating requests.
const CSRF_HEADER: &str = "X-CSRFToken";

/// Failure taxonomy for backend calls.
///
/// Transport and status problems render as a generic network error;
/// application rejections carry the server message verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("network error: server returned {0}")]
    Status(StatusCode),
    #[error("network error: invalid response body")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Async client bound to one backend instance.
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    base_url: String,
    cookie: String,
    csrf_token: Option<String>,
}

impl AdminClient {
    /// Create a client from configuration.
    ///
    /// # Details
    /// The CSRF token is read once from the configured session cookie; GET
    /// requests send only the cookie, mutating requests also echo the token
    /// in the CSRF header.
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let csrf_token = cookies::cookie_value(&config.cookie, &config.csrf_cookie_name);
        if csrf_token.is_none() {
            tracing::warn!(
                cookie_name = %config.csrf_cookie_name,
                "csrf cookie not found; mutating requests will be rejected"
            );
        }
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cookie: config.cookie.clone(),
            csrf_token,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.get(&url).query(query);
        if !self.cookie.is_empty() {
            request = request.header(COOKIE, &self.cookie);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(body);
        if !self.cookie.is_empty() {
            request = request.header(COOKIE, &self.cookie);
        }
        if let Some(token) = &self.csrf_token {
            request = request.header(CSRF_HEADER, token);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Decode a response body as JSON.
    ///
    /// # Details
    /// The backend reports application failures as JSON envelopes on both
    /// 2xx and 4xx statuses, so the body is parsed regardless of status; the
    /// status code is the error only when the body is not a JSON envelope
    /// (proxy error pages, HTML 404s).
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        let url = response.url().to_string();
        let bytes = response.bytes().await?;
        match serde_json::from_slice(&bytes) {
            Ok(decoded) => Ok(decoded),
            Err(err) => {
                tracing::warn!(%url, %status, "undecodable response body");
                if status.is_success() {
                    Err(ApiError::Decode(err))
                } else {
                    Err(ApiError::Status(status))
                }
            }
        }
    }

    fn accept<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
        if envelope.success {
            Ok(envelope.body)
        } else {
            Err(ApiError::Rejected(envelope.failure_message()))
        }
    }

    /// Run a mutation and return the server's success message, if any.
    async fn mutate(&self, path: &str, body: &Value) -> Result<Option<String>, ApiError> {
        let envelope: Envelope<Ack> = self.post(path, body).await?;
        if envelope.success {
            Ok(envelope.message)
        } else {
            Err(ApiError::Rejected(envelope.failure_message()))
        }
    }

    // ── Roster ──

    /// Fetch a roster page, optionally filtered by status.
    pub async fn list_students(
        &self,
        page: u32,
        page_size: u32,
        search: &str,
        filter: Option<&str>,
    ) -> Result<StudentPage, ApiError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("page_size", page_size.to_string()),
            ("search", search.to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("filter", filter.to_string()));
        }
        let envelope: Envelope<StudentPage> =
            self.get("/operations/students/api/", &query).await?;
        Self::accept(envelope)
    }

    /// Fetch one student's full record.
    pub async fn student_detail(&self, id: i64) -> Result<StudentDetail, ApiError> {
        let envelope: Envelope<crate::api::models::StudentBody> = self
            .get(&format!("/operations/students/{}/", id), &[])
            .await?;
        Self::accept(envelope)?
            .student
            .ok_or_else(|| ApiError::Rejected("student missing from response".to_string()))
    }

    pub async fn create_student(&self, payload: &Value) -> Result<Option<String>, ApiError> {
        self.mutate("/operations/students/create/", payload).await
    }

    pub async fn update_student(
        &self,
        id: i64,
        payload: &Value,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(&format!("/operations/students/{}/update/", id), payload)
            .await
    }

    /// Attach an operations note to a student.
    pub async fn set_operation_note(
        &self,
        id: i64,
        note: &str,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            &format!("/operations/students/{}/note/", id),
            &json!({ "operation_note": note }),
        )
        .await
    }

    /// Fetch one student's record through the research quality endpoint.
    pub async fn research_student_detail(&self, id: i64) -> Result<StudentDetail, ApiError> {
        let envelope: Envelope<crate::api::models::StudentBody> = self
            .get(&format!("/research/quality/students/{}/", id), &[])
            .await?;
        Self::accept(envelope)?
            .student
            .ok_or_else(|| ApiError::Rejected("student missing from response".to_string()))
    }

    /// Save a research note from the detail drawer.
    pub async fn set_research_note(
        &self,
        id: i64,
        note: &str,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            &format!("/research/quality/students/{}/note/", id),
            &json!({ "note": note }),
        )
        .await
    }

    // ── Student search ──

    /// Search students for the teaching day list.
    pub async fn search_students(&self, query: &str) -> Result<Vec<StudentHit>, ApiError> {
        let params = [("q", query.to_string())];
        let envelope: Envelope<crate::api::models::StudentHits> =
            self.get("/teaching/students/search/", &params).await?;
        Self::accept(envelope).map(|body| body.students)
    }

    /// Search students for the assignment workflow (legacy endpoint without
    /// a success flag).
    pub async fn search_assignment_students(
        &self,
        query: &str,
    ) -> Result<Vec<StudentHit>, ApiError> {
        let params = [("q", query.to_string())];
        let envelope: Envelope<crate::api::models::StudentHits> =
            self.get("/research/students/search/", &params).await?;
        Self::accept(envelope).map(|body| body.students)
    }

    // ── Operations tasks ──

    /// Fetch an ops task page, optionally filtered by status and keyword.
    pub async fn list_ops_tasks(
        &self,
        page: u32,
        status: Option<&str>,
        search: &str,
    ) -> Result<TaskPage, ApiError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("search", search.to_string()),
        ];
        if let Some(status) = status {
            query.push(("status", status.to_string()));
        }
        let envelope: Envelope<TaskPage> = self.get("/operations/tasks/api/", &query).await?;
        Self::accept(envelope)
    }

    /// Update one task's status; batch updates call this once per id.
    pub async fn update_task_status(
        &self,
        task_id: i64,
        status: &str,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            &format!("/operations/tasks/{}/update/", task_id),
            &json!({ "status": status }),
        )
        .await
    }

    /// Create a manual ops task for a student.
    pub async fn add_manual_task(&self, student_id: i64) -> Result<Option<String>, ApiError> {
        self.mutate(
            "/operations/tasks/manual/",
            &json!({ "student_id": student_id }),
        )
        .await
    }

    // ── Visit records ──

    /// Fetch a visit-record page, optionally scoped to one student.
    pub async fn list_visits(
        &self,
        page: u32,
        filter: &VisitFilter,
        student_id: Option<i64>,
    ) -> Result<VisitPage, ApiError> {
        let mut query = vec![
            ("page", page.to_string()),
            ("search", filter.keyword.clone()),
        ];
        if let Some(status) = &filter.status {
            query.push(("status", status.clone()));
        }
        if let Some(student_id) = student_id {
            query.push(("student_id", student_id.to_string()));
        }
        let envelope: Envelope<VisitPage> = self.get("/operations/visits/", &query).await?;
        Self::accept(envelope)
    }

    pub async fn create_visit(&self, payload: &Value) -> Result<Option<String>, ApiError> {
        self.mutate("/operations/visits/create/", payload).await
    }

    // ── Teaching ──

    /// Fetch today's teaching day list.
    pub async fn today_tasks(&self) -> Result<Vec<TodayTask>, ApiError> {
        let envelope: Envelope<crate::api::models::TodayTasks> =
            self.get("/teaching/tasks/today/", &[]).await?;
        Self::accept(envelope).map(|body| body.tasks)
    }

    /// Add a student to today's day list.
    pub async fn add_today_task(&self, student_id: i64) -> Result<Option<String>, ApiError> {
        self.mutate("/teaching/tasks/add/", &json!({ "student_id": student_id }))
            .await
    }

    /// Remove students from today's day list.
    pub async fn delete_today_tasks(
        &self,
        student_ids: &[i64],
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            "/teaching/tasks/delete/",
            &json!({ "student_ids": student_ids }),
        )
        .await
    }

    /// Submit teacher feedback for one or more students.
    pub async fn submit_feedbacks(
        &self,
        feedbacks: &[FeedbackDraft],
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            "/teaching/feedback/submit/",
            &json!({ "feedbacks": feedbacks }),
        )
        .await
    }

    /// Fetch a page of completed feedback records.
    pub async fn completed_feedbacks(&self, page: u32) -> Result<CompletedPage, ApiError> {
        let query = [("page", page.to_string())];
        let envelope: Envelope<CompletedPage> =
            self.get("/teaching/feedback/completed/", &query).await?;
        Self::accept(envelope)
    }

    /// Push selected students to the research department with a note.
    pub async fn push_research(
        &self,
        student_ids: &[i64],
        note: &str,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            "/teaching/push/research/",
            &json!({ "student_ids": student_ids, "research_note": note }),
        )
        .await
    }

    /// Push selected students to the operations department with a note.
    pub async fn push_operation(
        &self,
        student_ids: &[i64],
        note: &str,
    ) -> Result<Option<String>, ApiError> {
        self.mutate(
            "/teaching/push/operation/",
            &json!({ "student_ids": student_ids, "operation_note": note }),
        )
        .await
    }

    // ── Assignment ──

    /// Create teaching task assignments for one teacher.
    pub async fn create_assignment(
        &self,
        teacher_id: i64,
        assignments: &[(i64, String)],
    ) -> Result<Option<String>, ApiError> {
        let rows: Vec<Value> = assignments
            .iter()
            .map(|(student_id, note)| json!({ "student_id": student_id, "task_note": note }))
            .collect();
        self.mutate(
            "/research/tasks/create/",
            &json!({ "teacher_id": teacher_id, "assignments": rows }),
        )
        .await
    }

    /// Fetch the raw assignment history rows.
    pub async fn task_history(&self) -> Result<Vec<HistoryTask>, ApiError> {
        let envelope: Envelope<crate::api::models::HistoryTasks> =
            self.get("/research/tasks/history/api/", &[]).await?;
        Self::accept(envelope).map(|body| body.tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_new_reads_csrf_token() {
        let config = Config {
            cookie: "sessionid=abc; csrftoken=tok123".to_string(),
            ..Config::default()
        };
        let client = AdminClient::new(&config).unwrap();
        assert_eq!(client.csrf_token.as_deref(), Some("tok123"));
    }

    #[test]
    fn test_client_new_without_session_cookie() {
        let client = AdminClient::new(&Config::default()).unwrap();
        assert!(client.csrf_token.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let config = Config {
            base_url: "http://127.0.0.1:8000/".to_string(),
            ..Config::default()
        };
        let client = AdminClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:8000");
    }

    #[test]
    fn test_rejected_error_carries_server_message() {
        let envelope: Envelope<Ack> =
            serde_json::from_str(r#"{"success": false, "message": "name taken"}"#).unwrap();
        let error = AdminClient::accept(envelope).unwrap_err();
        assert_eq!(error.to_string(), "name taken");
    }
}
