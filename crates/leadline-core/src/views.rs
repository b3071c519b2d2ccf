//! Lead and task lists
//!
//! Each view runs one fixed query and hands back the rows as received.
//! Nothing is cached between loads.

use chrono::{DateTime, Local, TimeZone};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

use leadline_backend::{Backend, QueryRequest, Session};

pub const MISSING_CONFIG_VIEW_MESSAGE: &str =
    "Missing backend configuration. Set SUPABASE_URL and SUPABASE_ANON_KEY.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub status: String,
    pub created_at: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl Lead {
    pub fn phone_label(&self) -> &str {
        self.phone.as_deref().unwrap_or("No phone number")
    }

    pub fn email_label(&self) -> &str {
        self.email.as_deref().unwrap_or("No email")
    }

    pub fn source_label(&self) -> &str {
        self.source.as_deref().unwrap_or("Unknown source")
    }

    pub fn created_label(&self) -> String {
        format_timestamp(&self.created_at)
    }
}

/// Lead embedded in a task row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRef {
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_at: Option<String>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub leads: Option<LeadRef>,
}

impl Task {
    pub fn lead_name(&self) -> &str {
        self.leads
            .as_ref()
            .map(|lead| lead.full_name.as_str())
            .unwrap_or("No linked lead")
    }

    pub fn due_label(&self) -> String {
        self.due_at
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "No due date".to_string())
    }
}

/// Newest leads first
pub fn leads_query(page_size: usize) -> QueryRequest {
    QueryRequest::table("leads")
        .select("id, full_name, phone, email, status, created_at, source")
        .order("created_at", false)
        .limit(page_size)
}

/// Earliest due tasks first, with the linked lead's name
pub fn tasks_query(page_size: usize) -> QueryRequest {
    QueryRequest::table("tasks")
        .select("id, title, due_at, done, leads(full_name)")
        .order("due_at", true)
        .limit(page_size)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    /// No session; the view shows the sign-in prompt and runs no query
    SignInRequired,
    Loaded(Vec<T>),
    Failed(String),
}

pub struct ListView<T> {
    backend: Arc<dyn Backend>,
    request: QueryRequest,
    _rows: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ListView<T> {
    pub fn new(backend: Arc<dyn Backend>, request: QueryRequest) -> Self {
        Self {
            backend,
            request,
            _rows: PhantomData,
        }
    }

    pub async fn load(&self, session: Option<&Session>) -> ViewState<T> {
        if !self.backend.is_configured() {
            return ViewState::Failed(MISSING_CONFIG_VIEW_MESSAGE.to_string());
        }
        if session.is_none() {
            return ViewState::SignInRequired;
        }

        let rows = match self.backend.select(&self.request).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!(table = %self.request.table, error = %e, "List query failed");
                return ViewState::Failed(e.user_message());
            }
        };

        let count = rows.len();
        match rows
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<T>, _>>()
        {
            Ok(items) => {
                tracing::debug!(table = %self.request.table, count, "Loaded rows");
                ViewState::Loaded(items)
            }
            Err(e) => {
                tracing::warn!(table = %self.request.table, error = %e, "Unexpected row shape");
                ViewState::Failed(format!("Unexpected data from server: {}", e))
            }
        }
    }
}

/// `YYYY-MM-DD HH:MM` in local time, or the raw value if it does not parse
pub fn format_timestamp(raw: &str) -> String {
    format_timestamp_in(raw, &Local)
}

fn format_timestamp_in<Tz>(raw: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
