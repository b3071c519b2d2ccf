use serde::{Deserialize, Serialize};

use super::CommandResult;
use crate::state::AppState;
use leadline_core::{Lead, Task, ViewState};

/// Lead row with display fallbacks applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadInfo {
    pub id: String,
    pub full_name: String,
    pub status: String,
    pub phone: Option<String>,
    pub phone_label: String,
    pub email_label: String,
    pub source_label: String,
    pub created_label: String,
}

impl From<Lead> for LeadInfo {
    fn from(lead: Lead) -> Self {
        Self {
            phone_label: lead.phone_label().to_string(),
            email_label: lead.email_label().to_string(),
            source_label: lead.source_label().to_string(),
            created_label: lead.created_label(),
            id: lead.id,
            full_name: lead.full_name,
            status: lead.status,
            phone: lead.phone,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub lead_name: String,
    pub due_label: String,
}

impl From<Task> for TaskInfo {
    fn from(task: Task) -> Self {
        Self {
            lead_name: task.lead_name().to_string(),
            due_label: task.due_label(),
            id: task.id,
            title: task.title,
            done: task.done,
        }
    }
}

fn present<T, U: From<T>>(view: ViewState<T>) -> ViewState<U> {
    match view {
        ViewState::SignInRequired => ViewState::SignInRequired,
        ViewState::Loaded(rows) => ViewState::Loaded(rows.into_iter().map(U::from).collect()),
        ViewState::Failed(message) => ViewState::Failed(message),
    }
}

pub async fn get_leads(state: &AppState) -> CommandResult<ViewState<LeadInfo>> {
    match state.crm() {
        Ok(crm) => CommandResult::ok(present(crm.leads().await)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn get_tasks(state: &AppState) -> CommandResult<ViewState<TaskInfo>> {
    match state.crm() {
        Ok(crm) => CommandResult::ok(present(crm.tasks().await)),
        Err(e) => CommandResult::err(e.to_string()),
    }
}
