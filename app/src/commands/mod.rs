//! Frontend commands
//!
//! Each command takes plain arguments and answers with a
//! [`CommandResult`] the UI can render without further error handling.

pub mod auth;
pub mod calls;
pub mod diagnostics;
pub mod lists;

use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Command envelope sent by the frontend, one JSON object per line
#[derive(Debug, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    FrontendReady,
    GetSessionState,
    SignIn {
        email: String,
        password: String,
        #[serde(default = "remember_by_default")]
        remember: bool,
    },
    SignUp {
        email: String,
        password: String,
    },
    SignOut,
    SetRememberDevice {
        value: bool,
    },
    GetLeads,
    GetTasks,
    CallLead {
        #[serde(default)]
        phone: Option<String>,
    },
}

fn remember_by_default() -> bool {
    true
}

fn to_json<T: Serialize>(result: CommandResult<T>) -> serde_json::Value {
    serde_json::to_value(result).unwrap_or_else(|e| {
        serde_json::json!({ "success": false, "data": null, "error": e.to_string() })
    })
}

/// Run one request against the application state
pub async fn dispatch(state: &AppState, request: Request) -> serde_json::Value {
    match request {
        Request::FrontendReady => to_json(diagnostics::frontend_ready()),
        Request::GetSessionState => to_json(auth::get_session_state(state)),
        Request::SignIn {
            email,
            password,
            remember,
        } => to_json(auth::sign_in(state, email, password, remember).await),
        Request::SignUp { email, password } => to_json(auth::sign_up(state, email, password).await),
        Request::SignOut => to_json(auth::sign_out(state).await),
        Request::SetRememberDevice { value } => to_json(auth::set_remember_device(state, value)),
        Request::GetLeads => to_json(lists::get_leads(state).await),
        Request::GetTasks => to_json(lists::get_tasks(state).await),
        Request::CallLead { phone } => to_json(calls::call_lead(state, phone)),
    }
}

/// Parse and run one line of input
pub async fn dispatch_line(state: &AppState, line: &str) -> serde_json::Value {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(state, request).await,
        Err(e) => to_json(CommandResult::<()>::err(format!("Invalid command: {}", e))),
    }
}
