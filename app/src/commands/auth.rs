use serde::{Deserialize, Serialize};

use super::CommandResult;
use crate::state::AppState;
use leadline_core::{Crm, SessionState};

/// Session snapshot for the frontend; never carries tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    pub phase: String,
    pub loading: bool,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub has_config: bool,
    pub remember_device: bool,
}

impl SessionInfo {
    fn collect(crm: &Crm, state: &SessionState) -> Self {
        let user = state.session.as_ref().map(|session| &session.user);
        Self {
            phase: crm.session_manager().phase().as_str().to_string(),
            loading: state.loading,
            user_id: user.map(|u| u.id.clone()),
            email: user.and_then(|u| u.email.clone()),
            has_config: crm.has_config(),
            remember_device: crm.auth().remember_device(),
        }
    }
}

pub fn get_session_state(state: &AppState) -> CommandResult<SessionInfo> {
    match state.crm() {
        Ok(crm) => CommandResult::ok(SessionInfo::collect(&crm, &crm.session_state())),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Result of a sign-in or sign-up attempt
///
/// A rejected attempt is still a successful command; the UI shows `message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthOutcome {
    pub accepted: bool,
    pub message: Option<String>,
}

impl From<Option<String>> for AuthOutcome {
    fn from(message: Option<String>) -> Self {
        Self {
            accepted: message.is_none(),
            message,
        }
    }
}

pub async fn sign_in(
    state: &AppState,
    email: String,
    password: String,
    remember: bool,
) -> CommandResult<AuthOutcome> {
    let crm = match state.crm() {
        Ok(crm) => crm,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let outcome = crm.auth().sign_in(&email, &password, remember).await;
    CommandResult::ok(outcome.into())
}

pub async fn sign_up(state: &AppState, email: String, password: String) -> CommandResult<AuthOutcome> {
    let crm = match state.crm() {
        Ok(crm) => crm,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let outcome = crm.auth().sign_up(&email, &password).await;
    CommandResult::ok(outcome.into())
}

pub async fn sign_out(state: &AppState) -> CommandResult<AuthOutcome> {
    let crm = match state.crm() {
        Ok(crm) => crm,
        Err(e) => return CommandResult::err(e.to_string()),
    };
    let outcome = crm.auth().sign_out().await;
    CommandResult::ok(outcome.into())
}

pub fn set_remember_device(state: &AppState, value: bool) -> CommandResult<bool> {
    match state.crm() {
        Ok(crm) => {
            crm.auth().set_remember_device(value);
            CommandResult::ok(crm.auth().remember_device())
        }
        Err(e) => CommandResult::err(e.to_string()),
    }
}
