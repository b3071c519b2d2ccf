use super::CommandResult;
use crate::state::AppState;
use leadline_core::{Dialer, SystemDialer};

pub fn call_lead(state: &AppState, phone: Option<String>) -> CommandResult<String> {
    call_with(state, phone, &SystemDialer)
}

fn call_with(state: &AppState, phone: Option<String>, dialer: &dyn Dialer) -> CommandResult<String> {
    let crm = match state.crm() {
        Ok(crm) => crm,
        Err(e) => return CommandResult::err(e.to_string()),
    };

    match crm.call(phone.as_deref(), dialer) {
        Ok(uri) => CommandResult::ok(uri),
        Err(e) => {
            tracing::warn!(error = %e, "Call not placed");
            let (title, message) = e.alert();
            CommandResult::err(format!("{}: {}", title, message))
        }
    }
}
