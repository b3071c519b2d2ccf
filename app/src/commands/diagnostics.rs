use super::CommandResult;

pub fn frontend_ready() -> CommandResult<()> {
    tracing::info!("Frontend ready");
    CommandResult::ok(())
}
