use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use crate::core_ftpcommand::utils::parse_rest_offset;
use log::debug;

/// Arms the resume offset consumed by the next RETR.
pub async fn handle_rest_command(ctx: CommandContext) -> CommandResult {
    let arg = {
        let mut state = ctx.session.state.lock().await;
        state.resume_offset = parse_rest_offset(&state.pending_argument);
        debug!("Session {} resume offset set to {}", ctx.session.id(), state.resume_offset);
        state.pending_argument.clone()
    };
    ctx.reply(&format!(
        "350 Restarting at <{}>. Send STORE or RETRIEVE to initiate transfer.",
        arg
    ))
    .await
}
