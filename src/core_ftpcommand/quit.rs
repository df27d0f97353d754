use crate::constants::QUIT_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandFlow, CommandResult};
use log::info;

/// Says goodbye, then drops the data channel. The session loop closes the control side.
pub async fn handle_quit_command(ctx: CommandContext) -> CommandResult {
    ctx.session.reply(QUIT_REPLY).await?;
    if ctx.session.close_data().await {
        info!("Session {} closed its data connection on QUIT", ctx.session.id());
    }
    Ok(CommandFlow::Close)
}
