use crate::constants::WELCOME_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use log::info;

/// Any user name is accepted.
pub async fn handle_user_command(ctx: CommandContext) -> CommandResult {
    let username = ctx.argument().await;
    info!("Session {} identifies as {:?}", ctx.session.id(), username);
    ctx.reply(WELCOME_REPLY).await
}
