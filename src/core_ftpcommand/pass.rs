use crate::constants::WELCOME_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use log::debug;

pub async fn handle_pass_command(ctx: CommandContext) -> CommandResult {
    debug!("Session {} sent a password", ctx.session.id());
    ctx.reply(WELCOME_REPLY).await
}
