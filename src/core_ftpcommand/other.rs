use crate::constants::UNKNOWN_COMMAND_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};

pub async fn handle_other_command(ctx: CommandContext) -> CommandResult {
    ctx.reply(UNKNOWN_COMMAND_REPLY).await
}
