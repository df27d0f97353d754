use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};

pub async fn handle_pwd_command(ctx: CommandContext) -> CommandResult {
    let current_dir = ctx.working_directory().await;
    ctx.reply(&format!("current workdir is {}", current_dir)).await
}
