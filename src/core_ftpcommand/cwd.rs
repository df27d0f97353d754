use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use log::{info, warn};

/// Changes the working directory to the argument, taken verbatim, if it names a directory.
pub async fn handle_cwd_command(ctx: CommandContext) -> CommandResult {
    let new_dir = ctx.argument().await;
    let is_dir = tokio::fs::symlink_metadata(&new_dir)
        .await
        .map(|metadata| metadata.is_dir())
        .unwrap_or(false);

    let response = {
        let mut state = ctx.session.state.lock().await;
        if is_dir {
            state.working_directory = new_dir.clone();
            info!("Session {} changed directory to {}", ctx.session.id(), new_dir);
            format!("change workdir success workdir is {}", new_dir)
        } else {
            warn!("Session {} cannot change directory to {:?}", ctx.session.id(), new_dir);
            format!("change work dir error, current workdir is {}", state.working_directory)
        }
    };
    ctx.reply(&response).await
}
