use crate::constants::SIZE_UNAVAILABLE_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use log::{debug, info};

/// Replies with the byte size of a regular file in the working directory, or `-1`.
pub async fn handle_size_command(ctx: CommandContext) -> CommandResult {
    let file_path = {
        let state = ctx.session.state.lock().await;
        state.resolve(&state.pending_argument)
    };

    match tokio::fs::symlink_metadata(&file_path).await {
        Ok(metadata) if metadata.is_file() => {
            info!("File size for {} is {}", file_path, metadata.len());
            ctx.reply(&metadata.len().to_string()).await
        }
        Ok(_) => {
            debug!("SIZE on {}: not a regular file", file_path);
            ctx.reply(SIZE_UNAVAILABLE_REPLY).await
        }
        Err(e) => {
            debug!("SIZE on {}: {}", file_path, e);
            ctx.reply(SIZE_UNAVAILABLE_REPLY).await
        }
    }
}
