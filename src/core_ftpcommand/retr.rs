use crate::constants::{
    RETR_NO_DATA_REPLY, RETR_OPEN_FAILED_REPLY, RETR_READY_REPLY, RETR_STAT_FAILED_REPLY,
};
use crate::core_ftpcommand::handlers::{CommandContext, CommandFlow, CommandResult};
use crate::core_network::transfer::send_file;
use crate::helpers::transfer_rate;
use log::{info, warn};
use std::time::Instant;

/// Handles the RETR (Retrieve) FTP command.
///
/// Sends `working_directory/argument` over the session's data connection, starting at
/// the offset armed by a previous REST. The offset is consumed by every RETR, whether
/// or not the transfer happens.
///
/// # Arguments
///
/// * `ctx` - The session issuing the command and the shared server state.
///
/// # Returns
///
/// An error only when the control connection can no longer be written to.
pub async fn handle_retr_command(ctx: CommandContext) -> CommandResult {
    let (file_path, offset) = {
        let mut state = ctx.session.state.lock().await;
        let file_path = state.resolve(&state.pending_argument);
        (file_path, state.take_resume_offset())
    };

    let metadata = match tokio::fs::metadata(&file_path).await {
        Ok(metadata) if !metadata.is_dir() => metadata,
        Ok(_) => {
            warn!("RETR on directory {}", file_path);
            return ctx.reply(RETR_STAT_FAILED_REPLY).await;
        }
        Err(e) => {
            warn!("RETR cannot stat {}: {}", file_path, e);
            return ctx.reply(RETR_STAT_FAILED_REPLY).await;
        }
    };

    let file = match tokio::fs::File::open(&file_path).await {
        Ok(file) => file.into_std().await,
        Err(e) => {
            warn!("RETR cannot open {}: {}", file_path, e);
            return ctx.reply(RETR_OPEN_FAILED_REPLY).await;
        }
    };

    let timeout = ctx.server.config.data_wait_timeout();
    let Some(mut channel) = ctx.session.wait_for_data(timeout).await else {
        warn!("RETR on session {} without a data connection", ctx.session.id());
        return ctx.reply(RETR_NO_DATA_REPLY).await;
    };

    ctx.session.reply(RETR_READY_REPLY).await?;

    let length = metadata.len().saturating_sub(offset);
    let started = Instant::now();
    match send_file(&mut channel.stream, file, offset, length).await {
        Ok(sent) => {
            info!(
                "Session {} sent {} bytes of {} from offset {} ({})",
                ctx.session.id(),
                sent,
                file_path,
                offset,
                transfer_rate(sent, started.elapsed())
            );
            ctx.session.restore_data(channel).await;
        }
        Err(e) => {
            warn!("RETR of {} to {} failed: {}", file_path, channel.peer, e);
            channel.close().await;
        }
    }

    Ok(CommandFlow::Continue)
}
