use crate::constants::STOR_READY_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandFlow, CommandResult};
use crate::core_ftpcommand::utils::parse_stor_argument;
use crate::helpers::transfer_rate;
use log::{error, info, warn};
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Handles the STOR (Store File) FTP command.
///
/// The acknowledgment is the command's only reply. The argument carries the file name
/// after its last `/` and the declared byte count between `<` and `>`; the file is
/// created in the working directory and filled from the data connection until that
/// many bytes arrived or the peer closed. A malformed argument ends the command
/// silently.
///
/// # Arguments
///
/// * `ctx` - The session issuing the command and the shared server state.
///
/// # Returns
///
/// An error only when the acknowledgment cannot be sent.
pub async fn handle_stor_command(ctx: CommandContext) -> CommandResult {
    ctx.session.reply(STOR_READY_REPLY).await?;

    let arg = ctx.argument().await;
    let request = match parse_stor_argument(&arg) {
        Ok(request) => request,
        Err(e) => {
            warn!("Session {}: {}", ctx.session.id(), e);
            return Ok(CommandFlow::Continue);
        }
    };

    let file_path = ctx.session.state.lock().await.resolve(&request.filename);
    let mut file = match File::create(&file_path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to create file: {}, error: {}", file_path, e);
            return Ok(CommandFlow::Continue);
        }
    };

    if request.size == 0 {
        info!("Session {} stored empty file {}", ctx.session.id(), file_path);
        return Ok(CommandFlow::Continue);
    }

    let timeout = ctx.server.config.data_wait_timeout();
    let Some(mut channel) = ctx.session.wait_for_data(timeout).await else {
        warn!("STOR on session {} without a data connection, {} left empty", ctx.session.id(), file_path);
        return Ok(CommandFlow::Continue);
    };

    let mut buffer = vec![0; ctx.server.config.server.upload_buffer_size];
    let mut received: u64 = 0;
    let started = Instant::now();

    while received < request.size {
        let wanted = (request.size - received).min(buffer.len() as u64) as usize;
        let bytes_read = match channel.stream.read(&mut buffer[..wanted]).await {
            Ok(0) => {
                info!("Data peer {} closed after {} of {} bytes", channel.peer, received, request.size);
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!("Error reading from data stream: {}", e);
                break;
            }
        };
        if let Err(e) = file.write_all(&buffer[..bytes_read]).await {
            error!("Error writing to file {}: {}", file_path, e);
            break;
        }
        received += bytes_read as u64;
    }

    if let Err(e) = file.flush().await {
        error!("Error flushing file {}: {}", file_path, e);
    }
    drop(file);

    info!(
        "Session {} stored {} bytes into {} ({})",
        ctx.session.id(),
        received,
        file_path,
        transfer_rate(received, started.elapsed())
    );

    if received == request.size {
        ctx.session.restore_data(channel).await;
    } else {
        channel.close().await;
    }
    Ok(CommandFlow::Continue)
}
