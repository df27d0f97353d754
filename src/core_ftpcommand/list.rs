use crate::constants::LIST_FAILED_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use log::{debug, warn};
use std::io;

/// Lists the argument, or the working directory when there is none, on the control channel.
///
/// A directory yields every entry name (`.` and `..` included) followed by a tab, in
/// the order the filesystem returns them. Anything else yields `name<TAB>size`.
pub async fn handle_list_command(ctx: CommandContext) -> CommandResult {
    let arg = ctx.argument().await;
    let target = if arg.is_empty() {
        ctx.working_directory().await
    } else {
        arg
    };

    match list_target(&target).await {
        Ok(listing) => ctx.reply(&listing).await,
        Err(e) => {
            warn!("LIST on {:?} failed: {}", target, e);
            ctx.reply(LIST_FAILED_REPLY).await
        }
    }
}

async fn list_target(target: &str) -> io::Result<String> {
    let metadata = tokio::fs::symlink_metadata(target).await?;
    if !metadata.is_dir() {
        return Ok(format!("{}\t{}", target, metadata.len()));
    }

    let mut listing = String::from(".\t..\t");
    let mut entries = tokio::fs::read_dir(target).await?;
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await? {
        listing.push_str(&entry.file_name().to_string_lossy());
        listing.push('\t');
        count += 1;
    }
    debug!("Listed {} entries in {}", count, target);
    Ok(listing)
}
