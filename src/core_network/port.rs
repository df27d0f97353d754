use crate::constants::{PORT_CONNECT_FAILED_REPLY, PORT_INVALID_REPLY, PORT_SUCCESS_REPLY};
use crate::core_error::FtpError;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use crate::session::{DataChannel, DataMode};
use log::{error, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::TcpStream;

/// Parses `h1,h2,h3,h4,p1,p2` into the address the client listens on.
pub fn parse_port_argument(arg: &str) -> Result<SocketAddr, FtpError> {
    let invalid = || FtpError::InvalidPortArgument(arg.to_string());

    let parts: Vec<&str> = arg.trim().split(',').collect();
    if parts.len() != 6 {
        return Err(invalid());
    }
    let mut fields = [0u8; 6];
    for (field, part) in fields.iter_mut().zip(&parts) {
        *field = part.trim().parse().map_err(|_| invalid())?;
    }

    let ip = Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]);
    let port = u16::from(fields[4]) << 8 | u16::from(fields[5]);
    Ok(SocketAddr::from((ip, port)))
}

pub async fn connect_active(addr: SocketAddr) -> std::io::Result<TcpStream> {
    TcpStream::connect(addr).await
}

/// Handles the PORT (active mode) command. A failed connect leaves the session untouched.
pub async fn handle_port_command(ctx: CommandContext) -> CommandResult {
    let arg = ctx.argument().await;
    let addr = match parse_port_argument(&arg) {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Session {}: {}", ctx.session.id(), e);
            return ctx.reply(PORT_INVALID_REPLY).await;
        }
    };

    info!("Session {} connecting to {} for active mode", ctx.session.id(), addr);
    match connect_active(addr).await {
        Ok(stream) => {
            let channel = DataChannel::new(stream, addr, DataMode::Active);
            if let Some(previous) = ctx.session.attach_data(channel).await {
                previous.close().await;
            }
            ctx.reply(PORT_SUCCESS_REPLY).await
        }
        Err(e) => {
            error!("Failed to connect to client {}: {}", addr, e);
            ctx.reply(PORT_CONNECT_FAILED_REPLY).await
        }
    }
}
