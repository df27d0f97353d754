use log::debug;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// Binds a listening socket with address reuse and an explicit backlog.
pub fn bind_listener(address: &str, backlog: u32) -> io::Result<TcpListener> {
    let addr: SocketAddr = address.parse().map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid listen address {}: {}", address, e),
        )
    })?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_reuseaddr(true)?;
    socket.bind(addr)?;
    let listener = socket.listen(backlog)?;
    debug!("Listening on {} (backlog {})", listener.local_addr()?, backlog);
    Ok(listener)
}

/// Accepts on `listener`, or never resolves when there is none yet.
pub async fn accept_on(listener: Option<&TcpListener>) -> io::Result<(TcpStream, SocketAddr)> {
    match listener {
        Some(listener) => listener.accept().await,
        None => std::future::pending().await,
    }
}
