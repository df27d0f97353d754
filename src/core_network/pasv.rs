use crate::constants::PASV_FAILED_REPLY;
use crate::core_ftpcommand::handlers::{CommandContext, CommandResult};
use crate::core_network::network::bind_listener;
use log::{debug, error, info};
use std::io;
use std::net::Ipv4Addr;
use tokio::net::TcpListener;
use tokio::sync::{Notify, OnceCell};

/// The shared passive-mode listener. Bound by the first PASV and reused afterwards.
pub struct DataListener {
    address: String,
    backlog: u32,
    listener: OnceCell<TcpListener>,
    created: Notify,
}

impl DataListener {
    pub fn new(address: String, backlog: u32) -> Self {
        Self {
            address,
            backlog,
            listener: OnceCell::new(),
            created: Notify::new(),
        }
    }

    /// Binds the listener on first use. Waiters on [`created`](Self::created) are woken
    /// only once the listener is visible through [`get`](Self::get).
    pub async fn get_or_init(&self) -> io::Result<&TcpListener> {
        let was_bound = self.listener.initialized();
        let listener = self
            .listener
            .get_or_try_init(|| async {
                let listener = bind_listener(&self.address, self.backlog)?;
                info!("Data listener bound on {}", listener.local_addr()?);
                Ok::<_, io::Error>(listener)
            })
            .await?;
        if !was_bound {
            self.created.notify_one();
        }
        Ok(listener)
    }

    pub fn get(&self) -> Option<&TcpListener> {
        self.listener.get()
    }

    /// Resolves once the listener has been bound.
    pub async fn created(&self) {
        self.created.notified().await
    }
}

/// `(o1,o2,o3,o4,p1,p2)` with `port = p1 * 256 + p2`.
pub fn encode_pasv_reply(ip: Ipv4Addr, port: u16) -> String {
    let [o1, o2, o3, o4] = ip.octets();
    format!("({},{},{},{},{},{})", o1, o2, o3, o4, port / 256, port % 256)
}

pub async fn handle_pasv_command(ctx: CommandContext) -> CommandResult {
    let ip = match ctx.server.config.pasv_ip() {
        Ok(ip) => ip,
        Err(e) => {
            error!("Cannot announce passive address: {:#}", e);
            return ctx.reply(PASV_FAILED_REPLY).await;
        }
    };

    let port = match ctx.server.data_listener.get_or_init().await {
        Ok(listener) => listener.local_addr().map(|addr| addr.port()),
        Err(e) => Err(e),
    };

    match port {
        Ok(port) => {
            let response = encode_pasv_reply(ip, port);
            debug!("Session {} entering passive mode: {}", ctx.session.id(), response);
            ctx.reply(&response).await
        }
        Err(e) => {
            error!("Failed to create data listener: {}", e);
            ctx.reply(PASV_FAILED_REPLY).await
        }
    }
}
