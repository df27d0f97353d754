use chrono::{DateTime, Local};
use log::{debug, warn};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

/// Write side of a control connection.
pub type ControlWriter = Box<dyn AsyncWrite + Send + Unpin>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier of a control connection. Never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn next() -> Self {
        SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    Passive,
    Active,
}

/// An established data connection owned by exactly one session.
#[derive(Debug)]
pub struct DataChannel {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub mode: DataMode,
}

impl DataChannel {
    pub fn new(stream: TcpStream, peer: SocketAddr, mode: DataMode) -> Self {
        Self { stream, peer, mode }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!("Data connection to {} already closed: {}", self.peer, e);
        }
    }
}

/// Mutable per-session state that survives across command invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub working_directory: String,
    pub pending_argument: String,
    pub resume_offset: u64,
}

impl SessionState {
    pub fn new(working_directory: String) -> Self {
        Self {
            working_directory,
            pending_argument: String::new(),
            resume_offset: 0,
        }
    }

    /// Returns the armed resume offset and disarms it.
    pub fn take_resume_offset(&mut self) -> u64 {
        std::mem::take(&mut self.resume_offset)
    }

    /// `working_directory + "/" + name`, the way RETR, SIZE and STOR address files.
    pub fn resolve(&self, name: &str) -> String {
        format!("{}/{}", self.working_directory, name)
    }
}

pub struct Session {
    id: SessionId,
    peer: SocketAddr,
    connected_at: DateTime<Local>,
    pub state: Mutex<SessionState>,
    control: Mutex<Option<ControlWriter>>,
    data: Mutex<Option<DataChannel>>,
    data_attached: Notify,
}

impl Session {
    pub fn new(
        id: SessionId,
        peer: SocketAddr,
        working_directory: String,
        control: ControlWriter,
    ) -> Self {
        Self {
            id,
            peer,
            connected_at: Local::now(),
            state: Mutex::new(SessionState::new(working_directory)),
            control: Mutex::new(Some(control)),
            data: Mutex::new(None),
            data_attached: Notify::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn connected_at(&self) -> DateTime<Local> {
        self.connected_at
    }

    /// Sends one textual reply, CRLF terminated, over the control connection.
    pub async fn reply(&self, message: &str) -> io::Result<()> {
        let mut control = self.control.lock().await;
        let writer = control.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "control connection closed")
        })?;
        writer.write_all(message.as_bytes()).await?;
        writer.write_all(b"\r\n").await?;
        writer.flush().await
    }

    pub async fn close_control(&self) {
        if let Some(mut writer) = self.control.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!("Control connection of session {} already closed: {}", self.id, e);
            }
        }
    }

    /// Attaches a data channel, handing back the one it replaces.
    pub async fn attach_data(&self, channel: DataChannel) -> Option<DataChannel> {
        let previous = self.data.lock().await.replace(channel);
        self.data_attached.notify_one();
        previous
    }

    pub async fn take_data(&self) -> Option<DataChannel> {
        self.data.lock().await.take()
    }

    /// Takes the data channel, waiting up to `timeout` for a pending passive connection.
    pub async fn wait_for_data(&self, timeout: Duration) -> Option<DataChannel> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(channel) = self.take_data().await {
                return Some(channel);
            }
            if tokio::time::timeout_at(deadline, self.data_attached.notified())
                .await
                .is_err()
            {
                return self.take_data().await;
            }
        }
    }

    /// Puts a data channel back after a transfer. A channel attached meanwhile wins.
    pub async fn restore_data(&self, channel: DataChannel) {
        let mut slot = self.data.lock().await;
        if slot.is_none() {
            *slot = Some(channel);
        } else {
            warn!(
                "Session {} received a new data connection during a transfer, dropping {}",
                self.id, channel.peer
            );
            drop(slot);
            channel.close().await;
        }
    }

    pub async fn close_data(&self) -> bool {
        match self.take_data().await {
            Some(channel) => {
                channel.close().await;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub async fn has_data(&self) -> bool {
        self.data.lock().await.is_some()
    }
}
