use crate::core_ftpcommand::handlers::{dispatch, CommandContext, CommandFlow};
use crate::core_network::reactor::ServerContext;
use crate::session::Session;
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

/// Frames control lines out of a byte stream. Partial lines are kept between reads.
pub struct LineReader<R> {
    reader: R,
    chunk: Vec<u8>,
    pending: Vec<u8>,
    max_line: usize,
    discarding: bool,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R, chunk_size: usize, max_line: usize) -> Self {
        Self {
            reader,
            chunk: vec![0; chunk_size],
            pending: Vec::new(),
            max_line,
            discarding: false,
        }
    }

    /// Next non-empty line without its terminator, or `None` once the peer closed.
    ///
    /// Cancel safe: bytes already read stay buffered for the next call.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                return Ok(Some(line));
            }
            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                if !self.pending.is_empty() {
                    debug!("Discarding {} unterminated bytes at end of stream", self.pending.len());
                }
                return Ok(None);
            }
            self.pending.extend_from_slice(&self.chunk[..n]);
            if self.pending.len() > self.max_line && !self.has_terminator() {
                warn!("Discarding overlong control line ({} bytes)", self.pending.len());
                self.pending.clear();
                self.discarding = true;
            }
        }
    }

    fn has_terminator(&self) -> bool {
        self.pending.iter().any(|b| *b == b'\r' || *b == b'\n')
    }

    fn take_line(&mut self) -> Option<String> {
        loop {
            let end = self.pending.iter().position(|b| *b == b'\r' || *b == b'\n')?;
            let mut line: Vec<u8> = self.pending.drain(..=end).collect();
            line.pop();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            if !line.is_empty() {
                return Some(String::from_utf8_lossy(&line).into_owned());
            }
        }
    }
}

/// Serves one control connection until the peer leaves, QUIT, or shutdown.
pub async fn run_session<R>(
    session: Arc<Session>,
    reader: R,
    server: Arc<ServerContext>,
    mut shutdown: watch::Receiver<bool>,
) where
    R: AsyncRead + Unpin,
{
    let settings = &server.config.server;
    let mut lines = LineReader::new(reader, settings.control_buffer_size, settings.max_command_length);

    loop {
        if *shutdown.borrow() {
            break;
        }
        let line = tokio::select! {
            _ = shutdown.changed() => {
                info!("Closing session {} for shutdown", session.id());
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("Session {} closed by peer {}", session.id(), session.peer());
                break;
            }
            Err(e) => {
                warn!("Read error on session {}: {}", session.id(), e);
                break;
            }
        };

        let ctx = CommandContext::new(Arc::clone(&session), Arc::clone(&server));
        match server.pool.execute(dispatch(ctx, line)).await {
            Ok(Ok(CommandFlow::Continue)) => {}
            Ok(Ok(CommandFlow::Close)) => break,
            Ok(Err(e)) if e.is_disconnect() => {
                info!("Session {} lost its control connection: {}", session.id(), e);
                break;
            }
            Ok(Err(e)) => warn!("Command failed on session {}: {}", session.id(), e),
            Err(e) => {
                warn!("Session {} cannot run commands: {}", session.id(), e);
                break;
            }
        }
    }

    teardown(&session, &server).await;
}

async fn teardown(session: &Session, server: &ServerContext) {
    server.registry.lock().await.remove(session.id());
    session.close_data().await;
    session.close_control().await;
    let lifetime = chrono::Local::now() - session.connected_at();
    info!(
        "Session {} from {} ended after {}s",
        session.id(),
        session.peer(),
        lifetime.num_seconds()
    );
}
