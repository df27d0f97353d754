use crate::config::{log_config, Config};
use crate::core_ftpcommand::handlers::{initialize_command_handlers, CommandTable};
use crate::core_network::control::run_session;
use crate::core_network::network::{accept_on, bind_listener};
use crate::core_network::pasv::DataListener;
use crate::core_network::pool::WorkerPool;
use crate::core_network::registry::SessionRegistry;
use crate::session::{DataChannel, DataMode, Session, SessionId};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;

/// State shared by the reactor and every session task.
pub struct ServerContext {
    pub config: Arc<Config>,
    pub registry: Mutex<SessionRegistry>,
    pub pool: WorkerPool,
    pub data_listener: DataListener,
    pub commands: CommandTable,
    /// Initial working directory of every session.
    pub startup_directory: String,
}

impl ServerContext {
    pub fn new(config: Config, startup_directory: String) -> Self {
        let settings = &config.server;
        Self {
            registry: Mutex::new(SessionRegistry::new()),
            pool: WorkerPool::new(settings.worker_threads),
            data_listener: DataListener::new(config.data_socket(), settings.listen_backlog),
            commands: initialize_command_handlers(),
            startup_directory,
            config: Arc::new(config),
        }
    }
}

/// Requests an orderly shutdown of a running [`Server`].
#[derive(Clone)]
pub struct ShutdownHandle(Arc<watch::Sender<bool>>);

impl ShutdownHandle {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

pub struct Server {
    control: TcpListener,
    context: Arc<ServerContext>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    /// Binds the control listener. Sessions start in the process working directory.
    pub fn bind(config: Config) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        Self::bind_in(config, &cwd)
    }

    /// Binds the control listener with `directory` as every session's initial working directory.
    pub fn bind_in(config: Config, directory: &Path) -> Result<Self> {
        config.validate()?;
        let settings = &config.server;
        let control = bind_listener(&config.control_socket(), settings.listen_backlog)
            .with_context(|| format!("Failed to bind control socket {}", config.control_socket()))?;

        let context = ServerContext::new(config, directory.to_string_lossy().into_owned());
        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            control,
            context: Arc::new(context),
            shutdown: Arc::new(shutdown),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.control.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    /// Runs the event loop until a shutdown is triggered.
    pub async fn run(self) -> Result<()> {
        info!("FTP server listening on {}", self.local_addr()?);
        log_config(&self.context.config);
        info!("Sessions start in {}", self.context.startup_directory);

        let mut shutdown = self.shutdown.subscribe();
        let mut sessions = JoinSet::new();

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                accepted = self.control.accept() => match accepted {
                    Ok((stream, peer)) => self.accept_control(stream, peer, &mut sessions).await,
                    Err(e) => error!("Failed to accept control connection: {}", e),
                },
                accepted = accept_on(self.context.data_listener.get()) => match accepted {
                    Ok((stream, peer)) => self.accept_data(stream, peer).await,
                    Err(e) => error!("Failed to accept data connection: {}", e),
                },
                _ = self.context.data_listener.created() => {
                    debug!("Data listener active, accepting passive connections");
                }
                Some(joined) = sessions.join_next(), if !sessions.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("Session task panicked: {}", e);
                        }
                    }
                }
            }
        }

        self.stop(sessions).await;
        Ok(())
    }

    async fn accept_control(&self, stream: TcpStream, peer: SocketAddr, sessions: &mut JoinSet<()>) {
        let id = SessionId::next();
        let (reader, writer) = stream.into_split();
        let session = Arc::new(Session::new(
            id,
            peer,
            self.context.startup_directory.clone(),
            Box::new(writer),
        ));
        let active = {
            let mut registry = self.context.registry.lock().await;
            registry.register(Arc::clone(&session));
            registry.len()
        };
        info!("Session {} connected from {} ({} active)", id, peer, active);

        if let Err(e) = session.reply(&self.context.config.server.banner).await {
            warn!("Failed to greet session {}: {}", id, e);
            self.context.registry.lock().await.remove(id);
            return;
        }

        sessions.spawn(run_session(
            session,
            reader,
            Arc::clone(&self.context),
            self.shutdown.subscribe(),
        ));
    }

    async fn accept_data(&self, stream: TcpStream, peer: SocketAddr) {
        let owner = self.context.registry.lock().await.correlate(peer.ip());
        match owner {
            Some(session) => {
                let channel = DataChannel::new(stream, peer, DataMode::Passive);
                if let Some(previous) = session.attach_data(channel).await {
                    debug!("Session {} replaced data connection {}", session.id(), previous.peer);
                    previous.close().await;
                }
                info!("Data connection from {} attached to session {}", peer, session.id());
            }
            None => {
                warn!("Dropping data connection from {}: no control session for that address", peer);
            }
        }
    }

    async fn stop(self, mut sessions: JoinSet<()>) {
        let Server { control, context, shutdown } = self;
        info!("Shutting down, {} sessions active", sessions.len());
        drop(control);
        shutdown.send_replace(true);
        context.pool.close();

        let grace = context.config.shutdown_grace();
        let drained = tokio::time::timeout(grace, async {
            while sessions.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("{} sessions still running after {:?}, aborting them", sessions.len(), grace);
            sessions.abort_all();
            while sessions.join_next().await.is_some() {}
        }

        let leftovers = context.registry.lock().await.drain();
        for session in leftovers {
            session.close_data().await;
            session.close_control().await;
        }
        info!("Server stopped");
    }
}
