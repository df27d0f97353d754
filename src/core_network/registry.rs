use crate::session::{Session, SessionId};
use log::debug;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Live control sessions plus the peer address correlation used by passive data accepts.
///
/// The registry itself is not synchronized; the server keeps it behind a mutex and
/// every access goes through that lock.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Arc<Session>>,
    by_address: HashMap<IpAddr, SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session and points its peer IP at it. Returns the session the IP used to map to.
    pub fn register(&mut self, session: Arc<Session>) -> Option<SessionId> {
        let id = session.id();
        let ip = session.peer().ip();
        self.sessions.insert(id, session);
        let previous = self.by_address.insert(ip, id);
        if let Some(previous) = previous {
            debug!("Address {} moved from session {} to session {}", ip, previous, id);
        }
        previous
    }

    #[cfg(test)]
    pub fn get(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).cloned()
    }

    /// Session owning data connections that arrive from `ip`.
    pub fn correlate(&self, ip: IpAddr) -> Option<Arc<Session>> {
        self.by_address
            .get(&ip)
            .and_then(|id| self.sessions.get(id))
            .cloned()
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Arc<Session>> {
        let session = self.sessions.remove(&id)?;
        let ip = session.peer().ip();
        if self.by_address.get(&ip) == Some(&id) {
            self.by_address.remove(&ip);
        }
        Some(session)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Arc<Session>> {
        self.by_address.clear();
        self.sessions.drain().map(|(_, session)| session).collect()
    }
}
