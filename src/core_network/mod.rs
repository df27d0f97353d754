pub mod control;
pub mod network;
pub mod pasv;
pub mod pool;
pub mod port;
pub mod reactor;
pub mod registry;
pub mod transfer;

#[cfg(test)]
mod test_session;

pub use reactor::{Server, ServerContext, ShutdownHandle};
