pub mod config;
pub mod constants;
pub mod core_cli;
pub mod core_error;
pub mod core_ftpcommand;
pub mod core_log;
pub mod core_network;
pub mod helpers;
pub mod session;

pub use config::Config;
pub use core_error::FtpError;
pub use core_network::{Server, ShutdownHandle};
