// Verbs handled by the server, one module each
pub mod cwd;
pub mod list;
pub mod pass;
pub mod pwd;
pub mod quit;
pub mod rest;
pub mod retr;
pub mod size;
pub mod stor;
pub mod user;

// Fallback for unrecognized verbs
pub mod other;

pub mod ftpcommand;
pub mod handlers;

// The utils and common functions are here
pub mod utils;
