use anyhow::{bail, Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv4Addr;
use std::time::Duration;

use crate::constants::{DEFAULT_BANNER, DEFAULT_CONTROL_PORT, DEFAULT_DATA_PORT};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
    pub control_port: u16,
    pub data_port: u16,
    pub pasv_address: String, // Address octets advertised in the PASV reply
    pub worker_threads: usize,
    pub listen_backlog: u32,
    pub control_buffer_size: usize,
    pub max_command_length: usize,
    pub upload_buffer_size: usize,
    pub data_wait_timeout_ms: u64,
    pub shutdown_grace_secs: u64,
    pub banner: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: String::from("127.0.0.1"),
            control_port: DEFAULT_CONTROL_PORT,
            data_port: DEFAULT_DATA_PORT,
            pasv_address: String::from("127.0.0.1"),
            worker_threads: 6,
            listen_backlog: 10,
            control_buffer_size: 1024,
            max_command_length: 4096,
            upload_buffer_size: 1024,
            data_wait_timeout_ms: 2000,
            shutdown_grace_secs: 5,
            banner: String::from(DEFAULT_BANNER),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        let config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse configuration file: {}", path))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let server = &self.server;
        if server.worker_threads == 0 {
            bail!("worker_threads must be greater than 0");
        }
        if server.control_buffer_size == 0 || server.upload_buffer_size == 0 {
            bail!("buffer sizes must be greater than 0");
        }
        if server.max_command_length < server.control_buffer_size {
            bail!("max_command_length must be at least control_buffer_size");
        }
        self.pasv_ip()?;
        Ok(())
    }

    /// IPv4 address whose octets are announced by PASV.
    pub fn pasv_ip(&self) -> Result<Ipv4Addr> {
        self.server
            .pasv_address
            .parse()
            .with_context(|| format!("pasv_address is not an IPv4 address: {}", self.server.pasv_address))
    }

    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.server.listen_address, self.server.control_port)
    }

    pub fn data_socket(&self) -> String {
        format!("{}:{}", self.server.listen_address, self.server.data_port)
    }

    pub fn data_wait_timeout(&self) -> Duration {
        Duration::from_millis(self.server.data_wait_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_grace_secs)
    }
}

pub fn log_config(config: &Config) {
    info!("  Control Socket: {}", config.control_socket());
    info!("  Data Socket: {}", config.data_socket());
    info!("  PASV Address: {}", config.server.pasv_address);
    info!("  Worker Threads: {}", config.server.worker_threads);
    info!("  Control Buffer Size: {} bytes", config.server.control_buffer_size);
    info!("  Upload Buffer Size: {} bytes", config.server.upload_buffer_size);
}
