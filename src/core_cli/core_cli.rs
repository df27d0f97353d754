use clap::Parser;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tinyftpd", about = "A minimal FTP server with passive and active data channels.")]
pub struct Cli {
    /// Path to the configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Control connection port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Passive data connection port
    #[arg(short, long)]
    pub data_port: Option<u16>,

    /// Number of concurrently executing commands
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Enable verbose mode
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut crate::config::Config) {
        if let Some(port) = self.port {
            config.server.control_port = port;
        }
        if let Some(data_port) = self.data_port {
            config.server.data_port = data_port;
        }
        if let Some(workers) = self.workers {
            config.server.worker_threads = workers;
        }
    }
}
