//! Service configuration from command-line flags and environment variables.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::client::LifecycleSettings;

pub const DEFAULT_PORT: u16 = 5555;

/// Flags handed to the headless browser that drives the web messaging client.
pub const BROWSER_ARGS: [&str; 8] = [
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-accelerated-2d-canvas",
    "--no-first-run",
    "--no-zygote",
    "--disable-gpu",
    "--disable-software-rasterizer",
];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Browser launch options carried by client factories.
pub struct BrowserOptions {
    pub headless: bool,
    pub args: Vec<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            args: BROWSER_ARGS.iter().map(|arg| (*arg).to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "wadispatch",
    about = "HTTP gateway that sends messages to Indonesian phone numbers through a web messaging client",
    version
)]
pub struct AppConfig {
    #[arg(
        long,
        env = "PORT",
        default_value_t = DEFAULT_PORT,
        help = "Port the HTTP server listens on"
    )]
    pub port: u16,

    #[arg(
        long = "server-url",
        env = "SERVER_URL",
        help = "Public base URL of this server; when set, <url>/ping is requested periodically to keep the host awake"
    )]
    pub server_url: Option<Url>,

    #[arg(
        long = "api-key",
        env = "X_API_KEY",
        hide_env_values = true,
        help = "API key for clients (accepted but not enforced yet)"
    )]
    pub api_key: Option<String>,

    #[arg(
        long = "log-level",
        env = "LOG_LEVEL",
        default_value = "info",
        help = "Log filter directive, e.g. `info` or `wadispatch=debug`"
    )]
    pub log_level: String,

    #[arg(
        long = "log-dir",
        env = "LOG_DIR",
        default_value = "logs",
        help = "Directory receiving the JSON log file"
    )]
    pub log_dir: PathBuf,

    #[arg(
        long = "send-timeout-secs",
        env = "SEND_TIMEOUT_SECS",
        default_value_t = 15,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds a request waits for the messaging client to accept a message"
    )]
    pub send_timeout_secs: u64,

    #[arg(
        long = "reconnect-delay-secs",
        env = "RECONNECT_DELAY_SECS",
        default_value_t = 3,
        help = "Seconds between tearing down a disconnected client and initializing its replacement"
    )]
    pub reconnect_delay_secs: u64,

    #[arg(
        long = "presence-interval-secs",
        env = "PRESENCE_INTERVAL_SECS",
        default_value_t = 120,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between presence announcements while the client is ready"
    )]
    pub presence_interval_secs: u64,

    #[arg(
        long = "keepalive-interval-secs",
        env = "KEEPALIVE_INTERVAL_SECS",
        default_value_t = 240,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between keep-alive pings to --server-url"
    )]
    pub keepalive_interval_secs: u64,

    #[arg(skip)]
    pub browser: BrowserOptions,
}

impl AppConfig {
    /// Load `.env` (if present) into the environment, then parse flags and variables.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.keepalive_interval_secs)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            presence_interval: Duration::from_secs(self.presence_interval_secs),
        }
    }
}
