use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

const DEFAULT_RESOURCE_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Ceiling for the admission wait on each fetch request.
    pub resource_timeout: Duration,
    pub browser: BrowserSettings,
}

#[derive(Clone)]
pub struct BrowserSettings {
    /// Chromium profile directory, reused across sessions.
    pub user_data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        // Load server configuration with defaults
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::Config(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::Config(format!("Invalid host address: {}", e)))?;

        let server_addr = SocketAddr::new(ip, port);

        let resource_timeout = parse_resource_timeout(env::var("RESOURCE_TIMEOUT").ok())?;

        let user_data_dir = env::var("BROWSER_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./data"));

        Ok(Config {
            server_addr,
            resource_timeout,
            browser: BrowserSettings { user_data_dir },
        })
    }
}

fn parse_resource_timeout(raw: Option<String>) -> Result<Duration> {
    let secs = match raw {
        Some(value) => value
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("Invalid RESOURCE_TIMEOUT: {}", e)))?,
        None => DEFAULT_RESOURCE_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}
