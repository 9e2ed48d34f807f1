use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use crate::error::{AppError, Result};

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: SocketAddr,
    /// Root of the `/static` mount. Downloaded images land in `<static_dir>/images`.
    pub static_dir: PathBuf,
    /// Absolute base used for returned image URLs. Falls back to the request's Host header.
    pub public_base_url: Option<String>,
    pub openai_api_base: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "5000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let static_dir = env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());
        if static_dir.trim().is_empty() {
            return Err(AppError::ConfigError("STATIC_DIR must not be empty".to_string()));
        }

        let public_base_url = match env::var("PUBLIC_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Some(url.trim_end_matches('/').to_string()),
            Ok(_) | Err(env::VarError::NotPresent) => None,
            Err(e) => return Err(e.into()),
        };

        let openai_api_base = env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            static_dir: PathBuf::from(static_dir),
            public_base_url,
            openai_api_base,
        })
    }
}
