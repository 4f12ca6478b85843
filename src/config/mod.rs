use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    /// Applied to every outbound call: page fetch, favicon check and oEmbed fetch.
    pub fetch_timeout: Duration,
    pub max_body_bytes: usize,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Config {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: parse_or("SERVER_PORT", env::var("SERVER_PORT").ok(), 3000),
            fetch_timeout: Duration::from_secs(parse_or(
                "FETCH_TIMEOUT_SECS",
                env::var("FETCH_TIMEOUT_SECS").ok(),
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            max_body_bytes: parse_or(
                "MAX_BODY_BYTES",
                env::var("MAX_BODY_BYTES").ok(),
                DEFAULT_MAX_BODY_BYTES,
            ),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
    }
}
