use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
    #[error("{name} is out of range: {value}")]
    OutOfRange { name: &'static str, value: u64 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Artificial latency before the mock endpoint starts streaming.
    pub response_delay: Duration,
    /// Latency before a scripted chat session answers.
    pub typing_delay: Duration,
    pub word_delay: Duration,
    pub chat_rate_limit: usize,
    pub chat_rate_window_secs: u64,
    pub session_ttl: chrono::Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            response_delay: Duration::from_millis(1000),
            typing_delay: Duration::from_millis(1500),
            word_delay: Duration::from_millis(50),
            chat_rate_limit: 30,
            chat_rate_window_secs: 60,
            session_ttl: chrono::Duration::minutes(120),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => defaults.bind_addr.clone(),
        });

        let millis = |name: &'static str, fallback: Duration| -> Result<Duration, ConfigError> {
            Ok(match lookup(name) {
                Some(raw) => Duration::from_millis(parse_number(name, &raw)?),
                None => fallback,
            })
        };
        let number = |name: &'static str, fallback: u64| -> Result<u64, ConfigError> {
            let value = match lookup(name) {
                Some(raw) => parse_number(name, &raw)?,
                None => fallback,
            };
            if value == 0 {
                return Err(ConfigError::Zero { name });
            }
            Ok(value)
        };

        Ok(Self {
            bind_addr,
            response_delay: millis("CHAT_RESPONSE_DELAY_MS", defaults.response_delay)?,
            typing_delay: millis("CHAT_TYPING_DELAY_MS", defaults.typing_delay)?,
            word_delay: millis("STREAM_WORD_DELAY_MS", defaults.word_delay)?,
            chat_rate_limit: number("CHAT_RATE_LIMIT", defaults.chat_rate_limit as u64)? as usize,
            chat_rate_window_secs: number("CHAT_RATE_WINDOW_SECS", defaults.chat_rate_window_secs)?,
            session_ttl: ttl_minutes(number(
                "SESSION_TTL_MINUTES",
                defaults.session_ttl.num_minutes() as u64,
            )?)?,
        })
    }
}

fn ttl_minutes(value: u64) -> Result<chrono::Duration, ConfigError> {
    i64::try_from(value)
        .ok()
        .and_then(chrono::Duration::try_minutes)
        .ok_or(ConfigError::OutOfRange {
            name: "SESSION_TTL_MINUTES",
            value,
        })
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })
}
