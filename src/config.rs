//! Configuration types.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::channels::UserId;
use crate::error::ConfigError;

/// User id the CLI channel gives its local user, who also acts as operator.
pub const CLI_LOCAL_USER: UserId = UserId(1);

/// Which transport the bot talks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Telegram,
    Cli,
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "telegram" => Ok(Self::Telegram),
            "cli" => Ok(Self::Cli),
            other => Err(format!("expected 'telegram' or 'cli', got '{other}'")),
        }
    }
}

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub channel: ChannelKind,
    /// Bot API token. Only present for the Telegram channel.
    pub bot_token: Option<SecretString>,
    /// Receives submission notifications and may press accept/reject.
    pub operator_id: UserId,
    /// Directory holding the record collections.
    pub data_dir: PathBuf,
    /// Long-poll timeout passed to getUpdates.
    pub poll_timeout: Duration,
    /// Timeout for every HTTP request; must exceed the poll timeout.
    pub request_timeout: Duration,
    /// How many requests "My requests" lists.
    pub recent_requests: usize,
    /// Rolling log file directory, if file logging is wanted.
    pub log_dir: Option<PathBuf>,
}

impl BotConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, which maps a variable name to
    /// its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let channel = parse_or("TAXI_CHANNEL", get("TAXI_CHANNEL"), ChannelKind::Telegram)?;

        let bot_token = match channel {
            ChannelKind::Telegram => Some(SecretString::from(
                get("TAXI_BOT_TOKEN")
                    .ok_or_else(|| ConfigError::MissingEnvVar("TAXI_BOT_TOKEN".into()))?,
            )),
            ChannelKind::Cli => None,
        };

        let operator_id = match (channel, get("TAXI_OPERATOR_ID")) {
            (_, Some(raw)) => UserId(parse_value("TAXI_OPERATOR_ID", &raw)?),
            (ChannelKind::Cli, None) => CLI_LOCAL_USER,
            (ChannelKind::Telegram, None) => {
                return Err(ConfigError::MissingEnvVar("TAXI_OPERATOR_ID".into()));
            }
        };

        let data_dir = get("TAXI_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let poll_secs: u64 = parse_or("TAXI_POLL_TIMEOUT_SECS", get("TAXI_POLL_TIMEOUT_SECS"), 30)?;
        let request_secs: u64 = parse_or(
            "TAXI_REQUEST_TIMEOUT_SECS",
            get("TAXI_REQUEST_TIMEOUT_SECS"),
            40,
        )?;
        if request_secs <= poll_secs {
            return Err(ConfigError::InvalidValue {
                key: "TAXI_REQUEST_TIMEOUT_SECS".into(),
                message: format!(
                    "must exceed TAXI_POLL_TIMEOUT_SECS ({request_secs} <= {poll_secs})"
                ),
            });
        }

        let recent_requests: usize =
            parse_or("TAXI_RECENT_REQUESTS", get("TAXI_RECENT_REQUESTS"), 5)?;
        if recent_requests == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TAXI_RECENT_REQUESTS".into(),
                message: "must be at least 1".into(),
            });
        }

        Ok(Self {
            channel,
            bot_token,
            operator_id,
            data_dir,
            poll_timeout: Duration::from_secs(poll_secs),
            request_timeout: Duration::from_secs(request_secs),
            recent_requests,
            log_dir: get("TAXI_LOG_DIR").map(PathBuf::from),
        })
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
