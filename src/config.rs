//! Relay configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), read once at startup.
//!
//! | Variable             | Default                             |
//! |----------------------|-------------------------------------|
//! | `LISTEN_ADDR`        | `0.0.0.0:8000`                      |
//! | `ROOM_IDS`           | `channel-1,channel-2,channel-3`     |
//! | `HUB_QUEUE_CAPACITY` | `64`                                |
//! | `SEND_TIMEOUT_MS`    | unset (no per-member send deadline) |
//! | `LOG_FORMAT`         | `text` (`json` for structured logs) |

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::hub::DEFAULT_QUEUE_CAPACITY;
use crate::domain::{HubOptions, RoomId};
use crate::error::RelayError;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_ROOM_IDS: &str = "channel-1,channel-2,channel-3";

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Top-level relay configuration.
///
/// Loaded once at startup via [`RelayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Socket address to bind the HTTP server to.
    pub listen_addr: SocketAddr,

    /// Rooms to serve, in configuration order. Never empty.
    pub room_ids: Vec<RoomId>,

    /// Depth of each hub's event queue.
    pub hub_queue_capacity: usize,

    /// Per-member send deadline during fan-out.
    pub send_timeout: Option<Duration>,

    /// Log output format.
    pub log_format: LogFormat,
}

impl RelayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if any variable is set to a
    /// value that cannot be parsed.
    pub fn from_env() -> Result<Self, RelayError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] on malformed values, an empty
    /// or duplicated room list, or a zero queue capacity.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|err| RelayError::InvalidConfig(format!("LISTEN_ADDR: {err}")))?;

        let room_ids =
            parse_room_ids(&lookup("ROOM_IDS").unwrap_or_else(|| DEFAULT_ROOM_IDS.to_string()))?;

        let hub_queue_capacity: usize =
            parse_var(&lookup, "HUB_QUEUE_CAPACITY")?.unwrap_or(DEFAULT_QUEUE_CAPACITY);
        if hub_queue_capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "HUB_QUEUE_CAPACITY must be greater than zero".to_string(),
            ));
        }

        let send_timeout = parse_var::<u64, _>(&lookup, "SEND_TIMEOUT_MS")?
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(other) => {
                return Err(RelayError::InvalidConfig(format!(
                    "LOG_FORMAT: unknown format {other:?}"
                )));
            }
        };

        Ok(Self {
            listen_addr,
            room_ids,
            hub_queue_capacity,
            send_timeout,
            log_format,
        })
    }

    /// Returns the hub options derived from this configuration.
    #[must_use]
    pub fn hub_options(&self) -> HubOptions {
        HubOptions {
            queue_capacity: self.hub_queue_capacity,
            send_timeout: self.send_timeout,
        }
    }
}

/// Parses a comma-separated room list. Blank entries are skipped.
///
/// # Errors
///
/// Returns [`RelayError::InvalidConfig`] if an entry is not a valid room
/// id, an id repeats, or no ids remain.
pub fn parse_room_ids(raw: &str) -> Result<Vec<RoomId>, RelayError> {
    let mut ids: Vec<RoomId> = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let id = RoomId::parse(entry)
            .map_err(|err| RelayError::InvalidConfig(format!("ROOM_IDS: {err}")))?;
        if ids.contains(&id) {
            return Err(RelayError::InvalidConfig(format!(
                "ROOM_IDS: duplicate room id {id}"
            )));
        }
        ids.push(id);
    }
    if ids.is_empty() {
        return Err(RelayError::InvalidConfig(
            "ROOM_IDS: at least one room id is required".to_string(),
        ));
    }
    Ok(ids)
}

/// Parses an optional variable as `T`. Unset or blank yields `None`.
fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, RelayError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|err| RelayError::InvalidConfig(format!("{key}: {err}"))),
        _ => Ok(None),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<RelayConfig, RelayError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RelayConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let Ok(config) = load(&[]) else {
            panic!("defaults should load");
        };
        assert_eq!(config.listen_addr.port(), 8000);
        let rooms: Vec<_> = config.room_ids.iter().map(RoomId::as_str).collect();
        assert_eq!(rooms, ["channel-1", "channel-2", "channel-3"]);
        assert_eq!(config.hub_queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.send_timeout, None);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn explicit_values_are_applied() {
        let Ok(config) = load(&[
            ("LISTEN_ADDR", "127.0.0.1:9100"),
            ("ROOM_IDS", " lobby , ops "),
            ("HUB_QUEUE_CAPACITY", "8"),
            ("SEND_TIMEOUT_MS", "1500"),
            ("LOG_FORMAT", "JSON"),
        ]) else {
            panic!("config should load");
        };
        assert_eq!(config.listen_addr.port(), 9100);
        assert_eq!(config.room_ids.len(), 2);
        let options = config.hub_options();
        assert_eq!(options.queue_capacity, 8);
        assert_eq!(options.send_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn zero_send_timeout_disables_deadline() {
        let Ok(config) = load(&[("SEND_TIMEOUT_MS", "0")]) else {
            panic!("config should load");
        };
        assert_eq!(config.send_timeout, None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(load(&[("LISTEN_ADDR", "nowhere")]).is_err());
        assert!(load(&[("HUB_QUEUE_CAPACITY", "lots")]).is_err());
        assert!(load(&[("HUB_QUEUE_CAPACITY", "0")]).is_err());
        assert!(load(&[("SEND_TIMEOUT_MS", "-5")]).is_err());
        assert!(load(&[("LOG_FORMAT", "xml")]).is_err());
    }

    #[test]
    fn room_list_validation() {
        assert!(parse_room_ids(" , ,").is_err());
        assert!(parse_room_ids("a,b,a").is_err());
        assert!(parse_room_ids("a,../b").is_err());
        let Ok(ids) = parse_room_ids("a,,b") else {
            panic!("blank entries are skipped");
        };
        assert_eq!(ids.len(), 2);
    }
}
