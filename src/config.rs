use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

const DEFAULT_DATA_PATH: &str = "data/state.json";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_REMINDER_HOUR: u32 = 18;
const DEFAULT_NOTIFY_LEAD_MINUTES: u16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub port: u16,
    /// Local hour after which the "forgot to mark" reminder may fire.
    pub reminder_hour: u32,
    /// How far ahead of a class start its notice goes out.
    pub notify_lead_minutes: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            port: DEFAULT_PORT,
            reminder_hour: DEFAULT_REMINDER_HOUR,
            notify_lead_minutes: DEFAULT_NOTIFY_LEAD_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let reminder_hour = parse_or("REMINDER_HOUR", lookup("REMINDER_HOUR"), defaults.reminder_hour);
        Self {
            data_path: lookup("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            reminder_hour: if reminder_hour < 24 {
                reminder_hour
            } else {
                warn!("REMINDER_HOUR={reminder_hour} is not an hour of day, using {DEFAULT_REMINDER_HOUR}");
                DEFAULT_REMINDER_HOUR
            },
            notify_lead_minutes: parse_or(
                "NOTIFY_LEAD_MINUTES",
                lookup("NOTIFY_LEAD_MINUTES"),
                defaults.notify_lead_minutes,
            ),
        }
    }
}

fn parse_or<T: FromStr + Copy>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring unparsable {key}={value}");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        assert_eq!(config(&[]), AppConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("APP_DATA_PATH", "/tmp/attendance.json"),
            ("PORT", "9090"),
            ("REMINDER_HOUR", "20"),
            ("NOTIFY_LEAD_MINUTES", "5"),
        ]);
        assert_eq!(config.data_path, PathBuf::from("/tmp/attendance.json"));
        assert_eq!(config.port, 9090);
        assert_eq!(config.reminder_hour, 20);
        assert_eq!(config.notify_lead_minutes, 5);
    }

    #[test]
    fn bad_values_fall_back() {
        let config = config(&[("PORT", "http"), ("REMINDER_HOUR", "25")]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.reminder_hour, 18);
    }
}
