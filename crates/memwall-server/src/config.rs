use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::FixedOffset;

const WEEK_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Load the demo guestbook on startup
    pub seed: bool,
    pub analytics_interval: Duration,
    /// Offset used for "local" hours and week boundaries. Unset follows the
    /// host zone, re-read on every report so DST shifts apply.
    pub utc_offset: Option<FixedOffset>,
    pub event_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take defaults; set but malformed
    /// keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let seed = match lookup("MEMWALL_SEED") {
            Some(v) => parse_bool(&v).with_context(|| format!("MEMWALL_SEED={}", v))?,
            None => true,
        };

        let interval_secs: u64 = match lookup("MEMWALL_ANALYTICS_INTERVAL_SECS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("MEMWALL_ANALYTICS_INTERVAL_SECS={}", v))?,
            None => WEEK_SECS,
        };
        if interval_secs == 0 {
            return Err(anyhow!("MEMWALL_ANALYTICS_INTERVAL_SECS must be positive"));
        }

        let utc_offset = match lookup("MEMWALL_UTC_OFFSET_MINUTES") {
            Some(v) => {
                let minutes: i32 = v
                    .parse()
                    .with_context(|| format!("MEMWALL_UTC_OFFSET_MINUTES={}", v))?;
                let offset = minutes
                    .checked_mul(60)
                    .and_then(FixedOffset::east_opt)
                    .ok_or_else(|| anyhow!("MEMWALL_UTC_OFFSET_MINUTES out of range: {}", v))?;
                Some(offset)
            }
            None => None,
        };

        let event_capacity: usize = match lookup("MEMWALL_EVENT_CAPACITY") {
            Some(v) => v
                .parse()
                .with_context(|| format!("MEMWALL_EVENT_CAPACITY={}", v))?,
            None => memwall_api::dispatcher::DEFAULT_CAPACITY,
        };

        Ok(Self {
            seed,
            analytics_interval: Duration::from_secs(interval_secs),
            utc_offset,
            event_capacity,
        })
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("not a boolean: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.seed);
        assert_eq!(cfg.analytics_interval, Duration::from_secs(WEEK_SECS));
        assert_eq!(cfg.event_capacity, 1024);
        assert_eq!(cfg.utc_offset, None);
    }

    #[test]
    fn reads_every_key() {
        let cfg = config(&[
            ("MEMWALL_SEED", "off"),
            ("MEMWALL_ANALYTICS_INTERVAL_SECS", "60"),
            ("MEMWALL_UTC_OFFSET_MINUTES", "-300"),
            ("MEMWALL_EVENT_CAPACITY", "16"),
        ])
        .unwrap();
        assert!(!cfg.seed);
        assert_eq!(cfg.analytics_interval, Duration::from_secs(60));
        assert_eq!(cfg.utc_offset.map(|o| o.local_minus_utc()), Some(-5 * 3600));
        assert_eq!(cfg.event_capacity, 16);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(config(&[("MEMWALL_SEED", "maybe")]).is_err());
        assert!(config(&[("MEMWALL_ANALYTICS_INTERVAL_SECS", "0")]).is_err());
        assert!(config(&[("MEMWALL_UTC_OFFSET_MINUTES", "99999")]).is_err());
        assert!(config(&[("MEMWALL_EVENT_CAPACITY", "-1")]).is_err());
    }
}
