#![forbid(unsafe_code)]

//! Engine configuration.
//!
//! Defaults match the reference behavior: a 100 ms signal throttle, lenient
//! sink validation, lifecycle events on. Settings can be overridden from the
//! environment and, with the `policy-config` feature, loaded from TOML:
//!
//! ```toml
//! signal_throttle_ms = 250
//! strict_sinks = true
//! emit_lifecycle_events = false
//! ```
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CYCLEBIND_SIGNAL_THROTTLE_MS` | `signal_throttle_ms` |
//! | `CYCLEBIND_STRICT_SINKS` | `strict_sinks` |
//! | `CYCLEBIND_LIFECYCLE_EVENTS` | `emit_lifecycle_events` |

use std::time::Duration;

use crate::error::{CycleError, Result};

/// Default signal throttle window.
pub const DEFAULT_SIGNAL_THROTTLE_MS: u64 = 100;

pub const ENV_SIGNAL_THROTTLE_MS: &str = "CYCLEBIND_SIGNAL_THROTTLE_MS";
pub const ENV_STRICT_SINKS: &str = "CYCLEBIND_STRICT_SINKS";
pub const ENV_LIFECYCLE_EVENTS: &str = "CYCLEBIND_LIFECYCLE_EVENTS";

/// Tunables for a [`CycleEngine`](crate::engine::CycleEngine).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct CycleConfig {
    /// Leading-edge throttle window for signal drivers, in milliseconds.
    pub signal_throttle_ms: u64,
    /// Reject sinks without a matching driver instead of dropping them.
    pub strict_sinks: bool,
    /// Emit `MountedEvent` / `UnmountedEvent` on the change stream.
    pub emit_lifecycle_events: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            signal_throttle_ms: DEFAULT_SIGNAL_THROTTLE_MS,
            strict_sinks: false,
            emit_lifecycle_events: true,
        }
    }
}

impl CycleConfig {
    #[must_use]
    pub fn signal_throttle(&self) -> Duration {
        Duration::from_millis(self.signal_throttle_ms)
    }

    #[must_use]
    pub fn with_signal_throttle(mut self, interval: Duration) -> Self {
        self.signal_throttle_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }

    #[must_use]
    pub fn with_strict_sinks(mut self, strict: bool) -> Self {
        self.strict_sinks = strict;
        self
    }

    #[must_use]
    pub fn with_lifecycle_events(mut self, emit: bool) -> Self {
        self.emit_lifecycle_events = emit;
        self
    }

    /// Apply overrides read through `lookup` (normally `std::env::var`).
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_SIGNAL_THROTTLE_MS) {
            self.signal_throttle_ms = raw.trim().parse().map_err(|_| {
                CycleError::InvalidConfig(format!("{ENV_SIGNAL_THROTTLE_MS}: not a number: {raw}"))
            })?;
        }
        if let Some(raw) = lookup(ENV_STRICT_SINKS) {
            self.strict_sinks = parse_flag(ENV_STRICT_SINKS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LIFECYCLE_EVENTS) {
            self.emit_lifecycle_events = parse_flag(ENV_LIFECYCLE_EVENTS, &raw)?;
        }
        Ok(self)
    }

    /// Defaults with process-environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| CycleError::InvalidConfig(e.to_string()))
    }

    /// Load a TOML file.
    #[cfg(feature = "policy-config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CycleError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(CycleError::InvalidConfig(format!(
            "{key}: expected a boolean, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults() {
        let config = CycleConfig::default();
        assert_eq!(config.signal_throttle(), Duration::from_millis(100));
        assert!(!config.strict_sinks);
        assert!(config.emit_lifecycle_events);
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_SIGNAL_THROTTLE_MS, "250"),
            (ENV_STRICT_SINKS, "yes"),
            (ENV_LIFECYCLE_EVENTS, "0"),
        ]
        .into_iter()
        .collect();
        let config = CycleConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| (*v).to_string()))
            .expect("valid overrides");
        assert_eq!(config.signal_throttle_ms, 250);
        assert!(config.strict_sinks);
        assert!(!config.emit_lifecycle_events);
    }

    #[test]
    fn from_env_reads_the_process_environment() {
        let expected = CycleConfig::default().with_env_overrides(|k| std::env::var(k).ok());
        assert_eq!(CycleConfig::from_env(), expected);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let err = CycleConfig::default()
            .with_env_overrides(|k| (k == ENV_STRICT_SINKS).then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, CycleError::InvalidConfig(_)));
    }

    #[test]
    fn builder_setters() {
        let config = CycleConfig::default()
            .with_signal_throttle(Duration::from_millis(40))
            .with_strict_sinks(true)
            .with_lifecycle_events(false);
        assert_eq!(config.signal_throttle_ms, 40);
        assert!(config.strict_sinks);
        assert!(!config.emit_lifecycle_events);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_keeps_defaults_for_missing_keys() {
        let config = CycleConfig::from_toml_str("strict_sinks = true").expect("valid toml");
        assert!(config.strict_sinks);
        assert_eq!(config.signal_throttle_ms, DEFAULT_SIGNAL_THROTTLE_MS);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn load_reads_a_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "signal_throttle_ms = 30\nemit_lifecycle_events = false").expect("write");
        let config = CycleConfig::load(file.path()).expect("loads");
        assert_eq!(config.signal_throttle(), Duration::from_millis(30));
        assert!(!config.emit_lifecycle_events);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn load_reports_missing_file() {
        let err = CycleConfig::load("/nonexistent/cyclebind.toml").unwrap_err();
        assert!(matches!(err, CycleError::InvalidConfig(msg) if msg.contains("cyclebind.toml")));
    }
}
