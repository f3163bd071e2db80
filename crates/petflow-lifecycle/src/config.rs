//! Lifecycle runtime configuration.
//!
//! Defaults match the production behaviour. Override via environment
//! variables or explicit construction for tests.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Delay before a scheduled progression fires.
pub const DEFAULT_AUTO_PROGRESSION_DELAY: Duration = Duration::from_millis(1500);

/// Automatic hops allowed per originating transition.
pub const DEFAULT_MAX_AUTOMATIC_HOPS: u32 = 10;

/// Audit entries retained before trimming.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10_000;

/// Interval between progression driver polls.
pub const DEFAULT_DRIVER_TICK: Duration = Duration::from_millis(100);

/// Tunables for the transition engine and its scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Lower bound on the wait between landing in a qualifying state and the
    /// automatic re-evaluation.
    pub auto_progression_delay: Duration,
    /// Cap on automatic hops in one chain. Exceeding it escalates as
    /// [`ConfigurationError::RunawayProgression`](crate::error::ConfigurationError::RunawayProgression).
    pub max_automatic_hops: u32,
    /// Maximum audit trail length.
    pub audit_capacity: usize,
    /// How often [`ProgressionDriver`](crate::driver::ProgressionDriver) polls.
    pub driver_tick: Duration,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            auto_progression_delay: DEFAULT_AUTO_PROGRESSION_DELAY,
            max_automatic_hops: DEFAULT_MAX_AUTOMATIC_HOPS,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            driver_tick: DEFAULT_DRIVER_TICK,
        }
    }
}

impl LifecycleConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PETFLOW_AUTO_PROGRESSION_DELAY_MS` (default: 1500)
    /// - `PETFLOW_MAX_AUTOMATIC_HOPS` (default: 10, must be non-zero)
    /// - `PETFLOW_AUDIT_CAPACITY` (default: 10000)
    /// - `PETFLOW_DRIVER_TICK_MS` (default: 100)
    ///
    /// An unset variable falls back to its default; a set but unparsable one
    /// is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            auto_progression_delay: Duration::from_millis(env_number(
                "PETFLOW_AUTO_PROGRESSION_DELAY_MS",
                DEFAULT_AUTO_PROGRESSION_DELAY.as_millis() as u64,
            )?),
            max_automatic_hops: env_number(
                "PETFLOW_MAX_AUTOMATIC_HOPS",
                DEFAULT_MAX_AUTOMATIC_HOPS,
            )?,
            audit_capacity: env_number("PETFLOW_AUDIT_CAPACITY", DEFAULT_AUDIT_CAPACITY)?,
            driver_tick: Duration::from_millis(env_number(
                "PETFLOW_DRIVER_TICK_MS",
                DEFAULT_DRIVER_TICK.as_millis() as u64,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder: set the auto-progression delay.
    pub fn with_auto_progression_delay(mut self, delay: Duration) -> Self {
        self.auto_progression_delay = delay;
        self
    }

    /// Builder: set the hop cap.
    pub fn with_max_automatic_hops(mut self, hops: u32) -> Self {
        self.max_automatic_hops = hops;
        self
    }

    /// Builder: set the audit capacity.
    pub fn with_audit_capacity(mut self, capacity: usize) -> Self {
        self.audit_capacity = capacity;
        self
    }

    /// Builder: set the driver tick.
    pub fn with_driver_tick(mut self, tick: Duration) -> Self {
        self.driver_tick = tick;
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_automatic_hops == 0 {
            return Err(ConfigError::InvalidValue {
                var: "max_automatic_hops".into(),
                value: "0".into(),
                reason: "must allow at least one automatic hop".into(),
            });
        }
        if self.driver_tick.is_zero() {
            return Err(ConfigError::InvalidValue {
                var: "driver_tick".into(),
                value: "0".into(),
                reason: "driver tick must be positive".into(),
            });
        }
        Ok(())
    }
}

fn env_number<T>(var: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => parse_number(var, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_number<T>(var: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}
