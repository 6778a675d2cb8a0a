//! Runtime configuration.
//!
//! Values come from environment variables, read once at startup and passed
//! explicitly to the orchestrator, gateway and stores. Invalid values are
//! reported as [`ConfigError`]; missing ones fall back to defaults.

use crate::error::ConfigError;
use crate::types::UserId;
use crate::validation::DeliveryWindow;
use chrono::{Duration, FixedOffset, NaiveTime};
use courier_runtime::retry::RetryPolicy;
use std::str::FromStr;

/// Result type alias for configuration loading.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings the orchestrator needs per input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    /// Idle lifetime of a session; every input restarts it.
    ///
    /// Default: 1 hour
    pub session_ttl: Duration,

    /// Delivery hours and local time zone
    pub delivery: DeliveryWindow,

    /// Administrator allowed into the catalog sub-flow, notified of new orders
    pub admin: Option<UserId>,
}

impl WorkflowConfig {
    /// Set the session idle lifetime.
    #[must_use]
    pub const fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Set the delivery window.
    #[must_use]
    pub const fn with_delivery(mut self, delivery: DeliveryWindow) -> Self {
        self.delivery = delivery;
        self
    }

    /// Set the administrator.
    #[must_use]
    pub const fn with_admin(mut self, admin: Option<UserId>) -> Self {
        self.admin = admin;
        self
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(1),
            delivery: DeliveryWindow::default(),
            admin: None,
        }
    }
}

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `DATABASE_URL`
    pub database_url: String,
    /// `DATABASE_MAX_CONNECTIONS`
    pub database_max_connections: u32,
    /// `REDIS_URL`
    pub redis_url: String,
    /// `ADMIN_USER_ID`
    pub admin_user_id: Option<UserId>,
    /// `SESSION_TTL_SECS`
    pub session_ttl: Duration,
    /// `COMMIT_MAX_ATTEMPTS` and `COMMIT_RETRY_DELAY_MS`
    pub retry: RetryPolicy,
    /// `DELIVERY_OPENS_AT`, `DELIVERY_CLOSES_AT`, `DELIVERY_UTC_OFFSET_MINUTES`
    pub delivery: DeliveryWindow,
    /// `LOG_LEVEL`, used when `RUST_LOG` is not set
    pub log_level: Option<String>,
    /// `COURIER_IN_MEMORY`: run on in-memory stores instead of Redis and `PostgreSQL`
    pub in_memory: bool,
}

impl Config {
    /// Load from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first variable holding an invalid value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first variable holding an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars(&lookup);
        let defaults = WorkflowConfig::default();

        let session_ttl_secs: i64 = vars.parse_or("SESSION_TTL_SECS", defaults.session_ttl.num_seconds())?;
        if session_ttl_secs <= 0 {
            return Err(invalid("SESSION_TTL_SECS", session_ttl_secs, "must be positive"));
        }

        let max_attempts: usize = vars.parse_or("COMMIT_MAX_ATTEMPTS", 3)?;
        if max_attempts == 0 {
            return Err(invalid("COMMIT_MAX_ATTEMPTS", max_attempts, "must be at least 1"));
        }
        let delay_ms: u64 = vars.parse_or("COMMIT_RETRY_DELAY_MS", 5_000)?;

        let opens = vars.time_or("DELIVERY_OPENS_AT", defaults.delivery.opens)?;
        let closes = vars.time_or("DELIVERY_CLOSES_AT", defaults.delivery.closes)?;
        if opens >= closes {
            return Err(invalid(
                "DELIVERY_CLOSES_AT",
                closes.format("%H:%M"),
                "must be later than DELIVERY_OPENS_AT",
            ));
        }

        let offset_minutes: i32 = vars.parse_or(
            "DELIVERY_UTC_OFFSET_MINUTES",
            defaults.delivery.utc_offset.local_minus_utc() / 60,
        )?;
        let utc_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| invalid("DELIVERY_UTC_OFFSET_MINUTES", offset_minutes, "must be within ±24h"))?;

        let database_max_connections: u32 = vars.parse_or("DATABASE_MAX_CONNECTIONS", 5)?;
        if database_max_connections == 0 {
            return Err(invalid("DATABASE_MAX_CONNECTIONS", 0, "must be at least 1"));
        }

        Ok(Self {
            database_url: vars.string_or("DATABASE_URL", "postgres://localhost/courier"),
            database_max_connections,
            redis_url: vars.string_or("REDIS_URL", "redis://127.0.0.1:6379"),
            admin_user_id: vars.parse::<i64>("ADMIN_USER_ID")?.map(UserId::new),
            session_ttl: Duration::seconds(session_ttl_secs),
            retry: RetryPolicy::builder()
                .max_attempts(max_attempts)
                .delay(std::time::Duration::from_millis(delay_ms))
                .build(),
            delivery: DeliveryWindow {
                opens,
                closes,
                utc_offset,
            },
            log_level: vars.get("LOG_LEVEL"),
            in_memory: vars.flag("COURIER_IN_MEMORY")?,
        })
    }

    /// Settings handed to the orchestrator.
    #[must_use]
    pub const fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            session_ttl: self.session_ttl,
            delivery: self.delivery,
            admin: self.admin_user_id,
        }
    }

    /// Retry policy for the persistence gateway.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone()
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Lookup wrapper treating blank values as unset.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string_or(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(name)
            .map(|raw| raw.parse::<T>().map_err(|e| invalid(name, &raw, &e.to_string())))
            .transpose()
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse(name)?.unwrap_or(default))
    }

    fn time_or(&self, name: &'static str, default: NaiveTime) -> Result<NaiveTime> {
        self.get(name).map_or(Ok(default), |raw| {
            NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| invalid(name, &raw, "expected HH:MM"))
        })
    }

    fn flag(&self, name: &'static str) -> Result<bool> {
        match self.get(name).as_deref() {
            None | Some("0" | "false") => Ok(false),
            Some("1" | "true") => Ok(true),
            Some(other) => Err(invalid(name, other, "expected 1/0 or true/false")),
        }
    }
}
