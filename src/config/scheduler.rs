//! Scheduler configuration structures.

use std::collections::HashMap;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::core::{AppResult, DEFAULT_LIMIT};

/// Prefix of the environment variables read by [`SchedulerConfig::from_env`].
pub const ENV_PREFIX: &str = "THROTTLE_";

/// Configuration for one scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Name used in logs and diagnostic events.
    pub name: String,
    /// Maximum concurrently running tasks.
    pub limit: usize,
    /// Maximum queued tasks before rejection; `None` is unbounded.
    pub max_queue_depth: Option<usize>,
    /// Emit per-task dispatched/completed events.
    pub diagnostics: bool,
    /// Start dispatching as soon as the scheduler is built.
    pub autostart: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            name: "default".into(),
            limit: DEFAULT_LIMIT,
            max_queue_depth: None,
            diagnostics: false,
            autostart: false,
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.limit == 0 {
            return Err("limit must be greater than 0".into());
        }
        if self.max_queue_depth == Some(0) {
            return Err("max_queue_depth must be greater than 0".into());
        }
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from `THROTTLE_*` environment variables, reading a `.env` file
    /// first if one exists. Unset variables keep their defaults.
    pub fn from_env() -> AppResult<Self> {
        // A missing .env is normal.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary key lookup.
    /// Keys are passed with the `THROTTLE_` prefix.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));
        let mut cfg = Self::default();

        if let Some(name) = var("NAME") {
            cfg.name = name;
        }
        if let Some(limit) = var("LIMIT") {
            cfg.limit = limit
                .trim()
                .parse()
                .with_context(|| format!("THROTTLE_LIMIT is not a positive integer: {limit:?}"))?;
        }
        if let Some(depth) = var("MAX_QUEUE_DEPTH") {
            cfg.max_queue_depth = Some(depth.trim().parse().with_context(|| {
                format!("THROTTLE_MAX_QUEUE_DEPTH is not a positive integer: {depth:?}")
            })?);
        }
        if let Some(flag) = var("DIAGNOSTICS") {
            cfg.diagnostics = parse_flag(&flag).context("THROTTLE_DIAGNOSTICS")?;
        }
        if let Some(flag) = var("AUTOSTART") {
            cfg.autostart = parse_flag(&flag).context("THROTTLE_AUTOSTART")?;
        }

        cfg.validate().map_err(anyhow::Error::msg)?;
        Ok(cfg)
    }
}

fn parse_flag(raw: &str) -> AppResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected a boolean, got {other:?}"),
    }
}

/// Root configuration for several named schedulers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    /// Map of scheduler name to configuration.
    pub schedulers: HashMap<String, SchedulerConfig>,
}

impl ThrottleConfig {
    /// Validate all schedulers and ensure at least one exists.
    pub fn validate(&self) -> Result<(), String> {
        if self.schedulers.is_empty() {
            return Err("at least one scheduler must be defined".into());
        }
        for (name, scheduler) in &self.schedulers {
            scheduler
                .validate()
                .map_err(|e| format!("scheduler `{name}` invalid: {e}"))?;
        }
        Ok(())
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}
