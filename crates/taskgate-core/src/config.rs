//! 起動時設定
//!
//! すべてのフィールドにデフォルトがあるので、空の JSON (`{}`) でも有効な設定になる。
//! 値の検証は `ServiceBuilder::build` で行う（Fail-fast）。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::{RetryMode, RetryPolicy};

pub const DEFAULT_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Worker slots (gate permits).
    pub capacity: usize,

    /// Max wait for a slot. `None` waits indefinitely.
    pub acquire_timeout_ms: Option<u64>,

    pub retry: RetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub budget_ms: u64,
    pub mode: RetryMode,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            acquire_timeout_ms: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl From<RetryPolicy> for RetryConfig {
    fn from(p: RetryPolicy) -> Self {
        Self {
            max_attempts: p.max_attempts,
            delay_ms: p.delay.as_millis() as u64,
            budget_ms: p.budget.as_millis() as u64,
            mode: p.mode,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(c: &RetryConfig) -> Self {
        Self {
            max_attempts: c.max_attempts,
            delay: Duration::from_millis(c.delay_ms),
            budget: Duration::from_millis(c.budget_ms),
            mode: c.mode,
        }
    }
}

impl DispatchConfig {
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn acquire_timeout(&self) -> Option<Duration> {
        self.acquire_timeout_ms.map(Duration::from_millis)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_gives_defaults() {
        let config = DispatchConfig::from_json("{}").unwrap();
        assert_eq!(config, DispatchConfig::default());
        assert_eq!(config.capacity, 5);
        assert_eq!(config.acquire_timeout(), None);
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_json_overrides_only_given_fields() {
        let config = DispatchConfig::from_json(
            r#"{ "capacity": 2, "acquire_timeout_ms": 250, "retry": { "mode": "uniform" } }"#,
        )
        .unwrap();

        assert_eq!(config.capacity, 2);
        assert_eq!(config.acquire_timeout(), Some(Duration::from_millis(250)));
        let policy = config.retry_policy();
        assert_eq!(policy.mode, RetryMode::Uniform);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay, Duration::from_millis(100));
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(DispatchConfig::from_json(r#"{ "retry": { "mode": "sometimes" } }"#).is_err());
    }
}
