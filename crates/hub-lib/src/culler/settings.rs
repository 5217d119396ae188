//! Culler settings handed to the external idle culler

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of the idle culler service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullerSettings {
    /// Base idle timeout in seconds
    pub timeout: u64,
    /// Poll interval in seconds
    pub every: u64,
    /// Maximum concurrent removals
    pub concurrency: u32,
    /// Maximum session age in seconds, 0 disables
    pub max_age: u64,
    /// Also remove named servers
    pub remove_named_servers: bool,
    /// Idle timeouts by accelerator count
    pub timeouts: TimeoutTiers,
    /// Priority added for sessions holding accelerators
    pub bonuses: PriorityBonuses,
}

impl Default for CullerSettings {
    fn default() -> Self {
        Self {
            timeout: 7200,
            every: 600,
            concurrency: 10,
            max_age: 0,
            remove_named_servers: true,
            timeouts: TimeoutTiers::default(),
            bonuses: PriorityBonuses::default(),
        }
    }
}

impl CullerSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.every)
    }

    pub fn base_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age > 0).then(|| Duration::from_secs(self.max_age))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutTiers {
    pub cpu_secs: u64,
    pub single_accelerator_secs: u64,
    pub multi_accelerator_secs: u64,
}

impl Default for TimeoutTiers {
    fn default() -> Self {
        Self {
            cpu_secs: 7200,
            single_accelerator_secs: 14400,
            multi_accelerator_secs: 21600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBonuses {
    pub single_accelerator: i64,
    pub multi_accelerator: i64,
}

impl Default for PriorityBonuses {
    fn default() -> Self {
        Self {
            single_accelerator: 10,
            multi_accelerator: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = CullerSettings::default();
        assert_eq!(settings.base_timeout(), Duration::from_secs(7200));
        assert_eq!(settings.poll_interval(), Duration::from_secs(600));
        assert_eq!(settings.concurrency, 10);
        assert_eq!(settings.max_age(), None);
        assert!(settings.remove_named_servers);
    }

    #[test]
    fn test_partial_deserialization_keeps_defaults() {
        let settings: CullerSettings =
            serde_json::from_str(r#"{"every": 300, "timeouts": {"cpu_secs": 3600}}"#).unwrap();
        assert_eq!(settings.every, 300);
        assert_eq!(settings.timeout, 7200);
        assert_eq!(settings.timeouts.cpu_secs, 3600);
        assert_eq!(settings.timeouts.multi_accelerator_secs, 21600);
        assert_eq!(settings.bonuses, PriorityBonuses::default());
    }
}
