//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::QueueType;
use crate::error::{Result, SchedulerError};

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Max concurrent metadata calls
    pub metadata_max_jobs: usize,

    /// Max concurrent file transfers
    pub file_max_jobs: usize,

    /// Consecutive throttles after which backoff stops growing
    pub max_throttle_count: u32,

    /// Upper bound (exclusive) of the random jitter added to each backoff
    pub max_jitter_ms: u64,

    /// Retry throttled jobs immediately (tests only)
    pub disable_throttling: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            metadata_max_jobs: 5,
            file_max_jobs: 1,
            max_throttle_count: 5,
            max_jitter_ms: 1000,
            disable_throttling: false,
        }
    }
}

impl SchedulerConfig {
    /// Concurrency cap for `queue`
    pub fn max_jobs(&self, queue: QueueType) -> usize {
        match queue {
            QueueType::Metadata => self.metadata_max_jobs,
            QueueType::File => self.file_max_jobs,
        }
    }

    /// Jitter bound as a Duration
    pub fn max_jitter(&self) -> Duration {
        Duration::from_millis(self.max_jitter_ms)
    }

    /// Reject configurations that could never dispatch a job
    pub fn validate(&self) -> Result<()> {
        for queue in QueueType::ALL {
            if self.max_jobs(queue) == 0 {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{}_max_jobs must be at least 1",
                    queue
                )));
            }
        }
        if self.max_throttle_count == 0 {
            return Err(SchedulerError::InvalidConfig(
                "max_throttle_count must be at least 1".to_string(),
            ));
        }
        // 2^(count-1) seconds must fit in a u64
        if self.max_throttle_count > 32 {
            return Err(SchedulerError::InvalidConfig(
                "max_throttle_count must be at most 32".to_string(),
            ));
        }
        Ok(())
    }

    /// Builder: disable backoff delays
    pub fn without_throttling(mut self) -> Self {
        self.disable_throttling = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchedulerConfig::default();
        assert_eq!(config.max_jobs(QueueType::Metadata), 5);
        assert_eq!(config.max_jobs(QueueType::File), 1);
        assert_eq!(config.max_throttle_count, 5);
        assert_eq!(config.max_jitter(), Duration::from_millis(1000));
        assert!(!config.disable_throttling);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cap_is_rejected() {
        let config = SchedulerConfig {
            file_max_jobs: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("file_max_jobs"));
    }

    #[test]
    fn test_throttle_count_bounds() {
        let zero = SchedulerConfig {
            max_throttle_count: 0,
            ..Default::default()
        };
        assert!(zero.validate().is_err());

        let huge = SchedulerConfig {
            max_throttle_count: 64,
            ..Default::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: SchedulerConfig = serde_yaml::from_str("metadata_max_jobs: 3\n").unwrap();
        assert_eq!(config.metadata_max_jobs, 3);
        assert_eq!(config.file_max_jobs, 1);
        assert_eq!(config.max_jitter_ms, 1000);
    }

    #[test]
    fn test_without_throttling() {
        let config = SchedulerConfig::default().without_throttling();
        assert!(config.disable_throttling);
    }
}
