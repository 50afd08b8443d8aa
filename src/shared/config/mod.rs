//! Notification center configuration
//!
//! Tunables for the client-side notification drawer: how many items are
//! always visible, how many the first and subsequent pages reveal, and the
//! timing of the progressive reveal and the post-collapse re-sort.

use std::time::Duration;
use thiserror::Error;

/// Notification center configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCenterConfig {
    /// Items shown while the drawer is closed
    pub preview_count: usize,
    /// Extra items revealed when the drawer opens
    pub first_page_count: usize,
    /// Extra items revealed by each further page
    pub page_size: usize,
    /// Total time over which one page of items is revealed
    pub reveal_duration: Duration,
    /// Delay between collapsing a freshly-read item and re-sorting the list
    pub resort_delay: Duration,
}

impl Default for NotificationCenterConfig {
    fn default() -> Self {
        Self {
            preview_count: 3,
            first_page_count: 5,
            page_size: 10,
            reveal_duration: Duration::from_millis(400),
            resort_delay: Duration::from_millis(350),
        }
    }
}

impl NotificationCenterConfig {
    /// Create a new NotificationCenterConfigBuilder
    pub fn builder() -> NotificationCenterConfigBuilder {
        NotificationCenterConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.first_page_count == 0 {
            return Err(ConfigError::MissingValue("first_page_count"));
        }
        if self.page_size == 0 {
            return Err(ConfigError::MissingValue("page_size"));
        }
        Ok(())
    }
}

/// Builder for NotificationCenterConfig
#[derive(Debug, Default)]
pub struct NotificationCenterConfigBuilder {
    preview_count: Option<usize>,
    first_page_count: Option<usize>,
    page_size: Option<usize>,
    reveal_duration: Option<Duration>,
    resort_delay: Option<Duration>,
}

impl NotificationCenterConfigBuilder {
    pub fn preview_count(mut self, count: usize) -> Self {
        self.preview_count = Some(count);
        self
    }

    pub fn first_page_count(mut self, count: usize) -> Self {
        self.first_page_count = Some(count);
        self
    }

    pub fn page_size(mut self, count: usize) -> Self {
        self.page_size = Some(count);
        self
    }

    pub fn reveal_duration(mut self, duration: Duration) -> Self {
        self.reveal_duration = Some(duration);
        self
    }

    pub fn resort_delay(mut self, delay: Duration) -> Self {
        self.resort_delay = Some(delay);
        self
    }

    /// Build the configuration, filling gaps with defaults
    pub fn build(self) -> Result<NotificationCenterConfig, ConfigError> {
        let defaults = NotificationCenterConfig::default();
        let config = NotificationCenterConfig {
            preview_count: self.preview_count.unwrap_or(defaults.preview_count),
            first_page_count: self.first_page_count.unwrap_or(defaults.first_page_count),
            page_size: self.page_size.unwrap_or(defaults.page_size),
            reveal_duration: self.reveal_duration.unwrap_or(defaults.reveal_duration),
            resort_delay: self.resort_delay.unwrap_or(defaults.resort_delay),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = NotificationCenterConfig::builder().build().unwrap();
        assert_eq!(config, NotificationCenterConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = NotificationCenterConfig::builder()
            .preview_count(1)
            .page_size(4)
            .reveal_duration(Duration::from_millis(100))
            .build()
            .unwrap();
        assert_eq!(config.preview_count, 1);
        assert_eq!(config.page_size, 4);
        assert_eq!(config.first_page_count, 5);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = NotificationCenterConfig::builder().page_size(0).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingValue("page_size"));
    }
}
