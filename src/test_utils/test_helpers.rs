//! Helper utilities for testing and development.

use crate::config::ConnectionOptions;

/// Valid options with no settle delay, so scripted sessions run instantly.
#[must_use]
pub fn test_options() -> ConnectionOptions {
    ConnectionOptions::builder("127.0.0.1".into(), 3306, "tester".into(), String::new())
        .settle_delay(std::time::Duration::ZERO)
        .finish()
}
