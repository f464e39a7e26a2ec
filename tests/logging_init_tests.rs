#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Global subscriber installation
//!
//! Lives in its own test binary: the first initialisation installs the
//! process-wide subscriber, which no other test may observe.

use brrtbridge::logging::{init_logging_with_config, LogConfig};

#[test]
fn test_second_init_fails_without_panicking() {
    let config = LogConfig::default_prod();
    assert!(init_logging_with_config(&config).is_ok());
    let second = init_logging_with_config(&config);
    assert!(second.is_err());
}
