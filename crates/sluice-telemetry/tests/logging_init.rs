//! Global subscriber installation with the human-readable layout.
//!
//! The subscriber is process-wide, so everything lives in one test.

use sluice_telemetry::logging::create_env_filter;
use sluice_telemetry::{init_logging, LogConfig, TelemetryError};

#[test]
fn test_init_logging_installs_once() {
    let bad_level = LogConfig {
        level: "sluice=loud".to_string(),
        ..LogConfig::development()
    };
    assert!(matches!(
        init_logging(&bad_level),
        Err(TelemetryError::InvalidFilter(_))
    ));
    assert!(matches!(
        create_env_filter("=[bad"),
        Err(TelemetryError::InvalidFilter(_))
    ));

    assert!(init_logging(&LogConfig::development()).is_ok());
    tracing::debug!(installed = true, "development subscriber active");

    let again = init_logging(&LogConfig::development());
    assert!(matches!(again, Err(TelemetryError::LoggingInit(_))));

    let disabled = LogConfig {
        enabled: false,
        ..LogConfig::development()
    };
    assert!(init_logging(&disabled).is_ok());
}
