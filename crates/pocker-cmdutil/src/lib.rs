//! Shared bootstrap for Planning Pocker service binaries.
//!
//! Resolves settings from defaults, an optional JSON settings file,
//! environment variables and flags, then installs tracing and the global
//! bridge logger.

pub mod error;
pub mod settings;
pub mod telemetry;

pub use error::{CmdError, Result};
pub use settings::{
    HEALTH_CHECK_PORT_GRPC, HEALTH_CHECK_PORT_HTTP, HealthcheckSettings, LogSettings, ServiceArgs,
    Settings, build_logger, load_dotenv, logger_config, settings_schema,
};
pub use telemetry::{TelemetryGuard, install};
