//! Service settings, the flags that override them, and their JSON Schema.
//!
//! Precedence, lowest first: built-in defaults, the JSON settings file named by
//! `--config`, then environment variables and flags.

use crate::error::{CmdError, Result};
use clap::Args;
use pocker_logger::{Level, LogSink, Logger, LoggerConfig, WriterOption, field};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const HEALTH_CHECK_PORT_GRPC: u16 = 5051;
pub const HEALTH_CHECK_PORT_HTTP: u16 = 5052;

/// Flags shared by every service binary.
#[derive(Debug, Clone, Default, Args)]
pub struct ServiceArgs {
    /// Settings file (JSON)
    #[arg(long, global = true, env = "PLANNING_POCKER_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Which service to run
    #[arg(short = 's', long, global = true, env = "PLANNING_POCKER_SERVICE")]
    pub service: Option<String>,

    /// Log level written to the console [default: info]
    #[arg(long, global = true, env = "LOG_LEVEL", value_name = "LEVEL")]
    pub log_level: Option<Level>,

    /// Minimum level attached to trace spans [default: warn]
    #[arg(long, global = true, env = "PLANNING_POCKER_TRACE_LOG_LEVEL", value_name = "LEVEL")]
    pub trace_log_level: Option<Level>,

    /// Add trace and span ids to log records
    #[arg(
        long,
        global = true,
        env = "PLANNING_POCKER_WITH_TRACE_ID",
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub with_trace_id: Option<bool>,

    /// Host to listen on for services that support a health check [default: localhost]
    #[arg(long, global = true, env = "PLANNING_POCKER_HEALTHCHECK_HOST")]
    pub healthcheck_host: Option<String>,

    /// gRPC health check port [default: 5051]
    #[arg(long, global = true, env = "PLANNING_POCKER_HEALTHCHECK_PORT")]
    pub healthcheck_port: Option<u16>,

    /// HTTP health check port [default: 5052]
    #[arg(long, global = true, env = "PLANNING_POCKER_HEALTHCHECK_WEB_PORT")]
    pub healthcheck_web_port: Option<u16>,
}

impl ServiceArgs {
    /// Loads the settings file, if any, and applies flag overrides on top.
    pub fn resolve(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)?,
            None => Settings::default(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    pub fn apply(&self, settings: &mut Settings) {
        if let Some(service) = &self.service {
            settings.service = Some(service.clone());
        }
        if let Some(level) = self.log_level {
            settings.log.level = level;
        }
        if let Some(level) = self.trace_log_level {
            settings.log.trace_level = level;
        }
        if let Some(on) = self.with_trace_id {
            settings.log.with_trace_id = on;
        }
        if let Some(host) = &self.healthcheck_host {
            settings.healthcheck.host = host.clone();
        }
        if let Some(port) = self.healthcheck_port {
            settings.healthcheck.port = port;
        }
        if let Some(port) = self.healthcheck_web_port {
            settings.healthcheck.web_port = port;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Name of the service being launched
    pub service: Option<String>,
    pub log: LogSettings,
    pub healthcheck: HealthcheckSettings,
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CmdError::ConfigNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn service_name(&self) -> &str {
        self.service.as_deref().unwrap_or("planning-pocker")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct LogSettings {
    /// Console log level
    #[schemars(with = "String")]
    pub level: Level,
    /// Minimum level recorded on trace spans
    #[schemars(with = "String")]
    pub trace_level: Level,
    /// Minimum level that marks a span as failed
    #[schemars(with = "String")]
    pub error_status_level: Level,
    pub caller: bool,
    pub stack_trace: bool,
    pub with_trace_id: bool,
    /// Panic on DPanic entries
    pub development: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        let config = LoggerConfig::default();
        Self {
            level: Level::Info,
            trace_level: config.min_level,
            error_status_level: config.error_status_level,
            caller: config.caller,
            stack_trace: config.stack_trace,
            with_trace_id: config.with_trace_id,
            development: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct HealthcheckSettings {
    pub host: String,
    pub port: u16,
    pub web_port: u16,
}

impl Default for HealthcheckSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: HEALTH_CHECK_PORT_GRPC,
            web_port: HEALTH_CHECK_PORT_HTTP,
        }
    }
}

impl HealthcheckSettings {
    pub fn grpc_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.web_port)
    }
}

/// Loads `.env` from the working directory or its parents, if there is one.
pub fn load_dotenv() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Pretty-printed JSON Schema of the settings file.
pub fn settings_schema() -> Result<String> {
    let schema = schemars::schema_for!(Settings);
    Ok(serde_json::to_string_pretty(&schema)?)
}

/// Span-side logger configuration for the given log settings.
pub fn logger_config(log: &LogSettings) -> LoggerConfig {
    LoggerConfig::default()
        .with_min_level(log.trace_level)
        .with_error_status_level(log.error_status_level)
        .with_caller(log.caller)
        .with_stack_trace(log.stack_trace)
        .with_trace_id(log.with_trace_id)
}

/// Builds the service logger over `sink`.
///
/// The writer is named after the service and filters entries below the console
/// level; the service name is attached to every entry.
pub fn build_logger(settings: &Settings, sink: Arc<dyn LogSink>) -> Logger {
    let mut options = vec![
        WriterOption::IncreaseLevel(settings.log.level),
        WriterOption::Development(settings.log.development),
    ];
    if let Some(service) = &settings.service {
        options.push(WriterOption::Named(service.clone()));
        options.push(WriterOption::Fields(vec![field::string("service", service.clone())]));
    }
    Logger::new(sink, logger_config(&settings.log)).with_options(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_flag_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.log.level, Level::Info);
        assert_eq!(settings.log.trace_level, Level::Warn);
        assert_eq!(settings.healthcheck.grpc_addr(), "localhost:5051");
        assert_eq!(settings.healthcheck.http_addr(), "localhost:5052");
        assert_eq!(settings.service_name(), "planning-pocker");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"log": {"level": "debug"}, "healthcheck": {"port": 6000}}"#)
                .unwrap();
        assert_eq!(settings.log.level, Level::Debug);
        assert!(settings.log.caller);
        assert_eq!(settings.healthcheck.port, 6000);
        assert_eq!(settings.healthcheck.host, "localhost");
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let parsed = serde_json::from_str::<Settings>(r#"{"logs": {}}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_apply_overrides_only_given_flags() {
        let mut settings = Settings::default();
        settings.log.with_trace_id = true;
        let args = ServiceArgs {
            service: Some("lobby".to_string()),
            healthcheck_port: Some(7000),
            ..ServiceArgs::default()
        };
        args.apply(&mut settings);
        assert_eq!(settings.service.as_deref(), Some("lobby"));
        assert_eq!(settings.healthcheck.port, 7000);
        assert_eq!(settings.healthcheck.web_port, HEALTH_CHECK_PORT_HTTP);
        assert!(settings.log.with_trace_id);
    }

    #[test]
    fn test_logger_config_maps_log_settings() {
        let log = LogSettings {
            trace_level: Level::Info,
            error_status_level: Level::Warn,
            stack_trace: true,
            ..LogSettings::default()
        };
        let config = logger_config(&log);
        assert_eq!(config.min_level, Level::Info);
        assert_eq!(config.error_status_level, Level::Warn);
        assert!(config.stack_trace);
        assert!(config.caller);
        assert!(config.extra_fields.is_empty());
    }
}
