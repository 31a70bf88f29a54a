//! Process-wide tracing setup.
//!
//! [`install`] wires, once per process:
//! - an OpenTelemetry tracer provider, registered globally;
//! - a `tracing` subscriber with an env filter, a fmt layer and an
//!   OpenTelemetry layer;
//! - the bridge logger, installed as the global logger over a `TracingSink`.

use crate::error::{CmdError, Result};
use crate::settings::{Settings, build_logger};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::{Config, Sampler, TracerProvider};
use pocker_logger::{Level, TracingSink};
use std::sync::Arc;
use tracing::dispatcher;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;

/// Keeps telemetry alive; dropping it restores the previous global logger and
/// shuts the tracer provider down.
pub struct TelemetryGuard {
    provider: TracerProvider,
    restore: Option<Box<dyn FnOnce() + Send>>,
}

impl TelemetryGuard {
    pub fn tracer_provider(&self) -> &TracerProvider {
        &self.provider
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(restore) = self.restore.take() {
            restore();
        }
        global::shutdown_tracer_provider();
    }
}

pub fn install(settings: &Settings) -> Result<TelemetryGuard> {
    if dispatcher::has_been_set() {
        return Err(CmdError::SubscriberAlreadySet);
    }

    let provider = build_tracer_provider(settings);
    let tracer = provider.tracer("pocker");

    let subscriber = tracing_subscriber::registry()
        .with(build_env_filter(settings.log.level))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|err| CmdError::Telemetry(err.to_string()))?;

    global::set_tracer_provider(provider.clone());

    let logger = build_logger(settings, Arc::new(TracingSink));
    let restore = pocker_logger::global::replace_globals(logger);

    tracing::info!(
        service = settings.service_name(),
        level = %settings.log.level,
        trace_level = %settings.log.trace_level,
        "Telemetry installed"
    );

    Ok(TelemetryGuard {
        provider,
        restore: Some(Box::new(restore)),
    })
}

fn build_tracer_provider(settings: &Settings) -> TracerProvider {
    let resource = Resource::new(vec![KeyValue::new(
        "service.name",
        settings.service_name().to_string(),
    )]);
    TracerProvider::builder()
        .with_config(
            Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_resource(resource),
        )
        .build()
}

/// `RUST_LOG` when set, otherwise the configured console level.
pub fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive(level)))
}

fn directive(level: Level) -> &'static str {
    match level {
        Level::Debug => "debug",
        Level::Info => "info",
        Level::Warn => "warn",
        Level::Error | Level::DPanic | Level::Panic | Level::Fatal => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_collapses_panic_levels() {
        assert_eq!(directive(Level::Warn), "warn");
        assert_eq!(directive(Level::DPanic), "error");
        assert_eq!(directive(Level::Fatal), "error");
    }
}
