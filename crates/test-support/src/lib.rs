//! Shared test helpers: in-memory span capture and settings fixtures.

pub mod common;
pub mod support;

pub use common::{attr, attr_keys, log_events};
pub use support::settings::write_settings;
pub use support::spans::SpanHarness;
