//! Structured logging bridged onto OpenTelemetry spans.
//!
//! Every leveled call made against a context whose span is recording becomes a
//! `log` event on that span, carrying the call's fields as attributes plus
//! `log.severity` and `log.message`. Calls at or above the error-status level
//! mark the span as failed. The call is then written to a [`LogSink`].
//!
//! ```
//! use opentelemetry::Context;
//! use pocker_logger::{field, Logger, LoggerConfig, TracingSink};
//! use std::sync::Arc;
//!
//! let logger = Logger::new(Arc::new(TracingSink), LoggerConfig::default());
//! let cx = Context::current();
//! logger.ctx(&cx).warn("disk almost full", vec![field::i64("pct", 97)]);
//! ```

pub mod attr;
pub mod caller;
pub mod encoder;
pub mod field;
pub mod global;
pub mod keys;
pub mod level;
pub mod logger;
pub mod sink;
pub mod sugar;
pub mod trace_id;

pub use encoder::{ArrayEncoder, ArrayMarshaler, MarshalError, ObjectEncoder, ObjectMarshaler};
pub use field::{Field, FieldValue};
pub use level::{Level, ParseLevelError};
pub use logger::{Logger, LoggerConfig, LoggerWithCtx, WriterOption};
pub use sink::{Entry, LogSink, MemorySink, NopSink, RecordedEntry, TracingSink};
pub use sugar::{Arg, SugaredLogger, SugaredLoggerWithCtx};
pub use trace_id::convert_trace_id;
