//! Attribute and field key names shared by the bridge.
//!
//! Span attribute keys follow the OpenTelemetry semantic conventions where one
//! exists (`code.*`, `exception.*`); the `log.*` keys are bridge-specific.

/// Name of the span event emitted for every bridged log call.
pub const LOG_EVENT: &str = "log";

pub mod span {
    /// Severity of the log call (`Warn`, `Error`, ...).
    pub const LOG_SEVERITY: &str = "log.severity";
    /// Final log message.
    pub const LOG_MESSAGE: &str = "log.message";
    /// Raw template of a templated sugared call.
    pub const LOG_TEMPLATE: &str = "log.template";

    pub const CODE_FUNCTION: &str = "code.function";
    pub const CODE_FILEPATH: &str = "code.filepath";
    pub const CODE_LINENO: &str = "code.lineno";

    pub const EXCEPTION_TYPE: &str = "exception.type";
    pub const EXCEPTION_MESSAGE: &str = "exception.message";
    pub const EXCEPTION_STACKTRACE: &str = "exception.stacktrace";
}

/// Fields appended to the sink record when trace ids are injected.
pub mod record {
    pub const TRACE_ID_HEX: &str = "traceId";
    pub const TRACE_ID: &str = "trace_id";
    pub const SPAN_ID_HEX: &str = "spanId";
    pub const SPAN_ID: &str = "span_id";

    /// Sweetening diagnostics.
    pub const INVALID_PAIRS: &str = "invalid";
    pub const IGNORED_KEY: &str = "ignored";
}

/// Suffix of the diagnostic attribute emitted when a field cannot be converted.
pub const ERROR_SUFFIX: &str = "_error";
