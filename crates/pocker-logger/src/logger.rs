//! The strict logger: typed fields, forwarded to the active span and the sink.

use crate::attr;
use crate::caller;
use crate::field::{self, Field};
use crate::keys;
use crate::level::Level;
use crate::sink::{Entry, LogSink, NopSink};
use crate::sugar::{SugaredLogger, SugaredLoggerWithCtx};
use crate::trace_id::convert_trace_id;
use opentelemetry::trace::{SpanContext, SpanRef, Status, TraceContextExt, TraceId};
use opentelemetry::{Context, KeyValue};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;
use std::time::SystemTime;

/// Span-side behaviour of a [`Logger`].
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Calls below this level are not attached to the span.
    pub min_level: Level,
    /// Calls at or above this level mark the span as failed.
    pub error_status_level: Level,
    pub caller: bool,
    /// Extra frames to skip when reporting the caller.
    pub caller_depth: usize,
    pub stack_trace: bool,
    /// Append `traceId`/`trace_id`/`spanId`/`span_id` to the sink fields.
    pub with_trace_id: bool,
    /// Appended to every strict call.
    pub extra_fields: Vec<Field>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Warn,
            error_status_level: Level::Error,
            caller: true,
            caller_depth: 0,
            stack_trace: false,
            with_trace_id: false,
            extra_fields: Vec::new(),
        }
    }
}

impl LoggerConfig {
    pub fn with_min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_error_status_level(mut self, level: Level) -> Self {
        self.error_status_level = level;
        self
    }

    pub fn with_caller(mut self, on: bool) -> Self {
        self.caller = on;
        self
    }

    pub fn with_caller_depth(mut self, depth: usize) -> Self {
        self.caller_depth = depth;
        self
    }

    pub fn with_stack_trace(mut self, on: bool) -> Self {
        self.stack_trace = on;
        self
    }

    pub fn with_trace_id(mut self, on: bool) -> Self {
        self.with_trace_id = on;
        self
    }

    pub fn with_extra_fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.extra_fields.extend(fields);
        self
    }
}

/// Options that derive a new underlying writer, see [`Logger::with_options`].
#[derive(Debug, Clone)]
pub enum WriterOption {
    /// Fields added to every entry of the derived logger.
    Fields(Vec<Field>),
    /// Appends a segment to the logger name, dot separated.
    Named(String),
    /// Development writers panic on DPanic.
    Development(bool),
    /// Raises the sink-side minimum level. Lowering is ignored.
    IncreaseLevel(Level),
}

/// Sink plus the writer-side settings derived through [`WriterOption`]s.
#[derive(Clone)]
pub(crate) struct Writer {
    sink: Arc<dyn LogSink>,
    name: Option<String>,
    development: bool,
    level: Option<Level>,
}

impl Writer {
    fn enabled(&self, level: Level) -> bool {
        self.level.is_none_or(|min| level >= min) && self.sink.enabled(level)
    }

    fn apply(&mut self, option: WriterOption, config: &mut LoggerConfig) {
        match option {
            WriterOption::Fields(fields) => config.extra_fields.extend(fields),
            WriterOption::Named(name) => {
                self.name = Some(match self.name.take() {
                    Some(parent) if !parent.is_empty() => format!("{parent}.{name}"),
                    _ => name,
                });
            }
            WriterOption::Development(on) => self.development = on,
            WriterOption::IncreaseLevel(level) => {
                self.level = Some(self.level.map_or(level, |current| current.max(level)));
            }
        }
    }

    /// Writes the entry if enabled, then applies the level's escalation.
    pub(crate) fn write(
        &self,
        level: Level,
        message: &str,
        fields: &[Field],
        location: &'static Location<'static>,
    ) {
        if self.enabled(level) {
            let entry = Entry {
                level,
                message,
                logger_name: self.name.as_deref(),
                caller: Some(location),
                time: SystemTime::now(),
            };
            self.sink.write(&entry, fields);
        }
        self.escalate(level, message);
    }

    fn escalate(&self, level: Level, message: &str) {
        match level {
            Level::DPanic if self.development => {
                self.sink.sync();
                panic!("{message}");
            }
            Level::Panic => {
                self.sink.sync();
                panic!("{message}");
            }
            Level::Fatal => {
                self.sink.sync();
                std::process::exit(1);
            }
            _ => {}
        }
    }
}

struct Inner {
    writer: Writer,
    config: LoggerConfig,
}

/// Structured logger bridging log calls onto the active span.
///
/// Cloning is cheap; derived loggers (`clone_with`, `with_options`) get their
/// own copy of the configuration and never share mutable state.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.inner.writer.name)
            .field("development", &self.inner.writer.development)
            .field("config", &self.inner.config)
            .finish()
    }
}

impl Logger {
    pub fn new(sink: Arc<dyn LogSink>, config: LoggerConfig) -> Self {
        let writer = Writer {
            sink,
            name: None,
            development: false,
            level: None,
        };
        Self::from_parts(writer, config)
    }

    /// A logger that writes nowhere; the process-wide default.
    pub fn nop() -> Self {
        Self::new(Arc::new(NopSink), LoggerConfig::default())
    }

    fn from_parts(writer: Writer, config: LoggerConfig) -> Self {
        Self {
            inner: Arc::new(Inner { writer, config }),
        }
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.inner.config
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.writer.name.as_deref()
    }

    pub fn is_development(&self) -> bool {
        self.inner.writer.development
    }

    /// Whether `other` is this very instance rather than an equal copy.
    pub fn ptr_eq(&self, other: &Logger) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Copies the configuration and applies `mutate` to the copy.
    pub fn clone_with(&self, mutate: impl FnOnce(&mut LoggerConfig)) -> Logger {
        let mut config = self.inner.config.clone();
        mutate(&mut config);
        Self::from_parts(self.inner.writer.clone(), config)
    }

    /// Derives a logger with a new underlying writer.
    ///
    /// `Fields` options land in the extra fields, so they reach both the span and
    /// the sink exactly once.
    pub fn with_options(&self, options: impl IntoIterator<Item = WriterOption>) -> Logger {
        let mut writer = self.inner.writer.clone();
        let mut config = self.inner.config.clone();
        for option in options {
            writer.apply(option, &mut config);
        }
        Self::from_parts(writer, config)
    }

    pub fn named(&self, name: impl Into<String>) -> Logger {
        self.with_options([WriterOption::Named(name.into())])
    }

    pub fn sugar(&self) -> SugaredLogger {
        SugaredLogger::new(self.clone())
    }

    /// Binds the logger to a request context.
    pub fn ctx(&self, cx: &Context) -> LoggerWithCtx {
        LoggerWithCtx {
            cx: cx.clone(),
            logger: self.clone(),
        }
    }

    /// Binds the logger to the context current on this thread.
    pub fn ctx_current(&self) -> LoggerWithCtx {
        self.ctx(&Context::current())
    }

    /// Flushes the sink.
    pub fn sync(&self) {
        self.inner.writer.sink.sync();
    }

    /// Logs at `level` against the span of `cx`, then writes to the sink.
    #[track_caller]
    pub fn log(&self, cx: &Context, level: Level, msg: &str, fields: Vec<Field>) {
        let location = Location::caller();
        let fields = self.log_fields(cx, level, msg, fields, location);
        self.inner.writer.write(level, msg, &fields, location);
    }

    pub(crate) fn writer(&self) -> &Writer {
        &self.inner.writer
    }

    /// Span side of a strict call. Returns the fields the sink should receive.
    pub(crate) fn log_fields(
        &self,
        cx: &Context,
        level: Level,
        msg: &str,
        mut fields: Vec<Field>,
        location: &'static Location<'static>,
    ) -> Vec<Field> {
        let config = &self.inner.config;
        fields.extend(config.extra_fields.iter().cloned());

        if level < config.min_level {
            return fields;
        }
        let span = cx.span();
        if !span.is_recording() {
            return fields;
        }

        let attrs = attr::convert_fields(&fields);
        self.record(&span, level, msg, attrs, location);

        if config.with_trace_id {
            for (key, value) in trace_id_pairs(span.span_context()) {
                fields.push(field::string(key, value));
            }
        }
        fields
    }

    /// Adds the `log` event, and escalates the span status when required.
    pub(crate) fn record(
        &self,
        span: &SpanRef<'_>,
        level: Level,
        msg: &str,
        mut attrs: Vec<KeyValue>,
        location: &'static Location<'static>,
    ) {
        let config = &self.inner.config;
        attrs.push(KeyValue::new(keys::span::LOG_SEVERITY, level.severity()));
        attrs.push(KeyValue::new(keys::span::LOG_MESSAGE, msg.to_string()));

        if config.caller {
            if let Some(site) = caller::resolve(location, config.caller_depth) {
                if let Some(function) = site.function {
                    attrs.push(KeyValue::new(keys::span::CODE_FUNCTION, function));
                }
                attrs.push(KeyValue::new(keys::span::CODE_FILEPATH, site.file));
                attrs.push(KeyValue::new(keys::span::CODE_LINENO, i64::from(site.line)));
            }
        }

        if config.stack_trace {
            attrs.push(KeyValue::new(
                keys::span::EXCEPTION_STACKTRACE,
                caller::stack_trace(),
            ));
        }

        span.add_event(keys::LOG_EVENT, attrs);

        if level >= config.error_status_level {
            span.set_status(Status::error(msg.to_string()));
        }
    }
}

/// Hex and decimal renderings of the trace and span ids, when the trace id is valid.
pub(crate) fn trace_id_pairs(sc: &SpanContext) -> Vec<(&'static str, String)> {
    if sc.trace_id() == TraceId::INVALID {
        return Vec::new();
    }
    let trace_id = sc.trace_id().to_string();
    let span_id = sc.span_id().to_string();
    let trace_decimal = convert_trace_id(&trace_id);
    let span_decimal = convert_trace_id(&span_id);
    vec![
        (keys::record::TRACE_ID_HEX, trace_id),
        (keys::record::TRACE_ID, trace_decimal),
        (keys::record::SPAN_ID_HEX, span_id),
        (keys::record::SPAN_ID, span_decimal),
    ]
}

/// A [`Logger`] bound to one request context.
#[derive(Debug, Clone)]
pub struct LoggerWithCtx {
    cx: Context,
    logger: Logger,
}

impl LoggerWithCtx {
    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn sugar(&self) -> SugaredLoggerWithCtx {
        self.logger.sugar().ctx(&self.cx)
    }

    pub fn with_options(&self, options: impl IntoIterator<Item = WriterOption>) -> LoggerWithCtx {
        LoggerWithCtx {
            cx: self.cx.clone(),
            logger: self.logger.with_options(options),
        }
    }

    pub fn clone_with(&self, mutate: impl FnOnce(&mut LoggerConfig)) -> LoggerWithCtx {
        LoggerWithCtx {
            cx: self.cx.clone(),
            logger: self.logger.clone_with(mutate),
        }
    }

    #[track_caller]
    pub fn log(&self, level: Level, msg: &str, fields: Vec<Field>) {
        self.logger.log(&self.cx, level, msg, fields);
    }
}

macro_rules! leveled_methods {
    ($($level:ident => $plain:ident, $with_context:ident;)*) => {
        impl Logger {
            $(
                /// Sink-only call; no span is consulted.
                #[track_caller]
                pub fn $plain(&self, msg: &str, fields: Vec<Field>) {
                    self.log(&Context::new(), Level::$level, msg, fields);
                }

                #[track_caller]
                pub fn $with_context(&self, cx: &Context, msg: &str, fields: Vec<Field>) {
                    self.log(cx, Level::$level, msg, fields);
                }
            )*
        }

        impl LoggerWithCtx {
            $(
                #[track_caller]
                pub fn $plain(&self, msg: &str, fields: Vec<Field>) {
                    self.logger.log(&self.cx, Level::$level, msg, fields);
                }
            )*
        }
    };
}

leveled_methods! {
    Debug => debug, debug_context;
    Info => info, info_context;
    Warn => warn, warn_context;
    Error => error, error_context;
    DPanic => dpanic, dpanic_context;
    Panic => panic, panic_context;
    Fatal => fatal, fatal_context;
}
