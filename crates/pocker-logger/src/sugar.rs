//! Loosely typed logging on top of [`Logger`].
//!
//! Two flavours per level: `…f` calls fill a `{}` template from positional
//! arguments, `…w` calls take alternating keys and values. Strongly typed
//! [`Field`]s may be mixed into key/value lists.
//!
//! ```
//! use pocker_logger::{args, field, Logger};
//!
//! let sugar = Logger::nop().sugar();
//! sugar.infof("joined room {} as {}", args!["r-42", "alice"]);
//! sugar.infow("joined", args!["room", "r-42", field::bool("spectator", false)]);
//! ```

use crate::attr;
use crate::encoder::{ArrayEncoder, ArrayMarshaler, MarshalError, ObjectEncoder, ObjectMarshaler};
use crate::field::{self, Field, FieldValue};
use crate::keys;
use crate::level::Level;
use crate::logger::{self, Logger, LoggerWithCtx};
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use std::panic::Location;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// One argument of a sugared call.
#[derive(Debug, Clone)]
pub enum Arg {
    Field(Field),
    Value(FieldValue),
}

impl Arg {
    fn as_key(&self) -> Option<&str> {
        match self {
            Arg::Value(value) => value.as_str(),
            Arg::Field(_) => None,
        }
    }

    fn value(&self) -> &FieldValue {
        match self {
            Arg::Value(value) => value,
            Arg::Field(field) => &field.value,
        }
    }

    fn into_value(self) -> FieldValue {
        match self {
            Arg::Value(value) => value,
            Arg::Field(field) => field.value,
        }
    }

    fn render(&self) -> String {
        match self {
            Arg::Value(value) => value.to_string(),
            Arg::Field(field) => format!("{}={}", field.key, field.value),
        }
    }
}

impl From<Field> for Arg {
    fn from(field: Field) -> Self {
        Arg::Field(field)
    }
}

impl From<FieldValue> for Arg {
    fn from(value: FieldValue) -> Self {
        Arg::Value(value)
    }
}

macro_rules! arg_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Value(FieldValue::from(value))
                }
            }
        )*
    };
}

arg_from_value!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64,
    String,
    &str,
    &String,
    Duration,
    SystemTime,
    serde_json::Value,
);

/// Builds a `Vec<Arg>` from heterogeneous values.
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// Sugared front end of a [`Logger`], with its own sink-only context.
#[derive(Debug, Clone)]
pub struct SugaredLogger {
    logger: Logger,
    context: Vec<Field>,
}

impl SugaredLogger {
    pub(crate) fn new(logger: Logger) -> Self {
        Self {
            logger,
            context: Vec::new(),
        }
    }

    pub fn desugar(&self) -> &Logger {
        &self.logger
    }

    /// Adds context fields written with every later entry.
    ///
    /// Context is sink-only: it never reaches span attributes.
    #[track_caller]
    pub fn with(&self, args: Vec<Arg>) -> SugaredLogger {
        let mut context = self.context.clone();
        context.extend(self.sweeten(args, Location::caller()));
        SugaredLogger {
            logger: self.logger.clone(),
            context,
        }
    }

    pub fn ctx(&self, cx: &Context) -> SugaredLoggerWithCtx {
        SugaredLoggerWithCtx {
            cx: cx.clone(),
            sugar: self.clone(),
        }
    }

    /// Templated call against the span of `cx`.
    #[track_caller]
    pub fn logf(&self, cx: &Context, level: Level, template: &str, args: Vec<Arg>) {
        let location = Location::caller();
        let message = interpolate(template, &args);
        self.log_args(cx, level, template, &message, location);
        let fields = self.base_fields(Vec::new());
        self.logger
            .writer()
            .write(level, &message, &fields, location);
    }

    /// Key/value call against the span of `cx`.
    #[track_caller]
    pub fn logw(&self, cx: &Context, level: Level, msg: &str, kvs: Vec<Arg>) {
        let location = Location::caller();
        let trace_ids = self.log_kvs(cx, level, msg, &kvs, location);
        let mut swept = self.sweeten(kvs, location);
        swept.extend(trace_ids);
        let fields = self.base_fields(swept);
        self.logger.writer().write(level, msg, &fields, location);
    }

    fn base_fields(&self, call_fields: Vec<Field>) -> Vec<Field> {
        let mut fields = Vec::with_capacity(
            self.logger.config().extra_fields.len() + self.context.len() + call_fields.len(),
        );
        fields.extend(self.logger.config().extra_fields.iter().cloned());
        fields.extend(self.context.iter().cloned());
        fields.extend(call_fields);
        fields
    }

    fn log_args(
        &self,
        cx: &Context,
        level: Level,
        template: &str,
        message: &str,
        location: &'static Location<'static>,
    ) {
        if level < self.logger.config().min_level {
            return;
        }
        let span = cx.span();
        if !span.is_recording() {
            return;
        }
        let attrs = vec![KeyValue::new(
            keys::span::LOG_TEMPLATE,
            template.to_string(),
        )];
        self.logger.record(&span, level, message, attrs, location);
    }

    /// Span side of a key/value call. Returns the trace-id fields the sink
    /// should receive after the swept pairs.
    fn log_kvs(
        &self,
        cx: &Context,
        level: Level,
        msg: &str,
        kvs: &[Arg],
        location: &'static Location<'static>,
    ) -> Vec<Field> {
        if level < self.logger.config().min_level {
            return Vec::new();
        }
        let span = cx.span();
        if !span.is_recording() {
            return Vec::new();
        }

        let mut attrs = Vec::with_capacity(kvs.len() / 2 + 5);
        let mut i = 0;
        while i + 1 < kvs.len() {
            if let Some(key) = kvs[i].as_key() {
                attrs.push(attr::loose_attribute(key.to_string(), kvs[i + 1].value()));
            }
            i += 2;
        }
        self.logger.record(&span, level, msg, attrs, location);

        if !self.logger.config().with_trace_id {
            return Vec::new();
        }
        logger::trace_id_pairs(span.span_context())
            .into_iter()
            .map(|(key, value)| field::string(key, value))
            .collect()
    }

    /// Turns loosely typed arguments into fields for the sink.
    ///
    /// Malformed input is dropped and reported as a separate entry.
    fn sweeten(&self, args: Vec<Arg>, location: &'static Location<'static>) -> Vec<Field> {
        let mut fields = Vec::with_capacity(args.len() / 2 + 1);
        let mut invalid = InvalidPairs::default();
        let mut args = args.into_iter().enumerate();

        while let Some((position, arg)) = args.next() {
            let key = match arg {
                Arg::Field(field) => {
                    fields.push(field);
                    continue;
                }
                Arg::Value(key) => key,
            };
            let Some((_, value)) = args.next() else {
                self.report(
                    "Ignored key without a value.",
                    Field::new(keys::record::IGNORED_KEY, key),
                    location,
                );
                break;
            };
            match key {
                FieldValue::String(key) => fields.push(Field::new(key, value.into_value())),
                key => invalid.0.push(InvalidPair {
                    position,
                    key,
                    value: value.into_value(),
                }),
            }
        }

        if !invalid.0.is_empty() {
            self.report(
                "Ignored key-value pairs with non-string keys.",
                Field::new(keys::record::INVALID_PAIRS, FieldValue::Array(Arc::new(invalid))),
                location,
            );
        }
        fields
    }

    fn report(&self, message: &str, field: Field, location: &'static Location<'static>) {
        let level = if self.logger.is_development() {
            Level::DPanic
        } else {
            Level::Error
        };
        self.logger
            .writer()
            .write(level, message, &[field], location);
    }
}

#[derive(Debug, Clone)]
struct InvalidPair {
    position: usize,
    key: FieldValue,
    value: FieldValue,
}

impl ObjectMarshaler for InvalidPair {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<(), MarshalError> {
        enc.add("position", &FieldValue::Usize(self.position));
        enc.add("key", &self.key);
        enc.add("value", &self.value);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InvalidPairs(Vec<InvalidPair>);

impl ArrayMarshaler for InvalidPairs {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<(), MarshalError> {
        for pair in &self.0 {
            enc.append(&FieldValue::Object(Arc::new(pair.clone())));
        }
        Ok(())
    }
}

/// Fills `{}` placeholders positionally. `{{` and `}}` are literal braces.
///
/// A template without arguments is returned as is. Missing arguments render
/// as `{!MISSING}`, surplus ones are appended as ` {!EXTRA a, b}`.
pub fn interpolate(template: &str, args: &[Arg]) -> String {
    if args.is_empty() {
        return template.to_string();
    }
    if template.is_empty() {
        return args.iter().map(Arg::render).collect::<Vec<_>>().join(" ");
    }

    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut next = 0;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) => {
                chars.next();
                out.push('{');
            }
            ('{', Some('}')) => {
                chars.next();
                match args.get(next) {
                    Some(arg) => out.push_str(&arg.render()),
                    None => out.push_str("{!MISSING}"),
                }
                next += 1;
            }
            ('}', Some('}')) => {
                chars.next();
                out.push('}');
            }
            (c, _) => out.push(c),
        }
    }
    if next < args.len() {
        let extra: Vec<String> = args[next..].iter().map(Arg::render).collect();
        out.push_str(&format!(" {{!EXTRA {}}}", extra.join(", ")));
    }
    out
}

/// A [`SugaredLogger`] bound to one request context.
#[derive(Debug, Clone)]
pub struct SugaredLoggerWithCtx {
    cx: Context,
    sugar: SugaredLogger,
}

impl SugaredLoggerWithCtx {
    pub fn desugar(&self) -> LoggerWithCtx {
        self.sugar.logger.ctx(&self.cx)
    }

    pub fn context(&self) -> &Context {
        &self.cx
    }

    pub fn sugar(&self) -> &SugaredLogger {
        &self.sugar
    }
}

macro_rules! sugared_methods {
    ($($level:ident => $f:ident, $f_ctx:ident, $w:ident, $w_ctx:ident;)*) => {
        impl SugaredLogger {
            $(
                #[track_caller]
                pub fn $f(&self, template: &str, args: Vec<Arg>) {
                    self.logf(&Context::new(), Level::$level, template, args);
                }

                #[track_caller]
                pub fn $f_ctx(&self, cx: &Context, template: &str, args: Vec<Arg>) {
                    self.logf(cx, Level::$level, template, args);
                }

                #[track_caller]
                pub fn $w(&self, msg: &str, kvs: Vec<Arg>) {
                    self.logw(&Context::new(), Level::$level, msg, kvs);
                }

                #[track_caller]
                pub fn $w_ctx(&self, cx: &Context, msg: &str, kvs: Vec<Arg>) {
                    self.logw(cx, Level::$level, msg, kvs);
                }
            )*
        }

        impl SugaredLoggerWithCtx {
            $(
                #[track_caller]
                pub fn $f(&self, template: &str, args: Vec<Arg>) {
                    self.sugar.logf(&self.cx, Level::$level, template, args);
                }

                #[track_caller]
                pub fn $w(&self, msg: &str, kvs: Vec<Arg>) {
                    self.sugar.logw(&self.cx, Level::$level, msg, kvs);
                }
            )*
        }
    };
}

sugared_methods! {
    Debug => debugf, debugf_context, debugw, debugw_context;
    Info => infof, infof_context, infow, infow_context;
    Warn => warnf, warnf_context, warnw, warnw_context;
    Error => errorf, errorf_context, errorw, errorw_context;
    DPanic => dpanicf, dpanicf_context, dpanicw, dpanicw_context;
    Panic => panicf, panicf_context, panicw, panicw_context;
    Fatal => fatalf, fatalf_context, fatalw, fatalw_context;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field;
    use crate::logger::{LoggerConfig, WriterOption};
    use crate::sink::MemorySink;

    fn memory_sugar() -> (Arc<MemorySink>, SugaredLogger) {
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::new(sink.clone(), LoggerConfig::default());
        (sink, logger.sugar())
    }

    #[test]
    fn test_interpolate_fills_placeholders() {
        assert_eq!(
            interpolate("user {} joined {}", &args!["alice", 42]),
            "user alice joined 42"
        );
        assert_eq!(interpolate("{{literal}} {}", &args![true]), "{literal} true");
    }

    #[test]
    fn test_interpolate_reports_missing_and_extra() {
        assert_eq!(interpolate("{} and {}", &args![1]), "1 and {!MISSING}");
        assert_eq!(interpolate("only {}", &args![1, 2, 3]), "only 1 {!EXTRA 2, 3}");
    }

    #[test]
    fn test_interpolate_without_args_keeps_template() {
        assert_eq!(interpolate("100% {} done", &args![]), "100% {} done");
        assert_eq!(interpolate("", &args!["a", 1]), "a 1");
    }

    #[test]
    fn test_sweeten_accepts_inline_fields() {
        let (sink, sugar) = memory_sugar();
        sugar.infow("joined", args!["room", "r-42", field::i64("seat", 3), "spectator", false]);

        let entries = sink.take();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].keys(), vec!["room", "seat", "spectator"]);
    }

    #[test]
    fn test_sweeten_reports_non_string_keys() {
        let (sink, sugar) = memory_sugar();
        sugar.infow("joined", args![42, "value", "room", "r-1"]);

        let entries = sink.take();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, Level::Error);
        assert_eq!(entries[0].message, "Ignored key-value pairs with non-string keys.");
        let invalid = entries[0].field(keys::record::INVALID_PAIRS).unwrap();
        assert_eq!(invalid.to_string(), "[{key=42, position=0, value=value}]");
        assert_eq!(entries[1].keys(), vec!["room"]);
    }

    #[test]
    fn test_sweeten_reports_orphaned_key() {
        let (sink, sugar) = memory_sugar();
        sugar.warnw("left", args!["room", "r-1", "oops"]);

        let entries = sink.take();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "Ignored key without a value.");
        assert_eq!(
            entries[0].field(keys::record::IGNORED_KEY).and_then(FieldValue::as_str),
            Some("oops")
        );
        assert_eq!(entries[1].keys(), vec!["room"]);
    }

    #[test]
    #[should_panic(expected = "Ignored key without a value.")]
    fn test_sweeten_panics_in_development() {
        let (_, sugar) = memory_sugar();
        let dev = sugar
            .desugar()
            .with_options([WriterOption::Development(true)])
            .sugar();
        dev.infow("left", args!["oops"]);
    }

    #[test]
    fn test_with_context_reaches_every_entry() {
        let (sink, sugar) = memory_sugar();
        let scoped = sugar.with(args!["lobby", "l-1"]);
        scoped.infof("tick {}", args![1]);
        scoped.infow("tock", args!["n", 2]);
        sugar.infof("untouched", args![]);

        let entries = sink.take();
        assert_eq!(entries[0].message, "tick 1");
        assert_eq!(entries[0].keys(), vec!["lobby"]);
        assert_eq!(entries[1].keys(), vec!["lobby", "n"]);
        assert!(entries[2].fields.is_empty());
    }
}
