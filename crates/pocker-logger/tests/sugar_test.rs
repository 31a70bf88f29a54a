//! Sugared logger calls against real spans.

use opentelemetry::Value;
use pocker_logger::{FieldValue, Level, Logger, LoggerConfig, MemorySink, args, field, keys};
use std::sync::Arc;
use test_support::{SpanHarness, attr, attr_keys, log_events};

fn memory_logger(config: LoggerConfig) -> (Arc<MemorySink>, Logger) {
    let sink = Arc::new(MemorySink::new());
    let logger = Logger::new(sink.clone(), config);
    (sink, logger)
}

#[test]
fn test_templated_call_records_template_and_message() {
    let harness = SpanHarness::new();
    let (sink, logger) = memory_logger(LoggerConfig::default().with_caller(false));
    let cx = harness.start("join");

    logger
        .sugar()
        .ctx(&cx)
        .warnf("room {} is full ({} seats)", args!["r-42", 8]);

    let span = harness.finish(&cx);
    let event = log_events(&span)[0];
    assert_eq!(
        attr_keys(event),
        vec!["log.template", "log.severity", "log.message"]
    );
    assert_eq!(
        attr(event, keys::span::LOG_TEMPLATE),
        Some(&Value::String("room {} is full ({} seats)".into()))
    );
    assert_eq!(
        attr(event, keys::span::LOG_MESSAGE),
        Some(&Value::String("room r-42 is full (8 seats)".into()))
    );
    assert_eq!(sink.take()[0].message, "room r-42 is full (8 seats)");
}

#[test]
fn test_templated_error_sets_status_with_interpolated_message() {
    let harness = SpanHarness::new();
    let (_, logger) = memory_logger(LoggerConfig::default());
    let cx = harness.start("query");

    logger.sugar().errorf_context(&cx, "db {} down", args!["primary"]);

    let span = harness.finish(&cx);
    assert_eq!(
        span.status,
        opentelemetry::trace::Status::Error {
            description: "db primary down".into()
        }
    );
}

#[test]
fn test_orphaned_key_is_dropped_from_span() {
    let harness = SpanHarness::new();
    let (sink, logger) = memory_logger(LoggerConfig::default().with_min_level(Level::Info));
    let cx = harness.start("join");

    logger
        .sugar()
        .ctx(&cx)
        .infow("joined", args!["user", "alice", "oops"]);

    let span = harness.finish(&cx);
    let event = log_events(&span)[0];
    assert_eq!(attr(event, "user"), Some(&Value::String("alice".into())));
    assert!(attr(event, "oops").is_none());
    assert_eq!(&attr_keys(event)[..2], &["user", "log.severity"]);

    let entries = sink.take();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "Ignored key without a value.");
    assert_eq!(entries[1].keys(), vec!["user"]);
}

#[test]
fn test_non_string_keys_drop_their_pair() {
    let harness = SpanHarness::new();
    let (_, logger) = memory_logger(LoggerConfig::default());
    let cx = harness.start("join");

    logger
        .sugar()
        .warnw_context(&cx, "joined", args![7, "seven", "seat", 3u8, "ratio", 0.5]);

    let span = harness.finish(&cx);
    let event = log_events(&span)[0];
    assert_eq!(&attr_keys(event)[..2], &["seat", "ratio"]);
    assert_eq!(attr(event, "seat"), Some(&Value::I64(3)));
    assert_eq!(attr(event, "ratio"), Some(&Value::F64(0.5)));
}

#[test]
fn test_kv_trace_ids_reach_sink() {
    let harness = SpanHarness::new();
    let (sink, logger) = memory_logger(LoggerConfig::default().with_trace_id(true));
    let cx = harness.start("join");

    logger.sugar().ctx(&cx).warnw("joined", args!["user", "alice"]);

    let entry = &sink.take()[0];
    assert_eq!(entry.keys(), vec!["user", "traceId", "trace_id", "spanId", "span_id"]);
}

#[test]
fn test_orphaned_key_does_not_shift_trace_ids() {
    let harness = SpanHarness::new();
    let (sink, logger) = memory_logger(LoggerConfig::default().with_trace_id(true));
    let cx = harness.start("join");

    logger
        .sugar()
        .ctx(&cx)
        .warnw("joined", args!["user", "alice", "oops"]);

    let entries = sink.take();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].message, "Ignored key without a value.");
    assert_eq!(
        entries[0]
            .field(keys::record::IGNORED_KEY)
            .and_then(FieldValue::as_str),
        Some("oops")
    );
    assert_eq!(
        entries[1].keys(),
        vec!["user", "traceId", "trace_id", "spanId", "span_id"]
    );

    let span = harness.finish(&cx);
    let trace_hex = span.span_context.trace_id().to_string();
    assert_eq!(
        entries[1].field("traceId").and_then(FieldValue::as_str),
        Some(trace_hex.as_str())
    );
}

#[test]
fn test_sugared_context_stays_out_of_span() {
    let harness = SpanHarness::new();
    let (sink, logger) = memory_logger(LoggerConfig::default().with_caller(false));
    let cx = harness.start("join");

    let sugar = logger.sugar().with(args!["lobby", "l-9", field::u16("shard", 2)]);
    sugar.ctx(&cx).warnw("joined", args!["user", "alice"]);

    let span = harness.finish(&cx);
    assert_eq!(
        attr_keys(log_events(&span)[0]),
        vec!["user", "log.severity", "log.message"]
    );
    assert_eq!(sink.take()[0].keys(), vec!["lobby", "shard", "user"]);
}

#[test]
fn test_desugar_round_trip_keeps_context() {
    let harness = SpanHarness::new();
    let (_, logger) = memory_logger(LoggerConfig::default());
    let cx = harness.start("join");

    let strict = logger.ctx(&cx).sugar().desugar();
    assert!(strict.logger().ptr_eq(&logger));
    strict.warn("back to strict", vec![]);

    assert_eq!(log_events(&harness.finish(&cx)).len(), 1);
}
