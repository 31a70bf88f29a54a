//! Process-wide logger replacement.

use pocker_logger::{LoggerConfig, Logger, MemorySink, field, global};
use std::sync::Arc;
use test_support::{SpanHarness, log_events};

#[test]
fn test_replace_globals_and_restore() {
    let initial = global::l();
    let sink = Arc::new(MemorySink::new());
    let installed = Logger::new(sink.clone(), LoggerConfig::default());

    let restore = global::replace_globals(installed.clone());
    assert!(global::l().ptr_eq(&installed));

    let harness = SpanHarness::new();
    let cx = harness.start("global");
    global::ctx(&cx).warn("via global", vec![field::i64("pct", 97)]);
    global::s().infow("sugared via global", pocker_logger::args!["k", "v"]);

    restore();
    assert!(global::l().ptr_eq(&initial));

    assert_eq!(log_events(&harness.finish(&cx)).len(), 1);
    assert_eq!(sink.len(), 2);

    global::l().warn("dropped by the no-op default", vec![]);
    assert_eq!(sink.len(), 2);
}
