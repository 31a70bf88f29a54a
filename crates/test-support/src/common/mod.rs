//! Assertions over exported span events.

use opentelemetry::Value;
use opentelemetry::trace::Event;
use opentelemetry_sdk::export::trace::SpanData;

/// Events named `log`, in emission order.
pub fn log_events(span: &SpanData) -> Vec<&Event> {
    span.events.iter().filter(|event| event.name == "log").collect()
}

pub fn attr<'a>(event: &'a Event, key: &str) -> Option<&'a Value> {
    event
        .attributes
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| &kv.value)
}

pub fn attr_keys(event: &Event) -> Vec<&str> {
    event.attributes.iter().map(|kv| kv.key.as_str()).collect()
}
