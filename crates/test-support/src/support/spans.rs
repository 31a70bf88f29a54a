//! Tracer provider backed by an in-memory exporter.

use opentelemetry::Context;
use opentelemetry::trace::{TraceContextExt, Tracer as _, TracerProvider as _};
use opentelemetry_sdk::export::trace::SpanData;
use opentelemetry_sdk::testing::trace::InMemorySpanExporter;
use opentelemetry_sdk::trace::{Config, Sampler, Tracer, TracerProvider};
use std::borrow::Cow;

/// Starts spans on a private provider and collects them once ended.
pub struct SpanHarness {
    provider: TracerProvider,
    exporter: InMemorySpanExporter,
    tracer: Tracer,
}

impl Default for SpanHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanHarness {
    /// Every span is sampled and recording.
    pub fn new() -> Self {
        Self::with_sampler(Sampler::AlwaysOn)
    }

    /// Spans are created but never recording.
    pub fn unsampled() -> Self {
        Self::with_sampler(Sampler::AlwaysOff)
    }

    fn with_sampler(sampler: Sampler) -> Self {
        let exporter = InMemorySpanExporter::default();
        let provider = TracerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .with_config(Config::default().with_sampler(sampler))
            .build();
        let tracer = provider.tracer("pocker-test");
        Self {
            provider,
            exporter,
            tracer,
        }
    }

    /// A fresh context holding a newly started span.
    pub fn start(&self, name: impl Into<Cow<'static, str>>) -> Context {
        Context::new().with_span(self.tracer.start(name))
    }

    /// Ends the span of `cx` and returns its exported data.
    pub fn finish(&self, cx: &Context) -> SpanData {
        let span = cx.span();
        let span_id = span.span_context().span_id();
        span.end();
        self.finished()
            .into_iter()
            .find(|data| data.span_context.span_id() == span_id)
            .expect("span was not exported; was it sampled?")
    }

    pub fn finished(&self) -> Vec<SpanData> {
        self.exporter
            .get_finished_spans()
            .expect("in-memory exporter is readable")
    }

    pub fn provider(&self) -> &TracerProvider {
        &self.provider
    }
}
