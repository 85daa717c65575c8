//! Metrics collection for observability

use prometheus::{
    CounterVec, Histogram, HistogramVec, IntCounter, Opts, Registry,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_histogram_with_registry, register_int_counter_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Conversation metrics
    pub turns: IntCounter,
    pub truncation_evictions: CounterVec,
    pub compactions: CounterVec,
    pub buffer_messages: Histogram,

    // Backend metrics
    pub llm_requests: CounterVec,
    pub llm_request_duration: HistogramVec,

    // Extraction metrics
    pub extractions: CounterVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let turns = register_int_counter_with_registry!(
            Opts::new("conversation_turns_total", "Total user turns processed"),
            registry
        )?;

        let truncation_evictions = register_counter_vec_with_registry!(
            Opts::new(
                "conversation_truncation_evictions_total",
                "Messages evicted by the truncation cascade"
            ),
            &["stage"],
            registry
        )?;

        let compactions = register_counter_vec_with_registry!(
            Opts::new("conversation_compactions_total", "Compaction attempts by outcome"),
            &["outcome"],
            registry
        )?;

        let buffer_messages = register_histogram_with_registry!(
            "conversation_buffer_messages",
            "Buffered messages after each turn",
            vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0],
            registry
        )?;

        let llm_requests = register_counter_vec_with_registry!(
            Opts::new("llm_requests_total", "Total backend requests"),
            &["operation", "status"],
            registry
        )?;

        let llm_request_duration = register_histogram_vec_with_registry!(
            "llm_request_duration_seconds",
            "Backend request duration in seconds",
            &["operation"],
            registry
        )?;

        let extractions = register_counter_vec_with_registry!(
            Opts::new("extraction_requests_total", "Total extraction requests"),
            &["status"],
            registry
        )?;

        Ok(Self {
            registry,
            turns,
            truncation_evictions,
            compactions,
            buffer_messages,
            llm_requests,
            llm_request_duration,
            extractions,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a completed user turn and the resulting buffer size
    pub fn record_turn(&self, buffered: usize) {
        self.turns.inc();
        self.buffer_messages.observe(buffered as f64);
    }

    /// Record evictions from one truncation stage
    pub fn record_truncation(&self, stage: &str, removed: usize) {
        if removed > 0 {
            self.truncation_evictions
                .with_label_values(&[stage])
                .inc_by(removed as f64);
        }
    }

    /// Record a compaction attempt
    pub fn record_compaction(&self, outcome: &str) {
        self.compactions.with_label_values(&[outcome]).inc();
    }

    /// Record a backend request
    pub fn record_llm_request(&self, operation: &str, success: bool, seconds: f64) {
        let status = if success { "success" } else { "error" };
        self.llm_requests.with_label_values(&[operation, status]).inc();
        self.llm_request_duration
            .with_label_values(&[operation])
            .observe(seconds);
    }

    /// Record an extraction request
    pub fn record_extraction(&self, success: bool) {
        let status = if success { "success" } else { "fallback" };
        self.extractions.with_label_values(&[status]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}
