//! Prometheus metrics (feature `metrics`) and tracing span helpers (feature `tracing`).

#[cfg(feature = "metrics")]
pub use self::prometheus_metrics::*;

#[cfg(feature = "metrics")]
mod prometheus_metrics {
    use once_cell::sync::Lazy;
    use opentelemetry::{
        global,
        metrics::{Counter, Histogram, MeterProvider as _},
    };
    use opentelemetry_prometheus::PrometheusExporter;
    use opentelemetry_sdk::metrics::SdkMeterProvider;
    use std::time::Duration;

    pub static METRICS: Lazy<OutletMetrics> = Lazy::new(OutletMetrics::init);

    pub struct OutletMetrics {
        pub provider: SdkMeterProvider,
        pub queries_total: Counter<u64>,
        pub query_errors_total: Counter<u64>,
        pub query_duration: Histogram<f64>,
        pub pool_wait_duration: Histogram<f64>,
        pub products_projected: Counter<u64>,
        pub http_requests_total: Counter<u64>,
    }

    impl OutletMetrics {
        pub fn init() -> Self {
            let exporter: PrometheusExporter = opentelemetry_prometheus::exporter()
                .with_registry(prometheus::default_registry().clone())
                .build()
                .expect("failed to build prometheus exporter");
            let provider = SdkMeterProvider::builder().with_reader(exporter).build();
            global::set_meter_provider(provider.clone());
            let meter = provider.meter("outlet");

            let queries_total = meter
                .u64_counter("outlet_queries_total")
                .with_description("Total store queries executed")
                .build();

            let query_errors_total = meter
                .u64_counter("outlet_query_errors_total")
                .with_description("Store queries that returned an error")
                .build();

            let query_duration = meter
                .f64_histogram("outlet_query_duration_seconds")
                .with_description("Duration of store queries")
                .build();

            let pool_wait_duration = meter
                .f64_histogram("outlet_pool_wait_seconds")
                .with_description("Time spent waiting for a pooled connection")
                .build();

            let products_projected = meter
                .u64_counter("outlet_products_projected_total")
                .with_description("Products emitted by the catalog projector")
                .build();

            let http_requests_total = meter
                .u64_counter("outlet_http_requests_total")
                .with_description("HTTP requests served")
                .build();

            Self {
                provider,
                queries_total,
                query_errors_total,
                query_duration,
                pool_wait_duration,
                products_projected,
                http_requests_total,
            }
        }

        pub fn record_query_duration(&self, elapsed: Duration) {
            self.queries_total.add(1, &[]);
            self.query_duration.record(elapsed.as_secs_f64(), &[]);
        }

        pub fn record_query_error(&self) {
            self.query_errors_total.add(1, &[]);
        }

        pub fn record_pool_wait(&self, waited: Duration) {
            self.pool_wait_duration.record(waited.as_secs_f64(), &[]);
        }

        pub fn record_projection(&self, products: usize) {
            self.products_projected.add(products as u64, &[]);
        }

        pub fn record_http_request(&self) {
            self.http_requests_total.add(1, &[]);
        }
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn render() -> Vec<u8> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            log::error!("failed to encode metrics: {e}");
        }
        buffer
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::{info_span, Span};

    pub fn acquire_connection_span() -> Span {
        info_span!("outlet.acquire_connection")
    }

    pub fn execute_query_span(query: &str) -> Span {
        info_span!("outlet.execute_query", db.statement = %query)
    }

    pub fn begin_transaction_span() -> Span {
        info_span!("outlet.begin_transaction")
    }

    pub fn commit_transaction_span() -> Span {
        info_span!("outlet.commit_transaction")
    }

    pub fn rollback_transaction_span() -> Span {
        info_span!("outlet.rollback_transaction")
    }

    pub fn project_span(rows: usize) -> Span {
        info_span!("outlet.project", rows)
    }
}
