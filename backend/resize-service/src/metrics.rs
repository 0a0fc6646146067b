//! Pipeline metrics for observability

use prometheus::{Counter, CounterVec, Encoder, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use tracing::warn;

static METRICS: OnceLock<ResizeMetricsInner> = OnceLock::new();

struct ResizeMetricsInner {
    registry: Registry,
    jobs_created: Counter,
    pipeline_failures: CounterVec,
    budget_outcomes: CounterVec,
    batch_items: CounterVec,
}

impl ResizeMetricsInner {
    fn new() -> Self {
        let inner = Self {
            registry: Registry::new(),
            jobs_created: Counter::with_opts(Opts::new(
                "resize_jobs_created_total",
                "Total jobs registered in the ledger",
            ))
            .expect("valid metric definition"),
            pipeline_failures: CounterVec::new(
                Opts::new(
                    "resize_pipeline_failures_total",
                    "Total pipeline failures by stage",
                ),
                &["stage"],
            )
            .expect("valid metric definition"),
            budget_outcomes: CounterVec::new(
                Opts::new(
                    "resize_budget_outcomes_total",
                    "Total budgeted encodes by outcome",
                ),
                &["outcome"],
            )
            .expect("valid metric definition"),
            batch_items: CounterVec::new(
                Opts::new("resize_batch_items_total", "Total batch items by result"),
                &["result"],
            )
            .expect("valid metric definition"),
        };

        if let Err(e) = inner.register() {
            warn!(error = %e, "Failed to register resize metrics");
        }
        inner
    }

    fn register(&self) -> Result<(), prometheus::Error> {
        self.registry.register(Box::new(self.jobs_created.clone()))?;
        self.registry
            .register(Box::new(self.pipeline_failures.clone()))?;
        self.registry.register(Box::new(self.budget_outcomes.clone()))?;
        self.registry.register(Box::new(self.batch_items.clone()))?;
        Ok(())
    }
}

fn get_metrics() -> &'static ResizeMetricsInner {
    METRICS.get_or_init(ResizeMetricsInner::new)
}

pub fn record_job_created() {
    get_metrics().jobs_created.inc();
}

/// `stage` is one of `read`, `resize`, `upload`, `presign`.
pub fn record_pipeline_failure(stage: &str) {
    get_metrics()
        .pipeline_failures
        .with_label_values(&[stage])
        .inc();
}

/// `outcome` is a `BudgetOutcome` label (`fits` or `best_effort`).
pub fn record_budget_outcome(outcome: &str) {
    get_metrics()
        .budget_outcomes
        .with_label_values(&[outcome])
        .inc();
}

pub fn record_batch_item(succeeded: bool) {
    let result = if succeeded { "success" } else { "failure" };
    get_metrics().batch_items.with_label_values(&[result]).inc();
}

/// Prometheus text exposition of every registered metric
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&get_metrics().registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
