//! The metrics endpoint (spec.md §6). Registration and incrementing of
//! the named counters/gauges is ours to get right; rendering the
//! Prometheus text exposition format is explicitly out of scope (spec.md
//! §1) and left to the `prometheus` crate's own encoder.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use economy_core::config::MetricsConfig;
use prometheus::{CounterVec, GaugeVec, Encoder, Registry, TextEncoder};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    pub z_earned_total: CounterVec,
    pub z_spent_total: CounterVec,
    pub z_gambled_in_total: prometheus::Counter,
    pub z_gambled_out_total: prometheus::Counter,
    pub events_processed_total: CounterVec,
    pub commands_processed_total: CounterVec,
    pub trigger_hits_total: CounterVec,
    pub active_users: GaugeVec,
    pub total_circulation: GaugeVec,
    pub median_balance: GaugeVec,
    pub participation_rate: GaugeVec,
    pub active_multiplier: GaugeVec,
    pub rank_distribution: GaugeVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let z_earned_total = register_counter_vec(&registry, "economy_z_earned_total", "Z credited", &["trigger"]);
        let z_spent_total = register_counter_vec(&registry, "economy_z_spent_total", "Z debited", &["type"]);
        let z_gambled_in_total = register_counter(&registry, "economy_z_gambled_in_total", "Z wagered");
        let z_gambled_out_total = register_counter(&registry, "economy_z_gambled_out_total", "Z won back from gambling");
        let events_processed_total = register_counter_vec(&registry, "economy_events_processed_total", "broker events processed", &["type"]);
        let commands_processed_total = register_counter_vec(&registry, "economy_commands_processed_total", "PM commands processed", &["command"]);
        let trigger_hits_total = register_counter_vec(&registry, "economy_trigger_hits_total", "earning trigger hits", &["trigger"]);
        let active_users = register_gauge_vec(&registry, "economy_active_users", "currently connected users", &["channel"]);
        let total_circulation = register_gauge_vec(&registry, "economy_total_circulation", "total Z in circulation", &["channel"]);
        let median_balance = register_gauge_vec(&registry, "economy_median_balance", "median account balance", &["channel"]);
        let participation_rate = register_gauge_vec(&registry, "economy_participation_rate", "fraction of accounts active today", &["channel"]);
        let active_multiplier = register_gauge_vec(&registry, "economy_active_multiplier", "combined active multiplier", &["channel"]);
        let rank_distribution = register_gauge_vec(&registry, "economy_rank_distribution", "accounts per rank", &["channel", "rank"]);

        Self {
            registry,
            z_earned_total,
            z_spent_total,
            z_gambled_in_total,
            z_gambled_out_total,
            events_processed_total,
            commands_processed_total,
            trigger_hits_total,
            active_users,
            total_circulation,
            median_balance,
            participation_rate,
            active_multiplier,
            rank_distribution,
        }
    }

    fn render(&self) -> String {
        let families = self.registry.gather();
        let mut buf = Vec::new();
        TextEncoder::new().encode(&families, &mut buf).expect("prometheus encoding never fails on owned buffers");
        String::from_utf8(buf).expect("prometheus text output is always valid utf-8")
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

fn register_counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let vec = CounterVec::new(prometheus::Opts::new(name, help), labels).expect("static metric definition");
    registry.register(Box::new(vec.clone())).expect("metric name is unique");
    vec
}

fn register_gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    let vec = GaugeVec::new(prometheus::Opts::new(name, help), labels).expect("static metric definition");
    registry.register(Box::new(vec.clone())).expect("metric name is unique");
    vec
}

fn register_counter(registry: &Registry, name: &str, help: &str) -> prometheus::Counter {
    let counter = prometheus::Counter::new(name, help).expect("static metric definition");
    registry.register(Box::new(counter.clone())).expect("metric name is unique");
    counter
}

async fn serve_metrics(State(metrics): State<Arc<Metrics>>) -> impl IntoResponse {
    ([("content-type", "text/plain; version=0.0.4")], metrics.render())
}

/// Spawns the metrics HTTP server as a background task; returns its
/// `JoinHandle` so the orchestrator can track it alongside the rest.
pub fn spawn(metrics: Arc<Metrics>, config: &MetricsConfig) -> tokio::task::JoinHandle<()> {
    let path = config.path.clone();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = Router::new().route(&path, get(serve_metrics)).with_state(metrics);

    tokio::spawn(async move {
        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                if let Err(error) = axum::serve(listener, app).await {
                    tracing::warn!(%error, "metrics server stopped");
                }
            }
            Err(error) => tracing::warn!(%error, %addr, "failed to bind metrics server"),
        }
    })
}
