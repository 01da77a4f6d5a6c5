//! Prometheus metrics for the game server.
//!
//! Exposed in Prometheus text format when `METRICS_BIND` is set. Without an
//! installed exporter every recording call is a no-op.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cn_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::games_created_total();
//! ```

use codenames::hub::BroadcastReport;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Record an accepted WebSocket connection.
pub fn websocket_connection_opened() {
    metrics::counter!("websocket_connections_total").increment(1);
    metrics::gauge!("websocket_connections_active").increment(1.0);
}

/// Record the end of a WebSocket connection.
pub fn websocket_connection_closed() {
    metrics::gauge!("websocket_connections_active").decrement(1.0);
}

/// Record one snapshot fan-out.
pub fn broadcast(report: BroadcastReport) {
    metrics::counter!("broadcasts_total").increment(1);
    metrics::counter!("broadcast_deliveries_total").increment(report.delivered as u64);
    if report.dropped > 0 {
        metrics::counter!("slow_consumer_disconnects_total").increment(report.dropped as u64);
    }
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current live games count.
pub fn active_games(count: usize) {
    metrics::gauge!("active_games").set(count as f64);
}

pub fn games_created_total() {
    metrics::counter!("games_created_total").increment(1);
}

pub fn cards_revealed_total() {
    metrics::counter!("cards_revealed_total").increment(1);
}
