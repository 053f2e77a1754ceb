//! On-demand Prometheus exporter for Ubiquiti airOS radios.
//!
//! Each request to `/metrics?target=<host>` opens a management session to
//! the named device, reads its status and answers with device and
//! per-station metrics in Prometheus text format. Nothing is cached between
//! scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  job   ┌──────────────┐  SSH   ┌──────────────┐
//! │ HTTP server │──────> │ Worker pool  │──────> │ airOS device │
//! │  (/metrics) │ <──────│ (Exporter)   │ <──────│              │
//! └─────────────┘  text  └──────────────┘ status └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! airos-exporter --config config.json5
//! curl 'http://localhost:8890/metrics?target=10.0.0.1'
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod aggregator;
pub mod config;
pub mod demo;
pub mod encoder;
pub mod http;
pub mod mapper;
pub mod pool;
pub mod retry;
pub mod runner;
pub mod scope;

pub use aggregator::{Exporter, PollError};
pub use config::{ConfigError, ExporterConfig};
pub use http::HttpServer;
pub use pool::{PoolHandle, Scraper, WorkerPool};
pub use retry::{RetryPolicy, Sleeper, acquire_session};
pub use scope::{LabelSet, MetricScope};
