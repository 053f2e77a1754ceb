//! HTTP server for the on-demand metrics endpoint.

use std::net::SocketAddr;

use axum::Router;
use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use chrono::{DateTime, Utc};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::encoder::CONTENT_TYPE;
use crate::pool::PoolHandle;

/// Body returned when a scrape names no device.
pub const NO_TARGET: &str = "No target parameter";

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    pool: PoolHandle,
}

/// Create the HTTP router.
///
/// The metrics endpoint answers any method on `metrics_path` with and
/// without a trailing slash. Anything else except `/health` is a bare 404.
pub fn create_router(pool: PoolHandle, metrics_path: &str) -> Router {
    let state = AppState { pool };
    let base = metrics_path.trim_end_matches('/');

    let mut router = Router::new().route(&format!("{}/", base), any(metrics_handler));
    if !base.is_empty() {
        router = router.route(base, any(metrics_handler));
    }

    router
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn(access_log))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// First non-empty `target` query parameter.
fn target_param(params: Vec<(String, String)>) -> Option<String> {
    params
        .into_iter()
        .find(|(key, value)| key == "target" && !value.is_empty())
        .map(|(_, value)| value)
}

/// Handler for the metrics endpoint.
async fn metrics_handler(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let Some(target) = target_param(params) else {
        return (StatusCode::INTERNAL_SERVER_ERROR, NO_TARGET).into_response();
    };

    match state.pool.scrape(target).await {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Scrape could not be served");
            (StatusCode::SERVICE_UNAVAILABLE, "scrape workers unavailable\n").into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Log every request in Common Log Format.
async fn access_log(request: Request, next: Next) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());
    let request_line = format!(
        "{} {} {:?}",
        request.method(),
        request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/"),
        request.version()
    );

    let response = next.run(request).await;

    let line = common_log_line(
        std::process::id(),
        &remote,
        Utc::now(),
        &request_line,
        response.status().as_u16(),
        response.body().size_hint().exact(),
    );
    info!("{}", line);

    response
}

/// Format one access log line.
pub fn common_log_line(
    pid: u32,
    remote: &str,
    time: DateTime<Utc>,
    request_line: &str,
    status: u16,
    size: Option<u64>,
) -> String {
    let size = size.map_or_else(|| "-".to_string(), |s| s.to_string());
    format!(
        "[{}] {} - - [{}] \"{}\" {} {}",
        pid,
        remote,
        time.format("%d/%b/%Y:%H:%M:%S %z"),
        request_line,
        status,
        size
    )
}

/// HTTP server configuration.
pub struct HttpServer {
    pool: PoolHandle,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl HttpServer {
    /// Create a new HTTP server.
    pub fn new(pool: PoolHandle, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            pool,
            listen_addr,
            metrics_path,
        }
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.pool, &self.metrics_path);
        let addr = listener.local_addr().unwrap_or(self.listen_addr);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            loop {
                if shutdown.changed().await.is_err() {
                    break;
                }
                if *shutdown.borrow() {
                    break;
                }
            }
            info!("HTTP server shutting down");
        })
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
