//! Process lifecycle: start workers and the HTTP server, then supervise.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{error, info, warn};

use airos_client::Connector;

use crate::aggregator::Exporter;
use crate::config::ExporterConfig;
use crate::http::HttpServer;
use crate::pool::WorkerPool;
use crate::retry::RetryPolicy;

/// Why the exporter stopped.
#[derive(Debug, Clone, Copy)]
enum Stop {
    Signal(&'static str),
    WorkerExited(Option<usize>),
}

/// Run the exporter until a signal arrives or a scrape worker dies.
///
/// Returns an error when a worker exited, so the process ends non-zero.
pub async fn run<C: Connector + 'static>(
    config: ExporterConfig,
    connector: C,
) -> anyhow::Result<()> {
    let listen_addr = config.http.socket_addr()?;

    let exporter = Exporter::new(connector, config.device.password.clone())
        .with_retry_policy(RetryPolicy::from(&config.retry));
    let mut pool = WorkerPool::spawn(
        Arc::new(exporter),
        config.workers.count,
        config.workers.queue_depth,
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(pool.handle(), listen_addr, config.http.path.clone());
    let mut http_task = tokio::spawn(http_server.run(shutdown_rx));

    let stop = tokio::select! {
        _ = tokio::signal::ctrl_c() => Stop::Signal("Ctrl+C"),
        _ = terminate() => Stop::Signal("SIGTERM"),
        exit = pool.first_exit() => Stop::WorkerExited(exit.map(|e| e.id)),
        result = &mut http_task => {
            // The server only returns early on a bind or accept failure.
            return match result {
                Ok(outcome) => outcome,
                Err(e) => Err(e.into()),
            };
        }
    };

    match stop {
        Stop::Signal(name) => info!("Received {}, shutting down...", name),
        Stop::WorkerExited(id) => error!(worker = ?id, "Scrape worker exited, shutting down"),
    }

    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(Duration::from_secs(5), http_task)
        .await
        .is_err()
    {
        warn!("HTTP server did not stop within 5s");
    }

    info!(workers = pool.size(), "Exporter stopped");

    match stop {
        Stop::Signal(_) => Ok(()),
        Stop::WorkerExited(Some(id)) => Err(anyhow::anyhow!("scrape worker {} exited", id)),
        Stop::WorkerExited(None) => Err(anyhow::anyhow!("scrape workers exited")),
    }
}

async fn terminate() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airos_client::SessionError;
    use airos_client::fake::FakeSession;
    use std::net::SocketAddr;
    use tokio::net::TcpStream;

    /// Connector whose session stack crashes the worker.
    struct Crashing;

    impl Connector for Crashing {
        type Session = FakeSession;

        fn open(&self, _hostname: &str, _secret: &str) -> Result<FakeSession, SessionError> {
            panic!("session stack crashed");
        }
    }

    fn free_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    async fn wait_until_listening(addr: SocketAddr) {
        for _ in 0..100 {
            if TcpStream::connect(addr).await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("server never listened on {}", addr);
    }

    #[tokio::test]
    async fn test_worker_exit_stops_server_with_error() {
        let port = free_port();
        let addr: SocketAddr = ([127, 0, 0, 1], port).into();

        let mut config = ExporterConfig::default();
        config.http.listen = "127.0.0.1".to_string();
        config.http.port = port;
        config.workers.count = 2;

        let task = tokio::spawn(run(config, Crashing));
        wait_until_listening(addr).await;

        let client = reqwest::Client::new();
        let _ = client
            .get(format!("http://{}/metrics?target=radio", addr))
            .send()
            .await;
        drop(client);

        let result = tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .unwrap()
            .unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("scrape worker"));
        assert!(TcpStream::connect(addr).await.is_err());
    }
}
