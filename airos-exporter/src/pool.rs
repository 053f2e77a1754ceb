//! Blocking scrape workers behind an async job queue.
//!
//! Device polls block on SSH I/O and retry sleeps, so they run on dedicated
//! OS threads instead of the async runtime. HTTP handlers submit a
//! [`ScrapeJob`] through a [`PoolHandle`] and await the reply.
//!
//! Workers are never restarted. When any of them exits, for a panic or
//! otherwise, [`WorkerPool::first_exit`] resolves and the caller is expected
//! to shut the whole process down.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use airos_client::Connector;

use crate::aggregator::Exporter;

/// Something that turns a target into an exposition payload.
pub trait Scraper: Send + Sync + 'static {
    fn scrape(&self, target: &str) -> Vec<u8>;
}

impl<C: Connector + 'static> Scraper for Exporter<C> {
    fn scrape(&self, target: &str) -> Vec<u8> {
        Exporter::scrape(self, target)
    }
}

/// Worker pool errors.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("scrape workers are gone")]
    Closed,
    #[error("scrape of {0} was dropped by its worker")]
    Dropped(String),
    #[error("failed to spawn scrape worker {id}: {source}")]
    Spawn {
        id: usize,
        #[source]
        source: std::io::Error,
    },
}

/// A queued scrape request.
#[derive(Debug)]
pub struct ScrapeJob {
    pub target: String,
    pub reply: oneshot::Sender<Vec<u8>>,
}

/// Report sent when a worker thread ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub id: usize,
    pub panicked: bool,
}

/// Sends a [`WorkerExit`] when the worker's stack unwinds or returns.
struct ExitNotice {
    id: usize,
    exits: mpsc::UnboundedSender<WorkerExit>,
}

impl Drop for ExitNotice {
    fn drop(&mut self) {
        let panicked = std::thread::panicking();
        if panicked {
            error!(worker = self.id, "Scrape worker panicked");
        } else {
            debug!(worker = self.id, "Scrape queue closed, worker exiting");
        }
        let _ = self.exits.send(WorkerExit {
            id: self.id,
            panicked,
        });
    }
}

/// Cloneable submission side of the pool.
#[derive(Debug, Clone)]
pub struct PoolHandle {
    jobs: mpsc::Sender<ScrapeJob>,
}

impl PoolHandle {
    /// Queue a scrape and wait for its payload.
    pub async fn scrape(&self, target: impl Into<String>) -> Result<Vec<u8>, PoolError> {
        let target = target.into();
        let (reply, response) = oneshot::channel();

        self.jobs
            .send(ScrapeJob {
                target: target.clone(),
                reply,
            })
            .await
            .map_err(|_| PoolError::Closed)?;

        response.await.map_err(|_| PoolError::Dropped(target))
    }
}

/// Fixed set of scrape worker threads.
pub struct WorkerPool {
    handle: PoolHandle,
    exits: mpsc::UnboundedReceiver<WorkerExit>,
    size: usize,
}

impl WorkerPool {
    /// Start `workers` threads sharing one queue of `queue_depth` jobs.
    pub fn spawn<S: Scraper>(
        scraper: Arc<S>,
        workers: usize,
        queue_depth: usize,
    ) -> Result<Self, PoolError> {
        let (jobs, queue) = mpsc::channel::<ScrapeJob>(queue_depth.max(1));
        let queue = Arc::new(Mutex::new(queue));
        let (exit_tx, exits) = mpsc::unbounded_channel();

        for id in 0..workers {
            let scraper = scraper.clone();
            let queue = queue.clone();
            let notice = ExitNotice {
                id,
                exits: exit_tx.clone(),
            };

            std::thread::Builder::new()
                .name(format!("scrape-worker-{}", id))
                .spawn(move || {
                    let _notice = notice;
                    worker_loop(id, scraper.as_ref(), &queue);
                })
                .map_err(|source| PoolError::Spawn { id, source })?;
        }

        info!(workers, queue_depth, "Scrape workers started");

        Ok(Self {
            handle: PoolHandle { jobs },
            exits,
            size: workers,
        })
    }

    /// A submission handle for request handlers.
    pub fn handle(&self) -> PoolHandle {
        self.handle.clone()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Wait until any worker exits.
    pub async fn first_exit(&mut self) -> Option<WorkerExit> {
        self.exits.recv().await
    }
}

fn worker_loop<S: Scraper + ?Sized>(
    id: usize,
    scraper: &S,
    queue: &Mutex<mpsc::Receiver<ScrapeJob>>,
) {
    debug!(worker = id, "Scrape worker ready");

    loop {
        let job = queue.lock().blocking_recv();
        let Some(job) = job else {
            break;
        };

        let body = scraper.scrape(&job.target);
        if job.reply.send(body).is_err() {
            debug!(worker = id, device = %job.target, "Requester went away before reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
    }

    impl Scraper for Echo {
        fn scrape(&self, target: &str) -> Vec<u8> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            format!("scraped {}\n", target).into_bytes()
        }
    }

    struct Explodes;

    impl Scraper for Explodes {
        fn scrape(&self, target: &str) -> Vec<u8> {
            if target == "boom" {
                panic!("worker blew up");
            }
            target.as_bytes().to_vec()
        }
    }

    #[tokio::test]
    async fn test_scrape_roundtrip() {
        let echo = Arc::new(Echo::default());
        let pool = WorkerPool::spawn(echo.clone(), 2, 4).unwrap();

        let body = pool.handle().scrape("radio-1").await.unwrap();

        assert_eq!(body, b"scraped radio-1\n");
        assert_eq!(echo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(pool.size(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_scrapes() {
        let echo = Arc::new(Echo::default());
        let pool = WorkerPool::spawn(echo.clone(), 3, 2).unwrap();
        let handle = pool.handle();

        let mut tasks = Vec::new();
        for i in 0..10 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.scrape(format!("radio-{}", i)).await
            }));
        }

        for (i, task) in tasks.into_iter().enumerate() {
            let body = task.await.unwrap().unwrap();
            assert_eq!(body, format!("scraped radio-{}\n", i).into_bytes());
        }
        assert_eq!(echo.calls.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_panicking_worker_reported() {
        let mut pool = WorkerPool::spawn(Arc::new(Explodes), 2, 4).unwrap();
        let handle = pool.handle();

        let result = handle.scrape("boom").await;
        assert!(matches!(result, Err(PoolError::Dropped(ref t)) if t == "boom"));

        let exit = tokio::time::timeout(Duration::from_secs(5), pool.first_exit())
            .await
            .unwrap()
            .unwrap();
        assert!(exit.panicked);
        assert!(exit.id < 2);
    }

    #[tokio::test]
    async fn test_workers_exit_when_handles_dropped() {
        let pool = WorkerPool::spawn(Arc::new(Echo::default()), 2, 4).unwrap();
        let WorkerPool {
            handle, mut exits, ..
        } = pool;
        drop(handle);

        let mut seen = Vec::new();
        while let Some(exit) = tokio::time::timeout(Duration::from_secs(5), exits.recv())
            .await
            .unwrap()
        {
            assert!(!exit.panicked);
            seen.push(exit.id);
        }
        seen.sort();
        assert_eq!(seen, vec![0, 1]);
    }
}
