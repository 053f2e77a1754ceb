//! Scripted in-memory connector.
//!
//! Used by tests and the demo mode to exercise the exporter without a radio.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use airos_common::StatusDocument;

use crate::error::SessionError;
use crate::{Connector, DeviceSession};

/// Call counters shared between a [`FakeConnector`] and its sessions.
#[derive(Debug, Default)]
pub struct FakeStats {
    opens: AtomicUsize,
    closes: AtomicUsize,
    status_reads: AtomicUsize,
    targets: Mutex<Vec<(String, String)>>,
}

impl FakeStats {
    /// Number of `open` calls, successful or not.
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of `close` calls.
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Number of `status` calls.
    pub fn status_reads(&self) -> usize {
        self.status_reads.load(Ordering::SeqCst)
    }

    /// `(hostname, secret)` pairs passed to `open`, in call order.
    pub fn targets(&self) -> Vec<(String, String)> {
        self.targets.lock().clone()
    }
}

/// Connector returning a fixed document after a scripted series of failures.
#[derive(Debug)]
pub struct FakeConnector {
    document: Result<StatusDocument, SessionError>,
    open_failures: Mutex<VecDeque<SessionError>>,
    stats: Arc<FakeStats>,
}

impl FakeConnector {
    /// Connector whose sessions return `document`.
    pub fn new(document: StatusDocument) -> Self {
        Self {
            document: Ok(document),
            open_failures: Mutex::new(VecDeque::new()),
            stats: Arc::new(FakeStats::default()),
        }
    }

    /// Connector whose sessions open but fail to read the status.
    pub fn failing_status(error: SessionError) -> Self {
        Self {
            document: Err(error),
            ..Self::new(StatusDocument::default())
        }
    }

    /// Fail the next `open` calls with these errors, in order.
    pub fn with_open_failures(self, failures: impl IntoIterator<Item = SessionError>) -> Self {
        self.open_failures.lock().extend(failures);
        self
    }

    /// Shared call counters.
    pub fn stats(&self) -> Arc<FakeStats> {
        self.stats.clone()
    }
}

impl Connector for FakeConnector {
    type Session = FakeSession;

    fn open(&self, hostname: &str, secret: &str) -> Result<FakeSession, SessionError> {
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        self.stats
            .targets
            .lock()
            .push((hostname.to_string(), secret.to_string()));

        if let Some(err) = self.open_failures.lock().pop_front() {
            return Err(err);
        }

        Ok(FakeSession {
            document: self.document.clone(),
            stats: self.stats.clone(),
        })
    }
}

/// Session handed out by [`FakeConnector`].
#[derive(Debug)]
pub struct FakeSession {
    document: Result<StatusDocument, SessionError>,
    stats: Arc<FakeStats>,
}

impl DeviceSession for FakeSession {
    fn status(&mut self) -> Result<StatusDocument, SessionError> {
        self.stats.status_reads.fetch_add(1, Ordering::SeqCst);
        self.document.clone()
    }

    fn close(&mut self) -> Result<(), SessionError> {
        self.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failures_then_success() {
        let connector = FakeConnector::new(StatusDocument::default()).with_open_failures([
            SessionError::transport("h", "reset"),
            SessionError::transport("h", "reset"),
        ]);

        assert!(connector.open("h", "s").is_err());
        assert!(connector.open("h", "s").is_err());
        let mut session = connector.open("h", "s").unwrap();
        assert!(session.status().is_ok());
        session.close().unwrap();

        let stats = connector.stats();
        assert_eq!(stats.opens(), 3);
        assert_eq!(stats.status_reads(), 1);
        assert_eq!(stats.closes(), 1);
        assert_eq!(stats.targets()[0], ("h".to_string(), "s".to_string()));
    }

    #[test]
    fn test_failing_status() {
        let connector = FakeConnector::failing_status(SessionError::Command {
            command: "wstalist".to_string(),
            status: 1,
        });
        let mut session = connector.open("h", "s").unwrap();
        assert!(matches!(
            session.status(),
            Err(SessionError::Command { status: 1, .. })
        ));
    }
}
