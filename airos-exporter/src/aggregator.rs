//! One scrape of one device, start to finish.
//!
//! The [`Exporter`] opens a session with retry, reads the status document,
//! maps it into the device scope and one scope per remote station, and
//! encodes the result. Any failure along the way replaces everything that
//! was gathered with a single `airos_error 1` scope.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use airos_client::{Connector, DeviceSession, SessionError, StatusDocument};
use airos_common::FieldError;

use crate::encoder::encode_scopes;
use crate::mapper::{ERROR_HELP, ERROR_METRIC, device_labels, error_scope, map_device, map_remote};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};
use crate::scope::MetricScope;

/// Why a poll produced no metrics.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Closes the wrapped session exactly once, whichever way the poll ends.
struct SessionGuard<'a, S: DeviceSession> {
    target: &'a str,
    session: S,
}

impl<'a, S: DeviceSession> SessionGuard<'a, S> {
    fn new(target: &'a str, session: S) -> Self {
        Self { target, session }
    }

    fn status(&mut self) -> Result<StatusDocument, SessionError> {
        self.session.status()
    }
}

impl<S: DeviceSession> Drop for SessionGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.session.close() {
            debug!(device = %self.target, error = %e, "Session close failed");
        }
    }
}

/// Polls devices through a connector.
pub struct Exporter<C: Connector> {
    connector: C,
    secret: String,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: Connector> Exporter<C> {
    /// Create an exporter using `secret` for every device.
    pub fn new(connector: C, secret: impl Into<String>) -> Self {
        Self {
            connector,
            secret: secret.into(),
            policy: RetryPolicy::default(),
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Poll `target` and return its scopes, or the failure scope.
    pub fn collect(&self, target: &str) -> Vec<MetricScope> {
        match self.poll(target) {
            Ok(scopes) => scopes,
            Err(e) => {
                warn!(device = %target, error = %e, "Poll failed");
                vec![error_scope(&e.to_string())]
            }
        }
    }

    /// Poll `target` and encode the result as exposition text.
    pub fn scrape(&self, target: &str) -> Vec<u8> {
        let start = Instant::now();
        let scopes = self.collect(target);
        let body = encode_scopes(&scopes);

        info!(
            device = %target,
            scopes = scopes.len(),
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scrape complete"
        );
        body
    }

    fn poll(&self, target: &str) -> Result<Vec<MetricScope>, PollError> {
        let session = self.policy.acquire_session(
            &self.connector,
            target,
            &self.secret,
            self.sleeper.as_ref(),
        )?;
        let mut guard = SessionGuard::new(target, session);
        let doc = guard.status()?;

        let labels = device_labels(&doc);
        let mut device = map_device(&doc, &labels)?;
        device.gauge(ERROR_METRIC, ERROR_HELP, 0.0);

        let mut scopes = Vec::with_capacity(1 + doc.station_count());
        scopes.push(device);
        scopes.extend(doc.stations().map(|station| map_remote(station, &labels)));

        debug!(device = %target, stations = doc.station_count(), "Status mapped");
        Ok(scopes)
    }
}
