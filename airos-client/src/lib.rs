//! Management session client for Ubiquiti airOS devices.
//!
//! A [`Connector`] opens an authenticated [`DeviceSession`] to one device.
//! The session reads the device status as a [`StatusDocument`] and is closed
//! explicitly by the caller.
//!
//! - [`ssh`] - SSH implementation running the airOS status commands
//! - [`parse`] - Parsers for the command outputs
//! - [`fake`] - Scripted in-memory connector for tests

pub mod error;
pub mod fake;
pub mod parse;
pub mod ssh;

pub use airos_common::StatusDocument;
pub use error::SessionError;
pub use fake::{FakeConnector, FakeStats};
pub use ssh::{SshConnector, SshSession};

/// An open management session to one device.
pub trait DeviceSession {
    /// Read the current operational status.
    fn status(&mut self) -> Result<StatusDocument, SessionError>;

    /// Release the session.
    fn close(&mut self) -> Result<(), SessionError>;
}

/// Opens management sessions to devices.
pub trait Connector: Send + Sync {
    type Session: DeviceSession;

    /// Open an authenticated session to `hostname` using the shared secret.
    fn open(&self, hostname: &str, secret: &str) -> Result<Self::Session, SessionError>;
}
