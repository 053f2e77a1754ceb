//! SSH session to an airOS device.

use std::io::Read;
use std::net::{IpAddr, SocketAddr, TcpStream};

use ssh2::{ErrorCode, Session};
use tracing::{debug, trace};

use airos_common::StatusDocument;

use crate::error::SessionError;
use crate::parse::{
    MCA_STATUS, STATUS_CGI, WSTALIST, parse_mca_status, parse_status_cgi, parse_wstalist,
};
use crate::{Connector, DeviceSession};

/// libssh2 `LIBSSH2_ERROR_AUTHENTICATION_FAILED`.
const AUTHENTICATION_FAILED: i32 = -18;

/// Opens SSH sessions with password authentication.
#[derive(Debug, Clone)]
pub struct SshConnector {
    username: String,
    port: u16,
}

impl SshConnector {
    /// Create a connector logging in as `username` on `port` unless the
    /// target names its own port.
    pub fn new(username: impl Into<String>, port: u16) -> Self {
        Self {
            username: username.into(),
            port,
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new("ubnt", 22)
    }
}

fn transport<E: std::fmt::Display>(host: &str) -> impl FnOnce(E) -> SessionError + '_ {
    move |e| SessionError::transport(host, e.to_string())
}

/// Split a scrape target into host and port.
///
/// Accepts `host`, `host:port`, a bare IP address or `[v6]:port`.
pub fn split_target(target: &str, default_port: u16) -> (String, u16) {
    if let Ok(addr) = target.parse::<SocketAddr>() {
        return (addr.ip().to_string(), addr.port());
    }
    if let Ok(ip) = target.parse::<IpAddr>() {
        return (ip.to_string(), default_port);
    }
    if let Some((host, port)) = target.rsplit_once(':') {
        if let Ok(port) = port.parse() {
            return (host.to_string(), port);
        }
    }
    (target.to_string(), default_port)
}

impl Connector for SshConnector {
    type Session = SshSession;

    fn open(&self, hostname: &str, secret: &str) -> Result<SshSession, SessionError> {
        let (host, port) = split_target(hostname, self.port);
        debug!(host = %host, port, user = %self.username, "Opening SSH session");

        let tcp = TcpStream::connect((host.as_str(), port)).map_err(transport(hostname))?;
        let mut session = Session::new().map_err(transport(hostname))?;
        session.set_tcp_stream(tcp);
        session.handshake().map_err(transport(hostname))?;

        match session.userauth_password(&self.username, secret) {
            Ok(()) if session.authenticated() => {}
            Ok(()) => {
                return Err(SessionError::Auth {
                    host: hostname.to_string(),
                    user: self.username.clone(),
                });
            }
            Err(e) if matches!(e.code(), ErrorCode::Session(AUTHENTICATION_FAILED)) => {
                return Err(SessionError::Auth {
                    host: hostname.to_string(),
                    user: self.username.clone(),
                });
            }
            Err(e) => return Err(transport(hostname)(e)),
        }

        Ok(SshSession {
            host: hostname.to_string(),
            session,
        })
    }
}

/// Authenticated SSH session to one device.
pub struct SshSession {
    host: String,
    session: Session,
}

impl SshSession {
    /// Run a command and return its standard output.
    fn exec(&self, command: &str) -> Result<String, SessionError> {
        let mut channel = self.session.channel_session().map_err(transport(&self.host))?;
        channel.exec(command).map_err(transport(&self.host))?;

        let mut output = String::new();
        channel
            .read_to_string(&mut output)
            .map_err(transport(&self.host))?;
        channel.wait_close().map_err(transport(&self.host))?;

        let status = channel.exit_status().map_err(transport(&self.host))?;
        if status != 0 {
            return Err(SessionError::Command {
                command: command.to_string(),
                status,
            });
        }

        trace!(host = %self.host, command, bytes = output.len(), "Command completed");
        Ok(output)
    }
}

impl DeviceSession for SshSession {
    fn status(&mut self) -> Result<StatusDocument, SessionError> {
        let mca_status = parse_mca_status(&self.exec(MCA_STATUS)?)?;
        let status = parse_status_cgi(&self.exec(STATUS_CGI)?)?;
        let stations = parse_wstalist(&self.exec(WSTALIST)?)?;

        Ok(StatusDocument::new(mca_status, status, stations))
    }

    fn close(&mut self) -> Result<(), SessionError> {
        debug!(host = %self.host, "Closing SSH session");
        self.session
            .disconnect(None, "scrape complete", None)
            .map_err(transport(&self.host))
    }
}
