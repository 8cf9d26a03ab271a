//! Socket seam for the dynamic-profiling client.

use std::io::{self, Read, Write};
use std::os::linux::net::SocketAddrExt;
use std::os::unix::net::{SocketAddr, UnixStream};
use std::time::Duration;

/// Byte transport to the dynamic-profiling server.
pub trait Transport: Send {
    /// # Errors
    /// Socket failure or timeout.
    fn send(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Fill `buf` completely.
    ///
    /// # Errors
    /// Socket failure, timeout, or the peer closing early.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<()>;

    /// Apply `timeout` to subsequent sends and receives.
    ///
    /// # Errors
    /// The socket rejected the option.
    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

pub trait Connector: Send + Sync {
    /// # Errors
    /// No server is listening on `name`.
    fn connect(&self, name: &str) -> io::Result<Box<dyn Transport>>;
}

/// Abstract-namespace Unix socket connector.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixConnector;

impl Connector for UnixConnector {
    fn connect(&self, name: &str) -> io::Result<Box<dyn Transport>> {
        let addr = SocketAddr::from_abstract_name(name.as_bytes())?;
        let stream = UnixStream::connect_addr(&addr)?;
        Ok(Box::new(UnixTransport(stream)))
    }
}

struct UnixTransport(UnixStream);

impl Transport for UnixTransport {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.0.read_exact(buf)
    }

    fn set_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.0.set_read_timeout(Some(timeout))?;
        self.0.set_write_timeout(Some(timeout))
    }
}
