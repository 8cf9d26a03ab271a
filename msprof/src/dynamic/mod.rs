//! Dynamic profiling
//!
//! Start and stop collection inside an already running application over a
//! local socket. The wire format lives in `msprof-common`.

pub mod client;
pub mod manager;
pub mod transport;

pub use client::{spawn_stdin_reader, Command, ConnectPolicy, DynProfClient};
pub use manager::DynProfManager;
pub use transport::{Connector, Transport, UnixConnector};
