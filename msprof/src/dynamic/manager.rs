//! Dynamic-profiling session manager
//!
//! Owns the client thread and the session state shared between the main
//! control thread and that thread. All state sits behind one mutex; the
//! client thread signals completion by dropping its end of a channel.

use super::client::{ConnectPolicy, DynProfClient};
use super::transport::Connector;
use crate::cancel::{CancelToken, POLL_INTERVAL};
use crate::domain::DynamicError;
use crate::params::ProfileParams;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{info, warn};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

#[derive(Default)]
struct SessionState {
    enabled: bool,
    app_mode: bool,
    key_pid: u32,
    stop_tx: Option<Sender<()>>,
    done_rx: Option<Receiver<()>>,
    handle: Option<JoinHandle<()>>,
}

pub struct DynProfManager {
    connector: Arc<dyn Connector>,
    state: Mutex<SessionState>,
}

impl DynProfManager {
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector, state: Mutex::new(SessionState::default()) }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        // A panicking client thread leaves the state usable
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Enable the session from validated parameters. Attach mode keys the
    /// server by `--pid`; app mode keys it by this process.
    pub fn configure(&self, params: &ProfileParams, self_pid: u32) {
        let mut state = self.state();
        state.enabled = params.dynamic;
        if !params.dynamic {
            return;
        }
        match params.dynamic_pid {
            Some(pid) => {
                state.app_mode = false;
                state.key_pid = pid;
            }
            None => {
                state.app_mode = true;
                state.key_pid = self_pid;
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    #[must_use]
    pub fn is_app_mode(&self) -> bool {
        self.state().app_mode
    }

    #[must_use]
    pub fn key_pid(&self) -> u32 {
        self.state().key_pid
    }

    /// Handshake with the server, then run the command loop on its own
    /// thread, reading commands from `lines` and reporting to `out`.
    ///
    /// # Errors
    /// Session not enabled or already running, or the handshake failed.
    pub fn start_client(
        &self,
        blob: &str,
        cancel: &CancelToken,
        lines: Receiver<String>,
        mut out: Box<dyn Write + Send>,
    ) -> Result<(), DynamicError> {
        let (app_mode, key_pid) = {
            let state = self.state();
            if !state.enabled {
                return Err(DynamicError::NotEnabled);
            }
            if state.handle.is_some() {
                return Err(DynamicError::AlreadyRunning);
            }
            (state.app_mode, state.key_pid)
        };
        let policy = if app_mode { ConnectPolicy::app_mode() } else { ConnectPolicy::Once };
        let client = DynProfClient::connect(self.connector.as_ref(), key_pid, blob, policy, cancel)?;

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let (done_tx, done_rx) = bounded::<()>(0);
        let handle = std::thread::Builder::new().name("dynprof-client".to_string()).spawn(move || {
            client.run(&lines, &stop_rx, out.as_mut());
            drop(done_tx);
        })?;

        let mut state = self.state();
        state.stop_tx = Some(stop_tx);
        state.done_rx = Some(done_rx);
        state.handle = Some(handle);
        info!("dynamic profiling client connected to pid {key_pid}");
        Ok(())
    }

    /// Block until the client loop ends, or until `cancel` fires, in which
    /// case the client is told to quit.
    pub fn wait_quit(&self, cancel: &CancelToken) {
        let Some(done_rx) = self.state().done_rx.clone() else {
            return;
        };
        loop {
            match done_rx.recv_timeout(POLL_INTERVAL) {
                Err(RecvTimeoutError::Timeout) if !cancel.is_cancelled() => {}
                _ => break,
            }
        }
        self.stop_client();
    }

    /// Tell the client to quit and join it. Idempotent.
    pub fn stop_client(&self) {
        let (stop_tx, handle) = {
            let mut state = self.state();
            state.done_rx = None;
            (state.stop_tx.take(), state.handle.take())
        };
        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("dynamic profiling client thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::transport::Transport;
    use msprof_common::{CommandMsg, MsgType, RspCode, CMD_MSG_LEN};
    use std::io;
    use std::time::Duration;

    /// Answers each request with `request + 1` and success.
    struct Echo {
        last: Option<MsgType>,
    }

    impl Transport for Echo {
        fn send(&mut self, buf: &[u8]) -> io::Result<()> {
            let raw = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
            self.last = MsgType::from_u32(raw);
            Ok(())
        }
        fn recv(&mut self, buf: &mut [u8]) -> io::Result<()> {
            let request = self.last.take().ok_or_else(|| io::Error::other("no request"))?;
            let response = request.response().ok_or_else(|| io::Error::other("not a request"))?;
            let msg: [u8; CMD_MSG_LEN] = CommandMsg { msg_type: response, code: RspCode::Success }.encode();
            buf.copy_from_slice(&msg);
            Ok(())
        }
        fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
            Ok(())
        }
    }

    struct EchoConnector;

    impl Connector for EchoConnector {
        fn connect(&self, _name: &str) -> io::Result<Box<dyn Transport>> {
            Ok(Box::new(Echo { last: None }))
        }
    }

    #[test]
    fn test_configure_key_pid() {
        let mgr = DynProfManager::new(Arc::new(EchoConnector));
        let attach = ProfileParams { dynamic: true, dynamic_pid: Some(77), ..Default::default() };
        mgr.configure(&attach, 5);
        assert!(mgr.is_enabled());
        assert!(!mgr.is_app_mode());
        assert_eq!(mgr.key_pid(), 77);

        let app = ProfileParams { dynamic: true, ..Default::default() };
        mgr.configure(&app, 5);
        assert!(mgr.is_app_mode());
        assert_eq!(mgr.key_pid(), 5);
    }

    #[test]
    fn test_disabled_manager_refuses_start() {
        let mgr = DynProfManager::new(Arc::new(EchoConnector));
        let (_tx, rx) = crossbeam_channel::unbounded();
        let err = mgr.start_client("{}", &CancelToken::new(), rx, Box::new(io::sink())).unwrap_err();
        assert!(matches!(err, DynamicError::NotEnabled));
    }

    #[test]
    fn test_quit_command_ends_wait() {
        let mgr = DynProfManager::new(Arc::new(EchoConnector));
        mgr.configure(&ProfileParams { dynamic: true, dynamic_pid: Some(1), ..Default::default() }, 2);
        let (tx, rx) = crossbeam_channel::unbounded();
        mgr.start_client("{}", &CancelToken::new(), rx, Box::new(io::sink())).unwrap();
        tx.send("start\n".to_string()).unwrap();
        tx.send("quit\n".to_string()).unwrap();
        mgr.wait_quit(&CancelToken::new());
        // Client state is released; a second stop is a no-op
        mgr.stop_client();
    }

    #[test]
    fn test_cancel_ends_wait() {
        let mgr = DynProfManager::new(Arc::new(EchoConnector));
        mgr.configure(&ProfileParams { dynamic: true, dynamic_pid: Some(1), ..Default::default() }, 2);
        let (_tx, rx) = crossbeam_channel::unbounded();
        mgr.start_client("{}", &CancelToken::new(), rx, Box::new(io::sink())).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        mgr.wait_quit(&cancel);
    }
}
