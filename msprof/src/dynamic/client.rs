//! Dynamic-profiling client
//!
//! Sends the parameter blob once at connect time, then turns single-word
//! commands read from the operator into fixed-size request/response
//! exchanges with the server inside the profiled process.

use super::transport::{Connector, Transport};
use crate::cancel::CancelToken;
use crate::domain::DynamicError;
use crossbeam_channel::{select, Receiver};
use log::{debug, warn};
use msprof_common::{socket_name, CommandMsg, MsgType, ParamsMsg, RspCode, CMD_MSG_LEN};
use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Timeout for the parameter handshake exchange.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for each command exchange.
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(3);
/// Connect retry interval while a launched app brings up its server.
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);
/// Connect retry ceiling in app mode.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const USAGE: &str = "\
Dynamic profiling commands:
    start      start collecting data
    stop       stop collecting data
    quit, q    stop collecting data and quit
    help, h    show this help";

/// How hard to try reaching the server.
#[derive(Debug, Clone, Copy)]
pub enum ConnectPolicy {
    /// The server may not be up yet; retry until `ceiling` elapses.
    Retry { interval: Duration, ceiling: Duration },
    /// The server must already be listening.
    Once,
}

impl ConnectPolicy {
    #[must_use]
    pub fn app_mode() -> Self {
        ConnectPolicy::Retry { interval: CONNECT_RETRY_INTERVAL, ceiling: CONNECT_TIMEOUT }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Quit,
    Help,
}

impl Command {
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        Some(match word {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "quit" | "q" => Command::Quit,
            "help" | "h" => Command::Help,
            _ => return None,
        })
    }
}

/// Whether the command loop continues after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct DynProfClient {
    transport: Box<dyn Transport>,
}

impl std::fmt::Debug for DynProfClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynProfClient").finish_non_exhaustive()
    }
}

impl DynProfClient {
    /// Connect to the server for `key_pid` and hand it `blob`.
    ///
    /// The blob length is checked before anything touches the socket.
    ///
    /// # Errors
    /// Oversized blob, no server within the policy, socket failure, a
    /// mismatched response, or a non-success handshake code.
    pub fn connect(
        connector: &dyn Connector,
        key_pid: u32,
        blob: &str,
        policy: ConnectPolicy,
        cancel: &CancelToken,
    ) -> Result<Self, DynamicError> {
        ParamsMsg::check_len(blob.len())?;
        let name = socket_name(key_pid);
        let mut transport = connect_with_policy(connector, &name, policy, cancel)?;

        transport.set_timeout(HANDSHAKE_TIMEOUT)?;
        transport.send(&ParamsMsg::encode(blob.as_bytes())?)?;
        let code = recv_response(transport.as_mut(), MsgType::ParamsReq)?;
        if code != RspCode::Success {
            return Err(DynamicError::ParamsRejected(code));
        }
        transport.set_timeout(COMMAND_TIMEOUT)?;
        debug!("dynamic profiling handshake with {name} done");
        Ok(Self { transport })
    }

    /// One request/response exchange.
    ///
    /// # Errors
    /// Socket failure or a response that does not answer `request`.
    pub fn exchange(&mut self, request: MsgType) -> Result<RspCode, DynamicError> {
        self.transport.send(&CommandMsg::request(request).encode())?;
        recv_response(self.transport.as_mut(), request)
    }

    /// Execute one command, reporting to `out`.
    pub fn execute(&mut self, cmd: Command, out: &mut dyn Write) -> Flow {
        let request = match cmd {
            Command::Help => {
                let _ = writeln!(out, "{USAGE}");
                return Flow::Continue;
            }
            Command::Start => MsgType::StartReq,
            Command::Stop => MsgType::StopReq,
            Command::Quit => MsgType::QuitReq,
        };
        let code = match self.exchange(request) {
            Ok(code) => code,
            Err(e) => {
                warn!("dynamic profiling {cmd:?} failed: {e}");
                RspCode::Fail
            }
        };
        let (message, flow) = match (cmd, code) {
            (Command::Quit, _) => ("Dynamic profiling quit.", Flow::Exit),
            (Command::Start, RspCode::Success) => ("Start profiling success.", Flow::Continue),
            (Command::Start, RspCode::AlreadyStarted) => {
                ("Profiling has already started.", Flow::Continue)
            }
            (Command::Start, RspCode::NotSetDevice) => (
                "Device is not set yet, profiling will start once the application sets a device.",
                Flow::Continue,
            ),
            (Command::Stop, RspCode::Success) => ("Stop profiling success.", Flow::Continue),
            (Command::Stop, RspCode::NotStarted) => ("Profiling has not started.", Flow::Continue),
            (Command::Start, _) => ("Start profiling failed, dynamic profiling will quit.", Flow::Exit),
            (_, _) => ("Stop profiling failed, dynamic profiling will quit.", Flow::Exit),
        };
        let _ = writeln!(out, "{message}");
        flow
    }

    /// Command loop. Ends on quit, a fatal command failure, end of input, or
    /// a signal on `stop`.
    pub fn run(mut self, lines: &Receiver<String>, stop: &Receiver<()>, out: &mut dyn Write) {
        let _ = writeln!(out, "{USAGE}");
        loop {
            select! {
                recv(lines) -> line => {
                    let Ok(line) = line else {
                        // Input closed
                        let _ = self.execute(Command::Quit, out);
                        return;
                    };
                    let word = line.trim();
                    if word.is_empty() {
                        continue;
                    }
                    let Some(cmd) = Command::parse(word) else {
                        let _ = writeln!(out, "Unknown command: {word}\n{USAGE}");
                        continue;
                    };
                    if self.execute(cmd, out) == Flow::Exit {
                        return;
                    }
                }
                recv(stop) -> _ => {
                    let _ = self.execute(Command::Quit, out);
                    return;
                }
            }
        }
    }
}

fn connect_with_policy(
    connector: &dyn Connector,
    name: &str,
    policy: ConnectPolicy,
    cancel: &CancelToken,
) -> Result<Box<dyn Transport>, DynamicError> {
    let (interval, ceiling) = match policy {
        ConnectPolicy::Once => {
            return connector
                .connect(name)
                .map_err(|source| DynamicError::Connect { name: name.to_string(), source });
        }
        ConnectPolicy::Retry { interval, ceiling } => (interval, ceiling),
    };
    let deadline = Instant::now() + ceiling;
    loop {
        match connector.connect(name) {
            Ok(transport) => return Ok(transport),
            Err(source) => {
                if Instant::now() + interval > deadline || cancel.sleep(interval) {
                    return Err(DynamicError::Connect { name: name.to_string(), source });
                }
                debug!("server {name} not ready, retrying: {source}");
            }
        }
    }
}

fn recv_response(transport: &mut dyn Transport, request: MsgType) -> Result<RspCode, DynamicError> {
    let mut buf = [0u8; CMD_MSG_LEN];
    transport.recv(&mut buf)?;
    Ok(CommandMsg::decode(&buf)?.answer_to(request)?)
}

/// Forward stdin lines into a channel from a detached reader thread.
///
/// # Errors
/// The thread cannot be spawned.
pub fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new().name("dynprof-stdin".to_string()).spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        loop {
            line.clear();
            match stdin.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    if tx.send(line.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    })?;
    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use msprof_common::MAX_PARAMS_LEN;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Wire {
        sent: Vec<u8>,
        replies: VecDeque<[u8; CMD_MSG_LEN]>,
        connects: usize,
    }

    struct MockTransport(Arc<Mutex<Wire>>);

    impl Transport for MockTransport {
        fn send(&mut self, buf: &[u8]) -> io::Result<()> {
            self.0.lock().unwrap().sent.extend_from_slice(buf);
            Ok(())
        }
        fn recv(&mut self, buf: &mut [u8]) -> io::Result<()> {
            let reply = self.0.lock().unwrap().replies.pop_front();
            let reply = reply.ok_or_else(|| io::Error::from(io::ErrorKind::TimedOut))?;
            buf.copy_from_slice(&reply);
            Ok(())
        }
        fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
            Ok(())
        }
    }

    struct MockConnector(Arc<Mutex<Wire>>);

    impl Connector for MockConnector {
        fn connect(&self, _name: &str) -> io::Result<Box<dyn Transport>> {
            self.0.lock().unwrap().connects += 1;
            Ok(Box::new(MockTransport(Arc::clone(&self.0))))
        }
    }

    fn reply(msg_type: MsgType, code: RspCode) -> [u8; CMD_MSG_LEN] {
        CommandMsg { msg_type, code }.encode()
    }

    fn wire_with(replies: &[[u8; CMD_MSG_LEN]]) -> Arc<Mutex<Wire>> {
        let wire = Arc::new(Mutex::new(Wire::default()));
        wire.lock().unwrap().replies.extend(replies.iter().copied());
        wire
    }

    fn connect(wire: &Arc<Mutex<Wire>>, blob: &str) -> Result<DynProfClient, DynamicError> {
        DynProfClient::connect(
            &MockConnector(Arc::clone(wire)),
            1234,
            blob,
            ConnectPolicy::Once,
            &CancelToken::new(),
        )
    }

    #[test]
    fn test_oversized_blob_sends_nothing() {
        let wire = wire_with(&[]);
        let blob = "x".repeat(MAX_PARAMS_LEN + 1);
        let err = connect(&wire, &blob).unwrap_err();
        assert!(matches!(err, DynamicError::Protocol(_)));
        let wire = wire.lock().unwrap();
        assert_eq!(wire.sent.len(), 0);
        assert_eq!(wire.connects, 0);
    }

    #[test]
    fn test_handshake_success() {
        let wire = wire_with(&[reply(MsgType::ParamsRsp, RspCode::Success)]);
        assert!(connect(&wire, "{}").is_ok());
        assert_eq!(wire.lock().unwrap().sent.len(), msprof_common::PARAMS_MSG_LEN);
    }

    #[test]
    fn test_handshake_rejected() {
        let wire = wire_with(&[reply(MsgType::ParamsRsp, RspCode::Fail)]);
        assert!(matches!(connect(&wire, "{}"), Err(DynamicError::ParamsRejected(RspCode::Fail))));
    }

    #[test]
    fn test_response_echoing_request_type_is_failure() {
        let wire = wire_with(&[
            reply(MsgType::ParamsRsp, RspCode::Success),
            // Echoes the request type with a success code
            reply(MsgType::StartReq, RspCode::Success),
        ]);
        let mut client = connect(&wire, "{}").unwrap();
        assert!(client.exchange(MsgType::StartReq).is_err());
    }

    #[test]
    fn test_failed_start_exits_loop() {
        let wire = wire_with(&[
            reply(MsgType::ParamsRsp, RspCode::Success),
            reply(MsgType::StartRsp, RspCode::Fail),
        ]);
        let mut client = connect(&wire, "{}").unwrap();
        let mut out = Vec::new();
        assert_eq!(client.execute(Command::Start, &mut out), Flow::Exit);
    }

    #[test]
    fn test_run_loop_handles_unknown_and_quit() {
        let wire = wire_with(&[
            reply(MsgType::ParamsRsp, RspCode::Success),
            reply(MsgType::StartRsp, RspCode::AlreadyStarted),
            reply(MsgType::QuitRsp, RspCode::Success),
        ]);
        let client = connect(&wire, "{}").unwrap();
        let (line_tx, line_rx) = crossbeam_channel::unbounded();
        let (_stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(1);
        for line in ["bogus\n", "start\n", "q\n"] {
            line_tx.send(line.to_string()).unwrap();
        }
        let mut out = Vec::new();
        client.run(&line_rx, &stop_rx, &mut out);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command: bogus"));
        assert!(text.contains("already started"));
        assert!(text.contains("Dynamic profiling quit."));
        // handshake + start + quit, the unknown command is never sent
        let sent = wire.lock().unwrap().sent.len();
        assert_eq!(sent, msprof_common::PARAMS_MSG_LEN + 2 * CMD_MSG_LEN);
    }

    #[test]
    fn test_command_abbreviations() {
        assert_eq!(Command::parse("q"), Some(Command::Quit));
        assert_eq!(Command::parse("h"), Some(Command::Help));
        assert_eq!(Command::parse("s"), None);
    }
}
