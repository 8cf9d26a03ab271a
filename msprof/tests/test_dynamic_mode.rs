mod common;

use common::{context_with_connector, run_msprof, write_script, FakeDriver};
use msprof::domain::{DynamicError, ModeError, RunStatus};
use msprof::dynamic::{Connector, Transport};
use msprof::params::ProfileParams;
use msprof_common::{socket_name, CommandMsg, MsgType, ParamsMsg, RspCode, CMD_MSG_LEN};
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct ServerLog {
    socket: Option<String>,
    requests: Vec<MsgType>,
    blob: Option<ProfileParams>,
}

/// In-process stand-in for the profiled application's server.
struct FakeServer {
    log: Arc<Mutex<ServerLog>>,
    pending: Option<MsgType>,
    handshake_code: RspCode,
}

impl Transport for FakeServer {
    fn send(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut log = self.log.lock().unwrap();
        let request = if let Ok(blob) = ParamsMsg::decode(buf) {
            log.blob = ProfileParams::from_blob(std::str::from_utf8(blob).unwrap()).ok();
            MsgType::ParamsReq
        } else {
            CommandMsg::decode(buf).map_err(|e| io::Error::other(e.to_string()))?.msg_type
        };
        log.requests.push(request);
        self.pending = Some(request);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let request = self.pending.take().ok_or_else(|| io::Error::other("no pending request"))?;
        let code = if request == MsgType::ParamsReq { self.handshake_code } else { RspCode::Success };
        let response = request.response().ok_or_else(|| io::Error::other("not a request"))?;
        let msg: [u8; CMD_MSG_LEN] = CommandMsg { msg_type: response, code }.encode();
        buf.copy_from_slice(&msg);
        Ok(())
    }

    fn set_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }
}

struct FakeConnector {
    log: Arc<Mutex<ServerLog>>,
    handshake_code: RspCode,
}

impl FakeConnector {
    fn new(handshake_code: RspCode) -> (Arc<Self>, Arc<Mutex<ServerLog>>) {
        let log = Arc::new(Mutex::new(ServerLog::default()));
        (Arc::new(Self { log: log.clone(), handshake_code }), log)
    }
}

impl Connector for FakeConnector {
    fn connect(&self, name: &str) -> io::Result<Box<dyn Transport>> {
        self.log.lock().unwrap().socket = Some(name.to_string());
        Ok(Box::new(FakeServer { log: self.log.clone(), pending: None, handshake_code: self.handshake_code }))
    }
}

fn commands(lines: &[&str]) -> crossbeam_channel::Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    for line in lines {
        tx.send(format!("{line}\n")).unwrap();
    }
    rx
}

#[test]
fn test_attach_runs_operator_commands() {
    let tmp = tempfile::tempdir().unwrap();
    let (connector, log) = FakeConnector::new(RspCode::Success);
    let ctx = context_with_connector(tmp.path(), Arc::new(FakeDriver::new(vec![0])), connector)
        .with_dynamic_input(commands(&["start", "stop", "quit"]));

    let target = std::process::id();
    let output = format!("--output={}", tmp.path().join("out").display());
    let pid = format!("--pid={target}");
    let status = run_msprof(&["--dynamic=on", &pid, &output], &ctx).unwrap();

    assert_eq!(status, RunStatus::Success);
    let log = log.lock().unwrap();
    assert_eq!(log.socket.as_deref(), Some(socket_name(target).as_str()));
    assert_eq!(log.requests, vec![MsgType::ParamsReq, MsgType::StartReq, MsgType::StopReq, MsgType::QuitReq]);
    let blob = log.blob.as_ref().unwrap();
    assert!(blob.dynamic);
    assert_eq!(blob.dynamic_pid, Some(target));
}

#[test]
fn test_rejected_handshake_fails_the_run() {
    let tmp = tempfile::tempdir().unwrap();
    let (connector, log) = FakeConnector::new(RspCode::Fail);
    let ctx = context_with_connector(tmp.path(), Arc::new(FakeDriver::new(vec![0])), connector)
        .with_dynamic_input(commands(&["start"]));

    let output = format!("--output={}", tmp.path().join("out").display());
    let pid = format!("--pid={}", std::process::id());
    let err = run_msprof(&["--dynamic=on", &pid, &output], &ctx).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ModeError>(),
        Some(ModeError::Dynamic(DynamicError::ParamsRejected(RspCode::Fail)))
    ));
    assert_eq!(log.lock().unwrap().requests, vec![MsgType::ParamsReq]);
}

#[test]
fn test_app_mode_keys_server_by_msprof_pid() {
    let tmp = tempfile::tempdir().unwrap();
    let app = write_script(&tmp.path().join("serve"), "exit 0");
    let (connector, log) = FakeConnector::new(RspCode::Success);
    let ctx = context_with_connector(tmp.path(), Arc::new(FakeDriver::new(vec![0])), connector)
        .with_dynamic_input(commands(&["quit"]));

    let output = format!("--output={}", tmp.path().join("out").display());
    let app = app.display().to_string();
    let status = run_msprof(&["--dynamic=on", &output, &app], &ctx).unwrap();

    assert_eq!(status, RunStatus::Success);
    let log = log.lock().unwrap();
    assert_eq!(log.socket.as_deref(), Some(socket_name(ctx.pid).as_str()));
    assert_eq!(log.requests, vec![MsgType::ParamsReq, MsgType::QuitReq]);
}

#[test]
fn test_pid_requires_dynamic() {
    let tmp = tempfile::tempdir().unwrap();
    let (connector, _log) = FakeConnector::new(RspCode::Success);
    let ctx = context_with_connector(tmp.path(), Arc::new(FakeDriver::new(vec![0])), connector);

    let output = format!("--output={}", tmp.path().join("out").display());
    let pid = format!("--pid={}", std::process::id());
    let err = run_msprof(&[&pid, &output], &ctx).unwrap_err();

    assert_eq!(err.to_string(), "Argument --pid requires --dynamic=on");
}
