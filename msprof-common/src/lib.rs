//! # Dynamic Profiling Wire Protocol (msprof ↔ profiled application)
//!
//! Defines the messages exchanged between the `msprof` command-line client and
//! the dynamic-profiling server embedded in a running application. The server
//! listens on a local socket whose name is [`SOCKET_NAME_PREFIX`] followed by
//! the decimal "key pid".
//!
//! ## Exchange
//!
//! 1. Client connects and sends one [`ParamsMsg`] carrying the serialized
//!    profiling parameters. Server answers with a [`CommandMsg`] of type
//!    [`MsgType::ParamsRsp`].
//! 2. Client sends [`CommandMsg`] requests (`StartReq`, `StopReq`, `QuitReq`).
//!    Every answer carries type `request + 1` and a [`RspCode`].
//!
//! All integers are little-endian. Every message starts with a 4-byte header
//! (`version: u16`, `reserved: u16`). Lengths are checked on both ends; the
//! layout is never reinterpreted from raw memory.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

use core::fmt;

// ============================================================================
// Constants
// ============================================================================

/// Protocol revision carried in every message header.
pub const PROTOCOL_VERSION: u16 = 1;

/// Socket name prefix; the full name appends the decimal key pid.
pub const SOCKET_NAME_PREFIX: &str = "msprof_dynamic_";

/// Maximum size of the serialized parameter blob carried by [`ParamsMsg`].
pub const MAX_PARAMS_LEN: usize = 64 * 1024;

/// Environment variable carrying the serialized parameters to a launched app.
pub const PROFILER_SAMPLE_CONFIG_ENV: &str = "PROFILER_SAMPLECONFIG";

/// Environment variable that switches the launched app into dynamic mode.
pub const PROFILING_MODE_ENV: &str = "PROFILING_MODE";

/// Value of [`PROFILING_MODE_ENV`] when dynamic profiling is enabled.
pub const PROFILING_MODE_DYNAMIC: &str = "dynamic";

/// Host work path used as the default output root when `--output` is absent.
pub const ASCEND_WORK_PATH_ENV: &str = "ASCEND_WORK_PATH";

const HEADER_LEN: usize = 4;

/// Encoded size of a [`CommandMsg`].
pub const CMD_MSG_LEN: usize = HEADER_LEN + 8;

/// Encoded size of a [`ParamsMsg`] (fixed, the blob is zero-padded).
pub const PARAMS_MSG_LEN: usize = HEADER_LEN + 8 + MAX_PARAMS_LEN;

// ============================================================================
// Message types
// ============================================================================

/// Message type tag.
///
/// Requests are odd, the matching response is always `request + 1`.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsgType {
    StartReq = 1,
    StartRsp = 2,
    StopReq = 3,
    StopRsp = 4,
    QuitReq = 5,
    QuitRsp = 6,
    ParamsReq = 7,
    ParamsRsp = 8,
}

impl MsgType {
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            1 => Self::StartReq,
            2 => Self::StartRsp,
            3 => Self::StopReq,
            4 => Self::StopRsp,
            5 => Self::QuitReq,
            6 => Self::QuitRsp,
            7 => Self::ParamsReq,
            8 => Self::ParamsRsp,
            _ => return None,
        })
    }

    #[must_use]
    pub fn is_request(self) -> bool {
        (self as u32) % 2 == 1
    }

    /// The response type a server must answer `self` with.
    ///
    /// Returns `None` when `self` is itself a response.
    #[must_use]
    pub fn response(self) -> Option<Self> {
        if self.is_request() {
            Self::from_u32(self as u32 + 1)
        } else {
            None
        }
    }
}

/// Status code carried in responses.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RspCode {
    Success = 0,
    AlreadyStarted = 1,
    NotStarted = 2,
    NotSetDevice = 3,
    Fail = 4,
}

impl RspCode {
    #[must_use]
    pub fn from_u32(raw: u32) -> Option<Self> {
        Some(match raw {
            0 => Self::Success,
            1 => Self::AlreadyStarted,
            2 => Self::NotStarted,
            3 => Self::NotSetDevice,
            4 => Self::Fail,
            _ => return None,
        })
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// Fewer bytes than the fixed message size.
    Truncated { expected: usize, actual: usize },
    /// Header carries a different protocol revision.
    VersionMismatch(u16),
    UnknownMsgType(u32),
    UnknownRspCode(u32),
    /// Response type is not `request + 1`.
    ResponseMismatch { request: MsgType, actual: MsgType },
    /// Parameter blob does not fit into [`MAX_PARAMS_LEN`].
    ParamsTooLarge { len: usize, max: usize },
    EmptyParams,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { expected, actual } => {
                write!(f, "message truncated: expected {expected} bytes, got {actual}")
            }
            Self::VersionMismatch(v) => {
                write!(f, "protocol version {v} does not match {PROTOCOL_VERSION}")
            }
            Self::UnknownMsgType(t) => write!(f, "unknown message type {t}"),
            Self::UnknownRspCode(c) => write!(f, "unknown response code {c}"),
            Self::ResponseMismatch { request, actual } => {
                write!(f, "response {actual:?} does not answer request {request:?}")
            }
            Self::ParamsTooLarge { len, max } => {
                write!(f, "parameter blob of {len} bytes exceeds the {max} byte limit")
            }
            Self::EmptyParams => write!(f, "parameter blob is empty"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

// ============================================================================
// Encoding helpers
// ============================================================================

fn put_header(out: &mut [u8]) {
    out[0..2].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
    out[2..4].copy_from_slice(&0u16.to_le_bytes());
}

fn check_header(buf: &[u8], expected: usize) -> Result<(), ProtocolError> {
    if buf.len() < expected {
        return Err(ProtocolError::Truncated { expected, actual: buf.len() });
    }
    let version = u16::from_le_bytes([buf[0], buf[1]]);
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::VersionMismatch(version));
    }
    Ok(())
}

fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

// ============================================================================
// Messages
// ============================================================================

/// Fixed-size request/response message.
///
/// Requests carry [`RspCode::Success`] in the code field; servers ignore it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandMsg {
    pub msg_type: MsgType,
    pub code: RspCode,
}

impl CommandMsg {
    #[must_use]
    pub fn request(msg_type: MsgType) -> Self {
        Self { msg_type, code: RspCode::Success }
    }

    #[must_use]
    pub fn encode(&self) -> [u8; CMD_MSG_LEN] {
        let mut out = [0u8; CMD_MSG_LEN];
        put_header(&mut out);
        out[4..8].copy_from_slice(&(self.msg_type as u32).to_le_bytes());
        out[8..12].copy_from_slice(&(self.code as u32).to_le_bytes());
        out
    }

    /// # Errors
    /// Truncated input, wrong version, or unknown type/code values.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_header(buf, CMD_MSG_LEN)?;
        let raw_type = read_u32(buf, 4);
        let raw_code = read_u32(buf, 8);
        let msg_type = MsgType::from_u32(raw_type).ok_or(ProtocolError::UnknownMsgType(raw_type))?;
        let code = RspCode::from_u32(raw_code).ok_or(ProtocolError::UnknownRspCode(raw_code))?;
        Ok(Self { msg_type, code })
    }

    /// Validate that `self` answers `request` and return its status code.
    ///
    /// # Errors
    /// [`ProtocolError::ResponseMismatch`] unless `self.msg_type == request + 1`.
    pub fn answer_to(&self, request: MsgType) -> Result<RspCode, ProtocolError> {
        match request.response() {
            Some(expected) if expected == self.msg_type => Ok(self.code),
            _ => Err(ProtocolError::ResponseMismatch { request, actual: self.msg_type }),
        }
    }
}

/// Handshake message carrying the serialized parameter blob.
///
/// Layout: header, `msg_type: u32` (= `ParamsReq`), `len: u32`, then
/// [`MAX_PARAMS_LEN`] bytes of zero-padded blob.
pub struct ParamsMsg;

impl ParamsMsg {
    /// Check that a blob of `len` bytes can be carried.
    ///
    /// # Errors
    /// Empty or oversized blobs.
    pub fn check_len(len: usize) -> Result<(), ProtocolError> {
        if len == 0 {
            return Err(ProtocolError::EmptyParams);
        }
        if len > MAX_PARAMS_LEN {
            return Err(ProtocolError::ParamsTooLarge { len, max: MAX_PARAMS_LEN });
        }
        Ok(())
    }

    /// Encode `blob` into `out`, which must hold [`PARAMS_MSG_LEN`] bytes.
    ///
    /// # Errors
    /// Blob length outside `1..=MAX_PARAMS_LEN` or `out` too small.
    pub fn encode_into(blob: &[u8], out: &mut [u8]) -> Result<usize, ProtocolError> {
        Self::check_len(blob.len())?;
        if out.len() < PARAMS_MSG_LEN {
            return Err(ProtocolError::Truncated { expected: PARAMS_MSG_LEN, actual: out.len() });
        }
        let out = &mut out[..PARAMS_MSG_LEN];
        out.fill(0);
        put_header(out);
        out[4..8].copy_from_slice(&(MsgType::ParamsReq as u32).to_le_bytes());
        // check_len bounds the length well below u32::MAX
        #[allow(clippy::cast_possible_truncation)]
        out[8..12].copy_from_slice(&(blob.len() as u32).to_le_bytes());
        out[12..12 + blob.len()].copy_from_slice(blob);
        Ok(PARAMS_MSG_LEN)
    }

    /// Borrow the blob carried by an encoded message.
    ///
    /// # Errors
    /// Truncated input, wrong version or type, or an out-of-range length.
    pub fn decode(buf: &[u8]) -> Result<&[u8], ProtocolError> {
        check_header(buf, PARAMS_MSG_LEN)?;
        let raw_type = read_u32(buf, 4);
        if raw_type != MsgType::ParamsReq as u32 {
            return Err(ProtocolError::UnknownMsgType(raw_type));
        }
        let len = read_u32(buf, 8) as usize;
        Self::check_len(len)?;
        Ok(&buf[12..12 + len])
    }

    /// Heap-allocating variant of [`ParamsMsg::encode_into`].
    ///
    /// # Errors
    /// Blob length outside `1..=MAX_PARAMS_LEN`.
    #[cfg(feature = "std")]
    pub fn encode(blob: &[u8]) -> Result<std::vec::Vec<u8>, ProtocolError> {
        Self::check_len(blob.len())?;
        let mut out = std::vec![0u8; PARAMS_MSG_LEN];
        Self::encode_into(blob, &mut out)?;
        Ok(out)
    }
}

/// Full socket name for a key pid.
#[cfg(feature = "std")]
#[must_use]
pub fn socket_name(key_pid: u32) -> std::string::String {
    std::format!("{SOCKET_NAME_PREFIX}{key_pid}")
}
