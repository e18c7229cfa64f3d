//! JSON-lines protocol spoken by `dkernel serve`.
//!
//! Every message is one JSON object on one line, tagged by `type`. Message
//! contents reuse the kernel's request and reply types, so an
//! `execute_request` line looks like
//! `{"type":"execute_request","code":"writeln(1);","silent":false}`.

use dkernel_core::{
    CompleteReply, ExecuteReply, ExecuteRequest, InspectReply, KernelInfo, StreamName,
};
use serde::{Deserialize, Serialize};

/// Messages read from the host on stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Execute a cell.
    ExecuteRequest(ExecuteRequest),

    /// Ask for kernel and language information.
    KernelInfoRequest,

    /// Ask for completions at a cursor position.
    CompleteRequest { code: String, cursor_pos: usize },

    /// Ask for documentation at a cursor position.
    InspectRequest {
        code: String,
        cursor_pos: usize,
        #[serde(default)]
        detail_level: u8,
    },

    /// Interrupt the running cell. Handled as soon as it is read.
    InterruptRequest,

    /// Answer to an `input_request`.
    InputReply { value: String },

    /// Stop the kernel, or reset it when `restart` is set.
    ShutdownRequest {
        #[serde(default)]
        restart: bool,
    },
}

/// Messages written to the host on stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Output produced by a running cell.
    Stream { name: StreamName, text: String },

    ExecuteReply(ExecuteReply),

    KernelInfoReply(KernelInfo),

    CompleteReply(CompleteReply),

    InspectReply(InspectReply),

    /// The running program wants a line of input.
    InputRequest { prompt: String, password: bool },

    /// A message could not be handled.
    Error { message: String },

    ShutdownReply { restart: bool },
}
