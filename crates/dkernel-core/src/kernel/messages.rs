//! Request and reply contents exchanged with the front-end.
//!
//! Field names follow the Jupyter messaging protocol so the types can be
//! embedded in a host's wire messages unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Jupyter messaging protocol version the replies correspond to.
pub const PROTOCOL_VERSION: &str = "5.3";

fn default_true() -> bool {
    true
}

/// A request to execute one cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,

    /// Execute without producing output or counting the execution.
    #[serde(default)]
    pub silent: bool,

    /// Count the execution in the session history.
    #[serde(default = "default_true")]
    pub store_history: bool,

    /// Expressions to evaluate after the cell. Not supported; always
    /// answered with an empty map.
    #[serde(default)]
    pub user_expressions: Map<String, Value>,

    /// Whether the front-end can answer input requests.
    #[serde(default = "default_true")]
    pub allow_stdin: bool,
}

impl ExecuteRequest {
    /// A request with protocol defaults.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            silent: false,
            store_history: true,
            user_expressions: Map::new(),
            allow_stdin: true,
        }
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn allow_stdin(mut self, allow: bool) -> Self {
        self.allow_stdin = allow;
        self
    }

    pub fn store_history(mut self, store: bool) -> Self {
        self.store_history = store;
        self
    }
}

/// Reply status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
    Abort,
}

/// Reply to an [`ExecuteRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteReply {
    pub status: ReplyStatus,
    pub execution_count: u64,
    #[serde(default)]
    pub payload: Vec<Value>,
    #[serde(default)]
    pub user_expressions: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evalue: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub traceback: Vec<String>,
}

impl ExecuteReply {
    pub fn new(status: ReplyStatus, execution_count: u64) -> Self {
        Self {
            status,
            execution_count,
            payload: Vec::new(),
            user_expressions: Map::new(),
            ename: None,
            evalue: None,
            traceback: Vec::new(),
        }
    }

    /// An `error` reply for a kernel-level failure.
    pub fn error(execution_count: u64, ename: &str, evalue: impl Into<String>) -> Self {
        let evalue = evalue.into();
        Self {
            ename: Some(ename.to_string()),
            traceback: vec![format!("{ename}: {evalue}")],
            evalue: Some(evalue),
            ..Self::new(ReplyStatus::Error, execution_count)
        }
    }
}

/// Language description reported in [`KernelInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub name: String,
    pub version: String,
    pub mimetype: String,
    pub file_extension: String,
}

/// Reply to a kernel info request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelInfo {
    pub protocol_version: String,
    pub implementation: String,
    pub implementation_version: String,
    pub language_info: LanguageInfo,
    pub banner: String,
    #[serde(default)]
    pub help_links: Vec<Value>,
}

/// Reply to a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteReply {
    pub status: ReplyStatus,
    pub matches: Vec<String>,
    pub cursor_start: usize,
    pub cursor_end: usize,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Reply to an inspection request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectReply {
    pub status: ReplyStatus,
    pub found: bool,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let req: ExecuteRequest = serde_json::from_value(json!({"code": "writeln(1);"})).unwrap();
        assert_eq!(req, ExecuteRequest::new("writeln(1);"));
        assert!(req.store_history);
        assert!(req.allow_stdin);
        assert!(!req.silent);
    }

    #[test]
    fn test_ok_reply_shape() {
        let reply = serde_json::to_value(ExecuteReply::new(ReplyStatus::Ok, 4)).unwrap();
        assert_eq!(
            reply,
            json!({
                "status": "ok",
                "execution_count": 4,
                "payload": [],
                "user_expressions": {}
            })
        );
    }

    #[test]
    fn test_error_reply_shape() {
        let reply = ExecuteReply::error(2, "ConfigurationError", "compiler `dmd` not found");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["ename"], "ConfigurationError");
        assert_eq!(value["traceback"][0], "ConfigurationError: compiler `dmd` not found");
    }
}
