//! JSON-RPC 2.0 envelopes for the eAPI `runCmds` exchange.
//!
//! eAPI speaks a fixed dialect: every request carries `method: "runCmds"`
//! and a `params` object with the protocol revision, the ordered command
//! batch, and the requested result encoding. Responses carry exactly one of
//! `result` or `error`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::EapiError;

/// JSON-RPC version constant.
pub const JSONRPC_VERSION: &str = "2.0";

/// The fixed protocol method name for batch command execution.
pub const RUN_CMDS_METHOD: &str = "runCmds";

/// Revision of the eAPI `params` schema.
pub const EAPI_VERSION: u32 = 1;

/// JSON-RPC version marker.
///
/// Serializes to exactly `"2.0"` and refuses anything else on the way in, so
/// an envelope with the wrong version never survives decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(JsonRpcVersion)
        } else {
            Err(serde::de::Error::custom(format!(
                "invalid JSON-RPC version: expected '{JSONRPC_VERSION}', got '{version}'"
            )))
        }
    }
}

/// Result encoding requested from the device.
///
/// `Json` yields structured per-command output; `Text` yields the raw CLI
/// text wrapped in a one-key mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    #[default]
    Json,
    Text,
}

impl ResponseFormat {
    /// Wire name of the encoding.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseFormat {
    type Err = EapiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(EapiError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// The `params` member of a `runCmds` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    /// eAPI params schema revision, always [`EAPI_VERSION`].
    pub version: u32,
    /// Ordered command batch, executed server-side until the first failure.
    pub cmds: Vec<String>,
    /// Requested result encoding.
    pub format: ResponseFormat,
}

/// eAPI request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// JSON-RPC version, always `"2.0"`.
    pub jsonrpc: JsonRpcVersion,
    /// Method name, always [`RUN_CMDS_METHOD`].
    pub method: String,
    /// Command batch and encoding.
    pub params: CommandParams,
    /// Opaque request identifier, echoed back by the device.
    pub id: String,
}

impl Request {
    /// Create a `runCmds` request for the given command batch.
    pub fn run_cmds(
        commands: Vec<String>,
        format: ResponseFormat,
        id: impl Into<String>,
    ) -> Self {
        Self {
            jsonrpc: JsonRpcVersion,
            method: RUN_CMDS_METHOD.to_string(),
            params: CommandParams {
                version: EAPI_VERSION,
                cmds: commands,
                format,
            },
            id: id.into(),
        }
    }

    /// Serialize the envelope to its wire form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// eAPI response envelope.
///
/// Lenient boundary form: `jsonrpc` and `id` are accepted as-is so that a
/// malformed or hostile reply still decodes far enough to be classified.
/// Exactly one of `result` / `error` is present in a well-formed reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// JSON-RPC version as sent by the device.
    pub jsonrpc: String,
    /// Ordered per-command results; the last entry may carry a `warnings`
    /// list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<Value>>,
    /// Protocol-level failure, mutually exclusive with `result`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
    /// Request identifier echo.
    #[serde(default)]
    pub id: Option<Value>,
}

impl Response {
    /// Decode a response envelope from a raw body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// `true` when the envelope carries an `error` member.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// `true` when the envelope carries a `result` member and no error.
    pub fn is_success(&self) -> bool {
        self.result.is_some() && self.error.is_none()
    }

    /// Warnings attached to the final result entry, if any.
    pub fn warnings(&self) -> Option<&[Value]> {
        let entry = self.result.as_ref()?.last()?;
        entry.get("warnings")?.as_array().map(Vec::as_slice)
    }
}

/// The `error` member of a failure envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric protocol error code.
    pub code: i64,
    /// Human-readable error text.
    pub message: String,
    /// Ordered per-command partial results; the last entry may carry an
    /// `errors` list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Value>>,
}

impl ErrorObject {
    /// Per-command error messages attached to the final data entry, if any.
    pub fn errors(&self) -> Option<&[Value]> {
        let entry = self.data.as_ref()?.last()?;
        entry.get("errors")?.as_array().map(Vec::as_slice)
    }
}
