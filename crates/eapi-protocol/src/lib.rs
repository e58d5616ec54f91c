//! # eapi-protocol
//!
//! Wire-level types for the eAPI management protocol: the JSON-RPC 2.0
//! `runCmds` request/response envelopes and the typed failures a client can
//! observe while driving an exchange.
//!
//! This crate performs no I/O. Transports live in `eapi-transport`; the
//! connection layer that ties both together lives in `eapi-client`.

pub mod error;
pub mod jsonrpc;

pub use error::{CommandError, ConnectionError, EapiError, EapiResult};
pub use jsonrpc::{
    CommandParams, EAPI_VERSION, ErrorObject, JSONRPC_VERSION, JsonRpcVersion, RUN_CMDS_METHOD,
    Request, Response, ResponseFormat,
};
