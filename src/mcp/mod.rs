//! Tool protocol module
//!
//! Stdio JSON-RPC server, wire types, and the tool registry mapping
//! protocol calls onto Gmail operations.

pub mod protocol;
pub mod server;
pub mod tools;
