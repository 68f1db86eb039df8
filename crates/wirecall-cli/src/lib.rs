//! wirecall CLI: command implementations shared by the `wirecall` binary
//! and its integration tests.

pub mod commands;
pub mod handlers;
