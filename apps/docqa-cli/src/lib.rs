//! Wiring shared by the `docqa` CLI and the `docqa-server` binary.

pub mod app;
pub mod server;
