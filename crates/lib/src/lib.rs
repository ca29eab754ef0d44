//! Relic core library — configuration, transport bridge, forwarder pipeline,
//! and server wiring used by the CLI.

pub mod config;
pub mod deliver;
pub mod forwarder;
pub mod heartbeat;
pub mod init;
pub mod server;
pub mod transport;
