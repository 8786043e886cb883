//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls a shutdown flag)
//! - Fixed worker thread pool fed by a bounded channel
//! - Commands routed through the Registry

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::Connection;
pub use server::Server;
