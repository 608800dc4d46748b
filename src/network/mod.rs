//! Network Module
//!
//! HTTP server and client handling.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polls the shutdown flag)
//! - One thread per connection, capped by `max_connections`
//! - Requests routed through the TableStore

mod server;
mod connection;
mod router;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use router::{error_response, route};
