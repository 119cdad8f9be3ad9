//! Test helper modules for fretcoach-practice integration tests
//!
//! - StubServer: in-process sensor server on an ephemeral port

pub mod stub_server;

pub use stub_server::{unused_base_url, StubServer};
