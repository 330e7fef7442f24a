//! Shared helpers for integration tests.

pub mod archive;
pub mod socket_guard;
