//! Encryption settings for the TDS connection
//!
//! TLS itself is negotiated by the driver; this module only carries the
//! user's choice of mode and trust anchor.

pub mod config;

pub use config::{TlsConfig, TlsMode};
