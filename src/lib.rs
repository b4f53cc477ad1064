//! One-shot SQL Server query probe.
//!
//! A check connects to the server, runs a single query, reduces the result
//! set to one scalar plus a row count and reports `OK` or `CRITICAL`.
//!
//! ```rust,ignore
//! use querypulse::{check, config::CheckConfig, mssql::MssqlDriver, tls::TlsConfig};
//!
//! let driver = MssqlDriver::new(TlsConfig::default());
//! let status = check::run_check(&driver, config).await;
//! println!("{}", status.message);
//! ```

pub mod check;
pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod executor;
pub mod metrics;
pub mod mssql;
pub mod probe;
pub mod reducer;
pub mod report;
pub mod target;
pub mod telemetry;
pub mod tls;
