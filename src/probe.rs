use crate::{
    check,
    config::CheckConfig,
    driver::Driver,
    mssql::MssqlDriver,
    report::{OutputFormat, Report},
    tls::TlsConfig,
};
use chrono::Utc;
use std::{process::ExitCode, time::Duration};

pub const EXIT_OK: u8 = 0;
pub const EXIT_CRITICAL: u8 = 2;

/// Run one check against SQL Server and print the report to stdout
///
/// # Errors
///
/// Returns an error if the report cannot be rendered
pub async fn run(
    config: CheckConfig,
    tls: TlsConfig,
    format: OutputFormat,
    timeout: Option<Duration>,
) -> anyhow::Result<ExitCode> {
    let driver = MssqlDriver::new(tls);
    let report = evaluate(&driver, config, timeout).await;

    println!("{}", report.render(format)?);

    Ok(ExitCode::from(exit_code(&report)))
}

/// Run the check under an optional invocation timeout and time it.
///
/// Resources are released even when the timeout fires.
pub async fn evaluate<D: Driver>(
    driver: &D,
    config: CheckConfig,
    timeout: Option<Duration>,
) -> Report {
    let started = Utc::now();

    let status = check::run_check_within(driver, config, timeout).await;

    Report::new(&status, started, Utc::now() - started)
}

#[must_use]
pub fn exit_code(report: &Report) -> u8 {
    if report.is_ok() { EXIT_OK } else { EXIT_CRITICAL }
}
