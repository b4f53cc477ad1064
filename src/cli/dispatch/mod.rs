use crate::{
    cli::actions::Action,
    config::{AuthenticationMethod, CheckConfig},
    report::OutputFormat,
    tls::{TlsConfig, TlsMode},
};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use std::{path::PathBuf, time::Duration};

fn get_string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn extract_tls_config(matches: &ArgMatches) -> Result<TlsConfig> {
    let mode = matches
        .get_one::<String>("tls-mode")
        .map(|m| m.parse::<TlsMode>().map_err(|e| anyhow!(e)))
        .transpose()?
        .unwrap_or_default();

    let ca = matches.get_one::<String>("tls-ca").map(PathBuf::from);

    Ok(TlsConfig { mode, ca })
}

/// Convert `ArgMatches` into typed Action enum with validation
///
/// The authentication/domain combination is deliberately not checked here,
/// a mismatch is reported as a CRITICAL check result.
///
/// # Errors
///
/// Returns an error if required parameters are missing or malformed
pub fn dispatch(matches: &ArgMatches) -> Result<Action> {
    let authentication_method = matches
        .get_one::<String>("auth")
        .map(|m| m.parse::<AuthenticationMethod>().map_err(|e| anyhow!(e)))
        .transpose()?
        .unwrap_or_default();

    let hostname = get_string(matches, "host").context("host is required")?;
    let username = get_string(matches, "username").context("username is required")?;
    let sql_query = get_string(matches, "query").context("query is required")?;

    let port = matches.get_one::<u16>("port").copied().unwrap_or(1433);

    let config = CheckConfig {
        authentication_method,
        hostname,
        port,
        domain: get_string(matches, "domain"),
        username,
        password: get_string(matches, "password").unwrap_or_default(),
        instance: get_string(matches, "instance"),
        database: get_string(matches, "database"),
        sql_query,
    };

    let tls = extract_tls_config(matches)?;

    let format = matches
        .get_one::<String>("format")
        .map(|f| f.parse::<OutputFormat>().map_err(|e| anyhow!(e)))
        .transpose()?
        .unwrap_or_default();

    let timeout = matches
        .get_one::<u64>("timeout")
        .copied()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(Action::Check {
        config,
        tls,
        format,
        timeout,
    })
}
