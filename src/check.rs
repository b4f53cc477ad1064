use crate::{
    config::{self, CheckConfig},
    driver::{Credentials, Driver, Scope},
    error::{ConfigError, ErrorKind, ProbeError},
    executor,
    reducer::{self, ReducedOutcome},
    target::{self, ConnectionTarget},
};
use serde::Serialize;
use std::{fmt, time::Duration};
use tokio::time;
use tracing::{debug, error, info, warn};

pub const SUCCESS_MESSAGE: &str = "Monitor successfully ran.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum State {
    Ok,
    Critical,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "OK"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Terminal result of one check
#[derive(Debug, Clone, PartialEq)]
pub struct CheckStatus {
    pub state: State,
    pub message: String,
    pub outcome: Option<ReducedOutcome>,
    pub failure: Option<ErrorKind>,
}

impl CheckStatus {
    #[must_use]
    pub fn ok(outcome: ReducedOutcome) -> Self {
        Self {
            state: State::Ok,
            message: SUCCESS_MESSAGE.to_string(),
            outcome: Some(outcome),
            failure: None,
        }
    }

    #[must_use]
    pub fn critical(err: &ProbeError) -> Self {
        Self {
            state: State::Critical,
            message: err.to_string(),
            outcome: None,
            failure: Some(err.kind()),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.state == State::Ok
    }
}

/// Run one check against `driver`.
///
/// Never fails: every error becomes a `CRITICAL` status and all acquired
/// resources are released before returning.
pub async fn run_check<D: Driver>(driver: &D, config: CheckConfig) -> CheckStatus {
    run_check_within(driver, config, None).await
}

/// [`run_check`] with the pipeline bounded by `timeout`.
///
/// On expiry the in-flight step is abandoned but the resources acquired so
/// far are still released, each release bounded by the same limit.
pub async fn run_check_within<D: Driver>(
    driver: &D,
    config: CheckConfig,
    timeout: Option<Duration>,
) -> CheckStatus {
    let query = config::normalize_query(&config.sql_query);

    let target = match prepare_target(&config, &query) {
        Ok(target) => target,
        Err(err) => {
            warn!(error = %err, "invalid check configuration");
            return CheckStatus::critical(&err);
        }
    };

    let credentials = Credentials {
        method: config.authentication_method,
        username: config.username,
        password: config.password,
    };

    let mut scope = Scope::new();
    let result = match timeout {
        Some(limit) => time::timeout(
            limit,
            probe(driver, &target, &credentials, &query, &mut scope),
        )
        .await
        .unwrap_or_else(|_| {
            error!(timeout = ?limit, "check did not finish in time");
            Err(ProbeError::TimedOut(limit))
        }),
        None => probe(driver, &target, &credentials, &query, &mut scope).await,
    };

    debug!("releasing connection, statement and result set");
    match timeout {
        Some(limit) => {
            if time::timeout(limit, scope.release()).await.is_err() {
                warn!(timeout = ?limit, "releasing resources did not finish in time");
            }
        }
        None => scope.release().await,
    }

    match result {
        Ok(outcome) => {
            info!(
                row_count = outcome.row_count,
                kind = ?outcome.value.kind(),
                "check finished"
            );
            CheckStatus::ok(outcome)
        }
        Err(err) => CheckStatus::critical(&err),
    }
}

fn prepare_target(config: &CheckConfig, query: &str) -> Result<ConnectionTarget, ProbeError> {
    config::validate(config.authentication_method, config.domain())?;

    if query.is_empty() {
        return Err(ConfigError::EmptyQuery.into());
    }

    Ok(target::build_target(
        &config.hostname,
        config.port,
        config.database(),
        config.instance(),
        config.domain(),
    ))
}

async fn probe<D: Driver>(
    driver: &D,
    target: &ConnectionTarget,
    credentials: &Credentials,
    query: &str,
    scope: &mut Scope<D::Connection>,
) -> Result<ReducedOutcome, ProbeError> {
    let cursor = executor::execute(driver, target, credentials, query, scope).await?;
    debug!("reducing result set");
    Ok(reducer::reduce(cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AuthenticationMethod, reducer::ScalarValue};

    #[test]
    fn test_prepare_target_empty_query() {
        let config = CheckConfig {
            hostname: "h".into(),
            port: 1433,
            ..CheckConfig::default()
        };
        let err = prepare_target(&config, "").err();
        assert!(matches!(
            err,
            Some(ProbeError::Configuration(ConfigError::EmptyQuery))
        ));
    }

    #[test]
    fn test_prepare_target_validates_before_empty_query() {
        let config = CheckConfig {
            authentication_method: AuthenticationMethod::Windows,
            hostname: "h".into(),
            port: 1433,
            ..CheckConfig::default()
        };
        let query = config::normalize_query(";");
        let err = prepare_target(&config, &query).err();
        assert!(matches!(
            err,
            Some(ProbeError::Configuration(
                ConfigError::WindowsAuthMissingDomain
            ))
        ));
    }

    #[test]
    fn test_prepare_target_windows_without_domain() {
        let config = CheckConfig {
            authentication_method: AuthenticationMethod::Windows,
            hostname: "h".into(),
            port: 1433,
            ..CheckConfig::default()
        };
        let err = prepare_target(&config, "SELECT 1").err();
        assert!(matches!(
            err,
            Some(ProbeError::Configuration(
                ConfigError::WindowsAuthMissingDomain
            ))
        ));
    }

    #[test]
    fn test_prepare_target_builds_dsn() {
        let config = CheckConfig {
            authentication_method: AuthenticationMethod::Windows,
            hostname: "sql01".into(),
            port: 1433,
            domain: Some("CORP".into()),
            database: Some(" ".into()),
            instance: Some("SQLEXPRESS".into()),
            ..CheckConfig::default()
        };
        let target = prepare_target(&config, "SELECT 1").ok();
        assert_eq!(
            target.as_ref().map(ConnectionTarget::as_str),
            Some("sqlserver://sql01:1433;instance=SQLEXPRESS;domain=CORP")
        );
    }

    #[test]
    fn test_status_constructors() {
        let status = CheckStatus::ok(ReducedOutcome {
            row_count: 1,
            value: ScalarValue::Integer(1),
        });
        assert!(status.is_ok());
        assert_eq!(status.message, SUCCESS_MESSAGE);
        assert_eq!(status.failure, None);

        let status = CheckStatus::critical(&ProbeError::ConnectionClosed);
        assert!(!status.is_ok());
        assert_eq!(status.message, "Connection is closed.");
        assert_eq!(status.failure, Some(ErrorKind::Connection));
        assert!(status.outcome.is_none());

        let status = CheckStatus::critical(&ProbeError::TimedOut(Duration::from_secs(5)));
        assert_eq!(status.state, State::Critical);
        assert_eq!(status.message, "Check timed out after 5s");
        assert_eq!(status.failure, Some(ErrorKind::Timeout));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(State::Ok.to_string(), "OK");
        assert_eq!(State::Critical.to_string(), "CRITICAL");
    }
}
