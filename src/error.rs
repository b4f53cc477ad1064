use std::{fmt, time::Duration};

/// Parameter combinations rejected before any connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Windows Authentication is selected but domain input is not given.")]
    WindowsAuthMissingDomain,

    #[error("Domain input is given but Windows Authentication is not selected.")]
    DomainGivenWithoutWindowsAuth,

    #[error("SQL query is empty.")]
    EmptyQuery,
}

/// Failures reported by a database driver
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("{0}")]
    Tiberius(#[from] tiberius::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid connection target: {0}")]
    InvalidTarget(String),

    #[error("Connection is closed")]
    Closed,

    #[error("{0}")]
    Rejected(String),
}

/// Everything that turns a check CRITICAL
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Could not connect to database, check monitor settings: {0}")]
    ConnectionFailed(#[source] DriverError),

    #[error("Connection is closed.")]
    ConnectionClosed,

    #[error("Could not get prepared statement, check connection object: {0}")]
    StatementPreparationFailed(#[source] DriverError),

    #[error("Could not get result set, check prepared statement: {0}")]
    ExecutionFailed(#[source] DriverError),

    #[error("Check timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// Category of a [`ProbeError`], used as a report label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Statement,
    Execution,
    Timeout,
}

impl ProbeError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::ConnectionFailed(_) | Self::ConnectionClosed => ErrorKind::Connection,
            Self::StatementPreparationFailed(_) => ErrorKind::Statement,
            Self::ExecutionFailed(_) => ErrorKind::Execution,
            Self::TimedOut(_) => ErrorKind::Timeout,
        }
    }
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Connection => "connection",
            Self::Statement => "statement",
            Self::Execution => "execution",
            Self::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
