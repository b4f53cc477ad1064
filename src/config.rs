use crate::error::ConfigError;
use std::{fmt, str::FromStr};

/// How the probe authenticates against SQL Server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthenticationMethod {
    /// NTLM login, requires a domain
    Windows,
    /// SQL Server login (username and password)
    #[default]
    SqlServer,
}

impl FromStr for AuthenticationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "windows" | "windows authentication" => Ok(Self::Windows),
            "sqlserver" | "sql-server" | "sql server authentication" => Ok(Self::SqlServer),
            _ => Err(format!("Invalid authentication method: {s}")),
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows Authentication"),
            Self::SqlServer => write!(f, "SQL Server Authentication"),
        }
    }
}

/// Parameters for a single check invocation
#[derive(Clone, Default)]
pub struct CheckConfig {
    pub authentication_method: AuthenticationMethod,
    pub hostname: String,
    pub port: u16,
    pub domain: Option<String>,
    pub username: String,
    pub password: String,
    pub instance: Option<String>,
    pub database: Option<String>,
    pub sql_query: String,
}

impl CheckConfig {
    /// Domain if one was supplied, blank values count as absent
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        non_blank(self.domain.as_deref())
    }

    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        non_blank(self.instance.as_deref())
    }

    #[must_use]
    pub fn database(&self) -> Option<&str> {
        non_blank(self.database.as_deref())
    }
}

impl fmt::Debug for CheckConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckConfig")
            .field("authentication_method", &self.authentication_method)
            .field("hostname", &self.hostname)
            .field("port", &self.port)
            .field("domain", &self.domain)
            .field("username", &self.username)
            .field("password", &"********")
            .field("instance", &self.instance)
            .field("database", &self.database)
            .field("sql_query", &self.sql_query)
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Check that the authentication method and the domain agree.
///
/// Windows authentication needs a domain, SQL Server authentication must
/// not carry one. Nothing is sent over the network before this passes.
///
/// # Errors
///
/// Returns the specific mismatch as a [`ConfigError`]
pub fn validate(method: AuthenticationMethod, domain: Option<&str>) -> Result<(), ConfigError> {
    match (method, non_blank(domain)) {
        (AuthenticationMethod::Windows, None) => Err(ConfigError::WindowsAuthMissingDomain),
        (AuthenticationMethod::SqlServer, Some(_)) => {
            Err(ConfigError::DomainGivenWithoutWindowsAuth)
        }
        _ => Ok(()),
    }
}

/// Strip surrounding whitespace and trailing semicolons until none are left
#[must_use]
pub fn normalize_query(query: &str) -> String {
    let mut normalized = query.trim();
    while let Some(stripped) = normalized.strip_suffix(';') {
        normalized = stripped.trim();
    }
    normalized.to_string()
}
