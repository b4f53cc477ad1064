use crate::error::DriverError;
use std::fmt;

pub const SCHEME: &str = "sqlserver";

/// Driver-facing connection string:
/// `sqlserver://<host>:<port>[/<database>][;instance=<instance>][;domain=<domain>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    dsn: String,
}

/// Borrowed view of the segments of a [`ConnectionTarget`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetParts<'a> {
    pub host: &'a str,
    pub port: u16,
    pub database: Option<&'a str>,
    pub instance: Option<&'a str>,
    pub domain: Option<&'a str>,
}

/// Build the connection target, each optional segment is appended only
/// when its source is non-empty. Callers validate the domain first.
#[must_use]
pub fn build_target(
    hostname: &str,
    port: u16,
    database: Option<&str>,
    instance: Option<&str>,
    domain: Option<&str>,
) -> ConnectionTarget {
    let mut dsn = format!("{SCHEME}://{hostname}:{port}");

    if let Some(database) = present(database) {
        dsn.push('/');
        dsn.push_str(database);
    }

    if let Some(instance) = present(instance) {
        dsn.push_str(";instance=");
        dsn.push_str(instance);
    }

    if let Some(domain) = present(domain) {
        dsn.push_str(";domain=");
        dsn.push_str(domain);
    }

    ConnectionTarget { dsn }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

impl ConnectionTarget {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.dsn
    }

    /// Split the target back into its segments
    ///
    /// # Errors
    ///
    /// Returns an error if the scheme, host or port are malformed or an
    /// unknown property is present
    pub fn parts(&self) -> Result<TargetParts<'_>, DriverError> {
        let invalid = |reason: &str| DriverError::InvalidTarget(format!("{reason}: {}", self.dsn));

        let rest = self
            .dsn
            .strip_prefix(SCHEME)
            .and_then(|rest| rest.strip_prefix("://"))
            .ok_or_else(|| invalid("unsupported scheme"))?;

        let mut segments = rest.split(';');
        let address = segments.next().unwrap_or_default();

        let (authority, database) = match address.split_once('/') {
            Some((authority, database)) => (authority, present(Some(database))),
            None => (address, None),
        };

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| invalid("missing port"))?;
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;

        let mut parts = TargetParts {
            host,
            port,
            database,
            instance: None,
            domain: None,
        };

        for segment in segments {
            match segment.split_once('=') {
                Some(("instance", value)) => parts.instance = present(Some(value)),
                Some(("domain", value)) => parts.domain = present(Some(value)),
                _ => return Err(invalid("unknown property")),
            }
        }

        Ok(parts)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dsn)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_build_minimal() {
        let target = build_target("h", 1433, Some(""), Some(""), Some(""));
        assert_eq!(target.as_str(), "sqlserver://h:1433");

        let target = build_target("h", 1433, None, None, None);
        assert_eq!(target.as_str(), "sqlserver://h:1433");
    }

    #[test]
    fn test_build_segments_in_order() {
        let target = build_target("db.local", 1434, Some("sales"), Some("SQLEXPRESS"), Some("CORP"));
        assert_eq!(
            target.to_string(),
            "sqlserver://db.local:1434/sales;instance=SQLEXPRESS;domain=CORP"
        );
    }

    #[test]
    fn test_build_each_segment_alone() {
        assert_eq!(
            build_target("h", 1, Some("db"), None, None).as_str(),
            "sqlserver://h:1/db"
        );
        assert_eq!(
            build_target("h", 1, None, Some("inst"), None).as_str(),
            "sqlserver://h:1;instance=inst"
        );
        assert_eq!(
            build_target("h", 1, None, None, Some("corp")).as_str(),
            "sqlserver://h:1;domain=corp"
        );
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = build_target("h", 1433, Some("db"), None, Some("corp"));
        let b = build_target("h", 1433, Some("db"), None, Some("corp"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parts_roundtrip() {
        let target = build_target("db.local", 1434, Some("sales"), Some("SQLEXPRESS"), Some("CORP"));
        let parts = target.parts().unwrap();
        assert_eq!(parts.host, "db.local");
        assert_eq!(parts.port, 1434);
        assert_eq!(parts.database, Some("sales"));
        assert_eq!(parts.instance, Some("SQLEXPRESS"));
        assert_eq!(parts.domain, Some("CORP"));

        let target = build_target("10.0.0.5", 1433, None, None, None);
        let parts = target.parts().unwrap();
        assert_eq!(parts.host, "10.0.0.5");
        assert_eq!(parts.database, None);
        assert_eq!(parts.instance, None);
        assert_eq!(parts.domain, None);
    }

    #[test]
    fn test_parts_rejects_malformed() {
        let target = build_target("", 1433, None, None, None);
        assert!(target.parts().is_err());

        let target = ConnectionTarget {
            dsn: "mysql://h:3306".to_string(),
        };
        assert!(matches!(target.parts(), Err(DriverError::InvalidTarget(_))));

        let target = ConnectionTarget {
            dsn: "sqlserver://h".to_string(),
        };
        assert!(target.parts().is_err());

        let target = ConnectionTarget {
            dsn: "sqlserver://h:1433;ssl=true".to_string(),
        };
        assert!(target.parts().is_err());
    }
}
