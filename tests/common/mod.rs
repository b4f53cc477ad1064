#![allow(dead_code, clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use async_trait::async_trait;
use querypulse::{
    config::{AuthenticationMethod, CheckConfig},
    driver::{Connection, Credentials, Driver, RawResult, RawRow},
    error::DriverError,
    target::ConnectionTarget,
};
use std::{
    env,
    sync::{Arc, Mutex},
    time::Duration,
};

pub const MSSQL_HOST: &str = "localhost";
pub const MSSQL_PORT: u16 = 1433;
pub const MSSQL_USER: &str = "sa";
pub const MSSQL_PASSWORD: &str = "Querypulse_Secret1";

pub fn skip_if_no_mssql() -> bool {
    env::var("SKIP_MSSQL_TESTS").is_ok()
}

/// Config for the local SQL Server container, overridable through the
/// same `QUERYPULSE_*` variables the binary reads
pub fn mssql_config(query: &str) -> CheckConfig {
    CheckConfig {
        authentication_method: AuthenticationMethod::SqlServer,
        hostname: env::var("QUERYPULSE_HOST").unwrap_or_else(|_| MSSQL_HOST.to_string()),
        port: env::var("QUERYPULSE_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(MSSQL_PORT),
        username: env::var("QUERYPULSE_USERNAME").unwrap_or_else(|_| MSSQL_USER.to_string()),
        password: env::var("QUERYPULSE_PASSWORD")
            .unwrap_or_else(|_| MSSQL_PASSWORD.to_string()),
        sql_query: query.to_string(),
        ..CheckConfig::default()
    }
}

pub fn sql_server_config(query: &str) -> CheckConfig {
    CheckConfig {
        authentication_method: AuthenticationMethod::SqlServer,
        hostname: "db.example".into(),
        port: 1433,
        username: "monitor".into(),
        password: "secret".into(),
        sql_query: query.to_string(),
        ..CheckConfig::default()
    }
}

/// Resource lifecycle events observed by the fake driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Connect(String),
    Prepare(String),
    Query,
    Unprepare,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Connect,
    Prepare,
    Query,
    Unprepare,
    Close,
}

/// Scripted in-memory driver
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    columns: usize,
    rows: Vec<RawRow>,
    fail: Option<Failure>,
    closed_on_connect: bool,
    delay: Option<Duration>,
    query_delay: Option<Duration>,
    generated: Option<u64>,
    peak_buffered: Arc<Mutex<usize>>,
    events: Arc<Mutex<Vec<Event>>>,
}

impl FakeDriver {
    pub fn returning(rows: &[&[Option<&str>]]) -> Self {
        let rows: Vec<RawRow> = rows
            .iter()
            .map(|row| row.iter().map(|c| c.map(str::to_string)).collect())
            .collect();
        Self {
            columns: rows.first().map_or(1, Vec::len),
            rows,
            ..Self::default()
        }
    }

    pub fn single(value: &str) -> Self {
        Self::returning(&[&[Some(value)]])
    }

    /// Streams `count` rows `1..=count` through a bounded cursor
    pub fn counting(count: u64) -> Self {
        Self {
            columns: 1,
            generated: Some(count),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing(mut self, failure: Failure) -> Self {
        self.fail = Some(failure);
        self
    }

    #[must_use]
    pub fn closed_on_connect(mut self) -> Self {
        self.closed_on_connect = true;
        self
    }

    #[must_use]
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Delay inside `query`, after the statement is prepared
    #[must_use]
    pub fn slow_query(mut self, delay: Duration) -> Self {
        self.query_delay = Some(delay);
        self
    }

    /// Most rows the cursor held at once
    pub fn peak_buffered(&self) -> usize {
        *self.peak_buffered.lock().unwrap()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl Driver for FakeDriver {
    type Connection = FakeConnection;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        _credentials: &Credentials,
    ) -> Result<FakeConnection, DriverError> {
        self.record(Event::Connect(target.to_string()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail == Some(Failure::Connect) {
            return Err(DriverError::Rejected("Login failed for user 'monitor'".into()));
        }

        Ok(FakeConnection {
            driver: self.clone(),
            closed: self.closed_on_connect,
        })
    }
}

#[derive(Debug)]
pub struct FakeConnection {
    driver: FakeDriver,
    closed: bool,
}

#[derive(Debug)]
pub struct FakeStatement;

#[async_trait]
impl Connection for FakeConnection {
    type Statement = FakeStatement;

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn prepare(&mut self, sql: &str) -> Result<FakeStatement, DriverError> {
        self.driver.record(Event::Prepare(sql.to_string()));
        if self.driver.fail == Some(Failure::Prepare) {
            return Err(DriverError::Rejected("Incorrect syntax near 'SELEC'.".into()));
        }
        Ok(FakeStatement)
    }

    async fn query(&mut self, _statement: &FakeStatement) -> Result<RawResult, DriverError> {
        self.driver.record(Event::Query);
        if self.driver.fail == Some(Failure::Query) {
            return Err(DriverError::Rejected("Invalid object name 'missing'.".into()));
        }
        if let Some(delay) = self.driver.query_delay {
            tokio::time::sleep(delay).await;
        }

        let Some(count) = self.driver.generated else {
            return Ok(RawResult::new(self.driver.columns, self.driver.rows.clone()));
        };

        let mut result = RawResult::bounded(self.driver.columns, 1);
        let mut peak = 0;
        for i in 1..=count {
            result.push(vec![Some(i.to_string())]);
            peak = peak.max(result.buffered());
        }
        *self.driver.peak_buffered.lock().unwrap() = peak;
        Ok(result)
    }

    async fn unprepare(&mut self, _statement: FakeStatement) -> Result<(), DriverError> {
        self.driver.record(Event::Unprepare);
        if self.driver.fail == Some(Failure::Unprepare) {
            return Err(DriverError::Closed);
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        self.driver.record(Event::Close);
        self.closed = true;
        if self.driver.fail == Some(Failure::Close) {
            return Err(DriverError::Closed);
        }
        Ok(())
    }
}
