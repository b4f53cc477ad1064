use crate::{config::AuthenticationMethod, error::DriverError, target::ConnectionTarget};
use async_trait::async_trait;
use std::{collections::VecDeque, fmt};
use tracing::{debug, warn};

/// Login material handed to a [`Driver`]
#[derive(Clone)]
pub struct Credentials {
    pub method: AuthenticationMethod,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("method", &self.method)
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}

/// Opens connections to a database server
#[async_trait]
pub trait Driver: Sync {
    type Connection: Connection;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Self::Connection, DriverError>;
}

/// A live session able to prepare and run one statement at a time
#[async_trait]
pub trait Connection: Send {
    type Statement: Send + Sync;

    fn is_closed(&self) -> bool;

    async fn prepare(&mut self, sql: &str) -> Result<Self::Statement, DriverError>;

    async fn query(&mut self, statement: &Self::Statement) -> Result<RawResult, DriverError>;

    async fn unprepare(&mut self, statement: Self::Statement) -> Result<(), DriverError>;

    async fn close(&mut self) -> Result<(), DriverError>;
}

/// One row, SQL NULL is `None`
pub type RawRow = Vec<Option<String>>;

/// Tabular result of an execution, rows are handed out in cursor order
/// Forward-only result set.
///
/// A bounded result keeps at most `window` unread rows: older ones are
/// dropped as new rows arrive and only counted in [`RawResult::passed`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawResult {
    column_count: usize,
    rows: VecDeque<RawRow>,
    window: Option<usize>,
    passed: u64,
    closed: bool,
}

impl RawResult {
    #[must_use]
    pub fn new(column_count: usize, rows: Vec<RawRow>) -> Self {
        Self {
            column_count,
            rows: rows.into(),
            ..Self::default()
        }
    }

    /// Result that only ever holds the latest `window` rows
    #[must_use]
    pub fn bounded(column_count: usize, window: usize) -> Self {
        Self {
            column_count,
            rows: VecDeque::with_capacity(window.max(1)),
            window: Some(window.max(1)),
            ..Self::default()
        }
    }

    pub fn push(&mut self, row: RawRow) {
        self.rows.push_back(row);
        if let Some(window) = self.window {
            while self.rows.len() > window {
                self.rows.pop_front();
                self.passed += 1;
            }
        }
    }

    #[must_use]
    pub const fn column_count(&self) -> usize {
        self.column_count
    }

    /// Rows dropped before they could be read
    #[must_use]
    pub const fn passed(&self) -> u64 {
        self.passed
    }

    /// Rows currently held in memory
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.rows.len()
    }

    /// Advance the cursor, `None` once exhausted or closed
    pub fn next_row(&mut self) -> Option<RawRow> {
        if self.closed {
            return None;
        }
        self.rows.pop_front()
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        self.rows.clear();
        self.closed = true;
    }
}

/// Resources acquired during one check.
///
/// [`Scope::release`] closes whatever was acquired, cursor first, then the
/// statement, then the connection, skipping anything already closed.
pub struct Scope<C: Connection> {
    pub(crate) connection: Option<C>,
    pub(crate) statement: Option<C::Statement>,
    pub(crate) cursor: Option<RawResult>,
}

impl<C: Connection> Default for Scope<C> {
    fn default() -> Self {
        Self {
            connection: None,
            statement: None,
            cursor: None,
        }
    }
}

impl<C: Connection> Scope<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn holds_connection(&self) -> bool {
        self.connection.is_some()
    }

    #[must_use]
    pub const fn holds_statement(&self) -> bool {
        self.statement.is_some()
    }

    #[must_use]
    pub const fn holds_cursor(&self) -> bool {
        self.cursor.is_some()
    }

    /// Release everything held, close failures are logged and swallowed
    pub async fn release(&mut self) {
        if let Some(mut cursor) = self.cursor.take()
            && !cursor.is_closed()
        {
            debug!("closing result set");
            cursor.close();
        }

        if let Some(statement) = self.statement.take() {
            match self.connection.as_mut() {
                Some(connection) if !connection.is_closed() => {
                    debug!("closing prepared statement");
                    if let Err(err) = connection.unprepare(statement).await {
                        warn!(error = %err, "error while closing prepared statement");
                    }
                }
                _ => debug!("connection already closed, dropping prepared statement"),
            }
        }

        if let Some(mut connection) = self.connection.take()
            && !connection.is_closed()
        {
            debug!("closing connection");
            if let Err(err) = connection.close().await {
                warn!(error = %err, "error while closing connection");
            }
        }
    }
}
