//! SQL Server driver built on tiberius
//!
//! Statements go through `sp_prepare`/`sp_execute`/`sp_unprepare` so that a
//! malformed query is rejected before anything runs.

use crate::{
    config::AuthenticationMethod,
    driver::{Connection, Credentials, Driver, RawResult, RawRow},
    error::DriverError,
    target::{ConnectionTarget, TargetParts},
    tls::{TlsConfig, TlsMode},
};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use futures::TryStreamExt;
use rust_decimal::Decimal;
use std::borrow::Cow;
use tiberius::{
    AuthMethod, Client, ColumnData, Config, EncryptionLevel, FromSql, QueryItem, Row, SqlBrowser,
    numeric::Numeric,
};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

pub const DEFAULT_PORT: u16 = 1433;

const PREPARE: &str = "DECLARE @handle int; EXEC sp_prepare @handle OUTPUT, NULL, @P1; SELECT @handle;";
const EXECUTE: &str = "EXEC sp_execute @P1";
const UNPREPARE: &str = "EXEC sp_unprepare @P1";

type TdsClient = Client<Compat<TcpStream>>;

#[derive(Debug, Clone, Default)]
pub struct MssqlDriver {
    tls: TlsConfig,
}

impl MssqlDriver {
    #[must_use]
    pub const fn new(tls: TlsConfig) -> Self {
        Self { tls }
    }
}

/// Translate a connection target into a tiberius [`Config`]
///
/// # Errors
///
/// Returns an error if the target is malformed or Windows authentication
/// is requested on a platform without NTLM support
pub fn tds_config(
    parts: &TargetParts<'_>,
    credentials: &Credentials,
    tls: &TlsConfig,
) -> Result<Config, DriverError> {
    let mut config = Config::new();
    config.host(parts.host);
    config.port(parts.port);
    config.application_name(env!("CARGO_PKG_NAME"));

    if let Some(database) = parts.database {
        config.database(database);
    }

    if let Some(instance) = parts.instance {
        config.instance_name(instance);
    }

    match credentials.method {
        AuthenticationMethod::SqlServer => {
            config.authentication(AuthMethod::sql_server(
                &credentials.username,
                &credentials.password,
            ));
        }
        AuthenticationMethod::Windows => {
            let domain = parts.domain.ok_or_else(|| {
                DriverError::InvalidTarget("Windows authentication requires a domain".into())
            })?;

            #[cfg(windows)]
            {
                config.authentication(AuthMethod::windows(
                    format!("{domain}\\{}", credentials.username),
                    &credentials.password,
                ));
            }
            #[cfg(not(windows))]
            {
                return Err(DriverError::Rejected(format!(
                    "Windows authentication ({domain}\\{}) is only supported on Windows hosts",
                    credentials.username
                )));
            }
        }
    }

    match tls.mode {
        TlsMode::Disable => config.encryption(EncryptionLevel::NotSupported),
        TlsMode::Require => {
            config.encryption(EncryptionLevel::Required);
            config.trust_cert();
        }
        TlsMode::VerifyCA | TlsMode::VerifyFull => {
            config.encryption(EncryptionLevel::Required);
            match &tls.ca {
                Some(ca) => config.trust_cert_ca(ca.to_string_lossy()),
                None => debug!("verifying server certificate against system roots"),
            }
        }
    }

    Ok(config)
}

#[async_trait]
impl Driver for MssqlDriver {
    type Connection = MssqlConnection;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<MssqlConnection, DriverError> {
        let parts = target.parts()?;
        let config = tds_config(&parts, credentials, &self.tls)?;

        let tcp = if parts.instance.is_some() {
            debug!(instance = parts.instance, "resolving named instance through SQL Browser");
            TcpStream::connect_named(&config).await?
        } else {
            TcpStream::connect(config.get_addr()).await?
        };
        tcp.set_nodelay(true)?;

        debug!(
            tls = self.tls.mode.is_enabled(),
            verify = self.tls.mode.verifies_certificate(),
            "starting TDS handshake"
        );
        let client = Client::connect(config, tcp.compat_write()).await?;
        debug!("successfully connected to SQL Server");

        Ok(MssqlConnection {
            client: Some(client),
        })
    }
}

/// Open TDS session, `None` once closed
pub struct MssqlConnection {
    client: Option<TdsClient>,
}

/// Server-side prepared statement handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MssqlStatement {
    handle: i32,
}

impl MssqlConnection {
    fn client(&mut self) -> Result<&mut TdsClient, DriverError> {
        self.client.as_mut().ok_or(DriverError::Closed)
    }
}

#[async_trait]
impl Connection for MssqlConnection {
    type Statement = MssqlStatement;

    fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    async fn prepare(&mut self, sql: &str) -> Result<MssqlStatement, DriverError> {
        let results = self
            .client()?
            .query(PREPARE, &[&sql])
            .await?
            .into_results()
            .await?;

        let handle = match results.last().and_then(|rows| rows.first()) {
            Some(row) => row.try_get::<i32, _>(0_usize)?,
            None => None,
        }
        .ok_or_else(|| DriverError::Rejected("sp_prepare returned no statement handle".into()))?;

        debug!(handle, "statement prepared");
        Ok(MssqlStatement { handle })
    }

    async fn query(&mut self, statement: &MssqlStatement) -> Result<RawResult, DriverError> {
        let mut stream = self.client()?.query(EXECUTE, &[&statement.handle]).await?;

        let mut result = RawResult::bounded(0, 1);

        // drain every result set so the session is clean, keep the first one
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(meta) if meta.result_index() == 0 => {
                    result = RawResult::bounded(meta.columns().len(), 1);
                }
                QueryItem::Row(row) if row.result_index() == 0 => result.push(render_row(row)?),
                _ => {}
            }
        }

        debug!(
            passed = result.passed(),
            buffered = result.buffered(),
            column_count = result.column_count(),
            "result set received"
        );
        Ok(result)
    }

    async fn unprepare(&mut self, statement: MssqlStatement) -> Result<(), DriverError> {
        self.client()?
            .execute(UNPREPARE, &[&statement.handle])
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn render_row(row: Row) -> Result<RawRow, DriverError> {
    row.into_iter().map(render_column).collect()
}

/// Render a column value the way a JDBC `getString` would, `None` for NULL
///
/// # Errors
///
/// Returns an error if a temporal value cannot be decoded
pub fn render_column(data: ColumnData<'static>) -> Result<Option<String>, DriverError> {
    let text = match data {
        ColumnData::Bit(v) => v.map(|v| if v { "1" } else { "0" }.to_string()),
        ColumnData::U8(v) => v.map(|v| v.to_string()),
        ColumnData::I16(v) => v.map(|v| v.to_string()),
        ColumnData::I32(v) => v.map(|v| v.to_string()),
        ColumnData::I64(v) => v.map(|v| v.to_string()),
        ColumnData::F32(v) => v.map(|v| render_float(v.to_string())),
        ColumnData::F64(v) => v.map(|v| render_float(v.to_string())),
        ColumnData::String(v) => v.map(Cow::into_owned),
        ColumnData::Guid(v) => v.map(|v| v.to_string().to_uppercase()),
        ColumnData::Binary(v) => v.map(|bytes| render_hex(&bytes)),
        ColumnData::Numeric(v) => v.map(render_decimal),
        ColumnData::Xml(v) => v.map(|xml| xml.into_owned().into_string()),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(&data)?.map(|v| v.to_string())
        }
        ColumnData::Date(_) => NaiveDate::from_sql(&data)?.map(|v| v.to_string()),
        ColumnData::Time(_) => NaiveTime::from_sql(&data)?.map(|v| v.to_string()),
        ColumnData::DateTimeOffset(_) => {
            DateTime::<FixedOffset>::from_sql(&data)?.map(|v| v.to_string())
        }
    };

    Ok(text)
}

/// Exact decimal text with the column scale, `DECIMAL(p,0)` has no fraction.
/// Values beyond 96 bits or scale 28 fall back to float text.
fn render_decimal(numeric: Numeric) -> String {
    let scale = numeric.scale();
    match Decimal::try_from_i128_with_scale(numeric.value(), u32::from(scale)) {
        Ok(decimal) => decimal.to_string(),
        Err(err) => {
            debug!(error = %err, "decimal out of range, rendering as float");
            #[allow(clippy::cast_precision_loss)]
            let value = numeric.value() as f64 / 10_f64.powi(i32::from(scale));
            render_float(value.to_string())
        }
    }
}

/// Whole floats keep a fractional part so they still read as floats
fn render_float(text: String) -> String {
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        format!("{text}.0")
    } else {
        text
    }
}

fn render_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut hex, b| {
        let _ = write!(hex, "{b:02X}");
        hex
    })
}
