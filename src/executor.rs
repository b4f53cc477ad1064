use crate::{
    driver::{Connection, Credentials, Driver, RawResult, Scope},
    error::ProbeError,
    target::ConnectionTarget,
};
use tracing::{debug, error};

/// Connect, prepare and execute `query`.
///
/// Each acquired resource is parked in `scope` as soon as it exists, so a
/// failure at any later step still leaves it there for release. No retries.
///
/// # Errors
///
/// Returns [`ProbeError::ConnectionFailed`] or [`ProbeError::ConnectionClosed`]
/// when no usable connection is obtained,
/// [`ProbeError::StatementPreparationFailed`] when the query is rejected and
/// [`ProbeError::ExecutionFailed`] when running it fails.
pub async fn execute<'s, D: Driver>(
    driver: &D,
    target: &ConnectionTarget,
    credentials: &Credentials,
    query: &str,
    scope: &'s mut Scope<D::Connection>,
) -> Result<&'s mut RawResult, ProbeError> {
    debug!(dsn = %target, "connecting to database");
    let connection = driver
        .connect(target, credentials)
        .await
        .map_err(|err| {
            error!(error = %err, "error while getting remote connection");
            ProbeError::ConnectionFailed(err)
        })?;
    let connection = scope.connection.insert(connection);

    if connection.is_closed() {
        error!("connection reported closed right after connecting");
        return Err(ProbeError::ConnectionClosed);
    }

    debug!("preparing statement");
    let statement = connection.prepare(query).await.map_err(|err| {
        error!(error = %err, "error while creating prepared statement");
        ProbeError::StatementPreparationFailed(err)
    })?;
    let statement = scope.statement.insert(statement);

    debug!("executing prepared statement");
    let result = connection.query(statement).await.map_err(|err| {
        error!(error = %err, "error while executing prepared statement");
        ProbeError::ExecutionFailed(err)
    })?;

    debug!(
        columns = result.column_count(),
        "execution returned a result set"
    );
    Ok(scope.cursor.insert(result))
}
