mod run;

use crate::{config::CheckConfig, report::OutputFormat, tls::TlsConfig};
use std::{process::ExitCode, time::Duration};

/// Action enum representing each possible command
#[derive(Debug)]
pub enum Action {
    Check {
        config: CheckConfig,
        tls: TlsConfig,
        format: OutputFormat,
        timeout: Option<Duration>,
    },
}

impl Action {
    /// Execute the action
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be written
    pub async fn execute(self) -> anyhow::Result<ExitCode> {
        run::execute(self).await
    }
}
