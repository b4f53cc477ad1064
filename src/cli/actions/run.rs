use super::Action;
use std::process::ExitCode;

/// Execute the action's business logic by delegating to the appropriate module
pub async fn execute(action: Action) -> anyhow::Result<ExitCode> {
    match action {
        Action::Check {
            config,
            tls,
            format,
            timeout,
        } => crate::probe::run(config, tls, format, timeout).await,
    }
}
