use std::process::ExitCode;

use calgary_route_alerts::{AlertsConfig, AlertsError, RouteAlert, run};

async fn try_main() -> Result<Vec<RouteAlert>, AlertsError> {
    let config = AlertsConfig::from_env()?;
    run(config).await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_target(false)
        .init();

    match try_main().await {
        Ok(alerts) => {
            tracing::info!("Found {} alerts for watched routes", alerts.len());
            ExitCode::SUCCESS
        }
        Err(AlertsError::HttpStatus { status, body }) => {
            tracing::error!(%status, %body, "Feed request failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = ?e, "Run aborted: {e}");
            ExitCode::FAILURE
        }
    }
}
