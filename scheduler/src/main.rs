// Birthday scheduler binary entry point

use anyhow::Context;
use common::bootstrap::init_scheduler;
use common::config::Settings;
use common::lifecycle::Lifecycle;
use common::telemetry::{init_logging, init_metrics};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging settings live in the configuration, so load it first
    let settings = Settings::load().context("Failed to load configuration")?;

    init_logging(
        &settings.observability.log_level,
        settings.observability.json,
    )?;

    info!("Starting birthday scheduler");

    info!(
        cron_expression = %settings.scheduler.cron_expression,
        timezone = %settings.scheduler.timezone,
        run_on_startup = settings.scheduler.run_on_startup,
        handle_leap_years = settings.scheduler.handle_leap_years,
        contacts_path = %settings.contacts.path.display(),
        "Configuration loaded"
    );

    if let Some(port) = settings.observability.metrics_port {
        init_metrics(port)?;
    }

    let scheduler = init_scheduler(&settings).map_err(|e| {
        error!(error = %e, "Failed to initialize scheduler");
        e
    })?;

    let lifecycle = Lifecycle::new(Arc::new(scheduler));
    if let Err(e) = lifecycle.run().await {
        error!(error = %e, "Scheduler error");
        return Err(e.into());
    }

    info!("Birthday scheduler stopped");
    Ok(())
}
