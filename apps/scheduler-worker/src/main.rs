//! Verdant scheduler worker.
//!
//! A long-running background process that periodically executes due
//! recurrence trigger rules, creating compliance schedules and deadlines.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use config::Config;
use tokio::signal;
use tracing::{error, info, warn};
use verdant_db::{run_migrations, DbPool};
use verdant_scheduling::{
    HolidayCalendar, StaticHolidayCalendar, TriggerExecutorInput, TriggerExecutorJob,
};

#[tokio::main]
async fn main() {
    // Load configuration (fail-fast on missing required values)
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    logging::init_logging(&config.rust_log);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        poll_interval_secs = config.poll_interval_secs,
        batch_size = config.trigger_batch_size,
        "Starting scheduler worker"
    );

    let calendar: Arc<dyn HolidayCalendar> = match &config.public_holidays {
        Some(value) => match StaticHolidayCalendar::parse(value) {
            Ok(calendar) => Arc::new(calendar),
            Err(e) => {
                eprintln!("Error: invalid PUBLIC_HOLIDAYS: {e}");
                std::process::exit(1);
            }
        },
        None => Arc::new(StaticHolidayCalendar::empty()),
    };

    let pool = match DbPool::connect_with(&config.database_url, config.max_db_connections).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: failed to connect to database: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(&pool).await {
        eprintln!("Error: failed to run migrations: {e}");
        std::process::exit(1);
    }
    info!("Migrations applied");

    let job = TriggerExecutorJob::new(pool.inner().clone(), calendar)
        .with_batch_size(config.trigger_batch_size);
    let input = TriggerExecutorInput {
        company_id: config.company_id,
        batch_size: None,
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // A failed cycle is logged and the worker keeps polling;
                // transient database outages must not kill the process.
                match job.run(&input).await {
                    Ok(stats) => {
                        info!(
                            processed = stats.processed,
                            fired = stats.fired,
                            skipped = stats.skipped,
                            failed = stats.failed,
                            "Trigger executor cycle complete"
                        );
                    }
                    Err(e) => {
                        error!(error = %e, "Trigger executor cycle failed");
                    }
                }
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    warn!(error = %e, "Failed to listen for shutdown signal");
                }
                info!("Shutdown signal received, stopping worker");
                break;
            }
        }
    }
}
