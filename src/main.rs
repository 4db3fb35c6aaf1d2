pub mod config;
pub mod crawler;
pub mod declare;
pub mod event;
pub mod history;
pub mod logging;
pub mod scheduler;
pub mod util;

use std::{env, sync::Arc};

use anyhow::Result;
use tokio_cron_scheduler::JobScheduler;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let result = run().await;
    logging::flush();

    result
}

async fn run() -> Result<()> {
    let app = Arc::new(config::App::get()?);

    logging::info_file_async(format!(
        "FuelCrawler started. Rust OS/Arch: {}/{} lat={} lng={} rad={} type={}",
        env::consts::OS,
        env::consts::ARCH,
        app.tracker.lat,
        app.tracker.lng,
        app.tracker.radius,
        app.tracker.fuel_type
    ));

    event::fuel_price::execute(&app).await?;

    if app.system.schedule.is_empty() {
        return Ok(());
    }

    let mut sched = JobScheduler::new().await?;
    scheduler::start(&sched, app.clone()).await?;

    tokio::signal::ctrl_c().await?;
    logging::info_console("Shutting down".to_string());
    sched.shutdown().await?;

    Ok(())
}
