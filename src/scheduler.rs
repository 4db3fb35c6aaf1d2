use std::{future::Future, sync::Arc};

use anyhow::{Error, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{config::App, event, logging};

/// 啟動排程，依照 `system.schedule` 定時抓取油價
pub async fn start(sched: &JobScheduler, app: Arc<App>) -> Result<()> {
    let cron_expr = app.system.schedule.clone();
    let job = create_job(&cron_expr, move || {
        let app = app.clone();
        async move { event::fuel_price::execute(&app).await }
    })?;

    sched.add(job).await?;
    sched.start().await?;

    logging::info_console(format!("Scheduled fuel price crawling with '{}' (UTC)", cron_expr));

    Ok(())
}

fn create_job<F, Fut>(cron_expr: &str, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    let expr = cron_expr.to_string();

    Ok(Job::new_async(cron_expr, move |_uuid, _l| {
        let task = task.clone();
        let expr = expr.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    expr, why
                ));
            }
        })
    })?)
}
