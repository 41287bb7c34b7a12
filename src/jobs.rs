use crate::errors::GateError;
use crate::storage;
use sea_orm::DatabaseConnection;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

pub const CLEANUP_EXPIRED_SESSIONS: &str = "cleanup_expired_sessions";

/// Initialize and start the job scheduler with all background tasks
pub async fn init_scheduler(db: DatabaseConnection) -> Result<JobScheduler, GateError> {
    let sched = JobScheduler::new()
        .await
        .map_err(|e| GateError::Other(format!("Failed to create job scheduler: {}", e)))?;

    // Cleanup expired sessions job - runs every hour
    let cleanup_sessions_job = Job::new_async("0 0 * * * *", move |_uuid, _l| {
        let db = db.clone();
        Box::pin(async move {
            info!("Running {} job", CLEANUP_EXPIRED_SESSIONS);
            match storage::cleanup_expired_sessions(&db).await {
                Ok(count) => info!("Cleaned up {} expired sessions", count),
                Err(e) => error!("Failed to cleanup expired sessions: {}", e),
            }
        })
    })
    .map_err(|e| GateError::Other(format!("Failed to create cleanup sessions job: {}", e)))?;

    sched
        .add(cleanup_sessions_job)
        .await
        .map_err(|e| GateError::Other(format!("Failed to add cleanup sessions job: {}", e)))?;

    sched
        .start()
        .await
        .map_err(|e| GateError::Other(format!("Failed to start job scheduler: {}", e)))?;

    info!("Job scheduler started");

    Ok(sched)
}

/// Run a job by name right away, returning the number of records it touched
pub async fn trigger_job_manually(
    db: &DatabaseConnection,
    job_name: &str,
) -> Result<u64, GateError> {
    info!("Manually triggering job: {}", job_name);

    let result = match job_name {
        CLEANUP_EXPIRED_SESSIONS => storage::cleanup_expired_sessions(db).await,
        _ => {
            return Err(GateError::Other(format!("Unknown job name: {}", job_name)));
        }
    };

    match &result {
        Ok(count) => info!(
            "Manually triggered job {} completed: {} records",
            job_name, count
        ),
        Err(e) => error!("Manually triggered job {} failed: {}", job_name, e),
    }

    result
}
