//! The task worker daemon.
//!
//! Every `poll_interval` the worker claims up to `batch_size` queued tasks, runs each one and
//! records the outcome. Claiming uses `FOR UPDATE SKIP LOCKED`, so several replicas can poll the
//! same table. A task left `active` for `claim_timeout` (its worker crashed or lost the database
//! before recording an outcome) is claimed again. Provider calls are simulated against the
//! database.

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::TaskAction;
use crate::{
    config::TasksConfig,
    crypto::generate_ssh_key_pair,
    db::{
        handlers::{CloudVolumes, KeyPairs, Providers, Repository, Tasks},
        models::{
            key_pairs::KeyPairCreateDBRequest,
            tasks::{STATUS_ERROR, STATUS_OK, TaskDBResponse},
        },
    },
};

pub async fn run_task_worker(config: TasksConfig, db: PgPool, shutdown: CancellationToken) {
    info!(
        poll_interval = ?config.poll_interval,
        batch_size = config.batch_size,
        "Starting task worker"
    );

    loop {
        tokio::select! {
            _ = tokio::time::sleep(config.poll_interval) => {}
            _ = shutdown.cancelled() => {
                info!("Task worker shutting down");
                return;
            }
        }

        match process_batch(&db, &config).await {
            Ok(0) => {}
            Ok(processed) => debug!(processed, "Processed queued tasks"),
            Err(e) => warn!(error = %e, "Failed to process queued tasks"),
        }
    }
}

/// Claim and run one batch. Returns how many tasks had their outcome recorded; the others stay
/// `active` until `claim_timeout` hands them to the next poll.
pub async fn process_batch(db: &PgPool, config: &TasksConfig) -> anyhow::Result<usize> {
    let claimed = {
        let mut conn = db.acquire().await?;
        Tasks::new(&mut conn).claim_queued(config.batch_size, config.claim_timeout).await?
    };

    let mut finished = 0;
    for task in claimed {
        let (status, message) = match execute(db, &task).await {
            Ok(message) => (STATUS_OK, message),
            Err(e) => {
                warn!(task_id = task.id, error = %format!("{e:#}"), "Task failed");
                (STATUS_ERROR, format!("{e:#}"))
            }
        };

        let recorded = match db.acquire().await {
            Ok(mut conn) => Tasks::new(&mut conn).finish(task.id, status, &message).await.map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        };
        match recorded {
            Ok(_) => finished += 1,
            Err(e) => error!(task_id = task.id, error = %format!("{e:#}"), "Failed to record task outcome"),
        }
    }
    Ok(finished)
}

#[instrument(skip_all, fields(task_id = task.id, name = %task.name))]
async fn execute(db: &PgPool, task: &TaskDBResponse) -> anyhow::Result<String> {
    let action: TaskAction = serde_json::from_value(task.action.clone())?;
    let mut conn = db.acquire().await?;

    match action {
        TaskAction::CreateKeyPair { provider_id, name } => {
            let provider = Providers::new(&mut conn)
                .get_by_id(provider_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Provider id: {provider_id} not found"))?;
            let generated = generate_ssh_key_pair(&name)?;
            let key_pair = KeyPairs::new(&mut conn)
                .create(&KeyPairCreateDBRequest {
                    name: name.clone(),
                    provider_id: Some(provider.id),
                    fingerprint: Some(generated.fingerprint),
                    public_key: Some(generated.public_key),
                })
                .await?;
            Ok(format!("Created key pair {} (id {}) on {}", name, key_pair.id, provider.name))
        }
        TaskAction::DeleteKeyPair { key_pair_id } => {
            if KeyPairs::new(&mut conn).delete(key_pair_id).await? {
                Ok(format!("Deleted key pair id: {key_pair_id}"))
            } else {
                anyhow::bail!("Key pair id: {key_pair_id} not found")
            }
        }
        TaskAction::DeleteCloudVolume { volume_id } => {
            if CloudVolumes::new(&mut conn).delete(volume_id).await? {
                Ok(format!("Deleted cloud volume id: {volume_id}"))
            } else {
                anyhow::bail!("Cloud volume id: {volume_id} not found")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::tasks::STATE_FINISHED;
    use crate::tasks::{PgTaskQueue, TaskQueue};
    use crate::test_utils::{create_test_cloud_volume, create_test_provider};
    use std::time::Duration;

    fn config() -> TasksConfig {
        TasksConfig::default()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_key_pair_task(pool: PgPool) {
        let provider = create_test_provider(&pool, "openstack").await;
        let queue = PgTaskQueue::new(pool.clone());
        let task_id = queue
            .enqueue(
                "admin",
                TaskAction::CreateKeyPair {
                    provider_id: provider.id,
                    name: "deploy".to_string(),
                },
                "Creating Cloud Key Pair deploy",
            )
            .await
            .unwrap();

        assert_eq!(process_batch(&pool, &config()).await.unwrap(), 1);

        let mut conn = pool.acquire().await.unwrap();
        let task = Tasks::new(&mut conn).get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.state, STATE_FINISHED);
        assert_eq!(task.status.as_deref(), Some(STATUS_OK));

        let key_pairs = KeyPairs::new(&mut conn).list(&crate::db::handlers::Page::new(0, 10)).await.unwrap();
        assert_eq!(key_pairs.len(), 1);
        assert!(key_pairs[0].fingerprint.as_deref().unwrap().starts_with("SHA256:"));
        assert!(key_pairs[0].public_key.as_deref().unwrap().starts_with("ssh-ed25519 "));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_failed_task_records_error(pool: PgPool) {
        let queue = PgTaskQueue::new(pool.clone());
        let task_id = queue
            .enqueue("admin", TaskAction::DeleteKeyPair { key_pair_id: 404 }, "Deleting missing")
            .await
            .unwrap();

        process_batch(&pool, &config()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        let task = Tasks::new(&mut conn).get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.status.as_deref(), Some(STATUS_ERROR));
        assert_eq!(task.message.as_deref(), Some("Key pair id: 404 not found"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cloud_volume_task(pool: PgPool) {
        let provider = create_test_provider(&pool, "amazon").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "vol-1").await;
        let queue = PgTaskQueue::new(pool.clone());
        queue
            .enqueue("admin", TaskAction::DeleteCloudVolume { volume_id: volume.id }, "Deleting Cloud Volume vol-1")
            .await
            .unwrap();

        process_batch(&pool, &config()).await.unwrap();

        let mut conn = pool.acquire().await.unwrap();
        assert!(CloudVolumes::new(&mut conn).get_by_id(volume.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_task_abandoned_by_dead_worker_is_finished(pool: PgPool) {
        let provider = create_test_provider(&pool, "openstack").await;
        let volume = create_test_cloud_volume(&pool, provider.id, "vol-1").await;
        let task_id = PgTaskQueue::new(pool.clone())
            .enqueue("admin", TaskAction::DeleteCloudVolume { volume_id: volume.id }, "Deleting Cloud Volume vol-1")
            .await
            .unwrap();

        // A worker claims the task and dies before recording an outcome
        let mut conn = pool.acquire().await.unwrap();
        let claimed = Tasks::new(&mut conn).claim_queued(10, config().claim_timeout).await.unwrap();
        assert_eq!(claimed.len(), 1);
        assert_eq!(process_batch(&pool, &config()).await.unwrap(), 0);

        sqlx::query("UPDATE tasks SET updated_on = NOW() - INTERVAL '1 hour' WHERE id = $1")
            .bind(task_id)
            .execute(&mut *conn)
            .await
            .unwrap();

        assert_eq!(process_batch(&pool, &config()).await.unwrap(), 1);
        let task = Tasks::new(&mut conn).get_by_id(task_id).await.unwrap().unwrap();
        assert_eq!(task.state, STATE_FINISHED);
        assert_eq!(task.status.as_deref(), Some(STATUS_OK));
        assert!(CloudVolumes::new(&mut conn).get_by_id(volume.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_worker_stops_on_cancel(pool: PgPool) {
        let shutdown = CancellationToken::new();
        let config = TasksConfig {
            enabled: true,
            poll_interval: Duration::from_millis(10),
            batch_size: 5,
            claim_timeout: Duration::from_secs(60),
        };
        let handle = tokio::spawn(run_task_worker(config, pool, shutdown.clone()));
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
