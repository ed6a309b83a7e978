//! Resource waiting with exponential backoff.
//!
//! Provides a generic abstraction for waiting on AWS resources to reach a
//! target state, with configurable exponential backoff, jitter, an attempt
//! ceiling and a total timeout, plus the concrete waiters the services use.

use crate::aws::error::AwsError;
use crate::aws::types::{InstanceInfo, InstanceState, KeyMetadata, KeyState, TableStatus};
use crate::aws::{DynamoDbOperations, Ec2Operations, KmsOperations};
use aegis_common::defaults::{
    INSTANCE_WAIT_MAX_ATTEMPTS, INSTANCE_WAIT_TIMEOUT_SECS, KEY_WAIT_MAX_ATTEMPTS,
    KEY_WAIT_TIMEOUT_SECS, TABLE_WAIT_MAX_ATTEMPTS, TABLE_WAIT_TIMEOUT_SECS,
};
use backon::{BackoffBuilder, ExponentialBuilder};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Configuration for resource waiting with exponential backoff.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    /// Initial delay between checks
    pub initial_delay: Duration,
    /// Maximum delay between checks (cap for exponential growth)
    pub max_delay: Duration,
    /// Maximum total time to wait before timeout
    pub timeout: Duration,
    /// Maximum number of checks before timeout
    pub max_attempts: u32,
    /// Add random jitter to delays
    pub jitter: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            timeout: Duration::from_secs(60),
            max_attempts: 30,
            jitter: true,
        }
    }
}

impl WaitConfig {
    /// Instance running/terminated waits
    pub fn instance() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(15),
            timeout: Duration::from_secs(INSTANCE_WAIT_TIMEOUT_SECS),
            max_attempts: INSTANCE_WAIT_MAX_ATTEMPTS,
            jitter: true,
        }
    }

    /// Table active wait
    pub fn table() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(20),
            timeout: Duration::from_secs(TABLE_WAIT_TIMEOUT_SECS),
            max_attempts: TABLE_WAIT_MAX_ATTEMPTS,
            jitter: true,
        }
    }

    /// Key enabled wait
    pub fn key() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            timeout: Duration::from_secs(KEY_WAIT_TIMEOUT_SECS),
            max_attempts: KEY_WAIT_MAX_ATTEMPTS,
            jitter: true,
        }
    }

    /// Poll without sleeping; for tests against in-memory fakes.
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            timeout: Duration::from_secs(5),
            max_attempts,
            jitter: false,
        }
    }
}

/// Wait settings for every waiter a run uses, plus the launch retry backoff.
#[derive(Debug, Clone)]
pub struct WaitPolicies {
    pub instance: WaitConfig,
    pub table: WaitConfig,
    pub key: WaitConfig,
    /// Backoff for RunInstances while IAM propagates or AWS throttles
    pub launch_retry: ExponentialBuilder,
}

impl Default for WaitPolicies {
    fn default() -> Self {
        Self {
            instance: WaitConfig::instance(),
            table: WaitConfig::table(),
            key: WaitConfig::key(),
            launch_retry: ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs(2))
                .with_max_delay(Duration::from_secs(30))
                .with_max_times(8),
        }
    }
}

impl WaitPolicies {
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            instance: WaitConfig::immediate(20),
            table: WaitConfig::immediate(20),
            key: WaitConfig::immediate(20),
            launch_retry: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(1))
                .with_max_delay(Duration::from_millis(1))
                .with_max_times(3),
        }
    }
}

/// Why a wait ended without the resource becoming ready
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Timeout waiting for {resource} after {elapsed:?} ({attempts} attempts)")]
    Timeout {
        resource: String,
        attempts: u32,
        elapsed: Duration,
    },

    #[error("Failed to check {resource}")]
    Poll {
        resource: String,
        #[source]
        source: AwsError,
    },

    #[error("{resource} entered unexpected state '{state}'")]
    UnexpectedState { resource: String, state: String },
}

impl WaitError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    fn poll(resource: &str, source: AwsError) -> Self {
        WaitError::Poll {
            resource: resource.to_string(),
            source,
        }
    }

    fn unexpected(resource: &str, state: impl ToString) -> Self {
        WaitError::UnexpectedState {
            resource: resource.to_string(),
            state: state.to_string(),
        }
    }
}

/// Wait for a resource to become ready with exponential backoff.
///
/// # Arguments
/// * `config` - Wait configuration
/// * `check` - Async function that returns `Ok(Some(value))` when ready,
///   `Ok(None)` to retry, `Err` to stop
/// * `resource_name` - Name for logging and errors
///
/// # Returns
/// * `Ok(value)` - Resource is ready
/// * `Err` - Timeout, attempt ceiling reached, or check returned an error
pub async fn wait_for_resource<T, F, Fut>(
    config: &WaitConfig,
    check: F,
    resource_name: &str,
) -> Result<T, WaitError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<T>, WaitError>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    let mut builder = ExponentialBuilder::default()
        .with_min_delay(config.initial_delay)
        .with_max_delay(config.max_delay)
        .with_factor(2.0)
        .without_max_times();
    if config.jitter {
        builder = builder.with_jitter();
    }
    let mut delays = builder.build();
    let timeout = |attempts| WaitError::Timeout {
        resource: resource_name.to_string(),
        attempts,
        elapsed: start.elapsed(),
    };

    loop {
        if start.elapsed() >= config.timeout {
            return Err(timeout(attempts));
        }
        attempts += 1;

        match check().await {
            Ok(Some(value)) => {
                debug!(resource = %resource_name, attempts, "Resource ready");
                return Ok(value);
            }
            Ok(None) => {
                if attempts >= config.max_attempts {
                    return Err(timeout(attempts));
                }
                // Never sleep past the deadline
                let remaining = config.timeout.saturating_sub(start.elapsed());
                let delay = delays.next().unwrap_or(config.max_delay).min(remaining);
                debug!(
                    resource = %resource_name,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Resource not ready, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                warn!(resource = %resource_name, error = %e, "Resource check failed");
                return Err(e);
            }
        }
    }
}

/// Wait until every instance in `ids` is running.
///
/// Returns the described instances (public IPs included). Instances that are
/// not yet visible are retried; shutting-down, terminated and stopping are
/// fatal.
pub async fn wait_for_instances_running<E: Ec2Operations>(
    ec2: &E,
    ids: &[String],
    config: &WaitConfig,
) -> Result<Vec<InstanceInfo>, WaitError> {
    let resource = format!("instances {} running", ids.join(","));
    wait_for_resource(
        config,
        || async {
            let instances = match ec2.describe_instances(ids.to_vec()).await {
                Ok(instances) => instances,
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(WaitError::poll(&resource, e)),
            };

            for instance in &instances {
                if matches!(
                    instance.state,
                    InstanceState::ShuttingDown | InstanceState::Terminated | InstanceState::Stopping
                ) {
                    return Err(WaitError::unexpected(
                        &format!("instance {}", instance.instance_id),
                        instance.state,
                    ));
                }
            }

            let all_running = ids.iter().all(|id| {
                instances
                    .iter()
                    .any(|i| &i.instance_id == id && i.state == InstanceState::Running)
            });
            Ok(all_running.then_some(instances))
        },
        &resource,
    )
    .await
}

/// Wait until every instance in `ids` is stopped.
///
/// Used to let a stopping worker settle before it is started again.
/// Shutting-down and terminated are fatal.
pub async fn wait_for_instances_stopped<E: Ec2Operations>(
    ec2: &E,
    ids: &[String],
    config: &WaitConfig,
) -> Result<(), WaitError> {
    let resource = format!("instances {} stopped", ids.join(","));
    wait_for_resource(
        config,
        || async {
            let instances = match ec2.describe_instances(ids.to_vec()).await {
                Ok(instances) => instances,
                Err(e) if e.is_not_found() => return Ok(None),
                Err(e) => return Err(WaitError::poll(&resource, e)),
            };

            if let Some(gone) = instances.iter().find(|i| {
                matches!(i.state, InstanceState::ShuttingDown | InstanceState::Terminated)
            }) {
                return Err(WaitError::unexpected(
                    &format!("instance {}", gone.instance_id),
                    gone.state,
                ));
            }

            let all_stopped = ids.iter().all(|id| {
                instances
                    .iter()
                    .any(|i| &i.instance_id == id && i.state == InstanceState::Stopped)
            });
            Ok(all_stopped.then_some(()))
        },
        &resource,
    )
    .await
}

/// Wait until every instance in `ids` is terminated or no longer described.
pub async fn wait_for_instances_terminated<E: Ec2Operations>(
    ec2: &E,
    ids: &[String],
    config: &WaitConfig,
) -> Result<(), WaitError> {
    let resource = format!("instances {} terminated", ids.join(","));
    wait_for_resource(
        config,
        || async {
            let instances = match ec2.describe_instances(ids.to_vec()).await {
                Ok(instances) => instances,
                Err(e) if e.is_not_found() => return Ok(Some(())),
                Err(e) => return Err(WaitError::poll(&resource, e)),
            };
            let done = instances
                .iter()
                .all(|i| i.state == InstanceState::Terminated);
            Ok(done.then_some(()))
        },
        &resource,
    )
    .await
}

/// Wait until a table exists and is ACTIVE.
pub async fn wait_for_table_active<D: DynamoDbOperations>(
    dynamodb: &D,
    table: &str,
    config: &WaitConfig,
) -> Result<(), WaitError> {
    let resource = format!("table {table}");
    wait_for_resource(
        config,
        || async {
            match dynamodb.describe_table_status(table).await {
                Ok(TableStatus::Active) => Ok(Some(())),
                Ok(TableStatus::Creating | TableStatus::Updating) => Ok(None),
                Ok(TableStatus::Deleting) => Err(WaitError::unexpected(&resource, "DELETING")),
                Ok(TableStatus::Other(s)) => Err(WaitError::unexpected(&resource, s)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(WaitError::poll(&resource, e)),
            }
        },
        &resource,
    )
    .await
}

/// Wait until a key is Enabled.
pub async fn wait_for_key_enabled<K: KmsOperations>(
    kms: &K,
    key_id: &str,
    config: &WaitConfig,
) -> Result<KeyMetadata, WaitError> {
    let resource = format!("key {key_id}");
    wait_for_resource(
        config,
        || async {
            match kms.describe_key(key_id).await {
                Ok(meta) if meta.state == KeyState::Enabled => Ok(Some(meta)),
                Ok(meta) if matches!(meta.state, KeyState::Creating | KeyState::Unavailable) => {
                    Ok(None)
                }
                Ok(meta) => Err(WaitError::unexpected(&resource, format!("{:?}", meta.state))),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(WaitError::poll(&resource, e)),
            }
        },
        &resource,
    )
    .await
}
