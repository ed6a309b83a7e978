//! Worker instance: discovery by tag, launch or reuse, teardown
//!
//! The instance is never recorded anywhere. Every operation finds it again
//! through its `Name` tag, so a crashed or repeated run converges on the
//! same single worker.

use crate::aws::cleanup::{CleanupReport, CleanupResult, best_effort};
use crate::aws::error::AwsError;
use crate::aws::types::{InstanceInfo, InstanceState, LaunchSpec};
use crate::aws::{Ec2Operations, SsmOperations};
use crate::config::ComputeConfig;
use crate::wait::{
    WaitConfig, wait_for_instances_running, wait_for_instances_stopped,
    wait_for_instances_terminated,
};
use aegis_common::ResourceKind;
use aegis_common::tags::{TAG_NAME, WORKER_TAG_VALUE, standard_tags, worker_tags};
use anyhow::{Context, Result, bail};
use backon::{ExponentialBuilder, Retryable};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// SSH port opened on the worker security group
pub const SSH_PORT: i32 = 22;

/// Everything a fresh launch needs from earlier steps
#[derive(Debug, Clone, Copy)]
pub struct LaunchRequest<'a> {
    pub ami_id: &'a str,
    pub key_name: &'a str,
    pub security_group_id: &'a str,
    pub instance_profile: &'a str,
}

pub struct ComputeService<'a, E, S> {
    ec2: &'a E,
    ssm: &'a S,
    settings: &'a ComputeConfig,
    wait: &'a WaitConfig,
    launch_retry: ExponentialBuilder,
}

/// Write a private key to `<dir>/<name>.pem`, readable by the owner only.
///
/// A stale file from an earlier key pair is replaced.
pub fn write_private_key(dir: &Path, name: &str, material: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(format!("{name}.pem"));
    match std::fs::remove_file(&path) {
        Ok(()) => warn!(path = %path.display(), "Replacing stale private key file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o400);
    }
    let mut file = options.open(&path)?;
    file.write_all(material.as_bytes())?;
    Ok(path)
}

fn is_retryable_launch_error(e: &AwsError) -> bool {
    matches!(e, AwsError::IamPropagationDelay | AwsError::Throttled)
}

fn public_ip(instances: &[InstanceInfo], instance_id: &str) -> Result<String> {
    instances
        .iter()
        .find(|i| i.instance_id == instance_id)
        .and_then(|i| i.public_ip.clone())
        .with_context(|| format!("Instance {instance_id} has no public IP address"))
}

impl<'a, E: Ec2Operations, S: SsmOperations> ComputeService<'a, E, S> {
    pub fn new(
        ec2: &'a E,
        ssm: &'a S,
        settings: &'a ComputeConfig,
        wait: &'a WaitConfig,
        launch_retry: ExponentialBuilder,
    ) -> Self {
        Self {
            ec2,
            ssm,
            settings,
            wait,
            launch_retry,
        }
    }

    /// Find the live worker, if any.
    pub async fn discover(&self) -> Result<Option<InstanceInfo>, AwsError> {
        let mut found = self
            .ec2
            .describe_instances_by_tag(TAG_NAME, WORKER_TAG_VALUE, InstanceState::LIVE.to_vec())
            .await?;

        if found.len() > 1 {
            let ids: Vec<&str> = found.iter().map(|i| i.instance_id.as_str()).collect();
            warn!(?ids, "Multiple worker instances found, using the first");
        }
        Ok((!found.is_empty()).then(|| found.swap_remove(0)))
    }

    /// Latest AMI id published under an SSM parameter
    pub async fn resolve_ami(&self, parameter: &str) -> Result<String> {
        let ami_id = self
            .ssm
            .get_parameter(parameter)
            .await
            .with_context(|| format!("Failed to resolve AMI from {parameter}"))?;
        info!(ami = %ami_id, "Resolved AMI");
        Ok(ami_id)
    }

    /// Create the key pair and save its private key. An existing key pair is
    /// reused as is; returns the written path only when a key was created.
    ///
    /// The private key is only ever returned once, so a key pair whose key
    /// could not be saved is deleted again.
    pub async fn ensure_key_pair(&self, key_name: &str) -> Result<Option<PathBuf>> {
        match self.ec2.create_key_pair(key_name, standard_tags()).await {
            Ok(material) => match write_private_key(&self.settings.key_dir, key_name, &material) {
                Ok(path) => {
                    info!(key_name, path = %path.display(), "Key pair created");
                    Ok(Some(path))
                }
                Err(e) => {
                    warn!(key_name, error = %e, "Could not save private key, deleting key pair");
                    best_effort(ResourceKind::KeyPair, key_name, || {
                        self.ec2.delete_key_pair(key_name)
                    })
                    .await;
                    Err(e).with_context(|| format!("Failed to save private key for {key_name}"))
                }
            },
            Err(e) if e.is_already_exists() => {
                info!(key_name, "Key pair already exists, reusing");
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to create key pair {key_name}")),
        }
    }

    /// Find or create the security group and open SSH from `cidr`.
    pub async fn ensure_security_group(&self, group_name: &str, cidr: &str) -> Result<String> {
        let existing = self
            .ec2
            .find_security_groups(group_name)
            .await
            .with_context(|| format!("Failed to look up security group {group_name}"))?;

        let sg_id = match existing.into_iter().next() {
            Some(id) => {
                info!(sg_id = %id, group_name, "Reusing security group");
                id
            }
            None => self
                .ec2
                .create_security_group(group_name, "Aegis worker SSH access", standard_tags())
                .await
                .with_context(|| format!("Failed to create security group {group_name}"))?,
        };

        match self.ec2.authorize_ingress(&sg_id, cidr, SSH_PORT).await {
            Ok(()) => {}
            Err(e) if e.is_already_exists() => info!(sg_id = %sg_id, cidr, "SSH rule already present"),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to authorize SSH on {sg_id} from {cidr}"));
            }
        }
        Ok(sg_id)
    }

    /// Bring the worker to running and return its public IP.
    ///
    /// A discovered worker is reused (started if stopped); otherwise a new
    /// one is launched.
    pub async fn launch_or_reuse(&self, request: LaunchRequest<'_>) -> Result<String> {
        if let Some(instance) = self
            .discover()
            .await
            .context("Failed to look up worker instance")?
        {
            let id = instance.instance_id.clone();
            info!(instance_id = %id, state = %instance.state, "Found existing worker");
            let ids = vec![id.clone()];
            let described = match instance.state {
                InstanceState::Running => self
                    .ec2
                    .describe_instances(ids)
                    .await
                    .with_context(|| format!("Failed to describe instance {id}"))?,
                InstanceState::Pending => {
                    wait_for_instances_running(self.ec2, &ids, self.wait).await?
                }
                InstanceState::Stopped => {
                    self.ec2
                        .start_instances(ids.clone())
                        .await
                        .with_context(|| format!("Failed to start instance {id}"))?;
                    info!(instance_id = %id, "Starting stopped worker");
                    wait_for_instances_running(self.ec2, &ids, self.wait).await?
                }
                InstanceState::Stopping => {
                    info!(instance_id = %id, "Worker is stopping, waiting before restart");
                    wait_for_instances_stopped(self.ec2, &ids, self.wait).await?;
                    self.ec2
                        .start_instances(ids.clone())
                        .await
                        .with_context(|| format!("Failed to start instance {id}"))?;
                    info!(instance_id = %id, "Starting stopped worker");
                    wait_for_instances_running(self.ec2, &ids, self.wait).await?
                }
                InstanceState::ShuttingDown | InstanceState::Terminated => {
                    bail!("Instance {id} is {}; cannot be reused", instance.state)
                }
            };
            return public_ip(&described, &id);
        }

        self.ensure_key_pair(request.key_name).await?;

        let mut spec = LaunchSpec::new(
            request.ami_id,
            &self.settings.instance_type,
            request.key_name,
            request.security_group_id,
            request.instance_profile,
        )
        .with_user_data(&self.settings.user_data);
        for (key, value) in worker_tags() {
            spec = spec.with_tag(key, value);
        }

        info!(
            instance_type = %spec.instance_type,
            ami = %spec.ami_id,
            "Launching worker instance"
        );
        let instance_id = (|| async { self.ec2.run_instance(&spec).await })
            .retry(self.launch_retry)
            .when(is_retryable_launch_error)
            .notify(|e, dur| match e {
                AwsError::IamPropagationDelay => warn!(
                    delay = ?dur,
                    error = %e,
                    "IAM instance profile not yet visible to EC2, retrying..."
                ),
                _ => warn!(delay = ?dur, error = %e, "AWS rate limited, backing off..."),
            })
            .await
            .context("Failed to launch worker instance")?;

        let ids = vec![instance_id.clone()];
        let running = wait_for_instances_running(self.ec2, &ids, self.wait).await?;
        let ip = public_ip(&running, &instance_id)?;
        info!(instance_id = %instance_id, public_ip = %ip, "Worker running");
        Ok(ip)
    }

    /// Terminate every tagged worker, wait for termination, then delete the
    /// security group and key pair. Never fails.
    pub async fn teardown(&self, key_name: &str, group_name: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self
            .ec2
            .describe_instances_by_tag(TAG_NAME, WORKER_TAG_VALUE, Vec::new())
            .await
        {
            Ok(instances) => {
                let ids: Vec<String> = instances
                    .into_iter()
                    .filter(|i| i.state != InstanceState::Terminated)
                    .map(|i| i.instance_id)
                    .collect();
                if ids.is_empty() {
                    info!("No worker instances to terminate");
                    report.record(ResourceKind::Ec2Instance, WORKER_TAG_VALUE, CleanupResult::Skipped);
                } else {
                    let label = ids.join(",");
                    let result = best_effort(ResourceKind::Ec2Instance, &label, || {
                        self.ec2.terminate_instances(ids.clone())
                    })
                    .await;
                    report.record(ResourceKind::Ec2Instance, &label, result);

                    if result == CleanupResult::Deleted {
                        match wait_for_instances_terminated(self.ec2, &ids, self.wait).await {
                            Ok(()) => info!(instances = %label, "Workers terminated"),
                            Err(e) => warn!(instances = %label, error = %e, "Termination wait ended early"),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(code = ?e.code(), error = %e, "Failed to look up worker instances");
                report.record(ResourceKind::Ec2Instance, WORKER_TAG_VALUE, CleanupResult::Failed);
            }
        }

        match self.ec2.find_security_groups(group_name).await {
            Ok(ids) if ids.is_empty() => {
                report.record(ResourceKind::SecurityGroup, group_name, CleanupResult::AlreadyAbsent);
            }
            Ok(ids) => {
                for sg_id in ids {
                    let result = best_effort(ResourceKind::SecurityGroup, &sg_id, || {
                        self.ec2.delete_security_group(&sg_id)
                    })
                    .await;
                    report.record(ResourceKind::SecurityGroup, &sg_id, result);
                }
            }
            Err(e) => {
                warn!(group_name, code = ?e.code(), error = %e, "Failed to look up security group");
                report.record(ResourceKind::SecurityGroup, group_name, CleanupResult::Failed);
            }
        }

        let result = best_effort(ResourceKind::KeyPair, key_name, || {
            self.ec2.delete_key_pair(key_name)
        })
        .await;
        report.record(ResourceKind::KeyPair, key_name, result);

        report
    }
}
