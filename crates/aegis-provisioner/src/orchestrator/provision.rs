//! Provisioning sequence: key, bucket, table, role, compute

use super::Orchestrator;
use crate::aws::CloudClients;
use crate::services::{
    BucketService, ComputeService, GrantTargets, KeyService, LaunchRequest, TableService,
};
use aegis_common::arn::{bucket_arn, table_arn};
use thiserror::Error;
use tracing::info;

/// The provisioning steps in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ProvisionStep {
    #[display("encryption key")]
    Key,
    #[display("bucket")]
    Bucket,
    #[display("audit table")]
    Table,
    #[display("role and instance profile")]
    Role,
    #[display("compute")]
    Compute,
}

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Provisioning failed at {step}: {reason}")]
    StepFailed { step: ProvisionStep, reason: String },
}

impl ProvisionError {
    fn step(step: ProvisionStep, reason: impl Into<String>) -> Self {
        Self::StepFailed {
            step,
            reason: reason.into(),
        }
    }

    fn from_anyhow(step: ProvisionStep, e: anyhow::Error) -> Self {
        Self::step(step, format!("{e:#}"))
    }

    pub fn failed_step(&self) -> ProvisionStep {
        match self {
            Self::StepFailed { step, .. } => *step,
        }
    }
}

/// Identifiers of everything provisioning created or reused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedInfrastructure {
    pub key_id: String,
    pub key_arn: String,
    pub bucket_arn: String,
    pub table_arn: String,
    pub instance_profile: String,
    pub public_ip: String,
}

impl<C: CloudClients> Orchestrator<'_, C> {
    /// Provision every resource in dependency order, stopping at the first
    /// failed step. Nothing already created is rolled back.
    pub async fn provision(&self) -> Result<ProvisionedInfrastructure, ProvisionError> {
        let storage = &self.config.storage;
        let compute = &self.config.compute;

        info!(alias = %storage.key_alias, "Resolving encryption key");
        let key = KeyService::new(self.clients.kms(), &self.wait.key)
            .resolve_or_create(&storage.key_alias)
            .await
            .map_err(|e| ProvisionError::from_anyhow(ProvisionStep::Key, e))?;

        info!(bucket = %storage.bucket, "Creating bucket");
        if !BucketService::new(self.clients.s3(), self.config.region())
            .create(&storage.bucket)
            .await
        {
            return Err(ProvisionError::step(
                ProvisionStep::Bucket,
                format!("could not create bucket {}", storage.bucket),
            ));
        }
        let bucket_arn = bucket_arn(&storage.bucket);

        info!(table = %storage.table, "Creating audit table");
        if !TableService::new(self.clients.dynamodb(), &storage.billing_mode, &self.wait.table)
            .create(&storage.table)
            .await
        {
            return Err(ProvisionError::step(
                ProvisionStep::Table,
                format!("could not create table {}", storage.table),
            ));
        }
        let Some(account_id) = &self.account_id else {
            return Err(ProvisionError::step(
                ProvisionStep::Table,
                "no account id to build the table ARN",
            ));
        };
        let table_arn = table_arn(self.config.region(), account_id, &storage.table);

        let names = self.role_names();
        info!(role = names.role, profile = names.instance_profile, "Setting up worker identity");
        let grants = GrantTargets {
            bucket_arn: &bucket_arn,
            table_arn: &table_arn,
            key_arn: &key.arn,
        };
        if !self.role_service().setup(names, grants).await {
            return Err(ProvisionError::step(
                ProvisionStep::Role,
                format!("could not set up role {}", names.role),
            ));
        }

        let service = ComputeService::new(
            self.clients.ec2(),
            self.clients.ssm(),
            compute,
            &self.wait.instance,
            self.wait.launch_retry,
        );
        let compute_err = |e| ProvisionError::from_anyhow(ProvisionStep::Compute, e);
        let ami_id = service
            .resolve_ami(&compute.ami_parameter)
            .await
            .map_err(compute_err)?;
        let security_group_id = service
            .ensure_security_group(&compute.security_group, &compute.ssh_cidr)
            .await
            .map_err(compute_err)?;
        let public_ip = service
            .launch_or_reuse(LaunchRequest {
                ami_id: &ami_id,
                key_name: &compute.key_pair,
                security_group_id: &security_group_id,
                instance_profile: names.instance_profile,
            })
            .await
            .map_err(compute_err)?;

        info!(public_ip = %public_ip, "Provisioning complete");
        Ok(ProvisionedInfrastructure {
            key_id: key.key_id,
            key_arn: key.arn,
            bucket_arn,
            table_arn,
            instance_profile: names.instance_profile.to_string(),
            public_ip,
        })
    }
}
