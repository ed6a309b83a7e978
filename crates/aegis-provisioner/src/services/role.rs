//! Worker role and instance profile

use crate::aws::IamOperations;
use crate::aws::cleanup::{CleanupReport, best_effort};
use crate::aws::error::AwsError;
use aegis_common::tags::standard_tags;
use aegis_common::{EC2_ASSUME_ROLE_POLICY, ResourceKind, build_permission_policy};
use std::time::Duration;
use tracing::{error, info};

/// Names of the IAM resources making up the worker identity
#[derive(Debug, Clone, Copy)]
pub struct RoleNames<'a> {
    pub role: &'a str,
    pub instance_profile: &'a str,
    pub policy: &'a str,
}

/// ARNs the inline policy grants access to
#[derive(Debug, Clone, Copy)]
pub struct GrantTargets<'a> {
    pub bucket_arn: &'a str,
    pub table_arn: &'a str,
    pub key_arn: &'a str,
}

pub struct RoleService<'a, I> {
    iam: &'a I,
    propagation_delay: Duration,
}

fn log_failure(step: &str, name: &str, e: &AwsError) {
    error!(step, name, code = ?e.code(), error = %e, "IAM setup failed");
}

impl<'a, I: IamOperations> RoleService<'a, I> {
    pub fn new(iam: &'a I, propagation_delay: Duration) -> Self {
        Self {
            iam,
            propagation_delay,
        }
    }

    /// Create the role, attach the inline policy, create the profile and
    /// put the role in it. Each step tolerates its resource already existing.
    /// Returns false at the first hard failure.
    pub async fn setup(&self, names: RoleNames<'_>, grants: GrantTargets<'_>) -> bool {
        match self
            .iam
            .create_role(names.role, EC2_ASSUME_ROLE_POLICY, standard_tags())
            .await
        {
            Ok(()) => {
                info!(role = names.role, "Role created, waiting for propagation");
                tokio::time::sleep(self.propagation_delay).await;
            }
            Err(e) if e.is_already_exists() => info!(role = names.role, "Role already exists"),
            Err(e) => {
                log_failure("create_role", names.role, &e);
                return false;
            }
        }

        let policy = build_permission_policy(grants.bucket_arn, grants.table_arn, grants.key_arn);
        let document = match policy.to_json() {
            Ok(document) => document,
            Err(e) => {
                error!(error = %e, "Failed to serialize permission policy");
                return false;
            }
        };
        if let Err(e) = self
            .iam
            .put_role_policy(names.role, names.policy, &document)
            .await
        {
            log_failure("put_role_policy", names.role, &e);
            return false;
        }
        info!(role = names.role, policy = names.policy, "Inline policy attached");

        match self
            .iam
            .create_instance_profile(names.instance_profile, standard_tags())
            .await
        {
            Ok(()) => info!(profile = names.instance_profile, "Instance profile created"),
            Err(e) if e.is_already_exists() => {
                info!(profile = names.instance_profile, "Instance profile already exists")
            }
            Err(e) => {
                log_failure("create_instance_profile", names.instance_profile, &e);
                return false;
            }
        }

        // A profile holds at most one role; LimitExceeded means it is already filled
        match self
            .iam
            .add_role_to_instance_profile(names.instance_profile, names.role)
            .await
        {
            Ok(()) => info!(
                profile = names.instance_profile,
                role = names.role,
                "Role added to instance profile"
            ),
            Err(e) if e.is_already_exists() || e.is_limit_exceeded() => info!(
                profile = names.instance_profile,
                "Instance profile already holds a role"
            ),
            Err(e) => {
                log_failure("add_role_to_instance_profile", names.instance_profile, &e);
                return false;
            }
        }

        true
    }

    /// Detach, then delete profile, inline policy and role. Each step is
    /// attempted regardless of the others.
    pub async fn teardown(&self, names: RoleNames<'_>) -> CleanupReport {
        let mut report = CleanupReport::default();

        let result = best_effort(ResourceKind::InstanceProfileRole, names.instance_profile, || {
            self.iam
                .remove_role_from_instance_profile(names.instance_profile, names.role)
        })
        .await;
        report.record(ResourceKind::InstanceProfileRole, names.instance_profile, result);

        let result = best_effort(ResourceKind::IamInstanceProfile, names.instance_profile, || {
            self.iam.delete_instance_profile(names.instance_profile)
        })
        .await;
        report.record(ResourceKind::IamInstanceProfile, names.instance_profile, result);

        let result = best_effort(ResourceKind::IamRolePolicy, names.policy, || {
            self.iam.delete_role_policy(names.role, names.policy)
        })
        .await;
        report.record(ResourceKind::IamRolePolicy, names.policy, result);

        let result =
            best_effort(ResourceKind::IamRole, names.role, || self.iam.delete_role(names.role))
                .await;
        report.record(ResourceKind::IamRole, names.role, result);

        report
    }
}
