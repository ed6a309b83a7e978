//! Teardown sequence: compute, role, table, bucket, key
//!
//! Every step runs regardless of what happened before it. Failures are
//! logged by the services and tallied, never raised.

use super::Orchestrator;
use crate::aws::CloudClients;
use crate::aws::cleanup::CleanupReport;
use crate::services::{BucketService, ComputeService, KeyService, TableService};
use tracing::{info, warn};

impl<C: CloudClients> Orchestrator<'_, C> {
    /// Delete everything provisioning may have created, in reverse
    /// dependency order.
    pub async fn cleanup(&self) -> CleanupReport {
        let storage = &self.config.storage;
        let compute = &self.config.compute;
        let mut report = CleanupReport::default();

        info!("Tearing down compute");
        let service = ComputeService::new(
            self.clients.ec2(),
            self.clients.ssm(),
            compute,
            &self.wait.instance,
            self.wait.launch_retry,
        );
        report.merge(
            service
                .teardown(&compute.key_pair, &compute.security_group)
                .await,
        );

        info!("Tearing down worker identity");
        report.merge(self.role_service().teardown(self.role_names()).await);

        info!(table = %storage.table, "Tearing down audit table");
        report.merge(
            TableService::new(self.clients.dynamodb(), &storage.billing_mode, &self.wait.table)
                .destroy(&storage.table)
                .await,
        );

        info!(bucket = %storage.bucket, "Tearing down bucket");
        report.merge(
            BucketService::new(self.clients.s3(), self.config.region())
                .destroy(&storage.bucket)
                .await,
        );

        info!(alias = %storage.key_alias, "Retiring encryption key");
        report.merge(
            KeyService::new(self.clients.kms(), &self.wait.key)
                .destroy(&storage.key_alias)
                .await,
        );

        if report.is_clean() {
            info!(summary = %report, "Cleanup complete");
        } else {
            let failures: Vec<String> = report
                .failures
                .iter()
                .map(|(kind, id)| format!("{kind}:{id}"))
                .collect();
            warn!(summary = %report, ?failures, "Cleanup finished with failures");
        }
        report
    }
}
