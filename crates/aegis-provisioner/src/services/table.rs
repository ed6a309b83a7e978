//! Audit table: create once and wait for it, unprotect and delete on teardown

use crate::aws::DynamoDbOperations;
use crate::aws::cleanup::{CleanupReport, CleanupResult, best_effort};
use crate::aws::types::TableSpec;
use crate::wait::{WaitConfig, wait_for_table_active};
use aegis_common::ResourceKind;
use aegis_common::defaults::TABLE_HASH_KEY;
use aegis_common::tags::standard_tags;
use tracing::{error, info, warn};

pub struct TableService<'a, D> {
    dynamodb: &'a D,
    billing_mode: &'a str,
    wait: &'a WaitConfig,
}

impl<'a, D: DynamoDbOperations> TableService<'a, D> {
    pub fn new(dynamodb: &'a D, billing_mode: &'a str, wait: &'a WaitConfig) -> Self {
        Self {
            dynamodb,
            billing_mode,
            wait,
        }
    }

    fn spec(&self, table: &str) -> TableSpec {
        TableSpec {
            name: table.to_string(),
            hash_key: TABLE_HASH_KEY.to_string(),
            billing_mode: self.billing_mode.to_string(),
            deletion_protection: true,
            tags: standard_tags(),
        }
    }

    /// Create the table and wait until it is active. An existing table
    /// counts as success.
    pub async fn create(&self, table: &str) -> bool {
        match self.dynamodb.create_table(&self.spec(table)).await {
            Ok(()) => info!(table, "Table creation started"),
            Err(e) if e.is_already_exists() => {
                info!(table, "Table already exists");
                return true;
            }
            Err(e) => {
                error!(table, code = ?e.code(), error = %e, "Failed to create table");
                return false;
            }
        }

        match wait_for_table_active(self.dynamodb, table, self.wait).await {
            Ok(()) => {
                info!(table, "Table active");
                true
            }
            Err(e) => {
                error!(table, error = %e, "Table did not become active");
                false
            }
        }
    }

    /// Disable deletion protection, then delete. Never fails.
    pub async fn destroy(&self, table: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.dynamodb.set_deletion_protection(table, false).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!(table, "Table absent");
                report.record(ResourceKind::DynamoTable, table, CleanupResult::AlreadyAbsent);
                return report;
            }
            Err(e) => {
                warn!(table, code = ?e.code(), error = %e, "Failed to disable deletion protection");
            }
        }

        let result = best_effort(ResourceKind::DynamoTable, table, || {
            self.dynamodb.delete_table(table)
        })
        .await;
        report.record(ResourceKind::DynamoTable, table, result);
        report
    }
}
