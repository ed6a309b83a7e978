//! Master key: resolve by alias or create, then retire

use crate::aws::cleanup::{CleanupReport, CleanupResult, best_effort};
use crate::aws::KmsOperations;
use crate::aws::error::ignore_not_found;
use crate::wait::{WaitConfig, wait_for_key_enabled};
use aegis_common::ResourceKind;
use aegis_common::defaults::{KEY_DESCRIPTION, KEY_PENDING_WINDOW_DAYS};
use aegis_common::tags::standard_tags;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Identifiers of the master key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRef {
    pub key_id: String,
    pub arn: String,
}

pub struct KeyService<'a, K> {
    kms: &'a K,
    wait: &'a WaitConfig,
}

impl<'a, K: KmsOperations> KeyService<'a, K> {
    pub fn new(kms: &'a K, wait: &'a WaitConfig) -> Self {
        Self { kms, wait }
    }

    /// Return the key bound to `alias`, creating and binding one if the
    /// alias does not exist yet.
    pub async fn resolve_or_create(&self, alias: &str) -> Result<KeyRef> {
        match self.kms.describe_key(alias).await {
            Ok(meta) => {
                info!(alias, key_id = %meta.key_id, state = ?meta.state, "Reusing existing key");
                return Ok(KeyRef {
                    key_id: meta.key_id,
                    arn: meta.arn,
                });
            }
            Err(e) if e.is_not_found() => {
                info!(alias, "Alias not found, creating key");
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to look up key alias {alias}"));
            }
        }

        let created = self
            .kms
            .create_key(KEY_DESCRIPTION, standard_tags())
            .await
            .context("Failed to create key")?;

        let meta = wait_for_key_enabled(self.kms, &created.key_id, self.wait)
            .await
            .with_context(|| format!("Key {} never became enabled", created.key_id))?;

        self.kms
            .create_alias(alias, &meta.key_id)
            .await
            .with_context(|| format!("Failed to bind alias {alias} to key {}", meta.key_id))?;

        info!(alias, key_id = %meta.key_id, "Key created and aliased");
        Ok(KeyRef {
            key_id: meta.key_id,
            arn: meta.arn,
        })
    }

    /// Remove the alias and schedule deletion of its key.
    pub async fn destroy(&self, alias: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        let meta = match ignore_not_found(self.kms.describe_key(alias).await) {
            Ok(Some(meta)) => meta,
            Ok(None) => {
                info!(alias, "Key alias absent, nothing to retire");
                report.record(ResourceKind::KmsAlias, alias, CleanupResult::AlreadyAbsent);
                return report;
            }
            Err(e) => {
                warn!(alias, code = ?e.code(), error = %e, "Failed to look up key alias");
                report.record(ResourceKind::KmsAlias, alias, CleanupResult::Failed);
                return report;
            }
        };

        let result =
            best_effort(ResourceKind::KmsAlias, alias, || self.kms.delete_alias(alias)).await;
        report.record(ResourceKind::KmsAlias, alias, result);

        let key_id = meta.key_id.as_str();
        let result = best_effort(ResourceKind::KmsKey, key_id, || {
            self.kms.schedule_key_deletion(key_id, KEY_PENDING_WINDOW_DAYS)
        })
        .await;
        report.record(ResourceKind::KmsKey, key_id, result);

        report
    }
}
