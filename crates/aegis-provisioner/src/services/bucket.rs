//! Vault bucket: create once, empty and delete on teardown

use crate::aws::S3Operations;
use crate::aws::cleanup::{CleanupReport, CleanupResult, best_effort};
use crate::aws::s3::DELETE_OBJECTS_BATCH;
use aegis_common::ResourceKind;
use tracing::{error, info, warn};

pub struct BucketService<'a, S> {
    s3: &'a S,
    region: &'a str,
}

impl<'a, S: S3Operations> BucketService<'a, S> {
    pub fn new(s3: &'a S, region: &'a str) -> Self {
        Self { s3, region }
    }

    /// Create the bucket; an existing bucket we already own counts as
    /// success. Returns false on any other failure.
    pub async fn create(&self, bucket: &str) -> bool {
        match self.s3.create_bucket(bucket, self.region).await {
            Ok(()) => {
                info!(bucket, region = %self.region, "Bucket created");
                true
            }
            Err(e) if e.is_already_exists() => {
                info!(bucket, "Bucket already exists and is owned by this account");
                true
            }
            Err(e) => {
                error!(bucket, code = ?e.code(), error = %e, "Failed to create bucket");
                false
            }
        }
    }

    /// Delete every object, then the bucket. Never fails.
    pub async fn destroy(&self, bucket: &str) -> CleanupReport {
        let mut report = CleanupReport::default();

        match self.s3.list_object_keys(bucket).await {
            Ok(keys) => {
                for batch in keys.chunks(DELETE_OBJECTS_BATCH) {
                    let result = best_effort(ResourceKind::S3Objects, bucket, || {
                        self.s3.delete_objects(bucket, batch.to_vec())
                    })
                    .await;
                    report.record(ResourceKind::S3Objects, bucket, result);
                }
                if !keys.is_empty() {
                    info!(bucket, count = keys.len(), "Bucket emptied");
                }
            }
            Err(e) if e.is_not_found() => {
                info!(bucket, "Bucket absent");
                report.record(ResourceKind::S3Bucket, bucket, CleanupResult::AlreadyAbsent);
                return report;
            }
            Err(e) => {
                warn!(bucket, code = ?e.code(), error = %e, "Failed to list bucket objects");
            }
        }

        let result =
            best_effort(ResourceKind::S3Bucket, bucket, || self.s3.delete_bucket(bucket)).await;
        report.record(ResourceKind::S3Bucket, bucket, result);
        report
    }
}
