//! S3 bucket and object management

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, sdk_error};
use aws_sdk_s3::Client;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ObjectIdentifier,
};
use tracing::debug;

/// Region where S3 rejects an explicit location constraint
const DEFAULT_S3_REGION: &str = "us-east-1";

/// Maximum keys accepted by one DeleteObjects call
pub const DELETE_OBJECTS_BATCH: usize = 1000;

/// S3 client for the vault bucket
pub struct S3Client {
    client: Client,
}

impl FromAwsContext for S3Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }
}

/// Trait for S3 operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait S3Operations: Send + Sync {
    /// Create a bucket in `region`
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), AwsError>;

    /// List every object key in the bucket (all pages)
    async fn list_object_keys(&self, bucket: &str) -> Result<Vec<String>, AwsError>;

    /// Delete up to [`DELETE_OBJECTS_BATCH`] objects in one call
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<(), AwsError>;

    /// Delete an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> Result<(), AwsError>;
}

impl S3Operations for S3Client {
    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<(), AwsError> {
        let mut request = self.client.create_bucket().bucket(bucket);

        if region != DEFAULT_S3_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn list_object_keys(&self, bucket: &str) -> Result<Vec<String>, AwsError> {
        let mut keys = Vec::new();
        let mut continuation_token = None;
        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);

            if let Some(token) = &continuation_token {
                request = request.continuation_token(token);
            }

            let response = request.send().await.map_err(sdk_error)?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .map(str::to_string),
            );

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        debug!(bucket = %bucket, count = keys.len(), "Listed objects");
        Ok(keys)
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<(), AwsError> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .into_iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(AwsError::invalid_request)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(AwsError::invalid_request)?;

        let response = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(sdk_error)?;

        // Quiet mode only reports the keys that failed
        if let Some(first) = response.errors().first() {
            return Err(AwsError::Sdk {
                code: first.code().map(str::to_string),
                message: format!(
                    "{} object(s) could not be deleted, first: {}",
                    response.errors().len(),
                    first.key().unwrap_or("<unknown>")
                ),
            });
        }

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), AwsError> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
