//! KMS key and alias management

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, sdk_error};
use super::types::{KeyMetadata, KeyState};
use aws_sdk_kms::Client;
use aws_sdk_kms::types::{KeySpec, KeyUsageType, OriginType, Tag};
use tracing::debug;

/// KMS client for the master key
pub struct KmsClient {
    client: Client,
}

impl FromAwsContext for KmsClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.kms_client(),
        }
    }
}

/// Trait for KMS operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait KmsOperations: Send + Sync {
    /// Describe a key by id, ARN or `alias/...` name
    async fn describe_key(&self, key_ref: &str) -> Result<KeyMetadata, AwsError>;

    /// Create a symmetric encrypt/decrypt key
    async fn create_key(
        &self,
        description: &str,
        tags: Vec<(String, String)>,
    ) -> Result<KeyMetadata, AwsError>;

    /// Bind an alias to a key
    async fn create_alias(&self, alias: &str, key_id: &str) -> Result<(), AwsError>;

    /// Remove an alias (the key is untouched)
    async fn delete_alias(&self, alias: &str) -> Result<(), AwsError>;

    /// Schedule key deletion after a pending window
    async fn schedule_key_deletion(
        &self,
        key_id: &str,
        pending_window_days: i32,
    ) -> Result<(), AwsError>;
}

fn to_metadata(meta: &aws_sdk_kms::types::KeyMetadata) -> Result<KeyMetadata, AwsError> {
    Ok(KeyMetadata {
        key_id: meta.key_id().to_string(),
        arn: meta
            .arn()
            .ok_or_else(|| AwsError::missing_field("key ARN"))?
            .to_string(),
        state: meta
            .key_state()
            .map(|s| KeyState::parse(s.as_str()))
            .unwrap_or(KeyState::Creating),
    })
}

impl KmsOperations for KmsClient {
    async fn describe_key(&self, key_ref: &str) -> Result<KeyMetadata, AwsError> {
        let response = self
            .client
            .describe_key()
            .key_id(key_ref)
            .send()
            .await
            .map_err(sdk_error)?;

        let meta = response
            .key_metadata()
            .ok_or_else(|| AwsError::missing_field("key metadata"))?;
        to_metadata(meta)
    }

    async fn create_key(
        &self,
        description: &str,
        tags: Vec<(String, String)>,
    ) -> Result<KeyMetadata, AwsError> {
        let mut request = self
            .client
            .create_key()
            .description(description)
            .key_usage(KeyUsageType::EncryptDecrypt)
            .key_spec(KeySpec::SymmetricDefault)
            .origin(OriginType::AwsKms);

        for (key, value) in tags {
            request = request.tags(
                Tag::builder()
                    .tag_key(key)
                    .tag_value(value)
                    .build()
                    .map_err(AwsError::invalid_request)?,
            );
        }

        let response = request.send().await.map_err(sdk_error)?;
        let meta = response
            .key_metadata()
            .ok_or_else(|| AwsError::missing_field("key metadata"))?;
        let meta = to_metadata(meta)?;

        debug!(key_id = %meta.key_id, "KMS key created");
        Ok(meta)
    }

    async fn create_alias(&self, alias: &str, key_id: &str) -> Result<(), AwsError> {
        self.client
            .create_alias()
            .alias_name(alias)
            .target_key_id(key_id)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_alias(&self, alias: &str) -> Result<(), AwsError> {
        self.client
            .delete_alias()
            .alias_name(alias)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn schedule_key_deletion(
        &self,
        key_id: &str,
        pending_window_days: i32,
    ) -> Result<(), AwsError> {
        self.client
            .schedule_key_deletion()
            .key_id(key_id)
            .pending_window_in_days(pending_window_days)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
