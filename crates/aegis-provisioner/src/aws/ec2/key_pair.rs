//! SSH key pair management

use super::{Ec2Client, tag_spec};
use crate::aws::error::{AwsError, sdk_error};
use aws_sdk_ec2::types::{KeyType, ResourceType};
use tracing::info;

impl Ec2Client {
    /// Create an RSA key pair and return its unencrypted PEM private key.
    ///
    /// AWS never returns the material again, so callers must persist it.
    pub async fn create_key_pair(
        &self,
        key_name: &str,
        tags: &[(String, String)],
    ) -> Result<String, AwsError> {
        let response = self
            .client
            .create_key_pair()
            .key_name(key_name)
            .key_type(KeyType::Rsa)
            .tag_specifications(tag_spec(ResourceType::KeyPair, tags))
            .send()
            .await
            .map_err(sdk_error)?;

        info!(key_name, key_pair_id = ?response.key_pair_id(), "Key pair created");

        response
            .key_material()
            .map(str::to_string)
            .ok_or_else(|| AwsError::missing_field("key material"))
    }

    /// Delete a key pair by name
    pub async fn delete_key_pair(&self, key_name: &str) -> Result<(), AwsError> {
        self.client
            .delete_key_pair()
            .key_name(key_name)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
