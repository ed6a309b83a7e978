//! DynamoDB audit table management

use super::context::{AwsContext, FromAwsContext};
use super::error::{AwsError, sdk_error};
use super::types::{TableSpec, TableStatus};
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType, Tag,
};

/// DynamoDB client for the audit table
pub struct DynamoDbClient {
    client: Client,
}

impl FromAwsContext for DynamoDbClient {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.dynamodb_client(),
        }
    }
}

/// Trait for DynamoDB operations that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait DynamoDbOperations: Send + Sync {
    /// Issue CreateTable (returns before the table is active)
    async fn create_table(&self, spec: &TableSpec) -> Result<(), AwsError>;

    /// Current table status
    async fn describe_table_status(&self, table: &str) -> Result<TableStatus, AwsError>;

    /// Toggle deletion protection
    async fn set_deletion_protection(&self, table: &str, enabled: bool) -> Result<(), AwsError>;

    /// Issue DeleteTable
    async fn delete_table(&self, table: &str) -> Result<(), AwsError>;
}

impl DynamoDbOperations for DynamoDbClient {
    async fn create_table(&self, spec: &TableSpec) -> Result<(), AwsError> {
        let attribute = AttributeDefinition::builder()
            .attribute_name(&spec.hash_key)
            .attribute_type(ScalarAttributeType::S)
            .build()
            .map_err(AwsError::invalid_request)?;

        let key_schema = KeySchemaElement::builder()
            .attribute_name(&spec.hash_key)
            .key_type(KeyType::Hash)
            .build()
            .map_err(AwsError::invalid_request)?;

        let mut request = self
            .client
            .create_table()
            .table_name(&spec.name)
            .deletion_protection_enabled(spec.deletion_protection)
            .attribute_definitions(attribute)
            .key_schema(key_schema)
            .billing_mode(BillingMode::from(spec.billing_mode.as_str()));

        for (key, value) in &spec.tags {
            request = request.tags(
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(AwsError::invalid_request)?,
            );
        }

        request.send().await.map_err(sdk_error)?;
        Ok(())
    }

    async fn describe_table_status(&self, table: &str) -> Result<TableStatus, AwsError> {
        let response = self
            .client
            .describe_table()
            .table_name(table)
            .send()
            .await
            .map_err(sdk_error)?;

        response
            .table()
            .and_then(|t| t.table_status())
            .map(|s| TableStatus::parse(s.as_str()))
            .ok_or_else(|| AwsError::missing_field("table status"))
    }

    async fn set_deletion_protection(&self, table: &str, enabled: bool) -> Result<(), AwsError> {
        self.client
            .update_table()
            .table_name(table)
            .deletion_protection_enabled(enabled)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }

    async fn delete_table(&self, table: &str) -> Result<(), AwsError> {
        self.client
            .delete_table()
            .table_name(table)
            .send()
            .await
            .map_err(sdk_error)?;
        Ok(())
    }
}
