//! AWS client modules for the provisioner
//!
//! This module provides wrappers around AWS SDK clients for:
//! - KMS: Master key and alias
//! - S3: Vault bucket
//! - DynamoDB: Audit table
//! - IAM: Role and instance profile management
//! - EC2: Worker instance, security group and key pair
//! - SSM: AMI lookup
//! - STS: Account ID lookup

pub mod account;
pub mod cleanup;
pub mod context;
pub mod dynamodb;
pub mod ec2;
pub mod error;
pub mod iam;
pub mod kms;
pub mod s3;
pub mod ssm;
pub mod types;

// Core clients
pub use account::{AccountId, get_current_account_id, resolve_account_id};
pub use context::{AwsContext, FromAwsContext};
pub use dynamodb::{DynamoDbClient, DynamoDbOperations};
pub use ec2::{Ec2Client, Ec2Operations};
pub use iam::{IamClient, IamOperations};
pub use kms::{KmsClient, KmsOperations};
pub use s3::{S3Client, S3Operations};
pub use ssm::{SsmClient, SsmOperations};

#[cfg(test)]
pub use {
    dynamodb::MockDynamoDbOperations, ec2::MockEc2Operations, iam::MockIamOperations,
    kms::MockKmsOperations, s3::MockS3Operations, ssm::MockSsmOperations,
};

// Error handling
pub use error::{AwsError, classify_aws_error, ignore_not_found};

// Cleanup utilities
pub use cleanup::{CleanupReport, CleanupResult, best_effort};

/// The set of service clients one run works with.
///
/// Implemented by [`AwsClients`] for real AWS and by the in-memory fake in
/// tests, so orchestrators are generic over where calls go.
pub trait CloudClients {
    type Kms: KmsOperations;
    type S3: S3Operations;
    type DynamoDb: DynamoDbOperations;
    type Iam: IamOperations;
    type Ec2: Ec2Operations;
    type Ssm: SsmOperations;

    fn kms(&self) -> &Self::Kms;
    fn s3(&self) -> &Self::S3;
    fn dynamodb(&self) -> &Self::DynamoDb;
    fn iam(&self) -> &Self::Iam;
    fn ec2(&self) -> &Self::Ec2;
    fn ssm(&self) -> &Self::Ssm;
}

/// Every service client, built from one [`AwsContext`]
pub struct AwsClients {
    pub kms: KmsClient,
    pub s3: S3Client,
    pub dynamodb: DynamoDbClient,
    pub iam: IamClient,
    pub ec2: Ec2Client,
    pub ssm: SsmClient,
}

impl FromAwsContext for AwsClients {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            kms: KmsClient::from_context(ctx),
            s3: S3Client::from_context(ctx),
            dynamodb: DynamoDbClient::from_context(ctx),
            iam: IamClient::from_context(ctx),
            ec2: Ec2Client::from_context(ctx),
            ssm: SsmClient::from_context(ctx),
        }
    }
}

impl CloudClients for AwsClients {
    type Kms = KmsClient;
    type S3 = S3Client;
    type DynamoDb = DynamoDbClient;
    type Iam = IamClient;
    type Ec2 = Ec2Client;
    type Ssm = SsmClient;

    fn kms(&self) -> &KmsClient {
        &self.kms
    }

    fn s3(&self) -> &S3Client {
        &self.s3
    }

    fn dynamodb(&self) -> &DynamoDbClient {
        &self.dynamodb
    }

    fn iam(&self) -> &IamClient {
        &self.iam
    }

    fn ec2(&self) -> &Ec2Client {
        &self.ec2
    }

    fn ssm(&self) -> &SsmClient {
        &self.ssm
    }
}
