//! AWS resource kinds and teardown ordering
//!
//! Provides a single teardown priority used by the cleanup orchestrator and
//! by log lines from the best-effort delete helpers.

/// Kinds of AWS resources managed by aegis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// EC2 worker instance (must terminate before its security group goes)
    Ec2Instance,
    /// EC2 security group
    SecurityGroup,
    /// EC2 key pair
    KeyPair,
    /// Role membership in an instance profile
    InstanceProfileRole,
    /// IAM instance profile
    IamInstanceProfile,
    /// Inline policy on the role
    IamRolePolicy,
    /// IAM role
    IamRole,
    /// DynamoDB table
    DynamoTable,
    /// Objects inside the bucket
    S3Objects,
    /// S3 bucket
    S3Bucket,
    /// KMS alias
    KmsAlias,
    /// KMS key (deletion is scheduled, never immediate)
    KmsKey,
}

impl ResourceKind {
    /// Short human readable name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Ec2Instance => "ec2-instance",
            ResourceKind::SecurityGroup => "security-group",
            ResourceKind::KeyPair => "key-pair",
            ResourceKind::InstanceProfileRole => "instance-profile-role",
            ResourceKind::IamInstanceProfile => "instance-profile",
            ResourceKind::IamRolePolicy => "role-policy",
            ResourceKind::IamRole => "iam-role",
            ResourceKind::DynamoTable => "dynamodb-table",
            ResourceKind::S3Objects => "s3-objects",
            ResourceKind::S3Bucket => "s3-bucket",
            ResourceKind::KmsAlias => "kms-alias",
            ResourceKind::KmsKey => "kms-key",
        }
    }

    /// Get teardown priority (lower number = torn down first)
    ///
    /// - 0-2: compute (instance, then its security group and key pair)
    /// - 3-6: role/profile (detach, profile, inline policy, role)
    /// - 7: table
    /// - 8-9: bucket (objects, then bucket)
    /// - 10-11: key (alias, then scheduled deletion)
    pub fn cleanup_priority(self) -> u8 {
        match self {
            ResourceKind::Ec2Instance => 0,
            ResourceKind::SecurityGroup => 1,
            ResourceKind::KeyPair => 2,
            ResourceKind::InstanceProfileRole => 3,
            ResourceKind::IamInstanceProfile => 4,
            ResourceKind::IamRolePolicy => 5,
            ResourceKind::IamRole => 6,
            ResourceKind::DynamoTable => 7,
            ResourceKind::S3Objects => 8,
            ResourceKind::S3Bucket => 9,
            ResourceKind::KmsAlias => 10,
            ResourceKind::KmsKey => 11,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instances_before_security_groups() {
        assert!(
            ResourceKind::Ec2Instance.cleanup_priority()
                < ResourceKind::SecurityGroup.cleanup_priority(),
            "Instances must be terminated before security groups"
        );
    }

    #[test]
    fn test_profile_detached_before_role_deleted() {
        assert!(
            ResourceKind::InstanceProfileRole.cleanup_priority()
                < ResourceKind::IamRole.cleanup_priority()
        );
        assert!(
            ResourceKind::IamRolePolicy.cleanup_priority()
                < ResourceKind::IamRole.cleanup_priority(),
            "Inline policy must go before the role"
        );
    }

    #[test]
    fn test_bucket_emptied_before_deleted() {
        assert!(
            ResourceKind::S3Objects.cleanup_priority() < ResourceKind::S3Bucket.cleanup_priority()
        );
    }

    #[test]
    fn test_key_is_last() {
        let all = [
            ResourceKind::Ec2Instance,
            ResourceKind::SecurityGroup,
            ResourceKind::KeyPair,
            ResourceKind::InstanceProfileRole,
            ResourceKind::IamInstanceProfile,
            ResourceKind::IamRolePolicy,
            ResourceKind::IamRole,
            ResourceKind::DynamoTable,
            ResourceKind::S3Objects,
            ResourceKind::S3Bucket,
            ResourceKind::KmsAlias,
        ];
        for kind in all {
            assert!(kind.cleanup_priority() < ResourceKind::KmsKey.cleanup_priority());
        }
    }
}
