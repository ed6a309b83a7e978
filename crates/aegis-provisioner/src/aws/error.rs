//! AWS error classification and handling
//!
//! Provides typed errors for AWS SDK operations using the `.code()` method
//! instead of string matching on Debug format.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use thiserror::Error;

/// AWS error categories for idempotence, retry and cleanup logic
#[derive(Debug, Clone, Error)]
pub enum AwsError {
    /// Resource was not found (safe to skip in cleanup)
    #[error("Resource not found ({code}): {message}")]
    NotFound { code: String, message: String },

    /// Resource already exists (safe to ignore in create operations)
    #[error("Resource already exists ({code}): {message}")]
    AlreadyExists { code: String, message: String },

    /// A per-resource quota is full (an instance profile already holds a role)
    #[error("Limit exceeded: {message}")]
    LimitExceeded { message: String },

    /// IAM profile not yet visible to EC2 (eventual consistency, retryable)
    #[error("IAM profile not yet visible to EC2 (eventual consistency)")]
    IamPropagationDelay,

    /// Rate limit exceeded (retryable with backoff)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Resource has dependent objects (retryable, e.g., SG with attached ENI)
    #[error("Resource has dependent objects: {message}")]
    DependencyViolation { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound { .. })
    }

    /// Check if this is an "already exists" error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, AwsError::AlreadyExists { .. })
    }

    /// Check if this is a "limit exceeded" error
    pub fn is_limit_exceeded(&self) -> bool {
        matches!(self, AwsError::LimitExceeded { .. })
    }

    /// The service error code, when AWS supplied one.
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::NotFound { code, .. } | AwsError::AlreadyExists { code, .. } => Some(code),
            AwsError::LimitExceeded { .. } => Some("LimitExceeded"),
            AwsError::IamPropagationDelay => Some("InvalidParameterValue"),
            AwsError::Throttled => Some("Throttling"),
            AwsError::DependencyViolation { .. } => Some("DependencyViolation"),
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Error for a request that could not be built locally.
    pub fn invalid_request(err: impl std::fmt::Display) -> Self {
        AwsError::Sdk {
            code: None,
            message: format!("Invalid request: {err}"),
        }
    }

    /// Error for a response that lacked a field the caller needs.
    pub fn missing_field(field: &str) -> Self {
        AwsError::Sdk {
            code: None,
            message: format!("Response missing {field}"),
        }
    }
}

/// Known AWS error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    // EC2
    "InvalidInstanceID.NotFound",
    "InvalidGroup.NotFound",
    "InvalidKeyPair.NotFound",
    "InvalidPermission.NotFound",
    // S3
    "NoSuchBucket",
    "NoSuchKey",
    // IAM
    "NoSuchEntity",
    // KMS
    "NotFoundException",
    // DynamoDB
    "ResourceNotFoundException",
    // SSM
    "ParameterNotFound",
];

/// Known AWS error codes for "already exists" conditions
const ALREADY_EXISTS_CODES: &[&str] = &[
    // EC2
    "InvalidPermission.Duplicate",
    "InvalidGroup.Duplicate",
    "InvalidKeyPair.Duplicate",
    // S3
    "BucketAlreadyOwnedByYou",
    // IAM
    "EntityAlreadyExists",
    // KMS
    "AlreadyExistsException",
    // DynamoDB
    "ResourceInUseException",
];

/// Known AWS error codes for full per-resource quotas
const LIMIT_EXCEEDED_CODES: &[&str] = &["LimitExceeded"];

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for dependency violations (resource still in use)
const DEPENDENCY_CODES: &[&str] = &["DependencyViolation"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => AwsError::NotFound {
            code: c.to_string(),
            message,
        },
        Some(c) if ALREADY_EXISTS_CODES.contains(&c) => AwsError::AlreadyExists {
            code: c.to_string(),
            message,
        },
        Some(c) if LIMIT_EXCEEDED_CODES.contains(&c) => AwsError::LimitExceeded { message },
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled,
        Some(c) if DEPENDENCY_CODES.contains(&c) => AwsError::DependencyViolation { message },
        Some("InvalidParameterValue") if message.contains("iamInstanceProfile") => {
            AwsError::IamPropagationDelay
        }
        Some(_) if message.contains("Invalid IAM Instance Profile") => {
            AwsError::IamPropagationDelay
        }
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error.
///
/// `SdkError` is the same type across every `aws-sdk-*` crate, so one
/// conversion serves all clients. Errors that never reached the service
/// (dispatch, timeout) carry no code and fall through to `Sdk`.
pub fn sdk_error<E, R>(err: SdkError<E, R>) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
    classify_aws_error(code.as_deref(), Some(&message))
}

/// Treat a "not found" error as `None`, pass everything else through.
pub fn ignore_not_found<T>(result: Result<T, AwsError>) -> Result<Option<T>, AwsError> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
            assert_eq!(err.code(), Some(*code));
        }
    }

    #[test]
    fn already_exists_codes() {
        for code in ALREADY_EXISTS_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(
                err.is_already_exists(),
                "Expected AlreadyExists for code: {code}"
            );
        }
    }

    #[test]
    fn limit_exceeded_is_its_own_class() {
        let err = classify_aws_error(Some("LimitExceeded"), Some("Cannot exceed quota"));
        assert!(err.is_limit_exceeded());
        assert!(!err.is_already_exists());
        assert!(!err.is_not_found());
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(matches!(err, AwsError::Throttled), "Expected Throttled for code: {code}");
        }
    }

    #[test]
    fn dependency_violation() {
        let err = classify_aws_error(Some("DependencyViolation"), Some("ENI attached"));
        assert!(matches!(err, AwsError::DependencyViolation { .. }));
    }

    #[test]
    fn iam_propagation_delay() {
        let err = classify_aws_error(
            Some("InvalidParameterValue"),
            Some("Value for parameter iamInstanceProfile is invalid"),
        );
        assert!(matches!(err, AwsError::IamPropagationDelay));

        // Alternate message form
        let err2 = classify_aws_error(Some("SomeCode"), Some("Invalid IAM Instance Profile name"));
        assert!(matches!(err2, AwsError::IamPropagationDelay));
    }

    #[test]
    fn bucket_owned_by_someone_else_is_not_success() {
        let err = classify_aws_error(Some("BucketAlreadyExists"), Some("taken"));
        assert!(!err.is_already_exists());
        assert_eq!(err.code(), Some("BucketAlreadyExists"));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, AwsError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, AwsError::Sdk { code: None, .. }));
    }

    #[test]
    fn ignore_not_found_maps_to_none() {
        let missing: Result<(), AwsError> =
            Err(classify_aws_error(Some("NoSuchEntity"), Some("gone")));
        assert!(matches!(ignore_not_found(missing), Ok(None)));

        let present: Result<u8, AwsError> = Ok(7);
        assert!(matches!(ignore_not_found(present), Ok(Some(7))));

        let failed: Result<(), AwsError> = Err(AwsError::Throttled);
        assert!(ignore_not_found(failed).is_err());
    }
}
