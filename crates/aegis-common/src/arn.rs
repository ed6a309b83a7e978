//! ARN construction for resources whose ARN is not returned by every call
//!
//! A bucket that already exists, or a table whose create call was rejected
//! as a conflict, yields no ARN, so both are derived from their names.

/// ARN of an S3 bucket
pub fn bucket_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}")
}

/// ARN of a DynamoDB table
pub fn table_arn(region: &str, account_id: &str, table: &str) -> String {
    format!("arn:aws:dynamodb:{region}:{account_id}:table/{table}")
}
