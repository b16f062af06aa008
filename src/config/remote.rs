use crate::core::Storage;
use crate::utils::error::{ReconError, Result};
use crate::utils::validation::{validate_non_empty_string, Validate};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client as S3Client;
use std::env;

/// Remote upload target read from S3_BUCKET / S3_PREFIX / S3_REGION.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub s3_region: String,
}

impl RemoteConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| ReconError::MissingConfigError {
                field: "S3_BUCKET".to_string(),
            })?,
            s3_prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "recon-output".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
        })
    }

    /// 建立 S3 用戶端
    pub async fn storage(&self) -> S3Storage {
        let shared = aws_config::load_defaults(BehaviorVersion::latest()).await;
        let config = aws_sdk_s3::config::Builder::from(&shared)
            .region(Region::new(self.s3_region.clone()))
            .force_path_style(true)
            .build();
        S3Storage::new(
            S3Client::from_conf(config),
            self.s3_bucket.clone(),
            self.s3_prefix.clone(),
        )
    }
}

impl Validate for RemoteConfig {
    fn validate(&self) -> Result<()> {
        validate_s3_bucket_name("S3_BUCKET", &self.s3_bucket)?;
        validate_non_empty_string("S3_REGION", &self.s3_region)?;
        Ok(())
    }
}

fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    let invalid = |reason: &str| ReconError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: bucket_name.to_string(),
        reason: reason.to_string(),
    };

    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(invalid("S3 bucket name must be between 3 and 63 characters"));
    }
    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }
    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(invalid("S3 bucket name cannot start or end with a hyphen"));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    fn key(&self, path: &str) -> String {
        let prefix = self.prefix.trim_matches('/');
        if prefix.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", prefix, path)
        }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let key = self.key(path);
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| ReconError::StorageError {
                message: format!("Failed to read s3://{}/{}: {}", self.bucket, key, DisplayErrorContext(&e)),
            })?;

        let data = resp.body.collect().await.map_err(|e| ReconError::StorageError {
            message: format!("Failed to collect s3://{}/{}: {}", self.bucket, key, e),
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let key = self.key(path);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| ReconError::StorageError {
                message: format!("Failed to write s3://{}/{}: {}", self.bucket, key, DisplayErrorContext(&e)),
            })?;

        tracing::debug!("☁️ Uploaded {} bytes to s3://{}/{}", data.len(), self.bucket, key);
        Ok(())
    }

    fn location(&self, path: &str) -> String {
        format!("s3://{}/{}", self.bucket, self.key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_s3_bucket_name("S3_BUCKET", "recon-output").is_ok());
        assert!(validate_s3_bucket_name("S3_BUCKET", "ab").is_err());
        assert!(validate_s3_bucket_name("S3_BUCKET", "Recon").is_err());
        assert!(validate_s3_bucket_name("S3_BUCKET", "-recon").is_err());
    }
}
