use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

/// Write-only object store for reference images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError>;
}

/// Client for the AWS S3 asset bucket.
pub struct S3Store {
    bucket: Box<Bucket>,
    bucket_name: String,
    region: String,
}

impl S3Store {
    pub fn new(
        bucket_name: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let parsed_region = region
            .parse::<Region>()
            .map_err(|e| StorageError::Config(format!("invalid region {region}: {e}")))?;

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, parsed_region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            region: region.to_string(),
        })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket_name, self.region, key
        )
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String, StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(StorageError::S3)?;

        let code = response.status_code();
        if !(200..300).contains(&code) {
            return Err(StorageError::Rejected(code));
        }
        Ok(self.public_url(key))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 rejected the upload with status {0}")]
    Rejected(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_uses_virtual_hosted_style() {
        let store = S3Store::new("looksim-hairstyles", "eu-west-1", "AKIA", "secret").unwrap();
        assert_eq!(
            store.public_url("styles/bob.png"),
            "https://looksim-hairstyles.s3.eu-west-1.amazonaws.com/styles/bob.png"
        );
    }
}
