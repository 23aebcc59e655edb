use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;

/// Object store abstraction. Production uses S3/MinIO; tests plug in an
/// in-memory implementation.
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> Result<()>;
    async fn delete_file(&self, key: &str) -> Result<()>;
    async fn get_file(&self, key: &str) -> Result<Vec<u8>>;
    async fn get_object_stream(&self, key: &str) -> Result<GetObjectOutput>;
    async fn presigned_url(
        &self,
        key: &str,
        expires_in_secs: u64,
        content_disposition: &str,
    ) -> Result<String>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_file(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn get_file(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        let data = output.body.collect().await?;
        Ok(data.into_bytes().to_vec())
    }

    async fn get_object_stream(&self, key: &str) -> Result<GetObjectOutput> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(output)
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in_secs: u64,
        content_disposition: &str,
    ) -> Result<String> {
        let config = PresigningConfig::expires_in(Duration::from_secs(expires_in_secs))?;
        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(content_disposition)
            .presigned(config)
            .await?;
        Ok(presigned.uri().to_string())
    }
}
