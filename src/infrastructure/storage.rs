use crate::services::storage::S3StorageService;
use aws_sdk_s3::config::Region;
use std::env;
use std::sync::Arc;
use tracing::info;

/// Builds the object store client. `S3_ENDPOINT` points at MinIO (or any
/// S3-compatible server); without it the SDK talks to AWS proper using
/// its default credential chain.
pub async fn setup_storage() -> Arc<S3StorageService> {
    let bucket = env::var("S3_BUCKET").expect("S3_BUCKET must be set");
    let region = env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
    let endpoint = env::var("S3_ENDPOINT").ok();

    let mut loader = aws_config::from_env().region(Region::new(region));

    if let Some(ref endpoint) = endpoint {
        let access_key = env::var("S3_ACCESS_KEY").expect("S3_ACCESS_KEY must be set");
        let secret_key = env::var("S3_SECRET_KEY").expect("S3_SECRET_KEY must be set");
        loader = loader.endpoint_url(endpoint).credentials_provider(
            aws_sdk_s3::config::Credentials::new(access_key, secret_key, None, None, "static"),
        );
        info!("☁️  Object store: {} (Bucket: {})", endpoint, bucket);
    } else {
        info!("☁️  Object store: AWS S3 (Bucket: {})", bucket);
    }

    let aws_config = loader.load().await;

    // MinIO serves buckets on the path, not a subdomain
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(endpoint.is_some())
        .build();

    let client = aws_sdk_s3::Client::from_conf(s3_config);

    match client.head_bucket().bucket(&bucket).send().await {
        Ok(_) => info!("✅ Bucket '{}' is ready", bucket),
        Err(_) => {
            info!("🪣 Bucket '{}' not found, creating...", bucket);
            if let Err(e) = client.create_bucket().bucket(&bucket).send().await {
                tracing::error!("❌ Failed to create bucket '{}': {}", bucket, e);
            }
        }
    }

    Arc::new(S3StorageService::new(client, bucket))
}
