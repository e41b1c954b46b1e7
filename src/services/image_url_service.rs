use aws_sdk_s3 as s3;
use aws_sdk_s3::{presigning::PresigningConfig, types::ObjectCannedAcl};
use std::time::Duration;

use crate::error::{AppError, Result};

pub const PRODUCT_PREFIX: &str = "product";

pub fn product_object_key(file_name: &str) -> String {
    format!("{}/{}", PRODUCT_PREFIX, file_name.trim())
}

pub fn public_object_url(bucket: &str, key: &str) -> String {
    format!("https://{}.s3.amazonaws.com/{}", bucket, key)
}

pub async fn put_object_url(
    client: &s3::Client,
    bucket: &str,
    object: &str,
    content_type: &str,
    expires_in: u64,
) -> Result<String> {
    let expires_in = PresigningConfig::expires_in(Duration::from_secs(expires_in))
        .map_err(|e| AppError::InternalError(format!("Invalid presign expiry: {}", e)))?;

    let presigned_request = client
        .put_object()
        .bucket(bucket)
        .key(object)
        .content_type(content_type)
        .acl(ObjectCannedAcl::PublicRead)
        .presigned(expires_in)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to presign upload: {}", e)))?;

    Ok(presigned_request.uri().into())
}

pub async fn object_exists(client: &s3::Client, bucket: &str, object: &str) -> Result<bool> {
    match client.head_object().bucket(bucket).key(object).send().await {
        Ok(_) => Ok(true),
        Err(err) => {
            if err
                .as_service_error()
                .is_some_and(|service_err| service_err.is_not_found())
            {
                Ok(false)
            } else {
                Err(AppError::InternalError(format!(
                    "Failed to check object {}: {}",
                    object, err
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_live_under_the_product_prefix() {
        assert_eq!(product_object_key(" shoe.png "), "product/shoe.png");
    }

    #[test]
    fn public_url_points_at_the_bucket_host() {
        assert_eq!(
            public_object_url("media", "product/shoe.png"),
            "https://media.s3.amazonaws.com/product/shoe.png"
        );
    }
}
