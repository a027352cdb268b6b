//! Object storage client for receipt photos
//!
//! Uploads are signed with HMAC-SHA256 over the method, object path and the
//! base64 SHA-256 of the body.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Object storage client
#[derive(Clone)]
pub struct ObjectStoreClient {
    client: Client,
    base_url: String,
    bucket: String,
    public_base_url: String,
    signing_secret: String,
}

/// Base64 SHA-256 digest of an object body
pub fn content_checksum(body: &[u8]) -> String {
    BASE64.encode(Sha256::digest(body))
}

/// Signature over `PUT\n{bucket}/{key}\n{checksum}`
pub fn sign_upload(secret: &str, bucket: &str, key: &str, checksum: &str) -> AppResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| AppError::Configuration("Chave de assinatura inválida".to_string()))?;
    mac.update(format!("PUT\n{}/{}\n{}", bucket, key, checksum).as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

impl ObjectStoreClient {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            signing_secret: config.signing_secret.clone(),
        }
    }

    /// Public URL an object is served from
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Upload an object and return its public URL
    pub async fn put_object(&self, key: &str, content_type: &str, body: Vec<u8>) -> AppResult<String> {
        let checksum = content_checksum(&body);
        let signature = sign_upload(&self.signing_secret, &self.bucket, key, &checksum)?;
        let url = format!("{}/{}/{}", self.base_url, self.bucket, key);

        let response = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .header("x-checksum-sha256", &checksum)
            .header("x-signature", signature)
            .body(body)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Falha no envio do arquivo: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::StorageError(format!("{} - {}", status, text)));
        }

        tracing::debug!("Stored object {} ({})", key, checksum);
        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_stable() {
        // SHA-256 of the empty string
        assert_eq!(
            content_checksum(b""),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn test_signature_depends_on_key() {
        let checksum = content_checksum(b"photo");
        let a = sign_upload("secret", "bucket", "a.jpg", &checksum).unwrap();
        let b = sign_upload("secret", "bucket", "b.jpg", &checksum).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, sign_upload("secret", "bucket", "a.jpg", &checksum).unwrap());
    }

    #[test]
    fn test_public_url() {
        let client = ObjectStoreClient::new(&StorageConfig {
            base_url: "http://store/".to_string(),
            bucket: "kitchen".to_string(),
            public_base_url: "https://cdn.example/kitchen/".to_string(),
            signing_secret: "s".to_string(),
        });
        assert_eq!(
            client.public_url("receipt-photos/x.jpg"),
            "https://cdn.example/kitchen/receipt-photos/x.jpg"
        );
    }
}
