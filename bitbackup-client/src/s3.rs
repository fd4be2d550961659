//! S3-compatible object store client
//!
//! Uploads use path-style addressing (`<endpoint>/<bucket>/<key>`) so that
//! non-AWS stores such as MinIO or Ceph work with the same code.

use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Client, Url};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

use crate::ensure_success;
use crate::error::{ClientError, Result};
use crate::signing::{self, Credentials};

/// Default AWS S3 endpoint
pub const DEFAULT_S3_ENDPOINT: &str = "https://s3.amazonaws.com";

/// Default signing region
pub const DEFAULT_S3_REGION: &str = "us-east-1";

const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Client for a single bucket of an S3-compatible store
#[derive(Debug, Clone)]
pub struct S3Client {
    /// Endpoint without trailing slash
    endpoint: String,
    bucket: String,
    credentials: Credentials,
    client: Client,
}

impl S3Client {
    /// Create a new client for `bucket` at `endpoint`
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let endpoint = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
            credentials,
            client: Client::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Absolute URL of an object, with bucket and key URI-encoded
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint,
            signing::uri_encode(&self.bucket, true),
            signing::uri_encode(key.trim_start_matches('/'), false)
        )
    }

    /// Upload the contents of `file` as the object `key`
    ///
    /// The file is read twice: once to hash it for the signature and once
    /// as the streamed request body. The payload hash is signed, so the
    /// store rejects a body corrupted in transit.
    pub async fn put_object(&self, key: &str, mut file: File) -> Result<()> {
        let url = Url::parse(&self.object_url(key))
            .map_err(|e| ClientError::InvalidRequest(format!("Invalid object URL: {}", e)))?;

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ClientError::InvalidRequest(format!(
                    "Object URL '{}' has no host",
                    url
                )));
            }
        };

        let (payload_hash, content_length) = hash_file(&mut file).await?;

        let now = Utc::now();
        let amz_date = signing::amz_date(now);

        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), host);
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.clone());
        headers.insert("x-amz-date".to_string(), amz_date.clone());

        let authorization = signing::authorization(
            &self.credentials,
            "PUT",
            url.path(),
            &headers,
            &payload_hash,
            now,
        );

        debug!(
            "Uploading {} bytes to s3://{}/{}",
            content_length, self.bucket, key
        );

        let response = self
            .client
            .put(url)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/gzip")
            .header(CONTENT_LENGTH, content_length)
            .body(Body::from(file))
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }
}

/// SHA-256 (hex) and length of `file`, leaving it rewound to the start
async fn hash_file(file: &mut File) -> Result<(String, u64)> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];
    let mut length = 0u64;

    file.seek(SeekFrom::Start(0)).await?;
    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        length += read as u64;
    }
    file.seek(SeekFrom::Start(0)).await?;

    Ok((hex::encode(hasher.finalize()), length))
}
