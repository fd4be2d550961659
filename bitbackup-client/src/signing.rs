//! AWS Signature Version 4 request signing
//!
//! Only what an object upload needs: header-based signing of a request with
//! no query string, for the `s3` service.
//!
//! Reference: <https://docs.aws.amazon.com/AmazonS3/latest/API/sig-v4-header-based-auth.html>

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Access key pair plus the region requests are signed for
#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

impl Credentials {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .finish()
    }
}

/// Hex-encoded SHA-256 of a payload, as sent in `x-amz-content-sha256`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Timestamp in the `x-amz-date` format (`20130524T000000Z`)
pub fn amz_date(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%SZ").to_string()
}

/// URI-encode a string the way SigV4 expects
///
/// Unreserved characters pass through; everything else becomes `%XX`.
/// `/` is kept when `encode_slash` is false so object keys keep their path
/// structure.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(input.len());

    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char)
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }

    encoded
}

/// Compute the `Authorization` header value for a request
///
/// # Arguments
/// * `method` - HTTP method, e.g. `PUT`
/// * `canonical_uri` - Already URI-encoded absolute path
/// * `headers` - Headers to sign; names must be lowercase and must include
///   `host` and `x-amz-date`
/// * `payload_hash` - Value of `x-amz-content-sha256`
/// * `at` - Request time, matching the `x-amz-date` header
pub fn authorization(
    credentials: &Credentials,
    method: &str,
    canonical_uri: &str,
    headers: &BTreeMap<String, String>,
    payload_hash: &str,
    at: DateTime<Utc>,
) -> String {
    let date = at.format("%Y%m%d").to_string();
    let scope = format!("{}/{}/{}/aws4_request", date, credentials.region, SERVICE);

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");

    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        method, canonical_uri, canonical_headers, signed_headers, payload_hash
    );

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(at),
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let signing_key = [credentials.region.as_str(), SERVICE, "aws4_request"].iter().fold(
        hmac_sha256(
            format!("AWS4{}", credentials.secret_key).as_bytes(),
            date.as_bytes(),
        ),
        |key, part| hmac_sha256(&key, part.as_bytes()),
    );

    let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{},SignedHeaders={},Signature={}",
        ALGORITHM, credentials.access_key, scope, signed_headers, signature
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
