//! AWS Signature Version 4 request signing
//!
//! COS exposes an S3-compatible API that accepts SigV4 with the COS region
//! (e.g. `ap-guangzhou`) and service name `s3`.

use super::credentials::Credentials;
use super::CosClientError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

/// Payload hash sentinel that skips hashing the request body
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// SigV4 signer bound to one credential pair and region
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
}

impl SigV4Signer {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
        }
    }

    /// Sign a request and return the `Authorization` header value
    ///
    /// `headers` must contain `host`. `x-amz-date` and `x-amz-content-sha256`
    /// are inserted; the caller sends every entry of `headers` with the
    /// request.
    pub fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        canonical_query: &str,
        headers: &mut BTreeMap<String, String>,
        payload_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<String, CosClientError> {
        if !headers.contains_key("host") {
            return Err(CosClientError::SigningError("missing host header".into()));
        }

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();
        headers.insert("x-amz-date".to_string(), amz_date.clone());
        headers.insert("x-amz-content-sha256".to_string(), payload_hash.to_string());

        let mut canonical_headers = String::new();
        let mut signed_headers = Vec::with_capacity(headers.len());
        for (name, value) in headers.iter() {
            let name = name.to_ascii_lowercase();
            canonical_headers.push_str(&format!("{}:{}\n", name, value.trim()));
            signed_headers.push(name);
        }
        let signed_headers = signed_headers.join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method, canonical_uri, canonical_query, canonical_headers, signed_headers, payload_hash
        );

        let credential_scope = format!(
            "{}/{}/{}/aws4_request",
            date_stamp, self.region, SERVICE
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            credential_scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let signing_key = self.signing_key(&date_stamp)?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        Ok(format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM,
            self.credentials.secret_id(),
            credential_scope,
            signed_headers,
            signature
        ))
    }

    fn signing_key(&self, date_stamp: &str) -> Result<Vec<u8>, CosClientError> {
        let k_secret = format!("AWS4{}", self.credentials.secret_key());
        let k_date = hmac_sha256(k_secret.as_bytes(), date_stamp.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        hmac_sha256(&k_service, b"aws4_request")
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CosClientError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CosClientError::SigningError(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Hex-encoded SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
