// crates/crawl-archive-store-s3/src/s3_object_store.rs
// ============================================================================
// Module: S3 Object Store
// Description: S3-backed object storage for archived crawls.
// Purpose: Provide put/get/copy/delete/list over a bucket and optional prefix.
// Dependencies: aws-config, aws-sdk-s3, crawl-archive-core, serde, tokio
// ============================================================================

//! ## Overview
//! Every key handed to [`S3ObjectStore`] is relative to the configured
//! prefix; listings strip the prefix again so callers never see it. HTTP 404
//! responses map to [`ObjectStoreError::NotFound`]; every other SDK failure
//! maps to [`ObjectStoreError::Remote`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use crawl_archive_core::ObjectStore;
use crawl_archive_core::ObjectStoreError;
use serde::Deserialize;
use serde::Serialize;
use tokio::runtime::Runtime;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for S3-backed object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3ObjectStoreConfig {
    /// Bucket name.
    pub bucket: String,
    /// AWS region (optional; falls back to environment configuration).
    #[serde(default)]
    pub region: Option<String>,
    /// Custom endpoint URL (for S3-compatible stores).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Optional prefix inside the bucket.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Force path-style addressing (for S3-compatible stores).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow a plain `http://` endpoint.
    #[serde(default)]
    pub allow_http: bool,
}

impl S3ObjectStoreConfig {
    /// Creates a config for `bucket` with SDK defaults for everything else.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint: None,
            prefix: None,
            force_path_style: false,
            allow_http: false,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError::Invalid`] when the bucket, endpoint, or
    /// prefix is unusable.
    pub fn validate(&self) -> Result<(), ObjectStoreError> {
        let bucket = self.bucket.trim();
        if bucket.is_empty() {
            return Err(ObjectStoreError::Invalid("bucket must be set".to_string()));
        }
        if bucket != self.bucket || bucket.contains('/') {
            return Err(ObjectStoreError::Invalid(format!("invalid bucket name: {}", self.bucket)));
        }
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ObjectStoreError::Invalid("region must not be empty".to_string()));
        }
        if let Some(endpoint) = &self.endpoint {
            if endpoint.starts_with("http://") {
                if !self.allow_http {
                    return Err(ObjectStoreError::Invalid(
                        "http endpoints require allow_http".to_string(),
                    ));
                }
            } else if !endpoint.starts_with("https://") {
                return Err(ObjectStoreError::Invalid(format!(
                    "endpoint must be an http(s) url: {endpoint}"
                )));
            }
        }
        normalize_prefix(self.prefix.as_deref())?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// S3-backed object store.
pub struct S3ObjectStore {
    /// S3 client handle.
    client: Client,
    /// Bucket name.
    bucket: String,
    /// Normalized prefix for object keys (empty or ending in `/`).
    prefix: String,
    /// Tokio runtime for blocking S3 calls.
    runtime: Option<Arc<Runtime>>,
}

impl Drop for S3ObjectStore {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            let _ = std::thread::spawn(move || drop(runtime));
        }
    }
}

impl S3ObjectStore {
    /// Creates a new S3 object store.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectStoreError`] when the config is invalid or the runtime
    /// cannot be started.
    pub fn new(config: &S3ObjectStoreConfig) -> Result<Self, ObjectStoreError> {
        config.validate()?;
        let prefix = normalize_prefix(config.prefix.as_deref())?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|err| ObjectStoreError::Io(err.to_string()))?;
        let shared_config = runtime.block_on(async {
            let mut loader = aws_config::defaults(BehaviorVersion::latest());
            if let Some(region) = &config.region {
                loader = loader.region(Region::new(region.clone()));
            }
            if let Some(endpoint) = &config.endpoint {
                loader = loader.endpoint_url(endpoint);
            }
            loader.load().await
        });
        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.force_path_style {
            s3_builder = s3_builder.force_path_style(true);
        }
        let client = Client::from_conf(s3_builder.build());
        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            prefix,
            runtime: Some(Arc::new(runtime)),
        })
    }

    /// Builds the bucket key for a store key.
    fn object_key(&self, key: &str) -> Result<String, ObjectStoreError> {
        validate_key(key)?;
        Ok(format!("{}{key}", self.prefix))
    }

    /// Returns the runtime used to drive SDK futures.
    fn runtime(&self) -> Result<&Runtime, ObjectStoreError> {
        self.runtime
            .as_deref()
            .ok_or_else(|| ObjectStoreError::Io("object store closed".to_string()))
    }
}

impl ObjectStore for S3ObjectStore {
    fn put(&self, key: &str, source: &Path, content_type: &str) -> Result<(), ObjectStoreError> {
        let object_key = self.object_key(key)?;
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        self.runtime()?.block_on(async move {
            let body = ByteStream::from_path(source)
                .await
                .map_err(|err| ObjectStoreError::Io(err.to_string()))?;
            client
                .put_object()
                .bucket(bucket)
                .key(&object_key)
                .body(body)
                .content_type(content_type)
                .send()
                .await
                .map_err(|err| map_sdk_error(&object_key, &err))?;
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, ObjectStoreError> {
        let object_key = self.object_key(key)?;
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        self.runtime()?.block_on(async move {
            let output = client
                .get_object()
                .bucket(bucket)
                .key(&object_key)
                .send()
                .await
                .map_err(|err| map_sdk_error(&object_key, &err))?;
            let body =
                output.body.collect().await.map_err(|err| ObjectStoreError::Io(err.to_string()))?;
            Ok(body.into_bytes().to_vec())
        })
    }

    fn copy(&self, from: &str, to: &str) -> Result<(), ObjectStoreError> {
        let from_key = self.object_key(from)?;
        let to_key = self.object_key(to)?;
        let copy_source = format!("{}/{}", self.bucket, encode_copy_source(&from_key));
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        self.runtime()?.block_on(async move {
            client
                .copy_object()
                .bucket(bucket)
                .key(&to_key)
                .copy_source(copy_source)
                .send()
                .await
                .map_err(|err| map_sdk_error(&from_key, &err))?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
        let object_key = self.object_key(key)?;
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        self.runtime()?.block_on(async move {
            client
                .delete_object()
                .bucket(bucket)
                .key(&object_key)
                .send()
                .await
                .map_err(|err| map_sdk_error(&object_key, &err))?;
            Ok(())
        })
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, ObjectStoreError> {
        validate_list_prefix(prefix)?;
        let full_prefix = format!("{}{prefix}", self.prefix);
        let store_prefix = self.prefix.clone();
        let client = self.client.clone();
        let bucket = self.bucket.clone();
        self.runtime()?.block_on(async move {
            let mut keys = Vec::new();
            let mut continuation: Option<String> = None;
            loop {
                let mut request = client.list_objects_v2().bucket(&bucket).prefix(&full_prefix);
                if let Some(token) = continuation.take() {
                    request = request.continuation_token(token);
                }
                let output =
                    request.send().await.map_err(|err| map_sdk_error(&full_prefix, &err))?;
                for object in output.contents() {
                    if let Some(key) = object.key()
                        && let Some(relative) = key.strip_prefix(&store_prefix)
                    {
                        keys.push(relative.to_string());
                    }
                }
                match output.next_continuation_token() {
                    Some(token) if output.is_truncated() == Some(true) => {
                        continuation = Some(token.to_string());
                    }
                    _ => break,
                }
            }
            Ok(keys)
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Maps an SDK failure to a store error; HTTP 404 means the object is absent.
fn map_sdk_error<E>(key: &str, err: &SdkError<E, HttpResponse>) -> ObjectStoreError
where
    E: std::error::Error + 'static,
{
    if err.raw_response().is_some_and(|raw| raw.status().as_u16() == 404) {
        return ObjectStoreError::NotFound(key.to_string());
    }
    ObjectStoreError::Remote(format!("{key}: {}", DisplayErrorContext(err)))
}

/// Normalizes an optional prefix into a safe S3 path prefix.
pub(crate) fn normalize_prefix(prefix: Option<&str>) -> Result<String, ObjectStoreError> {
    let Some(prefix) = prefix else {
        return Ok(String::new());
    };
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for segment in trimmed.split('/') {
        validate_segment(segment)?;
    }
    Ok(format!("{trimmed}/"))
}

/// Validates a full object key.
fn validate_key(key: &str) -> Result<(), ObjectStoreError> {
    if key.is_empty() {
        return Err(ObjectStoreError::Invalid("object key must not be empty".to_string()));
    }
    key.split('/').try_for_each(validate_segment)
}

/// Validates a listing prefix (a key, optionally ending in `/`).
fn validate_list_prefix(prefix: &str) -> Result<(), ObjectStoreError> {
    let trimmed = prefix.strip_suffix('/').unwrap_or(prefix);
    if trimmed.is_empty() {
        return Ok(());
    }
    validate_key(trimmed)
}

/// Validates a single key segment.
fn validate_segment(segment: &str) -> Result<(), ObjectStoreError> {
    if segment.is_empty() || segment == "." || segment == ".." {
        return Err(ObjectStoreError::Invalid(format!("invalid key segment: '{segment}'")));
    }
    if segment.contains('\\') || segment.chars().any(char::is_control) {
        return Err(ObjectStoreError::Invalid(format!("invalid key segment: '{segment}'")));
    }
    Ok(())
}

/// Percent-encodes a key for the `x-amz-copy-source` header, keeping `/`.
fn encode_copy_source(key: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(char::from(byte));
        } else {
            out.push('%');
            out.push(char::from(HEX[usize::from(byte >> 4)]));
            out.push(char::from(HEX[usize::from(byte & 0x0f)]));
        }
    }
    out
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions.")]

    use super::encode_copy_source;
    use super::normalize_prefix;
    use super::validate_key;
    use super::validate_list_prefix;

    #[test]
    fn normalize_prefix_none_is_empty() {
        assert_eq!(normalize_prefix(None).expect("normalize"), "");
    }

    #[test]
    fn normalize_prefix_trims_and_appends_slash() {
        assert_eq!(normalize_prefix(Some("/crawls/ocds/")).expect("normalize"), "crawls/ocds/");
    }

    #[test]
    fn normalize_prefix_empty_or_root_is_empty() {
        assert_eq!(normalize_prefix(Some("///")).expect("normalize"), "");
        assert_eq!(normalize_prefix(Some("")).expect("normalize"), "");
    }

    #[test]
    fn normalize_prefix_rejects_invalid_segments() {
        assert!(normalize_prefix(Some("bad/../prefix")).is_err());
        assert!(normalize_prefix(Some("bad//prefix")).is_err());
        assert!(normalize_prefix(Some("bad\\prefix")).is_err());
    }

    #[test]
    fn keys_reject_traversal_and_empty_segments() {
        assert!(validate_key("scotland/2020/09/data.tar.gz").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("scotland//data.tar.gz").is_err());
        assert!(validate_key("../escape").is_err());
        assert!(validate_list_prefix("scotland/").is_ok());
        assert!(validate_list_prefix("").is_ok());
    }

    #[test]
    fn copy_source_escapes_reserved_bytes() {
        assert_eq!(
            encode_copy_source("staging/scotland/2020/09/data.tar.gz"),
            "staging/scotland/2020/09/data.tar.gz"
        );
        assert_eq!(encode_copy_source("a b/c+d"), "a%20b/c%2Bd");
    }
}
