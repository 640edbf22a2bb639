//! Object storage access for manifests and image listings
//!
//! The importers only ever list a directory-like prefix or fetch one
//! object, so the trait stays small and synchronous; the S3 backend owns
//! its own tokio runtime and blocks on the SDK calls. A local-directory
//! backend serves tests and offline runs.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use aws_sdk_s3::Client;
use tokio::runtime::Runtime;

/// Synchronous list/fetch interface over the configured store
pub trait ObjectStore {
    /// Keys of the objects directly under a prefix
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Full contents of one object
    fn fetch(&self, key: &str) -> Result<Vec<u8>>;
}

/// Final path component of an object key
pub fn key_basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Select a store implementation from a location URL:
/// `s3://bucket` or `file:///dir` (a bare path also works).
pub fn open_store(url: &str) -> Result<Box<dyn ObjectStore>> {
    if let Some(bucket) = url.strip_prefix("s3://") {
        let bucket = bucket.trim_matches('/');
        if bucket.is_empty() {
            anyhow::bail!("storage url names no bucket: {}", url);
        }
        return Ok(Box::new(S3Store::new(bucket)?));
    }
    let path = url.strip_prefix("file://").unwrap_or(url);
    Ok(Box::new(DirStore::new(PathBuf::from(path))))
}

/// S3-backed store; blocks on the async SDK behind an owned runtime
pub struct S3Store {
    runtime: Runtime,
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(bucket: &str) -> Result<Self> {
        let runtime = Runtime::new().context("failed to start storage runtime")?;
        let config = runtime
            .block_on(async { aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await });
        Ok(Self {
            runtime,
            client: Client::new(&config),
            bucket: bucket.to_string(),
        })
    }
}

impl ObjectStore for S3Store {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = format!("{}/", prefix.trim_matches('/'));
        self.runtime.block_on(async {
            let mut keys = Vec::new();
            let mut continuation_token = None;

            loop {
                let mut request = self
                    .client
                    .list_objects_v2()
                    .bucket(&self.bucket)
                    .prefix(&prefix);
                if let Some(token) = continuation_token {
                    request = request.continuation_token(token);
                }

                let response = request
                    .send()
                    .await
                    .with_context(|| format!("failed to list s3://{}/{}", self.bucket, prefix))?;

                for object in response.contents() {
                    if let Some(key) = object.key() {
                        keys.push(key.to_string());
                    }
                }

                match response.next_continuation_token() {
                    Some(token) => continuation_token = Some(token.to_string()),
                    None => break,
                }
            }

            Ok(keys)
        })
    }

    fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(key)
                .send()
                .await
                .with_context(|| format!("failed to fetch s3://{}/{}", self.bucket, key))?;
            let bytes = response
                .body
                .collect()
                .await
                .with_context(|| format!("failed to read s3://{}/{}", self.bucket, key))?;
            Ok(bytes.into_bytes().to_vec())
        })
    }
}

/// Local-directory store for tests and offline runs
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ObjectStore for DirStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.trim_matches('/');
        let dir = self.root.join(prefix);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("failed to list {:?}", dir))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                keys.push(format!("{}/{}", prefix, entry.file_name().to_string_lossy()));
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn fetch(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.root.join(key.trim_start_matches('/'));
        fs::read(&path).with_context(|| format!("failed to fetch {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_dir_store_lists_and_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let images = dir.path().join("glossary-images");
        fs::create_dir(&images).unwrap();
        let mut f = fs::File::create(images.join("bract.png")).unwrap();
        f.write_all(b"png bytes").unwrap();

        let store = DirStore::new(dir.path().to_path_buf());
        let keys = store.list("glossary-images").unwrap();
        assert_eq!(keys, vec!["glossary-images/bract.png"]);
        assert_eq!(store.fetch("glossary-images/bract.png").unwrap(), b"png bytes");
    }

    #[test]
    fn test_dir_store_missing_prefix_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().to_path_buf());
        assert!(store.list("taxon-images").unwrap().is_empty());
    }

    #[test]
    fn test_key_basename() {
        assert_eq!(key_basename("taxon-images/Sapindaceae/acer-rubrum-ba-x.jpg"),
                   "acer-rubrum-ba-x.jpg");
        assert_eq!(key_basename("plain.txt"), "plain.txt");
    }

    #[test]
    fn test_open_store_rejects_empty_bucket() {
        assert!(open_store("s3://").is_err());
    }
}
