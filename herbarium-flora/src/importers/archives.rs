//! Data archive listing and retrieval

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use herbarium_core::Reporter;

use crate::store::{key_basename, ObjectStore};

const ARCHIVE_DIR: &str = "data";

/// Names of the archives available in the store's data directory, sorted
pub fn ziplist(store: &dyn ObjectStore) -> Result<Vec<String>> {
    let mut names: Vec<String> = store
        .list(ARCHIVE_DIR)?
        .iter()
        .map(|key| key_basename(key).to_string())
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    Ok(names)
}

/// Resolve a data archive to a local file, downloading if necessary.
///
/// Without a name, the lexically latest `.zip` in the store wins; the
/// archive names carry a date stamp, so that is also the most recent. A
/// copy already present in the data directory is reused as is.
pub fn zipimport(
    store: &dyn ObjectStore,
    data_dir: &Path,
    name: Option<&str>,
    reporter: &dyn Reporter,
) -> Result<PathBuf> {
    let name = match name {
        Some(name) => name.to_string(),
        None => {
            reporter.info("Searching storage for the most recent data archive");
            let latest = ziplist(store)?
                .into_iter()
                .filter(|n| n.ends_with(".zip"))
                .last();
            match latest {
                Some(name) => name,
                None => bail!("no data archives found in storage"),
            }
        }
    };

    let local_path = data_dir.join(&name);
    if local_path.exists() {
        reporter.info(&format!(
            "Using copy already present on filesystem: {}",
            local_path.display()
        ));
        return Ok(local_path);
    }

    reporter.info(&format!("Downloading {}", name));
    let bytes = store.fetch(&format!("{}/{}", ARCHIVE_DIR, name))?;
    fs::write(&local_path, bytes)
        .with_context(|| format!("failed to write {}", local_path.display()))?;
    reporter.info(&format!("Done: {}", local_path.display()));
    Ok(local_path)
}
