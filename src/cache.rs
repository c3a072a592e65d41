use crate::ast::Node;
use log::{trace, warn};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub nodes: Vec<Node>,
}

/// On-disk cache of parsed import files, keyed by file path and validated
/// against a hash of the source text.
pub struct ParseCache {
    cache_dir: PathBuf,
}

impl ParseCache {
    pub fn new(cache_dir: impl AsRef<Path>) -> Self {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        if !cache_dir.exists() {
            if let Err(e) = fs::create_dir_all(&cache_dir) {
                warn!("Could not create parse cache at {:?}: {}", cache_dir, e);
            }
        }
        Self { cache_dir }
    }

    pub fn compute_hash(source: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn get_cache_path(&self, file_path: &str) -> PathBuf {
        let safe_name = file_path
            .replace("/", "_")
            .replace("\\", "_")
            .replace(":", "_");
        self.cache_dir.join(format!("{}.json", safe_name))
    }

    pub fn get(&self, file_path: &str, source: &str) -> Option<Vec<Node>> {
        let cache_path = self.get_cache_path(file_path);
        let data = fs::read_to_string(&cache_path).ok()?;

        let entry: CacheEntry = match serde_json::from_str(&data) {
            Ok(e) => e,
            Err(e) => {
                warn!("Parse cache entry for {} is corrupt: {}", file_path, e);
                fs::remove_file(cache_path).ok();
                return None;
            }
        };

        if entry.hash == Self::compute_hash(source) {
            trace!("Parse cache hit for {}", file_path);
            Some(entry.nodes)
        } else {
            None
        }
    }

    pub fn set(&self, file_path: &str, source: &str, nodes: &[Node]) {
        let cache_path = self.get_cache_path(file_path);
        let entry = CacheEntry {
            hash: Self::compute_hash(source),
            nodes: nodes.to_vec(),
        };

        match serde_json::to_string(&entry) {
            Ok(data) => {
                if let Err(e) = fs::write(&cache_path, data) {
                    warn!("Could not write parse cache entry {:?}: {}", cache_path, e);
                }
            }
            Err(e) => warn!("Could not serialize parse cache entry for {}: {}", file_path, e),
        }
    }
}
