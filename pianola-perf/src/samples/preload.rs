//! Sample preloading
//!
//! Fetches every file a score needs from a [`SampleSource`], decodes them on
//! the [`DecodePool`] in batches of roughly the pool size, and collects the
//! results into a [`SampleBank`]. Missing or undecodable files are logged and
//! skipped; the voices that needed them are simply not sounded.

use super::decode_pool::{DecodePool, DecodeResult};
use crate::error::{Error, Result};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Provider of encoded sample bytes by file name
pub trait SampleSource: Send + Sync {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// Samples stored as files in one folder
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SampleSource for DirectorySource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            // Names are plain file names inside the library folder
            if name.contains(['/', '\\']) || name.contains("..") {
                return Err(Error::ResourceMissing(format!("invalid sample name {}", name)));
            }

            let path = self.root.join(name);
            tokio::fs::read(&path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::ResourceMissing(path.display().to_string())
                } else {
                    Error::Io(e)
                }
            })
        })
    }
}

/// Samples held in memory, keyed by file name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert(name.into(), bytes);
    }
}

impl SampleSource for MemorySource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| Error::ResourceMissing(name.to_string()))
        })
    }
}

/// Decoded samples ready for playback
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: HashMap<String, Arc<DecodeResult>>,
    missing: Vec<String>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, sample: DecodeResult) {
        self.samples.insert(name.into(), Arc::new(sample));
    }

    pub fn get(&self, name: &str) -> Option<Arc<DecodeResult>> {
        self.samples.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Files that were requested but could not be loaded
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}

/// Drives batched fetch + decode of a file list
pub struct Preloader<'a> {
    pool: &'a DecodePool,
    source: &'a dyn SampleSource,
}

impl<'a> Preloader<'a> {
    pub fn new(pool: &'a DecodePool, source: &'a dyn SampleSource) -> Self {
        Self { pool, source }
    }

    /// Load `files`, calling `progress(completed, total, file)` after each
    ///
    /// Failed files count as completed for progress purposes.
    pub async fn load<F>(&self, files: &[String], mut progress: F) -> SampleBank
    where
        F: FnMut(usize, usize, &str),
    {
        let total = files.len();
        let mut completed = 0;
        let mut bank = SampleBank::new();

        for batch in files.chunks(self.pool.size()) {
            debug!("Preloading batch of {} samples", batch.len());

            let mut in_flight: FuturesUnordered<_> = batch
                .iter()
                .map(|name| async move { (name, self.pool.submit_source(self.source, name).await) })
                .collect();

            while let Some((name, result)) = in_flight.next().await {
                completed += 1;
                match result {
                    Some(sample) => bank.insert(name.clone(), sample),
                    None => {
                        warn!("Sample {} unavailable; voices using it will be skipped", name);
                        bank.missing.push(name.clone());
                    }
                }
                progress(completed, total, name);
            }
        }

        info!(
            "Preloaded {} of {} samples ({} missing)",
            bank.len(),
            total,
            bank.missing.len()
        );
        bank
    }
}
