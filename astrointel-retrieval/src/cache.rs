//! On-disk vector cache
//!
//! Passage vectors are stored as a `(passage_count, dimension)` f32 `.npy`
//! array next to a JSON sidecar describing what produced it. The sidecar
//! fingerprint covers the model id and the ordered passage texts, so edits
//! to the knowledge base or a model switch force a rebuild.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;

use crate::embedding::VectorEngine;
use crate::error::{Result, RetrievalError};
use crate::passage::KnowledgeBase;

/// Sidecar format version
const FORMAT_VERSION: u32 = 1;

/// How the cache came to be in memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Read from disk without recomputation
    Loaded,
    /// No cache on disk; computed and persisted
    Built,
    /// Cache on disk was stale or unreadable; recomputed and overwritten
    Rebuilt,
}

/// Description of a persisted cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub format_version: u32,
    pub model_id: String,
    pub dimension: usize,
    pub passage_count: usize,
    /// SHA-256 over model id and ordered passage texts
    pub fingerprint: String,
    /// SHA-256 over the little-endian vector data
    pub vectors_digest: String,
}

/// Passage vectors, index-aligned with the knowledge base
#[derive(Debug, Clone, PartialEq)]
pub struct VectorCache {
    vectors: Vec<Vec<f32>>,
    dimension: usize,
}

impl VectorCache {
    /// Wrap vectors, checking they are non-empty and rectangular
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimension = vectors
            .first()
            .map(Vec::len)
            .ok_or_else(|| RetrievalError::cache("vector cache is empty"))?;
        if dimension == 0 {
            return Err(RetrievalError::cache("vector cache has zero dimension"));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
            return Err(RetrievalError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }
        Ok(Self { vectors, dimension })
    }

    /// Embed every passage in one batch
    pub fn build(kb: &KnowledgeBase, engine: &VectorEngine) -> Result<Self> {
        log::info!("Embedding {} passages with {}", kb.len(), engine.model_id());
        let vectors = engine.embed_batch(&kb.texts())?;
        Self::from_vectors(vectors)
    }

    /// Read a `.npy` array from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let array = Array2::<f32>::read_npy(BufReader::new(file))?;
        let vectors = array.rows().into_iter().map(|row| row.to_vec()).collect();
        Self::from_vectors(vectors)
    }

    /// Write the array atomically
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let flat: Vec<f32> = self.vectors.iter().flatten().copied().collect();
        let array = Array2::from_shape_vec((self.vectors.len(), self.dimension), flat)?;

        write_atomically(path.as_ref(), |writer| {
            array.write_npy(writer)?;
            Ok(())
        })
    }

    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.vectors
    }

    pub fn get(&self, index: usize) -> Option<&[f32]> {
        self.vectors.get(index).map(Vec::as_slice)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// SHA-256 over the vector data
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for value in self.vectors.iter().flatten() {
            hasher.update(value.to_le_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Fingerprint of (model, ordered passage texts)
pub fn fingerprint(model_id: &str, kb: &KnowledgeBase) -> String {
    let mut hasher = Sha256::new();
    hasher.update((model_id.len() as u64).to_le_bytes());
    hasher.update(model_id.as_bytes());
    for text in kb.texts() {
        hasher.update((text.len() as u64).to_le_bytes());
        hasher.update(text.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Sidecar path for a cache file: `kb_embeddings.npy` -> `kb_embeddings.npy.meta.json`
pub fn metadata_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".meta.json");
    PathBuf::from(name)
}

/// Load the cache at `path` or build and persist it
///
/// With `validate` set, the sidecar must match the current model and
/// knowledge base; any mismatch or read failure triggers a rebuild.
/// Without it, file presence alone decides, but the array shape must still
/// fit the knowledge base.
pub fn load_or_build(
    path: &Path,
    kb: &KnowledgeBase,
    engine: &VectorEngine,
    validate: bool,
) -> Result<(VectorCache, CacheStatus)> {
    if !path.exists() {
        log::info!("No vector cache at {}, building", path.display());
        let cache = build_and_persist(path, kb, engine)?;
        return Ok((cache, CacheStatus::Built));
    }

    if !validate {
        log::info!("Loading cached embeddings from {}", path.display());
        let cache = VectorCache::load(path)?;
        check_shape(&cache, kb, engine)?;
        return Ok((cache, CacheStatus::Loaded));
    }

    let expected_fingerprint = fingerprint(engine.model_id(), kb);
    match load_validated(path, kb, engine, &expected_fingerprint) {
        Ok(cache) => {
            log::info!(
                "Loaded {} cached embeddings from {}",
                cache.len(),
                path.display()
            );
            Ok((cache, CacheStatus::Loaded))
        }
        Err(e) => {
            log::warn!("Vector cache at {} is stale: {}. Rebuilding.", path.display(), e);
            let cache = build_and_persist(path, kb, engine)?;
            Ok((cache, CacheStatus::Rebuilt))
        }
    }
}

fn load_validated(
    path: &Path,
    kb: &KnowledgeBase,
    engine: &VectorEngine,
    expected_fingerprint: &str,
) -> Result<VectorCache> {
    let meta_file = File::open(metadata_path(path))?;
    let meta: CacheMetadata = serde_json::from_reader(BufReader::new(meta_file))?;

    if meta.format_version != FORMAT_VERSION {
        return Err(RetrievalError::cache(format!(
            "format version {} (current: {})",
            meta.format_version, FORMAT_VERSION
        )));
    }
    if meta.model_id != engine.model_id() {
        return Err(RetrievalError::cache(format!(
            "built with model {} (current: {})",
            meta.model_id,
            engine.model_id()
        )));
    }
    if meta.fingerprint != expected_fingerprint {
        return Err(RetrievalError::cache("knowledge base has changed"));
    }

    let cache = VectorCache::load(path)?;
    check_shape(&cache, kb, engine)?;
    if cache.digest() != meta.vectors_digest {
        return Err(RetrievalError::cache("vector data does not match its metadata"));
    }
    Ok(cache)
}

fn check_shape(cache: &VectorCache, kb: &KnowledgeBase, engine: &VectorEngine) -> Result<()> {
    if cache.len() != kb.len() {
        return Err(RetrievalError::cache(format!(
            "cache holds {} vectors for {} passages",
            cache.len(),
            kb.len()
        )));
    }
    if cache.dimension() != engine.dimension() {
        return Err(RetrievalError::DimensionMismatch {
            expected: engine.dimension(),
            actual: cache.dimension(),
        });
    }
    Ok(())
}

fn build_and_persist(path: &Path, kb: &KnowledgeBase, engine: &VectorEngine) -> Result<VectorCache> {
    let cache = VectorCache::build(kb, engine)?;
    cache.persist(path)?;

    let meta = CacheMetadata {
        format_version: FORMAT_VERSION,
        model_id: engine.model_id().to_string(),
        dimension: cache.dimension(),
        passage_count: cache.len(),
        fingerprint: fingerprint(engine.model_id(), kb),
        vectors_digest: cache.digest(),
    };
    write_atomically(&metadata_path(path), |writer| {
        serde_json::to_writer_pretty(writer, &meta)?;
        Ok(())
    })?;

    log::info!("Persisted {} embeddings to {}", cache.len(), path.display());
    Ok(cache)
}

/// Write through a temp file in the target directory, then rename over `path`
///
/// Readers observe either the old file or the complete new one.
fn write_atomically<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| RetrievalError::Io(e.error))?;
    Ok(())
}
