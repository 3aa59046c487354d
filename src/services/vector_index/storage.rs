//! On-disk layout of a persisted index.
//!
//! ```text
//! <dir>/manifest.json          live generation, counts, file names
//! <dir>/vectors-<gen>.bin      magic, version, dimension, count, f32 LE data
//! <dir>/metadata-<gen>.json    documents, parallel to the vectors
//! ```
//!
//! Data files of a new generation are written and synced before the manifest
//! is swapped in with a rename, so readers only ever see a complete generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Document;

use super::flat::FlatIndex;

pub const MANIFEST_FILE: &str = "manifest.json";
const VECTOR_MAGIC: &[u8; 4] = b"RGVI";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub generation: u64,
    pub dimension: usize,
    pub count: usize,
    pub vectors_file: String,
    pub metadata_file: String,
    pub created_at: DateTime<Utc>,
}

fn corrupt(dir: &Path, reason: impl Into<String>) -> DomainError {
    DomainError::CorruptIndex {
        path: dir.display().to_string(),
        reason: reason.into(),
    }
}

fn vectors_name(generation: u64) -> String {
    format!("vectors-{generation}.bin")
}

fn metadata_name(generation: u64) -> String {
    format!("metadata-{generation}.json")
}

fn manifest_tmp_name(generation: u64) -> String {
    format!("{MANIFEST_FILE}.{generation}.tmp")
}

/// Generation encoded in a data or temp file name this module writes.
fn parse_generation(name: &str) -> Option<u64> {
    let number = name
        .strip_prefix("vectors-")
        .and_then(|rest| rest.strip_suffix(".bin"))
        .or_else(|| name.strip_prefix("metadata-").and_then(|rest| rest.strip_suffix(".json")))
        .or_else(|| {
            name.strip_prefix(MANIFEST_FILE)
                .and_then(|rest| rest.strip_prefix('.'))
                .and_then(|rest| rest.strip_suffix(".tmp"))
        })?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

/// Read the manifest, `None` when the directory holds no index.
pub fn read_manifest(dir: &Path) -> DomainResult<Option<Manifest>> {
    let path = dir.join(MANIFEST_FILE);
    let raw = match fs::read(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|e| corrupt(dir, format!("unreadable manifest: {e}")))
}

/// Write `index` as a new generation and make it live. Returns the generation.
pub fn write_index(dir: &Path, index: &FlatIndex) -> DomainResult<u64> {
    fs::create_dir_all(dir)?;

    let previous = read_manifest(dir).ok().flatten().map_or(0, |m| m.generation);
    let generation = previous.max(index.generation()) + 1;

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        generation,
        dimension: index.dimension(),
        count: index.len(),
        vectors_file: vectors_name(generation),
        metadata_file: metadata_name(generation),
        created_at: Utc::now(),
    };

    write_synced(&dir.join(&manifest.vectors_file), &encode_vectors(index))?;
    write_synced(
        &dir.join(&manifest.metadata_file),
        &serde_json::to_vec(index.documents())?,
    )?;

    let tmp = dir.join(manifest_tmp_name(generation));
    write_synced(&tmp, &serde_json::to_vec_pretty(&manifest)?)?;
    fs::rename(&tmp, dir.join(MANIFEST_FILE))?;
    sync_dir(dir);

    remove_stale_generations(dir, generation);
    Ok(generation)
}

/// Load the live generation.
pub fn read_index(dir: &Path) -> DomainResult<FlatIndex> {
    let manifest = read_manifest(dir)?
        .ok_or_else(|| DomainError::NotFound(format!("no index manifest in {}", dir.display())))?;

    if manifest.format_version != FORMAT_VERSION {
        return Err(corrupt(
            dir,
            format!("unsupported format version {}", manifest.format_version),
        ));
    }
    if manifest.vectors_file != vectors_name(manifest.generation)
        || manifest.metadata_file != metadata_name(manifest.generation)
    {
        return Err(corrupt(dir, "manifest file names do not match its generation"));
    }

    let raw_vectors = fs::read(dir.join(&manifest.vectors_file))
        .map_err(|e| corrupt(dir, format!("missing vector file: {e}")))?;
    let (dimension, vectors) = decode_vectors(dir, &raw_vectors)?;

    let raw_metadata = fs::read(dir.join(&manifest.metadata_file))
        .map_err(|e| corrupt(dir, format!("missing metadata file: {e}")))?;
    let documents: Vec<Document> = serde_json::from_slice(&raw_metadata)
        .map_err(|e| corrupt(dir, format!("unreadable metadata: {e}")))?;

    let vector_count = vectors.len() / dimension;
    if vector_count != documents.len() {
        return Err(corrupt(
            dir,
            format!("{vector_count} vectors but {} metadata entries", documents.len()),
        ));
    }
    if vector_count != manifest.count || dimension != manifest.dimension {
        return Err(corrupt(dir, "data files disagree with the manifest"));
    }

    Ok(FlatIndex::new(dimension, vectors, documents)?.with_generation(manifest.generation))
}

fn encode_vectors(index: &FlatIndex) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LEN + index.vectors().len() * 4);
    bytes.extend_from_slice(VECTOR_MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    bytes.extend_from_slice(&(index.dimension() as u32).to_le_bytes());
    bytes.extend_from_slice(&(index.len() as u64).to_le_bytes());
    bytes.extend(index.vectors().iter().flat_map(|f| f.to_le_bytes()));
    bytes
}

fn decode_vectors(dir: &Path, bytes: &[u8]) -> DomainResult<(usize, Vec<f32>)> {
    if bytes.len() < HEADER_LEN {
        return Err(corrupt(dir, "vector file shorter than its header"));
    }
    if &bytes[0..4] != VECTOR_MAGIC {
        return Err(corrupt(dir, "vector file has the wrong magic"));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(corrupt(dir, format!("unsupported vector file version {version}")));
    }
    let dimension = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let mut count_bytes = [0_u8; 8];
    count_bytes.copy_from_slice(&bytes[12..20]);
    let count = usize::try_from(u64::from_le_bytes(count_bytes))
        .map_err(|_| corrupt(dir, "vector count out of range"))?;

    if dimension == 0 {
        return Err(corrupt(dir, "vector file has zero dimension"));
    }

    let body = &bytes[HEADER_LEN..];
    let expected = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt(dir, "vector file header overflows"))?;
    if body.len() != expected {
        return Err(corrupt(
            dir,
            format!("vector file truncated: expected {expected} data bytes, found {}", body.len()),
        ));
    }

    let vectors = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    Ok((dimension, vectors))
}

fn write_synced(path: &Path, bytes: &[u8]) -> DomainResult<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

fn sync_dir(dir: &Path) {
    // Directory handles cannot be synced on every platform.
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

fn remove_stale_generations(dir: &Path, live: u64) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    // Only names this module writes; anything else in the folder is left alone.
    let stale: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .and_then(parse_generation)
                .is_some_and(|generation| generation != live)
        })
        .collect();

    for path in stale {
        if let Err(e) = fs::remove_file(&path) {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove stale index file");
        }
    }
}
