use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use tokio::sync::RwLock;
use tracing::error;

use crate::domain::{StudyAccession, StudyMetadata};
use crate::error::MetasheetError;

/// Keyed document store for metadata artifacts. `put` has replace semantics;
/// `get` and `delete` signal a missing key with `KeyNotFound`.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn get(&self, accession: &StudyAccession) -> Result<StudyMetadata, MetasheetError>;
    async fn put(&self, metadata: &StudyMetadata) -> Result<(), MetasheetError>;
    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError>;
}

/// Keyed blob store for serialized workbooks. `delete` swallows a missing key,
/// so deleting an absent workbook is always a no-op.
#[async_trait]
pub trait WorkbookStore: Send + Sync {
    async fn get(&self, accession: &StudyAccession) -> Result<Vec<u8>, MetasheetError>;
    async fn put(&self, accession: &StudyAccession, bytes: Vec<u8>) -> Result<(), MetasheetError>;
    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError>;
}

const METADATA_DIR: &str = "metadata";
const WORKBOOK_DIR: &str = "workbooks";
const WORKBOOK_EXTENSION: &str = "xlsx";

/// Filesystem-backed metadata store: one pretty-printed JSON document per
/// accession under `<root>/metadata/`.
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    root: Utf8PathBuf,
}

impl FsMetadataStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, accession: &StudyAccession) -> Utf8PathBuf {
        self.root
            .join(METADATA_DIR)
            .join(format!("{accession}.json"))
    }
}

#[async_trait]
impl MetadataStore for FsMetadataStore {
    async fn get(&self, accession: &StudyAccession) -> Result<StudyMetadata, MetasheetError> {
        let content = read_bytes(&self.path(accession), accession).await?;
        serde_json::from_slice(&content).map_err(|err| {
            error!("failed to decode metadata document for {accession}: {err}");
            MetasheetError::Serialization(err.to_string())
        })
    }

    async fn put(&self, metadata: &StudyMetadata) -> Result<(), MetasheetError> {
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| MetasheetError::Serialization(err.to_string()))?;
        write_bytes_atomic(&self.path(&metadata.study_accession), &content).await
    }

    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError> {
        match tokio::fs::remove_file(self.path(accession).as_std_path()).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(MetasheetError::KeyNotFound(accession.to_string()))
            }
            Err(err) => Err(MetasheetError::Storage(err.to_string())),
        }
    }
}

/// Filesystem-backed workbook store: one `.xlsx` blob per accession under
/// `<root>/workbooks/`.
#[derive(Debug, Clone)]
pub struct FsWorkbookStore {
    root: Utf8PathBuf,
}

impl FsWorkbookStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path(&self, accession: &StudyAccession) -> Utf8PathBuf {
        self.root
            .join(WORKBOOK_DIR)
            .join(format!("{accession}.{WORKBOOK_EXTENSION}"))
    }
}

#[async_trait]
impl WorkbookStore for FsWorkbookStore {
    async fn get(&self, accession: &StudyAccession) -> Result<Vec<u8>, MetasheetError> {
        read_bytes(&self.path(accession), accession).await
    }

    async fn put(&self, accession: &StudyAccession, bytes: Vec<u8>) -> Result<(), MetasheetError> {
        write_bytes_atomic(&self.path(accession), &bytes).await
    }

    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError> {
        match tokio::fs::remove_file(self.path(accession).as_std_path()).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(MetasheetError::Storage(err.to_string())),
        }
    }
}

async fn read_bytes(
    path: &Utf8Path,
    accession: &StudyAccession,
) -> Result<Vec<u8>, MetasheetError> {
    match tokio::fs::read(path.as_std_path()).await {
        Ok(content) => Ok(content),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            Err(MetasheetError::KeyNotFound(accession.to_string()))
        }
        Err(err) => Err(MetasheetError::Storage(err.to_string())),
    }
}

async fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), MetasheetError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent.as_std_path())
            .await
            .map_err(|err| MetasheetError::Storage(err.to_string()))?;
    }
    let tmp_path = path.with_extension("tmp");
    tokio::fs::write(tmp_path.as_std_path(), content)
        .await
        .map_err(|err| MetasheetError::Storage(err.to_string()))?;
    tokio::fs::rename(tmp_path.as_std_path(), path.as_std_path())
        .await
        .map_err(|err| MetasheetError::Storage(err.to_string()))
}

/// In-memory metadata store for tests and ephemeral deployments.
#[derive(Debug, Default)]
pub struct MemMetadataStore {
    entries: RwLock<HashMap<String, StudyMetadata>>,
}

impl MemMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetadataStore for MemMetadataStore {
    async fn get(&self, accession: &StudyAccession) -> Result<StudyMetadata, MetasheetError> {
        self.entries
            .read()
            .await
            .get(accession.as_str())
            .cloned()
            .ok_or_else(|| MetasheetError::KeyNotFound(accession.to_string()))
    }

    async fn put(&self, metadata: &StudyMetadata) -> Result<(), MetasheetError> {
        self.entries
            .write()
            .await
            .insert(metadata.study_accession.to_string(), metadata.clone());
        Ok(())
    }

    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError> {
        self.entries
            .write()
            .await
            .remove(accession.as_str())
            .map(|_| ())
            .ok_or_else(|| MetasheetError::KeyNotFound(accession.to_string()))
    }
}

/// In-memory workbook store counterpart to [`MemMetadataStore`].
#[derive(Debug, Default)]
pub struct MemWorkbookStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemWorkbookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkbookStore for MemWorkbookStore {
    async fn get(&self, accession: &StudyAccession) -> Result<Vec<u8>, MetasheetError> {
        self.entries
            .read()
            .await
            .get(accession.as_str())
            .cloned()
            .ok_or_else(|| MetasheetError::KeyNotFound(accession.to_string()))
    }

    async fn put(&self, accession: &StudyAccession, bytes: Vec<u8>) -> Result<(), MetasheetError> {
        self.entries
            .write()
            .await
            .insert(accession.to_string(), bytes);
        Ok(())
    }

    async fn delete(&self, accession: &StudyAccession) -> Result<(), MetasheetError> {
        self.entries.write().await.remove(accession.as_str());
        Ok(())
    }
}
