use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::{StudyAccession, StudyMetadata};
use crate::error::MetasheetError;
use crate::store::{MetadataStore, WorkbookStore};
use crate::transpile::Transpiler;

/// Orchestrates the archival lifecycle: upsert with change detection,
/// retrieval with a unified not-found signal, and idempotent deletion.
///
/// The check-then-write in `upsert_metadata` is not serialized per accession;
/// two concurrent upserts with different content can interleave. This mirrors
/// the behavior of the event- and HTTP-driven callers sharing one store
/// without mutual exclusion.
pub struct Archiver {
    metadata_store: Arc<dyn MetadataStore>,
    workbook_store: Arc<dyn WorkbookStore>,
    transpiler: Transpiler,
}

impl Archiver {
    pub fn new(
        metadata_store: Arc<dyn MetadataStore>,
        workbook_store: Arc<dyn WorkbookStore>,
        transpiler: Transpiler,
    ) -> Self {
        Self {
            metadata_store,
            workbook_store,
            transpiler,
        }
    }

    pub fn transpiler(&self) -> &Transpiler {
        &self.transpiler
    }

    /// Store the document and its derived workbook, replacing any previous
    /// version. A document deep-equal to the stored one is a no-op: neither
    /// store is written and the workbook is not regenerated.
    pub async fn upsert_metadata(&self, metadata: &StudyMetadata) -> Result<(), MetasheetError> {
        let accession = &metadata.study_accession;
        match self.metadata_store.get(accession).await {
            Ok(existing) if existing == *metadata => {
                debug!("metadata for {accession} is unchanged, skipping upsert");
                return Ok(());
            }
            Ok(_) | Err(MetasheetError::KeyNotFound(_)) => {}
            Err(err) => return Err(err),
        }

        self.metadata_store.put(metadata).await?;
        let bytes = self.transpiler.transpile_to_bytes(metadata)?;
        self.workbook_store.put(accession, bytes).await?;
        info!("stored metadata and workbook for {accession}");
        Ok(())
    }

    pub async fn retrieve_metadata(
        &self,
        accession: &StudyAccession,
    ) -> Result<StudyMetadata, MetasheetError> {
        self.metadata_store
            .get(accession)
            .await
            .map_err(|err| into_not_found(err, accession))
    }

    pub async fn retrieve_workbook(
        &self,
        accession: &StudyAccession,
    ) -> Result<Vec<u8>, MetasheetError> {
        self.workbook_store
            .get(accession)
            .await
            .map_err(|err| into_not_found(err, accession))
    }

    /// Delete the document and its workbook. Absence of either is not an
    /// error, so the call is safe for accessions that were never stored.
    pub async fn delete_metadata(&self, accession: &StudyAccession) -> Result<(), MetasheetError> {
        match self.metadata_store.delete(accession).await {
            Ok(()) => info!("deleted metadata for {accession}"),
            Err(MetasheetError::KeyNotFound(_)) => {
                debug!("no metadata to delete for {accession}");
            }
            Err(err) => return Err(err),
        }
        self.workbook_store.delete(accession).await
    }
}

fn into_not_found(err: MetasheetError, accession: &StudyAccession) -> MetasheetError {
    match err {
        MetasheetError::KeyNotFound(_) => MetasheetError::MetadataNotFound(accession.to_string()),
        other => other,
    }
}
