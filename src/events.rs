use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{StudyAccession, StudyMetadata};
use crate::error::MetasheetError;
use crate::service::Archiver;

/// Only artifacts of this name are archived; events for other artifact names
/// are acknowledged and dropped.
pub const ARTIFACT_NAME: &str = "added_accessions";

/// Payload of an inbound artifact change event.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactEvent {
    pub artifact_name: String,
    pub study_accession: String,
    pub content: Map<String, Value>,
}

/// A decoded inbound event. Deletion events carry only the resource key,
/// formatted as `<artifact_name>:<study_accession>`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventEnvelope {
    Upserted { key: String, payload: ArtifactEvent },
    Deleted { key: String },
}

/// Translates artifact events into archiver calls. Transport (broker
/// subscription, retries, dead-lettering) is the caller's concern.
pub struct EventHandler {
    archiver: Arc<Archiver>,
}

impl EventHandler {
    pub fn new(archiver: Arc<Archiver>) -> Self {
        Self { archiver }
    }

    pub async fn dispatch(&self, envelope: EventEnvelope) -> Result<(), MetasheetError> {
        match envelope {
            EventEnvelope::Upserted { payload, .. } => self.changed(payload).await,
            EventEnvelope::Deleted { key } => self.deleted(&key).await,
        }
    }

    /// Consume a change event (created or updated) for an artifact.
    pub async fn changed(&self, event: ArtifactEvent) -> Result<(), MetasheetError> {
        if event.artifact_name != ARTIFACT_NAME {
            debug!(
                "ignoring change event for artifact '{}'",
                event.artifact_name
            );
            return Ok(());
        }
        let study_accession: StudyAccession = event.study_accession.parse()?;
        let metadata = StudyMetadata {
            study_accession,
            content: event.content,
        };
        self.archiver.upsert_metadata(&metadata).await
    }

    /// Consume a deletion event, identified by its resource key.
    pub async fn deleted(&self, resource_id: &str) -> Result<(), MetasheetError> {
        let Some((artifact_name, accession)) = resource_id.split_once(':') else {
            debug!("ignoring deletion event with malformed key '{resource_id}'");
            return Ok(());
        };
        if artifact_name != ARTIFACT_NAME {
            debug!("ignoring deletion event for artifact '{artifact_name}'");
            return Ok(());
        }
        let accession: StudyAccession = accession.parse()?;
        self.archiver.delete_metadata(&accession).await
    }
}
