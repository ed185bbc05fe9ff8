use std::io::Cursor;
use std::sync::Arc;

use assert_matches::assert_matches;
use calamine::{Reader, Xlsx};
use serde_json::json;

use metasheet::config::default_sheet_names;
use metasheet::domain::StudyAccession;
use metasheet::error::MetasheetError;
use metasheet::events::{ArtifactEvent, EventEnvelope, EventHandler};
use metasheet::service::Archiver;
use metasheet::sheets::SheetNameConfig;
use metasheet::store::{MemMetadataStore, MemWorkbookStore};
use metasheet::transpile::Transpiler;

fn fixture() -> (EventHandler, Arc<Archiver>) {
    let archiver = Arc::new(Archiver::new(
        Arc::new(MemMetadataStore::new()),
        Arc::new(MemWorkbookStore::new()),
        Transpiler::new(SheetNameConfig {
            sheet_names: default_sheet_names(),
            strict: false,
        }),
    ));
    (EventHandler::new(archiver.clone()), archiver)
}

fn artifact_event(accession: &str) -> ArtifactEvent {
    let event = json!({
        "artifact_name": "added_accessions",
        "study_accession": accession,
        "content": {
            "samples": [{"accession": "sample1"}],
            "studies": [{"accession": accession}],
        },
    });
    serde_json::from_value(event).unwrap()
}

#[tokio::test]
async fn change_event_archives_the_artifact() {
    let (handler, archiver) = fixture();
    handler.changed(artifact_event("test_accession")).await.unwrap();

    let accession: StudyAccession = "test_accession".parse().unwrap();
    let bytes = archiver.retrieve_workbook(&accession).await.unwrap();
    let workbook = Xlsx::new(Cursor::new(bytes)).unwrap();
    assert_eq!(workbook.sheet_names(), ["Sample", "Study"]);
}

#[tokio::test]
async fn change_event_for_foreign_artifact_is_ignored() {
    let (handler, archiver) = fixture();
    let mut event = artifact_event("test_accession");
    event.artifact_name = "embedded_public".to_string();
    handler.changed(event).await.unwrap();

    let accession: StudyAccession = "test_accession".parse().unwrap();
    let err = archiver.retrieve_workbook(&accession).await.unwrap_err();
    assert_matches!(err, MetasheetError::MetadataNotFound(_));
}

#[tokio::test]
async fn deletion_event_removes_the_artifact() {
    let (handler, archiver) = fixture();
    handler.changed(artifact_event("test_accession")).await.unwrap();

    handler
        .deleted("added_accessions:test_accession")
        .await
        .unwrap();

    let accession: StudyAccession = "test_accession".parse().unwrap();
    let err = archiver.retrieve_workbook(&accession).await.unwrap_err();
    assert_matches!(err, MetasheetError::MetadataNotFound(_));
}

#[tokio::test]
async fn deletion_event_with_foreign_or_malformed_key_is_ignored() {
    let (handler, archiver) = fixture();
    handler.changed(artifact_event("test_accession")).await.unwrap();

    handler.deleted("no_separator_here").await.unwrap();
    handler
        .deleted("embedded_public:test_accession")
        .await
        .unwrap();

    // the artifact is still there
    let accession: StudyAccession = "test_accession".parse().unwrap();
    archiver.retrieve_workbook(&accession).await.unwrap();
}

#[tokio::test]
async fn envelopes_decode_and_dispatch() {
    let (handler, archiver) = fixture();

    let upserted: EventEnvelope = serde_json::from_value(json!({
        "type": "upserted",
        "key": "added_accessions:test_accession",
        "payload": {
            "artifact_name": "added_accessions",
            "study_accession": "test_accession",
            "content": {"studies": [{"accession": "test_accession"}]},
        },
    }))
    .unwrap();
    handler.dispatch(upserted).await.unwrap();

    let accession: StudyAccession = "test_accession".parse().unwrap();
    archiver.retrieve_workbook(&accession).await.unwrap();

    let deleted: EventEnvelope = serde_json::from_value(json!({
        "type": "deleted",
        "key": "added_accessions:test_accession",
    }))
    .unwrap();
    handler.dispatch(deleted).await.unwrap();

    let err = archiver.retrieve_workbook(&accession).await.unwrap_err();
    assert_matches!(err, MetasheetError::MetadataNotFound(_));
}
