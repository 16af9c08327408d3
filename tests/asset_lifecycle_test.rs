use anyhow::Result;
use std::sync::Arc;

use dealer_media::app::merge_use_case::MergeUseCase;
use dealer_media::app::migrate_use_case::MigrateUseCase;
use dealer_media::app::ports::{ObjectStore, RecordStore};
use dealer_media::app::presign_use_case::PresignUseCase;
use dealer_media::app::transaction::AssetTransaction;
use dealer_media::app::upload_use_case::UploadUseCase;
use dealer_media::config::UploadConfig;
use dealer_media::domain::{FileSpec, IncomingFile};
use dealer_media::error::AssetError;
use dealer_media::infra::memory_records::MemoryRecordStore;
use dealer_media::infra::memory_store::MemoryObjectStore;

struct Harness {
    records: Arc<MemoryRecordStore>,
    objects: Arc<MemoryObjectStore>,
    transaction: Arc<AssetTransaction>,
}

fn harness() -> Harness {
    let records = Arc::new(MemoryRecordStore::new());
    let objects = Arc::new(MemoryObjectStore::new("lot-media"));
    let record_port: Arc<dyn RecordStore> = records.clone();
    let object_port: Arc<dyn ObjectStore> = objects.clone();
    let transaction = Arc::new(AssetTransaction::new(record_port, object_port));
    Harness {
        records,
        objects,
        transaction,
    }
}

fn jpeg(name: &str) -> IncomingFile {
    IncomingFile {
        file_name: name.to_string(),
        content_type: "image/jpeg".to_string(),
        bytes: vec![0xff, 0xd8, 0xff],
    }
}

fn seed_with_objects(h: &Harness, identifier: &str, names: &[&str]) -> Vec<String> {
    let mut references = Vec::new();
    for name in names {
        h.objects.insert_raw(name, b"bytes".to_vec(), "image/jpeg");
        references.push(h.objects.public_url(name));
    }
    h.records.insert_record(identifier, references.clone());
    references
}

#[tokio::test]
async fn removing_one_index_keeps_the_rest_in_order() -> Result<()> {
    let h = harness();
    seed_with_objects(&h, "R001", &["a.jpg", "b.jpg", "c.jpg"]);

    let report = h.transaction.remove_indices("R001", &[1]).await?;

    assert_eq!(
        report.remaining,
        vec![
            h.objects.public_url("a.jpg"),
            h.objects.public_url("c.jpg"),
        ]
    );
    assert_eq!(report.summary.succeeded, 1);
    assert!(!h.objects.contains("b.jpg"));
    assert!(h.objects.contains("a.jpg"));
    Ok(())
}

#[tokio::test]
async fn removing_first_and_last_keeps_the_middle() -> Result<()> {
    let h = harness();
    seed_with_objects(&h, "R001", &["a.jpg", "b.jpg", "c.jpg"]);

    let report = h.transaction.remove_indices("R001", &[0, 2]).await?;

    assert_eq!(report.remaining, vec![h.objects.public_url("b.jpg")]);
    assert_eq!(h.records.references("R001").unwrap(), report.remaining);
    Ok(())
}

#[tokio::test]
async fn duplicate_indices_count_once() -> Result<()> {
    let h = harness();
    seed_with_objects(&h, "R001", &["a.jpg", "b.jpg", "c.jpg", "d.jpg"]);

    let report = h.transaction.remove_indices("R001", &[3, 1, 3]).await?;

    assert_eq!(report.summary.requested, 3);
    assert_eq!(report.summary.processed, 2);
    assert_eq!(report.remaining.len(), 2);
    Ok(())
}

#[tokio::test]
async fn index_equal_to_length_fails_without_changes() -> Result<()> {
    let h = harness();
    let before = seed_with_objects(&h, "R001", &["a.jpg", "b.jpg", "c.jpg"]);

    let err = h
        .transaction
        .remove_indices("R001", &[3])
        .await
        .unwrap_err();

    assert!(matches!(err, AssetError::Validation(_)));
    assert_eq!(h.records.references("R001").unwrap(), before);
    assert_eq!(h.objects.object_keys().len(), 3);
    Ok(())
}

#[tokio::test]
async fn historical_encoding_variants_still_delete() -> Result<()> {
    let h = harness();
    // The object was stored with a raw space, but the recorded
    // reference carries the percent-encoded form.
    h.objects
        .insert_raw("uploads/car front.jpg", b"x".to_vec(), "image/jpeg");
    h.records.insert_record(
        "R001",
        vec![h.objects.public_url("uploads/car%20front.jpg")],
    );

    let report = h.transaction.remove_indices("R001", &[0]).await?;

    assert_eq!(report.summary.succeeded, 1);
    assert!(!h.objects.contains("uploads/car front.jpg"));
    assert!(h.records.references("R001").unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn merge_appends_after_existing_references() -> Result<()> {
    let h = harness();
    let existing = seed_with_objects(&h, "R001", &["old.jpg"]);
    let merge = MergeUseCase::new(h.objects.clone(), h.transaction.clone());

    let merged = merge
        .merge_keys(
            "R001",
            &[
                "records/R001/new1.jpg".to_string(),
                "records/R001/new2.jpg".to_string(),
            ],
        )
        .await?;

    assert_eq!(merged.references.len(), 3);
    assert_eq!(merged.references[0], existing[0]);
    assert_eq!(
        merged.references[1],
        h.objects.public_url("records/R001/new1.jpg")
    );
    Ok(())
}

#[tokio::test]
async fn presign_then_merge_round_trip() -> Result<()> {
    let h = harness();
    h.records.insert_record("AB 12", vec![]);
    let presign = PresignUseCase::new(h.objects.clone(), UploadConfig::default());

    let batch = presign
        .issue(
            Some("AB 12"),
            &[FileSpec {
                file_name: "front.jpg".to_string(),
                content_type: Some("image/jpeg".to_string()),
            }],
        )
        .await?;
    assert_eq!(batch.uploads[0].key, "records/AB-12/front.jpg");
    assert!(h.objects.object_keys().is_empty(), "signing created an object");

    // Client-side upload, then merge the key into the record.
    h.objects
        .insert_raw(&batch.uploads[0].key, b"img".to_vec(), "image/jpeg");
    let merge = MergeUseCase::new(h.objects.clone(), h.transaction.clone());
    let merged = merge
        .merge_keys("AB 12", &[batch.uploads[0].key.clone()])
        .await?;

    let reference = &merged.references[0];
    assert_eq!(
        h.objects.key_for_url(reference).as_deref(),
        Some("records/AB-12/front.jpg")
    );
    Ok(())
}

#[tokio::test]
async fn upload_batch_links_records_by_filename_prefix() -> Result<()> {
    let h = harness();
    h.records.insert_record("R001", vec![]);
    let upload = UploadUseCase::new(
        h.objects.clone(),
        h.transaction.clone(),
        UploadConfig::default(),
    );

    let outcome = upload
        .upload_batch(&[
            jpeg("R001_front.jpg"),
            jpeg("R001_rear.jpg"),
            jpeg("STRAY_x.jpg"),
        ])
        .await?;

    assert_eq!(outcome.linked, vec!["R001"]);
    assert_eq!(outcome.unmatched, vec!["STRAY"]);
    assert_eq!(h.records.references("R001").unwrap().len(), 2);
    // The stray group's objects stay in the store, unreferenced.
    assert_eq!(h.objects.object_keys().len(), 3);
    Ok(())
}

#[tokio::test]
async fn migration_dry_run_matches_apply() -> Result<()> {
    let h = harness();
    seed_with_objects(
        &h,
        "AB#12",
        &["1693000_front.jpg", "uploads/1693001_rear.jpg"],
    );
    let migrate = MigrateUseCase::new(h.objects.clone(), h.transaction.clone());

    let dry = migrate.run("AB#12", true).await?;
    let applied = migrate.run("AB#12", false).await?;

    // Byte-identical pair lists between the two modes.
    assert_eq!(
        serde_json::to_string(&dry.plan.moves)?,
        serde_json::to_string(&applied.plan.moves)?
    );
    assert_eq!(dry.references, seed_refs(&h));
    assert_eq!(applied.moved, 2);
    assert!(h.objects.contains("records/ABHASH12/1693000_front.jpg"));
    assert!(h.objects.contains("records/ABHASH12/1693001_rear.jpg"));
    assert!(!h.objects.contains("1693000_front.jpg"));

    // A second run has nothing left to do.
    let again = migrate.run("AB#12", false).await?;
    assert_eq!(again.moved, 0);
    assert!(again.plan.moves.is_empty());
    Ok(())
}

fn seed_refs(h: &Harness) -> Vec<String> {
    vec![
        h.objects.public_url("1693000_front.jpg"),
        h.objects.public_url("uploads/1693001_rear.jpg"),
    ]
}

#[tokio::test]
async fn operations_against_unknown_records_fail_fast() -> Result<()> {
    let h = harness();
    let upload = UploadUseCase::new(
        h.objects.clone(),
        h.transaction.clone(),
        UploadConfig::default(),
    );
    let migrate = MigrateUseCase::new(h.objects.clone(), h.transaction.clone());

    assert!(matches!(
        upload.add_to_record("ghost", &[jpeg("a_1.jpg")]).await,
        Err(AssetError::RecordNotFound(_))
    ));
    assert!(matches!(
        migrate.run("ghost", true).await,
        Err(AssetError::RecordNotFound(_))
    ));
    assert!(matches!(
        h.transaction.remove_indices("ghost", &[0]).await,
        Err(AssetError::RecordNotFound(_))
    ));
    assert!(h.objects.operations().is_empty());
    Ok(())
}
