//! Integration tests for backup, restore, reset and corruption recovery.

use chrono::NaiveDate;
use peekaboo_core::{NewProgress, ProgressFilter};
use peekaboo_db::{BackupOutcome, Database, DbError};

async fn open_temp(tmp: &tempfile::TempDir) -> Database {
    Database::open(&tmp.path().join("peekaboo.db"), &tmp.path().join("backup"))
        .await
        .expect("should open database")
}

fn entry(week: i64, day: i64) -> NewProgress {
    NewProgress::new(week, day, 7, 7, 7)
        .with_date(format!("2024-01-{:02}T09:00:00.000000", week * 7 + day))
}

#[tokio::test]
async fn test_corrupt_primary_restored_from_latest_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    db.insert_or_replace_progress(&entry(1, 1)).await.unwrap();

    let outcome = db.create_backup(10).await;
    assert!(outcome.is_created(), "{outcome:?}");

    // Clobber the primary file with something that isn't a database.
    std::fs::write(db.db_path(), vec![b'x'; 4096]).unwrap();

    let rows = db
        .query_progress(&ProgressFilter::default())
        .await
        .expect("query should succeed after restoring from backup");
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].week, rows[0].day), (1, 1));
}

#[tokio::test]
async fn test_corrupt_primary_without_backup_surfaces_error() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    std::fs::write(db.db_path(), vec![b'x'; 4096]).unwrap();

    let result = db.query_progress(&ProgressFilter::default()).await;
    assert!(matches!(result, Err(DbError::Sqlx(_))), "got {result:?}");
}

#[tokio::test]
async fn test_restore_named_backup_takes_safety_copy() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    db.insert_or_replace_progress(&entry(1, 1)).await.unwrap();

    let at = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let snapshot = db.backups().create_from_at(db.db_path(), at, 10);
    let name = snapshot
        .path()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap()
        .to_string();

    db.insert_or_replace_progress(&entry(1, 2)).await.unwrap();
    assert_eq!(db.query_progress(&ProgressFilter::default()).await.unwrap().len(), 2);

    let safety = db.restore_from_backup(&name, 10).await.unwrap();
    assert!(safety.is_created(), "{safety:?}");
    assert_eq!(db.backups().scan().len(), 2);

    let rows = db.query_progress(&ProgressFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].day, 1);
}

#[tokio::test]
async fn test_restore_named_backup_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;

    let missing = db
        .restore_from_backup("peekaboo_backup_20240101_080000.db", 10)
        .await;
    assert!(matches!(missing, Err(DbError::NotFound(_))), "got {missing:?}");

    let escape = db.restore_from_backup("../peekaboo.db", 10).await;
    assert!(matches!(escape, Err(DbError::Validation(_))), "got {escape:?}");

    std::fs::write(db.backups().dir().join("junk.db"), b"not sqlite").unwrap();
    let junk = db.restore_from_backup("junk.db", 10).await;
    assert!(matches!(junk, Err(DbError::Validation(_))), "got {junk:?}");
}

#[tokio::test]
async fn test_restore_from_upload() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    db.insert_or_replace_progress(&entry(3, 3)).await.unwrap();
    let uploaded = std::fs::read(db.db_path()).unwrap();
    db.delete_all_progress().await.unwrap();

    let wrong_ext = db.restore_from_upload("progress.csv", &uploaded, 10).await;
    assert!(matches!(wrong_ext, Err(DbError::Validation(_))), "got {wrong_ext:?}");

    let no_name = db.restore_from_upload("", &uploaded, 10).await;
    assert!(matches!(no_name, Err(DbError::Validation(_))), "got {no_name:?}");

    let not_sqlite = db.restore_from_upload("backup.db", b"plain text", 10).await;
    assert!(matches!(not_sqlite, Err(DbError::Validation(_))), "got {not_sqlite:?}");
    assert!(db.backups().scan().is_empty(), "rejected uploads take no backup");

    db.restore_from_upload("backup.db", &uploaded, 10).await.unwrap();
    let rows = db.query_progress(&ProgressFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!((rows[0].week, rows[0].day), (3, 3));
}

#[tokio::test]
async fn test_reset_takes_backup_then_clears() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    db.insert_or_replace_progress(&entry(1, 1)).await.unwrap();
    db.append_progress(&entry(1, 2)).await.unwrap();

    let outcome = db.reset_all_data(10).await.unwrap();
    let BackupOutcome::Created { path, .. } = outcome else {
        panic!("reset should take a backup, got {outcome:?}");
    };

    assert!(db.query_progress(&ProgressFilter::default()).await.unwrap().is_empty());
    assert!(db.completed_slots().await.unwrap().is_empty());

    // The safety backup still holds the old rows.
    let copy_dir = tempfile::tempdir().unwrap();
    let copy = copy_dir.path().join("copy.db");
    std::fs::copy(&path, &copy).unwrap();
    let old = Database::open(&copy, &copy_dir.path().join("backup"))
        .await
        .unwrap();
    assert_eq!(old.query_progress(&ProgressFilter::default()).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reset_of_empty_database_still_takes_backup() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    assert!(db.backups().scan().is_empty());

    let outcome = db.reset_all_data(10).await.unwrap();
    let path = outcome.path().expect("reset should take a backup").to_path_buf();
    assert!(path.is_file());
    assert_eq!(db.backups().scan().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_upload_restore_alongside_reads() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;
    for day in 1..=4 {
        db.append_progress(&entry(2, day)).await.unwrap();
    }
    let uploaded = std::fs::read(db.db_path()).unwrap();
    db.delete_all_progress().await.unwrap();

    let reader = db.clone();
    let reads = tokio::spawn(async move {
        for _ in 0..20 {
            let rows = reader.query_progress(&ProgressFilter::default()).await.unwrap();
            // Either the old empty file or the restored one, never a torn copy.
            assert!(rows.is_empty() || rows.len() == 4, "saw {} rows", rows.len());
        }
    });

    let safety = db.restore_from_upload("mine.db", &uploaded, 10).await.unwrap();
    assert!(safety.is_created());
    reads.await.unwrap();

    let rows = db.query_progress(&ProgressFilter::default()).await.unwrap();
    assert_eq!(rows.len(), 4);
}

#[tokio::test]
async fn test_create_backup_respects_retention() {
    let tmp = tempfile::tempdir().unwrap();
    let db = open_temp(&tmp).await;

    for hour in 0..5 {
        let at = NaiveDate::from_ymd_opt(2024, 2, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap();
        db.backups().create_from_at(db.db_path(), at, 10);
    }
    assert_eq!(db.backups().scan().len(), 5);

    let report = db.cleanup_old_backups(2);
    assert_eq!(report.removed.len(), 3);

    let kept: Vec<String> = db.backups().list().into_iter().map(|b| b.name).collect();
    assert_eq!(
        kept,
        vec![
            "peekaboo_backup_20240201_040000.db",
            "peekaboo_backup_20240201_030000.db",
        ]
    );
}
