use super::*;

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn missing_key_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(storage.get(keys::USER_ID).await.expect("get"), None);
}

#[tokio::test]
async fn set_overwrites_existing_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set(keys::TOKEN, "first").await.expect("set");
    storage.set(keys::TOKEN, "second").await.expect("overwrite");

    assert_eq!(
        storage.get(keys::TOKEN).await.expect("get").as_deref(),
        Some("second")
    );
    assert_eq!(storage.entries().await.expect("entries").len(), 1);
}

#[tokio::test]
async fn remove_reports_whether_key_existed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set(keys::USER_NAME, "Kim").await.expect("set");

    assert!(storage.remove(keys::USER_NAME).await.expect("remove"));
    assert!(!storage.remove(keys::USER_NAME).await.expect("remove again"));
    assert_eq!(storage.get(keys::USER_NAME).await.expect("get"), None);
}

#[tokio::test]
async fn set_many_is_all_or_nothing() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    sqlx::query(
        "CREATE TRIGGER reject_user_id BEFORE INSERT ON client_state \
         WHEN NEW.key = 'user_id' BEGIN SELECT RAISE(ABORT, 'user_id is read-only'); END",
    )
    .execute(storage.pool())
    .await
    .expect("trigger");

    let err = storage
        .set_many(&[(keys::TOKEN, "tok"), (keys::USER_ID, "7")])
        .await
        .expect_err("rejected");
    assert!(err.to_string().contains("user_id"));
    assert_eq!(storage.get(keys::TOKEN).await.expect("get"), None);

    storage
        .set_many(&[(keys::TOKEN, "tok"), (keys::USER_NAME, "Kim")])
        .await
        .expect("set many");
    assert_eq!(storage.entries().await.expect("entries").len(), 2);
}

#[tokio::test]
async fn entries_are_sorted_and_clear_empties_table() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set(keys::USER_ID, "1700000000000").await.expect("set");
    storage.set(keys::TOKEN, "tok").await.expect("set");

    let keys: Vec<String> = storage
        .entries()
        .await
        .expect("entries")
        .into_iter()
        .map(|entry| entry.key)
        .collect();
    assert_eq!(keys, vec!["token".to_string(), "user_id".to_string()]);

    assert_eq!(storage.clear().await.expect("clear"), 2);
    assert!(storage.entries().await.expect("entries").is_empty());
}

#[test]
fn memory_urls_have_no_file_path() {
    assert_eq!(sqlite_path("sqlite::memory:"), None);
    assert_eq!(
        sqlite_path("sqlite://./data/tutor.db?mode=rwc"),
        Some(PathBuf::from("./data/tutor.db"))
    );
}
