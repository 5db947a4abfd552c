//! Storage backend tests against temporary SQLite databases.

use std::collections::HashMap;

use chrono::Utc;
use tempfile::TempDir;

use qrgen::storage::backend::infer_backend_from_url;
use qrgen::storage::{
    ProcessedFile, ProcessingStatus, QrCodeFilter, QrCodeUpdate, QrSort, SeaOrmStorage,
};

async fn create_temp_storage() -> (SeaOrmStorage, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");

    (storage, temp_dir)
}

mod url_inference_tests {
    use super::*;

    #[test]
    fn infers_sqlite() {
        assert_eq!(infer_backend_from_url("sqlite://test.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url("data/app.db").unwrap(), "sqlite");
        assert_eq!(infer_backend_from_url(":memory:").unwrap(), "sqlite");
    }

    #[test]
    fn infers_mysql_and_postgres() {
        assert_eq!(
            infer_backend_from_url("mysql://root@localhost/qr").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgres://qr@localhost/qr").unwrap(),
            "postgres"
        );
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(infer_backend_from_url("redis://localhost").is_err());
    }

    #[tokio::test]
    async fn empty_backend_name_is_inferred_at_startup() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("infer.db").display());
        let storage = SeaOrmStorage::new(&db_url, "")
            .await
            .expect("Failed to create storage");
        assert_eq!(storage.get_backend_name(), "sqlite");
    }
}

mod qr_crud_tests {
    use super::*;

    #[tokio::test]
    async fn create_and_fetch_roundtrip() {
        let (storage, _dir) = create_temp_storage().await;

        let created = storage
            .create_qr("abc1234", "Test", "https://example.com", true, &HashMap::new())
            .await
            .unwrap();
        assert!(created.id > 0);
        assert_eq!(created.slug, "abc1234");
        assert!(created.is_dynamic);

        let by_id = storage.get_qr(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.content, "https://example.com");

        let by_slug = storage.get_qr_by_slug("abc1234").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);

        assert!(storage.slug_exists("abc1234").await.unwrap());
        assert!(!storage.slug_exists("missing").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_slug_is_rejected() {
        let (storage, _dir) = create_temp_storage().await;

        storage
            .create_qr("dup4321", "a", "https://a.example.com", false, &HashMap::new())
            .await
            .unwrap();
        let second = storage
            .create_qr("dup4321", "b", "https://b.example.com", false, &HashMap::new())
            .await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn update_changes_fields_and_bumps_timestamp() {
        let (storage, _dir) = create_temp_storage().await;

        let created = storage
            .create_qr("upd1234", "Old", "https://old.example.com", true, &HashMap::new())
            .await
            .unwrap();

        let updated = storage
            .update_qr(
                created.id,
                QrCodeUpdate {
                    title: Some("New".to_string()),
                    content: Some("https://new.example.com".to_string()),
                    is_dynamic: None,
                    options: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.content, "https://new.example.com");
        assert!(updated.updated_at >= created.updated_at);
        // Untouched fields survive.
        assert_eq!(updated.slug, "upd1234");
        assert!(updated.is_dynamic);
    }

    #[tokio::test]
    async fn update_missing_id_is_not_found() {
        let (storage, _dir) = create_temp_storage().await;
        let result = storage.update_qr(9999, QrCodeUpdate::default()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn delete_removes_code_and_its_clicks() {
        let (storage, _dir) = create_temp_storage().await;

        let created = storage
            .create_qr("del1234", "", "https://example.com", true, &HashMap::new())
            .await
            .unwrap();
        storage
            .insert_click(created.id, Some("hash".to_string()), None)
            .await
            .unwrap();
        assert_eq!(storage.count_clicks().await.unwrap(), 1);

        storage.delete_qr(created.id).await.unwrap();
        assert!(storage.get_qr(created.id).await.unwrap().is_none());
        assert_eq!(storage.count_clicks().await.unwrap(), 0);

        // Deleting again reports not found.
        assert!(storage.delete_qr(created.id).await.is_err());
    }

    #[tokio::test]
    async fn delete_all_reports_row_count() {
        let (storage, _dir) = create_temp_storage().await;
        for i in 0..3 {
            storage
                .create_qr(
                    &format!("bulk{:03}", i),
                    "",
                    "https://example.com",
                    false,
                    &HashMap::new(),
                )
                .await
                .unwrap();
        }
        assert_eq!(storage.delete_all_qr().await.unwrap(), 3);
        assert_eq!(storage.count_qr().await.unwrap(), 0);
    }
}

mod listing_tests {
    use super::*;

    async fn seed(storage: &SeaOrmStorage) {
        storage
            .create_qr("alpha01", "Invoices", "https://a.example.com", true, &HashMap::new())
            .await
            .unwrap();
        storage
            .create_qr("beta002", "Menu", "https://b.example.com", false, &HashMap::new())
            .await
            .unwrap();
        storage
            .create_qr("gamma03", "Poster menu", "wifi config text", false, &HashMap::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn filters_by_dynamic_flag() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;

        let page = storage
            .list_qr(&QrCodeFilter {
                dynamic: Some(true),
                page: 1,
                limit: 10,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].slug, "alpha01");
    }

    #[tokio::test]
    async fn search_matches_title_slug_and_content() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;

        let by_title = storage
            .list_qr(&QrCodeFilter {
                search: Some("menu".to_string()),
                page: 1,
                limit: 10,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_title.total, 2);

        let by_slug = storage
            .list_qr(&QrCodeFilter {
                search: Some("alpha".to_string()),
                page: 1,
                limit: 10,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(by_slug.total, 1);
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;

        let page = storage
            .list_qr(&QrCodeFilter {
                search: Some("MENU".to_string()),
                page: 1,
                limit: 10,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn paginates_and_sorts() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;

        let page = storage
            .list_qr(&QrCodeFilter {
                page: 2,
                limit: 2,
                sort: QrSort::TitleAsc,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pages(), 2);
        // Titles sorted ascending: Invoices, Menu, Poster menu.
        assert_eq!(page.items[0].title, "Poster menu");
    }

    #[tokio::test]
    async fn click_counts_are_aggregated() {
        let (storage, _dir) = create_temp_storage().await;
        seed(&storage).await;
        let qr = storage.get_qr_by_slug("alpha01").await.unwrap().unwrap();
        for _ in 0..4 {
            storage.insert_click(qr.id, None, None).await.unwrap();
        }

        let page = storage
            .list_qr(&QrCodeFilter {
                page: 1,
                limit: 10,
                ..QrCodeFilter::default()
            })
            .await
            .unwrap();
        let listed = page.items.iter().find(|i| i.id == qr.id).unwrap();
        assert_eq!(listed.click_count, 4);
    }
}

mod ledger_tests {
    use super::*;

    fn entry(path: &str, hash: &str, status: ProcessingStatus) -> ProcessedFile {
        ProcessedFile {
            dropbox_path: path.to_string(),
            filename: "scan.pdf".to_string(),
            content_hash: hash.to_string(),
            qrcode_id: None,
            status,
            error_message: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_overwrites() {
        let (storage, _dir) = create_temp_storage().await;

        storage
            .upsert_processed_file(&entry("/scans/a.pdf", "hash1", ProcessingStatus::Error))
            .await
            .unwrap();
        let first = storage
            .get_processed_file("/scans/a.pdf")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first.status, ProcessingStatus::Error);

        let mut second = entry("/scans/a.pdf", "hash2", ProcessingStatus::Success);
        second.qrcode_id = Some(42);
        storage.upsert_processed_file(&second).await.unwrap();

        let stored = storage
            .get_processed_file("/scans/a.pdf")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.content_hash, "hash2");
        assert_eq!(stored.status, ProcessingStatus::Success);
        assert_eq!(stored.qrcode_id, Some(42));

        // Still a single row.
        assert_eq!(storage.list_processed_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_path_is_none() {
        let (storage, _dir) = create_temp_storage().await;
        assert!(
            storage
                .get_processed_file("/nowhere.pdf")
                .await
                .unwrap()
                .is_none()
        );
    }
}
