//! Folder watcher pipeline tests with an in-memory remote store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::Mutex;

use qrgen::errors::{QrGenError, Result};
use qrgen::services::dropbox::{RemoteFile, RemoteStorage};
use qrgen::services::qr_service::QrService;
use qrgen::services::watcher::WatcherService;
use qrgen::storage::{ProcessingStatus, SeaOrmStorage};

const FOLDER: &str = "/scans";
const BASE_URL: &str = "https://qr.example.com";

/// Fake remote folder: listable files, downloadable bytes, captured uploads.
struct MockRemote {
    files: Mutex<Vec<RemoteFile>>,
    contents: Mutex<HashMap<String, Vec<u8>>>,
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    fail_downloads: Mutex<bool>,
}

impl MockRemote {
    fn new() -> Self {
        MockRemote {
            files: Mutex::new(Vec::new()),
            contents: Mutex::new(HashMap::new()),
            uploads: Mutex::new(HashMap::new()),
            fail_downloads: Mutex::new(false),
        }
    }

    async fn add_pdf(&self, name: &str, hash: &str, bytes: Vec<u8>) {
        let path = format!("{}/{}", FOLDER, name.to_lowercase());
        self.files.lock().await.push(RemoteFile {
            path: path.clone(),
            name: name.to_string(),
            content_hash: hash.to_string(),
        });
        self.contents.lock().await.insert(path, bytes);
    }

    async fn set_hash(&self, name: &str, hash: &str) {
        let mut files = self.files.lock().await;
        let file = files
            .iter_mut()
            .find(|f| f.name == name)
            .expect("file not seeded");
        file.content_hash = hash.to_string();
    }
}

#[async_trait]
impl RemoteStorage for MockRemote {
    async fn list_folder(&self, _folder: &str) -> Result<Vec<RemoteFile>> {
        Ok(self.files.lock().await.clone())
    }

    async fn find_by_name(&self, _folder: &str, name: &str) -> Result<Option<RemoteFile>> {
        Ok(self
            .files
            .lock()
            .await
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>> {
        if *self.fail_downloads.lock().await {
            return Err(QrGenError::remote_storage("download failed"));
        }
        self.contents
            .lock()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| QrGenError::remote_storage(format!("no such file: {}", path)))
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<()> {
        self.uploads.lock().await.insert(path.to_string(), data);
        Ok(())
    }

    async fn shared_link(&self, path: &str) -> Result<String> {
        Ok(format!("https://files.example.com{}?dl=1", path))
    }
}

/// One-page PDF, enough for the stamper to work on.
fn minimal_pdf() -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content = Content {
        operations: vec![Operation::new("BT", vec![]), Operation::new("ET", vec![])],
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

async fn setup() -> (WatcherService, Arc<MockRemote>, SeaOrmStorage, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("watcher.db").display()
    );
    let storage = SeaOrmStorage::new(&db_url, "sqlite")
        .await
        .expect("Failed to create storage");
    let qr = QrService::new(storage.clone(), BASE_URL, 7);
    let remote = Arc::new(MockRemote::new());
    let watcher = WatcherService::new(
        storage.clone(),
        Arc::clone(&remote) as Arc<dyn RemoteStorage>,
        qr,
        FOLDER,
        "https://verify.example.com/doc",
    );
    (watcher, remote, storage, dir)
}

#[tokio::test]
async fn processes_new_pdf_end_to_end() {
    let (watcher, remote, storage, _dir) = setup().await;
    remote.add_pdf("Invoice.pdf", "hash-1", minimal_pdf()).await;

    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.scanned(), 1);
    assert_eq!(report.processed.len(), 1);
    assert!(report.errors.is_empty());
    assert_eq!(
        report.processed[0].download_url.as_deref(),
        Some("https://files.example.com/scans/finalized/Invoice.pdf?dl=1")
    );

    // Stamped copy landed in finalized/ and is still a loadable PDF.
    let uploads = remote.uploads.lock().await;
    let stamped = uploads
        .get("/scans/finalized/Invoice.pdf")
        .expect("stamped file missing");
    assert!(lopdf::Document::load_mem(stamped).is_ok());

    // Ledger records the success with the minted code.
    let entry = storage
        .get_processed_file("/scans/invoice.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::Success);
    assert_eq!(entry.content_hash, "hash-1");
    let qrcode_id = entry.qrcode_id.unwrap();

    // The code now points at the shared link of the finalized copy.
    let qr = storage.get_qr(qrcode_id).await.unwrap().unwrap();
    assert!(qr.is_dynamic);
    assert_eq!(qr.title, "Invoice");
    assert_eq!(
        qr.content,
        "https://files.example.com/scans/finalized/Invoice.pdf?dl=1"
    );
}

#[tokio::test]
async fn rescan_skips_unchanged_files() {
    let (watcher, remote, _storage, _dir) = setup().await;
    remote.add_pdf("a.pdf", "hash-1", minimal_pdf()).await;

    watcher.run_scan().await.unwrap();
    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.scanned(), 1);
    assert!(report.processed.is_empty());
    assert_eq!(report.skipped.len(), 1);
}

#[tokio::test]
async fn changed_file_gets_a_fresh_code() {
    let (watcher, remote, storage, _dir) = setup().await;
    remote.add_pdf("a.pdf", "hash-1", minimal_pdf()).await;

    watcher.run_scan().await.unwrap();
    let first = storage
        .get_processed_file("/scans/a.pdf")
        .await
        .unwrap()
        .unwrap();

    remote.set_hash("a.pdf", "hash-2").await;
    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.processed.len(), 1);

    let second = storage
        .get_processed_file("/scans/a.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.content_hash, "hash-2");
    assert_ne!(second.qrcode_id, first.qrcode_id);

    // Both codes exist; the old printed copy keeps resolving.
    assert!(
        storage
            .get_qr(first.qrcode_id.unwrap())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn non_pdf_files_are_ignored() {
    let (watcher, remote, _storage, _dir) = setup().await;
    remote.add_pdf("notes.txt", "hash-1", b"not a pdf".to_vec()).await;

    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.scanned(), 0);
    assert!(report.processed.is_empty());
}

#[tokio::test]
async fn failed_download_is_recorded_in_ledger() {
    let (watcher, remote, storage, _dir) = setup().await;
    remote.add_pdf("a.pdf", "hash-1", minimal_pdf()).await;
    *remote.fail_downloads.lock().await = true;

    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(report.processed.is_empty());

    let entry = storage
        .get_processed_file("/scans/a.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::Error);
    assert!(entry.error_message.unwrap().contains("download failed"));

    // Once the remote recovers the same file is retried, not skipped.
    *remote.fail_downloads.lock().await = false;
    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.processed.len(), 1);
}

#[tokio::test]
async fn manual_process_bypasses_the_ledger_gate() {
    let (watcher, remote, _storage, _dir) = setup().await;
    remote.add_pdf("a.pdf", "hash-1", minimal_pdf()).await;

    watcher.run_scan().await.unwrap();
    // Unchanged file would be skipped by a scan, but manual processing runs.
    let outcome = watcher.process_by_name("a.pdf").await.unwrap();
    assert!(outcome.qrcode_id.is_some());
}

#[tokio::test]
async fn manual_process_appends_pdf_extension() {
    let (watcher, remote, _storage, _dir) = setup().await;
    remote.add_pdf("report.pdf", "hash-1", minimal_pdf()).await;

    let outcome = watcher.process_by_name("report").await.unwrap();
    assert_eq!(outcome.filename, "report.pdf");
}

#[tokio::test]
async fn finalized_outputs_are_not_rescanned() {
    let (watcher, remote, _storage, _dir) = setup().await;
    let path = "/scans/finalized/done.pdf".to_string();
    remote.files.lock().await.push(RemoteFile {
        path: path.clone(),
        name: "done.pdf".to_string(),
        content_hash: "hash-1".to_string(),
    });
    remote.contents.lock().await.insert(path, minimal_pdf());

    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.scanned(), 0);
}

#[tokio::test]
async fn manual_process_unknown_file_is_not_found() {
    let (watcher, _remote, _storage, _dir) = setup().await;
    let err = watcher.process_by_name("ghost.pdf").await.unwrap_err();
    assert!(matches!(err, QrGenError::NotFound(_)));
}

#[tokio::test]
async fn corrupt_pdf_is_an_error_not_a_crash() {
    let (watcher, remote, storage, _dir) = setup().await;
    remote
        .add_pdf("broken.pdf", "hash-1", b"%PDF-1.5 garbage".to_vec())
        .await;

    let report = watcher.run_scan().await.unwrap();
    assert_eq!(report.errors.len(), 1);

    let entry = storage
        .get_processed_file("/scans/broken.pdf")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.status, ProcessingStatus::Error);
}
