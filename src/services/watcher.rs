//! Folder watcher: turns scanned PDFs dropped into a remote folder into
//! stamped, shareable documents.
//!
//! Each run lists the watched folder, consults the processing ledger and
//! pushes every new or changed PDF through the pipeline:
//!
//!   download -> mint dynamic QR -> stamp first page -> upload to
//!   finalized/ -> create shared link -> point the QR at it -> record in
//!   the ledger.
//!
//! The ledger is keyed by remote path and stores the remote content hash,
//! so an unchanged file is skipped on every later run and a re-uploaded
//! (changed) file is processed again with a fresh code.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::errors::{QrGenError, Result};
use crate::services::dropbox::{RemoteFile, RemoteStorage};
use crate::services::pdf::stamp_pdf;
use crate::services::qr_service::{QrPatch, QrService};
use crate::storage::{ProcessedFile, ProcessingStatus, SeaOrmStorage};

/// Subfolder (inside the watched folder) that receives stamped output.
const FINALIZED_SUBFOLDER: &str = "finalized";
/// Destination recorded on a freshly minted code until the shared link of
/// the finalized file exists.
const PENDING_DESTINATION: &str = "pending-upload";

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: String,
    pub filename: String,
    pub qrcode_id: Option<i64>,
    /// Direct link to the finalized copy; None when link creation failed
    /// (non-fatal) or the file errored out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Result of one watch run, bucketed per file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchReport {
    pub processed: Vec<FileOutcome>,
    pub skipped: Vec<FileOutcome>,
    pub errors: Vec<FileOutcome>,
}

impl WatchReport {
    pub fn scanned(&self) -> usize {
        self.processed.len() + self.skipped.len() + self.errors.len()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} scanned, {} processed, {} skipped, {} failed",
            self.scanned(),
            self.processed.len(),
            self.skipped.len(),
            self.errors.len()
        )
    }
}

pub struct WatcherService {
    storage: SeaOrmStorage,
    remote: Arc<dyn RemoteStorage>,
    qr: QrService,
    folder_path: String,
    /// Second stamp placed next to the redirect code; empty disables it.
    verification_url: String,
}

impl WatcherService {
    pub fn new(
        storage: SeaOrmStorage,
        remote: Arc<dyn RemoteStorage>,
        qr: QrService,
        folder_path: &str,
        verification_url: &str,
    ) -> Self {
        WatcherService {
            storage,
            remote,
            qr,
            folder_path: folder_path.trim_end_matches('/').to_string(),
            verification_url: verification_url.to_string(),
        }
    }

    pub fn folder_path(&self) -> &str {
        &self.folder_path
    }

    /// Scan the watched folder and process everything new or changed.
    pub async fn run_scan(&self) -> Result<WatchReport> {
        let files = self.remote.list_folder(&self.folder_path).await?;
        let mut report = WatchReport::default();

        for file in files.iter().filter(|f| is_input_pdf(f)) {
            match self.should_skip(file).await? {
                true => report.skipped.push(FileOutcome {
                    path: file.path.clone(),
                    filename: file.name.clone(),
                    qrcode_id: None,
                    download_url: None,
                    message: None,
                }),
                false => self.process_and_record(file, &mut report).await,
            }
        }

        info!("Watch run finished: {}", report.summary());
        Ok(report)
    }

    /// Process one file by name, bypassing the ledger gate.
    pub async fn process_by_name(&self, filename: &str) -> Result<FileOutcome> {
        let filename = if is_pdf(filename) {
            filename.to_string()
        } else {
            format!("{}.pdf", filename)
        };

        let file = self
            .remote
            .find_by_name(&self.folder_path, &filename)
            .await?
            .ok_or_else(|| {
                QrGenError::not_found(format!(
                    "No file named '{}' under {}",
                    filename, self.folder_path
                ))
            })?;

        match self.process_file(&file).await {
            Ok((qrcode_id, download_url)) => Ok(FileOutcome {
                path: file.path.clone(),
                filename: file.name.clone(),
                qrcode_id: Some(qrcode_id),
                download_url,
                message: None,
            }),
            Err(e) => {
                self.record_failure(&file, &e).await;
                Err(e)
            }
        }
    }

    /// A file is skipped when the ledger already records a successful run
    /// for the same remote path and content hash.
    async fn should_skip(&self, file: &RemoteFile) -> Result<bool> {
        let Some(entry) = self.storage.get_processed_file(&file.path).await? else {
            return Ok(false);
        };
        Ok(entry.status == ProcessingStatus::Success && entry.content_hash == file.content_hash)
    }

    async fn process_and_record(&self, file: &RemoteFile, report: &mut WatchReport) {
        match self.process_file(file).await {
            Ok((qrcode_id, download_url)) => report.processed.push(FileOutcome {
                path: file.path.clone(),
                filename: file.name.clone(),
                qrcode_id: Some(qrcode_id),
                download_url,
                message: None,
            }),
            Err(e) => {
                error!("Processing {} failed: {}", file.path, e);
                report.errors.push(FileOutcome {
                    path: file.path.clone(),
                    filename: file.name.clone(),
                    qrcode_id: None,
                    download_url: None,
                    message: Some(e.format_simple()),
                });
                self.record_failure(file, &e).await;
            }
        }
    }

    /// The pipeline for one PDF. Returns the id of the code stamped onto it.
    ///
    /// A changed file always gets a fresh code: the old stamped copy may
    /// still be in circulation, and reusing its slug would silently repoint
    /// printed documents.
    async fn process_file(&self, file: &RemoteFile) -> Result<(i64, Option<String>)> {
        info!("Processing {}", file.path);

        let bytes = self.remote.download(&file.path).await?;

        let qr = self
            .qr
            .create(
                file_stem(&file.name),
                PENDING_DESTINATION,
                true,
                Default::default(),
            )
            .await?;

        let workdir = tempfile::tempdir()
            .map_err(|e| QrGenError::file_operation(format!("Temp dir creation failed: {}", e)))?;
        let input = workdir.path().join("input.pdf");
        let output = workdir.path().join("stamped.pdf");
        tokio::fs::write(&input, &bytes).await?;

        let redirect = self.qr.redirect_url(&qr.slug);
        let mut stamps = vec![redirect.as_str()];
        if !self.verification_url.is_empty() {
            stamps.push(self.verification_url.as_str());
        }
        stamp_pdf(&input, &output, &stamps)?;
        let stamped = tokio::fs::read(&output).await?;

        let final_path = format!(
            "{}/{}/{}",
            parent_folder(&file.path),
            FINALIZED_SUBFOLDER,
            file.name
        );
        self.remote.upload(&final_path, stamped).await?;

        // Link creation can fail on permissions; the stamped file is already
        // in place, so that is reported, not fatal.
        let download_url = match self.remote.shared_link(&final_path).await {
            Ok(link) => {
                self.qr
                    .update(
                        qr.id,
                        QrPatch {
                            content: Some(link.clone()),
                            ..QrPatch::default()
                        },
                    )
                    .await?;
                Some(link)
            }
            Err(e) => {
                warn!("No shared link for {}: {}", final_path, e);
                None
            }
        };

        self.storage
            .upsert_processed_file(&ProcessedFile {
                dropbox_path: file.path.clone(),
                filename: file.name.clone(),
                content_hash: file.content_hash.clone(),
                qrcode_id: Some(qr.id),
                status: ProcessingStatus::Success,
                error_message: None,
                updated_at: Utc::now(),
            })
            .await?;

        info!("Finalized {} -> {} (QR {})", file.path, final_path, qr.id);
        Ok((qr.id, download_url))
    }

    /// Record a failed run so operators can see it; never let ledger
    /// bookkeeping mask the original error.
    async fn record_failure(&self, file: &RemoteFile, cause: &QrGenError) {
        let entry = ProcessedFile {
            dropbox_path: file.path.clone(),
            filename: file.name.clone(),
            content_hash: file.content_hash.clone(),
            qrcode_id: None,
            status: ProcessingStatus::Error,
            error_message: Some(cause.format_simple()),
            updated_at: Utc::now(),
        };
        if let Err(e) = self.storage.upsert_processed_file(&entry).await {
            warn!("Could not record failure for {}: {}", file.path, e);
        }
    }
}

fn is_pdf(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Input filter: PDFs only, and never anything already under a
/// `finalized` segment (those are this pipeline's outputs).
fn is_input_pdf(file: &RemoteFile) -> bool {
    is_pdf(&file.name)
        && !file
            .path
            .split('/')
            .any(|seg| seg.eq_ignore_ascii_case(FINALIZED_SUBFOLDER))
}

fn parent_folder(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    }
}

fn file_stem(name: &str) -> &str {
    name.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(name)
}
