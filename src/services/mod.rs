pub mod analytics_service;
pub mod dropbox;
pub mod pdf;
pub mod qr_render;
pub mod qr_service;
pub mod watcher;

pub use analytics_service::{AnalyticsService, TrendReport};
pub use dropbox::{DropboxClient, RemoteFile, RemoteStorage};
pub use qr_service::{AdminStats, QrPatch, QrService};
pub use watcher::{FileOutcome, WatchReport, WatcherService};
