pub mod backend;
pub mod models;

pub use backend::{QrCodeUpdate, SeaOrmStorage};
pub use models::{
    Click, ClickPage, ProcessedFile, ProcessingStatus, QrCode, QrCodeFilter, QrCodePage, QrSort,
};
