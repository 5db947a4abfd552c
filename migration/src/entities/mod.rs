pub mod click;
pub mod processed_file;
pub mod qr_code;

pub use click::Entity as ClickEntity;
pub use processed_file::Entity as ProcessedFileEntity;
pub use qr_code::Entity as QrCodeEntity;
