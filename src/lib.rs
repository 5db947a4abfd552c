//! QR code backend: static and dynamic codes, click analytics and a
//! Dropbox-driven PDF stamping pipeline.

pub mod api;
pub mod config;
pub mod errors;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
