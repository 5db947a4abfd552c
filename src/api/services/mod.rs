pub mod auth;
pub mod automation;
pub mod qrcodes;
pub mod redirect;
