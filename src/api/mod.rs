pub mod auth;
pub mod helpers;
pub mod jwt;
pub mod routes;
pub mod services;
pub mod types;
