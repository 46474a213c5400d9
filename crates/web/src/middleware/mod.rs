pub mod auth;
pub mod base_url;
