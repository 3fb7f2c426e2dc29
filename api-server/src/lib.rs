pub mod api;
pub mod auth;
pub mod bot;
pub mod static_files;
pub mod store;
