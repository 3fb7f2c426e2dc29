pub mod auth;
pub mod composer;
pub mod context;
pub mod document;
pub mod error;
pub mod net;
pub mod user;
pub mod views;
