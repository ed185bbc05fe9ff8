pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod format;
pub mod http;
pub mod service;
pub mod sheets;
pub mod store;
pub mod transpile;
