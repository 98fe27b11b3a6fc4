//! Core Plié client library (config, credential storage, API gateway, wire models).

pub mod config;
pub mod credentials;
pub mod error;
pub mod events;
pub mod gateway;
pub mod login;

pub use error::{AppError, ErrorKind, StorageError};
