//! Core domain types for imgrelay.
//!
//! This crate holds the data model shared by the upload pipeline (items,
//! results, history entries), the unified `AppError` type, runtime
//! configuration, and link-format rendering.

pub mod config;
pub mod error;
pub mod links;
pub mod models;
pub mod util;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
