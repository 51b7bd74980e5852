//! File validation and client-side image processing.
//!
//! The validator gates files entering the upload queue; the processor
//! resizes and re-encodes images to bounded dimensions before transmission.
//! Processing is a best-effort size optimization: callers fall back to the
//! original bytes when it fails.

pub mod processor;
pub mod validator;

pub use processor::{ImageProcessor, ProcessError, ProcessedImage, ProcessingOptions, TargetFormat};
pub use validator::{FileValidator, ValidationError};
