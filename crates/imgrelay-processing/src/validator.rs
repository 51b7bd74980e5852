use imgrelay_core::models::SourceFile;

/// Why a file was rejected at the queue gate.
///
/// Both variants are terminal for the offending file: neither is retriable
/// without changing the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File type {content_type} is not supported")]
    UnsupportedType { content_type: String },

    #[error("File size exceeds {max_mb}MB limit")]
    TooLarge { size: usize, max_mb: usize },
}

/// Pure predicate over a candidate file: declared MIME type must be in the
/// accepted set and byte size must not exceed the limit.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: usize,
    accepted_types: Vec<String>,
}

impl FileValidator {
    pub fn new(max_file_size: usize, accepted_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            accepted_types,
        }
    }

    pub fn validate(&self, file: &SourceFile) -> Result<(), ValidationError> {
        let declared = file.content_type.to_lowercase();
        if !self.accepted_types.iter().any(|t| t == &declared) {
            return Err(ValidationError::UnsupportedType {
                content_type: file.content_type.clone(),
            });
        }

        if file.size() > self.max_file_size {
            return Err(ValidationError::TooLarge {
                size: file.size(),
                max_mb: self.max_file_size / 1024 / 1024,
            });
        }

        Ok(())
    }
}
