//! Text recognition boundary.

use thiserror::Error;

/// Recognition errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("No text detected in image")]
    NoText,

    #[error("Recognition service error: {0}")]
    Service(String),

    #[error("Recognition timed out: {0}")]
    Timeout(String),
}

/// OCR engine that turns image bytes into text (handwriting included).
///
/// Implementations may block and own their timeout policy.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, RecognitionError>;
}
