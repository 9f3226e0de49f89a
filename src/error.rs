use thiserror::Error;

/// Faults that reach the caller. Per-outline numeric trouble never lands here;
/// the selector excludes those outlines instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration value for {key}: {reason}")]
    Config { key: String, reason: String },

    #[error("mask must be a single-channel 0/255 image: {0}")]
    InvalidMask(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Raised by the OpenCV-backed stages.
    #[error("opencv: {0}")]
    OpenCv(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(key: &str, reason: impl Into<String>) -> Self {
        Error::Config {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
