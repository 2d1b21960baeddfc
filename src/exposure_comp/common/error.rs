use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExpCompError {
    #[error("Valid region list is empty")]
    EmptyRegionList,

    #[error("Invalid composite dimensions: width={width}, height={height}, views={views}")]
    InvalidDimensions {
        width: usize,
        height: usize,
        views: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to acquire image patch: {0}")]
    AcquireFailed(String),

    #[error("Failed to commit image patch: {0}")]
    CommitFailed(String),

    #[error("Block gain refinement is not enabled for this compensator")]
    BlockGainsDisabled,

    #[error("Failed to decode TIFF image: {0}")]
    DecodeError(String),

    #[error("Failed to encode TIFF image: {0}")]
    EncodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExpCompError>;
