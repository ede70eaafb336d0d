use std::path::PathBuf;

/// Convenience result type used across pixfx.
pub type PixfxResult<T> = Result<T, PixfxError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Codec variants (`NotFound`, `Decode`, `Create`, `Encode`) are terminal for one image only;
/// the pool logs them and keeps going.
#[derive(thiserror::Error, Debug)]
pub enum PixfxError {
    /// A manifest line or file could not be understood.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// The source image does not exist or could not be opened.
    #[error("source not found: {}: {source}", .path.display())]
    NotFound {
        /// Path that failed to open.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The source image exists but is not a decodable image.
    #[error("decode failed: {}: {message}", .path.display())]
    Decode {
        /// Path of the undecodable file.
        path: PathBuf,
        /// Codec message.
        message: String,
    },

    /// The output file (or its directory) could not be created.
    #[error("create failed: {}: {source}", .path.display())]
    Create {
        /// Output path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The flattened image could not be encoded.
    #[error("encode failed: {}: {message}", .path.display())]
    Encode {
        /// Output path.
        path: PathBuf,
        /// Codec message.
        message: String,
    },

    /// Invalid user-provided options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Worker pool or writer thread failure.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixfxError {
    /// Build a [`PixfxError::Manifest`] value.
    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    /// Build a [`PixfxError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixfxError::Pipeline`] value.
    pub fn pipeline(msg: impl Into<String>) -> Self {
        Self::Pipeline(msg.into())
    }

    /// Build a [`PixfxError::Decode`] value.
    pub fn decode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Build a [`PixfxError::Encode`] value.
    pub fn encode(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Encode {
            path: path.into(),
            message: msg.into(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
