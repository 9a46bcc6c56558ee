/// All errors that clipmatch can return.
///
/// Rendering itself never fails; these cover configuration, surface setup
/// and buffer I/O.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration document could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A surface was requested with a zero or oversized dimension.
    #[error("invalid surface size {width}x{height}")]
    InvalidSurface { width: u32, height: u32 },

    /// A geometry name did not match any known kind.
    #[error("unknown geometry kind: {0}")]
    UnknownGeometry(String),

    /// Keyframes were empty, unordered or had inconsistent arity.
    #[error("invalid keyframes: {0}")]
    InvalidKeyframes(String),

    /// Two pixel buffers being compared have different sizes.
    #[error("buffer size mismatch: {left_width}x{left_height} vs {right_width}x{right_height}")]
    BufferMismatch {
        left_width: u32,
        left_height: u32,
        right_width: u32,
        right_height: u32,
    },
}

/// Result alias for clipmatch operations.
pub type Result<T> = std::result::Result<T, Error>;
