use thiserror::Error;

/// Errors surfaced by the extraction engine.
///
/// Missing metadata is never an error: readers report it as `Ok(None)` and the
/// projector simply produces smaller output. Only the variants below reach the
/// caller.
#[derive(Error, Debug)]
pub enum MetaError {
    /// A mandatory decoding capability is missing from the runtime.
    #[error("Capability error: {0}")]
    Capability(String),

    /// The field/label configuration cannot be used.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A GPS rational token could not be converted.
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MetaError>;
