use thiserror::Error;

/// Error taxonomy of the kernel-reading core.
///
/// Lookup misses (unknown body, no covering segment, unknown pool variable)
/// are **not** errors: they are reported as `Option::None` by the relevant
/// accessors. Everything in this enum is either a malformed call site
/// (`InvalidArgument`), a kernel the core cannot interpret, or a propagated
/// I/O / parse failure.
#[derive(Error, Debug)]
pub enum SpiceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown reference frame id: {0}")]
    UnknownFrame(i32),

    #[error("Unknown kernel architecture for file: {0}")]
    UnknownArchitecture(String),

    #[error("Invalid SPK data type: {0}")]
    InvalidSpkDataType(i32),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Error during the nom parsing: {0}")]
    NomParsingError(String),
}

impl<E: std::fmt::Debug> From<nom::Err<E>> for SpiceError {
    fn from(err: nom::Err<E>) -> Self {
        SpiceError::NomParsingError(format!("{err:?}"))
    }
}

impl PartialEq for SpiceError {
    fn eq(&self, other: &Self) -> bool {
        use SpiceError::*;
        match (self, other) {
            (InvalidArgument(a), InvalidArgument(b)) => a == b,
            (UnknownFrame(a), UnknownFrame(b)) => a == b,
            (UnknownArchitecture(a), UnknownArchitecture(b)) => a == b,
            (InvalidSpkDataType(a), InvalidSpkDataType(b)) => a == b,
            (NomParsingError(a), NomParsingError(b)) => a == b,

            // I/O errors are not comparable: equality on the variant only.
            (IoError(_), IoError(_)) => true,

            _ => false,
        }
    }
}
