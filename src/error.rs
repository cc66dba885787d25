//! use certlife::error::CertLifeError;

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CertLifeError>;

/// The category a [`CertLifeError`] belongs to.
///
/// Callers that translate engine failures into their own responses only
/// need to look at this, not at the individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required input was missing or blank.
    Parameter,
    /// Key generation, name construction, extension attachment or signing failed.
    Generation,
    /// Building or parsing a bundle, or a binary re-encoding, failed.
    Conversion,
    /// A raw decode or parse failure surfaced while inspecting material.
    Analysis,
}

/// Represents errors that can occur in the certlife engine.
#[derive(Debug, Error, Clone)]
pub enum CertLifeError {
    /// A required field was missing or blank.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Certificate or key issuance failed. Wraps the message of the root cause.
    #[error("Certificate generation failed: {0}")]
    Generation(String),

    /// Bundle or binary conversion failed.
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// The key or signature algorithm is not one the engine handles.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A signing, verification or key operation failed.
    #[error("Cryptographic error: {0}")]
    Crypto(String),
}

impl CertLifeError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CertLifeError::InvalidParameter(_) => ErrorKind::Parameter,
            CertLifeError::Generation(_) => ErrorKind::Generation,
            CertLifeError::Conversion(_) => ErrorKind::Conversion,
            CertLifeError::EncodingError(_)
            | CertLifeError::DecodingError(_)
            | CertLifeError::UnsupportedAlgorithm(_)
            | CertLifeError::Crypto(_) => ErrorKind::Analysis,
        }
    }

    /// Folds any error into a single generation failure carrying its message.
    pub fn into_generation(self) -> Self {
        match self {
            err @ CertLifeError::Generation(_) => err,
            other => CertLifeError::Generation(other.to_string()),
        }
    }

    /// Folds any error except a parameter error into a conversion failure.
    pub fn into_conversion(self) -> Self {
        match self {
            err @ (CertLifeError::Conversion(_) | CertLifeError::InvalidParameter(_)) => err,
            other => CertLifeError::Conversion(other.to_string()),
        }
    }
}

impl From<der::Error> for CertLifeError {
    /// Converts a `der::Error` into a `CertLifeError`.
    fn from(err: der::Error) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<pem::PemError> for CertLifeError {
    fn from(err: pem::PemError) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<base64::DecodeError> for CertLifeError {
    fn from(err: base64::DecodeError) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for CertLifeError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::Error> for CertLifeError {
    fn from(err: pkcs8::Error) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CertLifeError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<rsa::Error> for CertLifeError {
    fn from(err: rsa::Error) -> Self {
        CertLifeError::Crypto(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for CertLifeError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        CertLifeError::DecodingError(err.to_string())
    }
}

impl From<ecdsa::Error> for CertLifeError {
    fn from(err: ecdsa::Error) -> Self {
        CertLifeError::Crypto(err.to_string())
    }
}

impl From<p256::elliptic_curve::Error> for CertLifeError {
    fn from(err: p256::elliptic_curve::Error) -> Self {
        CertLifeError::Crypto(err.to_string())
    }
}

impl From<toml::de::Error> for CertLifeError {
    fn from(err: toml::de::Error) -> Self {
        CertLifeError::InvalidParameter(err.to_string())
    }
}
