//! use minica::error::MiniCaError;

use thiserror::Error;

/// Represents errors that can occur while building, issuing or verifying
/// certificates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiniCaError {
    /// The requested not-before lies before the issuer's not-before.
    #[error("certificate cannot become valid before issuer")]
    NotValidBeforeIssuer,

    /// The requested not-after lies after the issuer's not-after.
    #[error("certificate cannot expire after issuer")]
    ExpiresAfterIssuer,

    /// The validity window cannot be represented or is inverted.
    #[error("Invalid validity period: {0}")]
    InvalidValidity(String),

    /// A CA-only operation was called on a certificate that is not a CA.
    #[error("Operation not permitted: {0}")]
    NotPermitted(String),

    /// Error during data encoding.
    #[error("Failed to encode data: {0}")]
    EncodingError(String),

    /// Error during data decoding.
    #[error("Failed to decode data: {0}")]
    DecodingError(String),

    /// Error due to invalid input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGenerationError(String),

    /// Error while producing or checking a signature.
    #[error("Signature error: {0}")]
    SignatureError(String),

    /// Error from RSA operations.
    #[error("RSA error: {0}")]
    RsaError(String),

    /// Error from RSA PKCS1 operations.
    #[error("RSA PKCS1 error: {0}")]
    RsaPkcs1Error(String),

    /// Error from PKCS8 or SEC1 private key handling.
    #[error("Private key error: {0}")]
    PrivateKeyError(String),

    /// Error from SubjectPublicKeyInfo handling.
    #[error("Public key error: {0}")]
    PublicKeyError(String),
}

pub type Result<T> = std::result::Result<T, MiniCaError>;

impl From<der::Error> for MiniCaError {
    /// Converts a `der::Error` into a `MiniCaError`.
    fn from(err: der::Error) -> Self {
        MiniCaError::EncodingError(err.to_string())
    }
}

impl From<rsa::Error> for MiniCaError {
    fn from(err: rsa::Error) -> Self {
        MiniCaError::RsaError(err.to_string())
    }
}

impl From<rsa::pkcs1::Error> for MiniCaError {
    fn from(err: rsa::pkcs1::Error) -> Self {
        MiniCaError::RsaPkcs1Error(err.to_string())
    }
}

impl From<pkcs8::Error> for MiniCaError {
    fn from(err: pkcs8::Error) -> Self {
        MiniCaError::PrivateKeyError(err.to_string())
    }
}

impl From<p256::elliptic_curve::Error> for MiniCaError {
    fn from(err: p256::elliptic_curve::Error) -> Self {
        MiniCaError::PrivateKeyError(err.to_string())
    }
}

impl From<x509_cert::spki::Error> for MiniCaError {
    fn from(err: x509_cert::spki::Error) -> Self {
        MiniCaError::PublicKeyError(err.to_string())
    }
}

impl From<rsa::signature::Error> for MiniCaError {
    fn from(err: rsa::signature::Error) -> Self {
        MiniCaError::SignatureError(err.to_string())
    }
}

impl From<pem::PemError> for MiniCaError {
    fn from(err: pem::PemError) -> Self {
        MiniCaError::DecodingError(err.to_string())
    }
}
