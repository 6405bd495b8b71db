//! Error types for concealment sessions

use thiserror::Error;

use sucisim_crypto::ecies::EciesError;
use sucisim_crypto::hybrid::HybridError;
use sucisim_crypto::kdf::KdfError;
use sucisim_crypto::kem::KemError;

use crate::pipeline::PipelineStage;

/// Error types for the session layer.
///
/// All failures are deterministic given their inputs and are never retried
/// internally; a failed pipeline stage leaves the session state unchanged.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A pipeline stage was invoked before its predecessor completed.
    #[error("{operation} requires stage {required}, session is at {current}")]
    PreconditionNotMet {
        /// The operation that was refused
        operation: &'static str,
        /// The stage the session must have reached first
        required: PipelineStage,
        /// The stage the session is actually at
        current: PipelineStage,
    },

    /// Network-side authentication of the scheme output failed.
    #[error("MAC verification failed")]
    MacVerificationFailed,

    /// Key derivation was attempted over an empty shared secret.
    #[error("Shared secret is empty")]
    EmptySharedSecret,

    /// The SUPI cannot be split into routing components.
    #[error("Unsupported SUPI: {0}")]
    InvalidSupi(String),

    /// A SUCI string or scheme output could not be parsed.
    #[error("SUCI codec error: {0}")]
    Codec(String),

    /// An underlying cryptographic primitive failed.
    ///
    /// Propagated as-is; the session never substitutes simulated material
    /// for a failed primitive.
    #[error("Crypto primitive failed: {0}")]
    PrimitiveUnavailable(String),
}

impl From<EciesError> for SessionError {
    fn from(e: EciesError) -> Self {
        match e {
            EciesError::MacVerificationFailed => SessionError::MacVerificationFailed,
            EciesError::KeyDerivation(KdfError::EmptySharedSecret) => {
                SessionError::EmptySharedSecret
            }
            other => SessionError::PrimitiveUnavailable(other.to_string()),
        }
    }
}

impl From<KdfError> for SessionError {
    fn from(e: KdfError) -> Self {
        match e {
            KdfError::EmptySharedSecret => SessionError::EmptySharedSecret,
        }
    }
}

impl From<HybridError> for SessionError {
    fn from(e: HybridError) -> Self {
        SessionError::PrimitiveUnavailable(e.to_string())
    }
}

impl From<KemError> for SessionError {
    fn from(e: KemError) -> Self {
        SessionError::PrimitiveUnavailable(e.to_string())
    }
}
