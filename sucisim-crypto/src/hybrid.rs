//! Hybrid classical/post-quantum key establishment
//!
//! Combines X25519 ECDH with ML-KEM-768 encapsulation for the hybrid mode
//! of Profile C. The combined shared secret is
//! `Z = SHA-256(Z_ecdh || Z_kem)`, secure as long as either primitive
//! remains unbroken.
//!
//! The combined ciphertext carried in the SUCI scheme output is the
//! ephemeral X25519 public key (32 bytes) followed by the ML-KEM-768
//! ciphertext (1088 bytes).

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::ecies::{x25519_shared_secret, X25519KeyPair, X25519_KEY_SIZE};
use crate::kem::{self, KemError, MlKemKeyPair};

/// Combined shared secret size in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// Combined ciphertext size: ephemeral X25519 public key || ML-KEM ciphertext
pub const COMBINED_CIPHERTEXT_SIZE: usize = X25519_KEY_SIZE + kem::CIPHERTEXT_SIZE;

/// Hybrid key establishment error types
#[derive(Debug, Error)]
pub enum HybridError {
    /// ML-KEM operation failed
    #[error("ML-KEM operation failed: {0}")]
    Kem(#[from] KemError),
    /// Invalid combined ciphertext framing
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),
}

/// Result type for hybrid operations
pub type HybridResult<T> = Result<T, HybridError>;

/// Hybrid key pair: an X25519 pair plus an ML-KEM-768 pair.
#[derive(Clone)]
pub struct HybridKeyPair {
    x25519: X25519KeyPair,
    kem: MlKemKeyPair,
}

impl HybridKeyPair {
    /// Generate a fresh hybrid key pair.
    pub fn generate() -> Self {
        Self {
            x25519: X25519KeyPair::generate(),
            kem: MlKemKeyPair::generate(),
        }
    }

    /// Build from existing component key pairs.
    pub fn from_parts(x25519: X25519KeyPair, kem: MlKemKeyPair) -> Self {
        Self { x25519, kem }
    }

    /// The X25519 half of the key pair
    pub fn x25519(&self) -> &X25519KeyPair {
        &self.x25519
    }

    /// The ML-KEM-768 half of the key pair
    pub fn kem(&self) -> &MlKemKeyPair {
        &self.kem
    }
}

/// Device-side hybrid encapsulation with a caller-supplied ephemeral
/// X25519 key pair.
///
/// Performs ML-KEM-768 encapsulation against `kem_ek` and X25519 ECDH
/// between `ephemeral` and `hn_x25519_pub`, then combines the secrets.
///
/// Returns `(combined_ciphertext, shared_secret)`.
pub fn encapsulate_with_keypair(
    ephemeral: &X25519KeyPair,
    hn_x25519_pub: &[u8; X25519_KEY_SIZE],
    kem_ek: &[u8],
) -> HybridResult<(Vec<u8>, [u8; SHARED_SECRET_SIZE])> {
    let z_ecdh = x25519_shared_secret(ephemeral.secret_key(), hn_x25519_pub);
    let (kem_ct, z_kem) = kem::encapsulate(kem_ek)?;

    let z = combine_secrets(&z_ecdh, &z_kem);

    let mut combined_ct = Vec::with_capacity(X25519_KEY_SIZE + kem_ct.len());
    combined_ct.extend_from_slice(ephemeral.public_key());
    combined_ct.extend_from_slice(&kem_ct);

    Ok((combined_ct, z))
}

/// Device-side hybrid encapsulation with a fresh ephemeral X25519 key pair.
pub fn encapsulate(
    hn_x25519_pub: &[u8; X25519_KEY_SIZE],
    kem_ek: &[u8],
) -> HybridResult<(Vec<u8>, [u8; SHARED_SECRET_SIZE])> {
    encapsulate_with_keypair(&X25519KeyPair::generate(), hn_x25519_pub, kem_ek)
}

/// Network-side hybrid decapsulation.
///
/// Splits the combined ciphertext, runs X25519 ECDH with the received
/// ephemeral public key and ML-KEM-768 decapsulation of the remainder, and
/// recombines the secrets.
pub fn decapsulate(
    hn_x25519_secret: &[u8; X25519_KEY_SIZE],
    kem_dk: &[u8],
    combined_ct: &[u8],
) -> HybridResult<[u8; SHARED_SECRET_SIZE]> {
    if combined_ct.len() <= X25519_KEY_SIZE {
        return Err(HybridError::InvalidCiphertext(format!(
            "Combined ciphertext too short: {} bytes",
            combined_ct.len()
        )));
    }

    let eph_public: [u8; X25519_KEY_SIZE] = combined_ct[..X25519_KEY_SIZE]
        .try_into()
        .expect("length checked above");
    let kem_ct = &combined_ct[X25519_KEY_SIZE..];

    let z_ecdh = x25519_shared_secret(hn_x25519_secret, &eph_public);
    let z_kem = kem::decapsulate(kem_dk, kem_ct)?;

    Ok(combine_secrets(&z_ecdh, &z_kem))
}

/// `Z = SHA-256(Z_ecdh || Z_kem)`
pub fn combine_secrets(z_ecdh: &[u8], z_kem: &[u8]) -> [u8; SHARED_SECRET_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(z_ecdh);
    hasher.update(z_kem);
    hasher.finalize().into()
}
