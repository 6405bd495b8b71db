//! ML-KEM-768 key encapsulation (FIPS 203)
//!
//! Post-quantum key establishment for the Profile C concealment scheme.
//! ML-KEM-768 (NIST security level 3) is the parameter set TS 33.501-style
//! hybrid profiles target; keys and ciphertexts are carried as serialized
//! bytes so callers never touch the generic KEM types.

use ml_kem::kem::{Decapsulate, Encapsulate};
use ml_kem::{EncodedSizeUser, KemCore, MlKem768};
use rand::rngs::OsRng;
use thiserror::Error;

/// ML-KEM-768 encapsulation key size in bytes
pub const ENCAPSULATION_KEY_SIZE: usize = 1184;

/// ML-KEM-768 decapsulation key size in bytes
pub const DECAPSULATION_KEY_SIZE: usize = 2400;

/// ML-KEM-768 ciphertext size in bytes
pub const CIPHERTEXT_SIZE: usize = 1088;

/// ML-KEM shared secret size in bytes
pub const SHARED_SECRET_SIZE: usize = 32;

/// ML-KEM error types
#[derive(Debug, Error)]
pub enum KemError {
    /// Encapsulation failed
    #[error("Encapsulation failed: {0}")]
    EncapsulationFailed(String),
    /// Decapsulation failed
    #[error("Decapsulation failed: {0}")]
    DecapsulationFailed(String),
    /// Invalid key data
    #[error("Invalid key data: {0}")]
    InvalidKeyData(String),
    /// Invalid ciphertext
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),
}

/// Result type for ML-KEM operations
pub type KemResult<T> = Result<T, KemError>;

/// ML-KEM-768 key pair, stored as serialized bytes.
#[derive(Clone)]
pub struct MlKemKeyPair {
    encapsulation_key: Vec<u8>,
    decapsulation_key: Vec<u8>,
}

impl MlKemKeyPair {
    /// Generate a new ML-KEM-768 key pair.
    pub fn generate() -> Self {
        let (dk, ek) = MlKem768::generate(&mut OsRng);
        Self {
            encapsulation_key: ek.as_bytes().to_vec(),
            decapsulation_key: dk.as_bytes().to_vec(),
        }
    }

    /// The encapsulation (public) key bytes
    pub fn encapsulation_key(&self) -> &[u8] {
        &self.encapsulation_key
    }

    /// The decapsulation (secret) key bytes
    pub fn decapsulation_key(&self) -> &[u8] {
        &self.decapsulation_key
    }
}

/// Encapsulate a shared secret against an ML-KEM-768 public key.
///
/// Returns `(ciphertext, shared_secret)`. The ciphertext must reach the key
/// owner; the shared secret must not.
pub fn encapsulate(encapsulation_key: &[u8]) -> KemResult<(Vec<u8>, Vec<u8>)> {
    let ek_encoded = encapsulation_key.try_into().map_err(|_| {
        KemError::InvalidKeyData(format!(
            "Invalid encapsulation key length: expected {ENCAPSULATION_KEY_SIZE}, got {}",
            encapsulation_key.len()
        ))
    })?;
    let ek = <MlKem768 as KemCore>::EncapsulationKey::from_bytes(ek_encoded);

    let (ct, ss) = ek
        .encapsulate(&mut OsRng)
        .map_err(|e| KemError::EncapsulationFailed(format!("{e:?}")))?;

    let ct_bytes: &[u8] = ct.as_ref();
    let ss_bytes: &[u8] = ss.as_ref();
    Ok((ct_bytes.to_vec(), ss_bytes.to_vec()))
}

/// Decapsulate a shared secret with an ML-KEM-768 secret key.
///
/// ML-KEM performs implicit rejection: a mismatched ciphertext yields a
/// wrong-but-valid shared secret rather than an error, and the mismatch
/// surfaces later as a failed MAC check.
pub fn decapsulate(decapsulation_key: &[u8], ciphertext: &[u8]) -> KemResult<Vec<u8>> {
    let dk_encoded = decapsulation_key.try_into().map_err(|_| {
        KemError::InvalidKeyData(format!(
            "Invalid decapsulation key length: expected {DECAPSULATION_KEY_SIZE}, got {}",
            decapsulation_key.len()
        ))
    })?;
    let dk = <MlKem768 as KemCore>::DecapsulationKey::from_bytes(dk_encoded);

    let ct_encoded = ciphertext.try_into().map_err(|_| {
        KemError::InvalidCiphertext(format!(
            "Invalid ciphertext length: expected {CIPHERTEXT_SIZE}, got {}",
            ciphertext.len()
        ))
    })?;

    let ss = dk
        .decapsulate(ct_encoded)
        .map_err(|e| KemError::DecapsulationFailed(format!("{e:?}")))?;

    let ss_bytes: &[u8] = ss.as_ref();
    Ok(ss_bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keypair_sizes() {
        let kp = MlKemKeyPair::generate();
        assert_eq!(kp.encapsulation_key().len(), ENCAPSULATION_KEY_SIZE);
        assert_eq!(kp.decapsulation_key().len(), DECAPSULATION_KEY_SIZE);
    }

    #[test]
    fn test_encapsulate_decapsulate_roundtrip() {
        let kp = MlKemKeyPair::generate();
        let (ct, ss_enc) = encapsulate(kp.encapsulation_key()).unwrap();
        assert_eq!(ct.len(), CIPHERTEXT_SIZE);
        assert_eq!(ss_enc.len(), SHARED_SECRET_SIZE);

        let ss_dec = decapsulate(kp.decapsulation_key(), &ct).unwrap();
        assert_eq!(ss_enc, ss_dec);
    }

    #[test]
    fn test_wrong_key_yields_different_secret() {
        let kp1 = MlKemKeyPair::generate();
        let kp2 = MlKemKeyPair::generate();

        let (ct, ss_enc) = encapsulate(kp1.encapsulation_key()).unwrap();
        // Implicit rejection: no error, but a different secret
        let ss_wrong = decapsulate(kp2.decapsulation_key(), &ct).unwrap();
        assert_ne!(ss_enc, ss_wrong);
    }

    #[test]
    fn test_invalid_encapsulation_key_length() {
        assert!(matches!(
            encapsulate(&[0u8; 10]),
            Err(KemError::InvalidKeyData(_))
        ));
    }

    #[test]
    fn test_invalid_ciphertext_length() {
        let kp = MlKemKeyPair::generate();
        assert!(matches!(
            decapsulate(kp.decapsulation_key(), &[0u8; 10]),
            Err(KemError::InvalidCiphertext(_))
        ));
    }
}
