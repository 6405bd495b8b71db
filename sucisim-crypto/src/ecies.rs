//! ECIES-style SUPI concealment primitives (3GPP TS 33.501 Annex C)
//!
//! Key agreement for the two elliptic-curve protection profiles:
//! - Profile A: X25519 (Curve25519)
//! - Profile B: NIST P-256, compressed SEC1 points
//!
//! plus the symmetric protection layer shared by every profile:
//! AES-128-CTR encryption with an all-zero initial counter block and an
//! HMAC-SHA256 tag truncated to 8 bytes, keys derived from the shared
//! secret via the X9.63 KDF.
//!
//! The zero counter is safe only because every concealment uses a fresh
//! ephemeral key and therefore a fresh shared secret; the session layer
//! enforces that a shared secret is never reused across two encryptions.

use aes::cipher::{KeyIvInit, StreamCipher};
use hmac::{Hmac, Mac};
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::{EncodedPoint, PublicKey as P256PublicKey, SecretKey as P256SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::kdf::{derive_session_keys, KdfError, SessionKeys};

/// X25519 key and shared secret size in bytes
pub const X25519_KEY_SIZE: usize = 32;

/// P-256 scalar (private key) size in bytes
pub const P256_SCALAR_SIZE: usize = 32;

/// P-256 public key size in compressed SEC1 encoding
pub const P256_POINT_SIZE: usize = 33;

/// ECDH shared secret size in bytes (both curves)
pub const SHARED_SECRET_SIZE: usize = 32;

/// MAC tag size in bytes (truncated HMAC-SHA256)
pub const MAC_TAG_SIZE: usize = 8;

/// AES-128-CTR keystream over a zero initial counter block
type Aes128Ctr = ctr::Ctr128BE<aes::Aes128>;

/// ECIES error types
#[derive(Debug, Error)]
pub enum EciesError {
    /// Invalid public key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
    /// Invalid private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),
    /// Invalid ciphertext or tag framing
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),
    /// MAC verification failed
    #[error("MAC verification failed")]
    MacVerificationFailed,
    /// Key derivation error
    #[error("Key derivation error: {0}")]
    KeyDerivation(#[from] KdfError),
}

/// Result type for ECIES operations
pub type EciesResult<T> = Result<T, EciesError>;

/// X25519 key pair (Profile A).
#[derive(Clone)]
pub struct X25519KeyPair {
    secret: [u8; X25519_KEY_SIZE],
    public: [u8; X25519_KEY_SIZE],
}

impl X25519KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let mut seed = [0u8; X25519_KEY_SIZE];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Build a key pair from a fixed seed (deterministic; for tests and
    /// provisioned long-term keys)
    pub fn from_seed(seed: &[u8; X25519_KEY_SIZE]) -> Self {
        let secret = StaticSecret::from(*seed);
        let public = PublicKey::from(&secret);
        Self {
            secret: *seed,
            public: *public.as_bytes(),
        }
    }

    /// The public key bytes
    pub fn public_key(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.public
    }

    /// The private key bytes
    pub fn secret_key(&self) -> &[u8; X25519_KEY_SIZE] {
        &self.secret
    }
}

/// Compute an X25519 shared secret.
pub fn x25519_shared_secret(
    my_secret: &[u8; X25519_KEY_SIZE],
    their_public: &[u8; X25519_KEY_SIZE],
) -> [u8; SHARED_SECRET_SIZE] {
    let secret = StaticSecret::from(*my_secret);
    let public = PublicKey::from(*their_public);
    *secret.diffie_hellman(&public).as_bytes()
}

/// NIST P-256 key pair (Profile B).
///
/// Public keys travel in compressed SEC1 encoding (33 bytes).
#[derive(Clone)]
pub struct P256KeyPair {
    secret: [u8; P256_SCALAR_SIZE],
    public: [u8; P256_POINT_SIZE],
}

impl P256KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secret_key = P256SecretKey::random(&mut OsRng);
        Self::from_secret(&secret_key)
    }

    /// Build a key pair from raw private scalar bytes.
    ///
    /// Fails if the scalar is zero or not below the curve order.
    pub fn from_secret_bytes(secret: &[u8; P256_SCALAR_SIZE]) -> EciesResult<Self> {
        let secret_key = P256SecretKey::from_bytes(secret.into())
            .map_err(|_| EciesError::InvalidPrivateKey("scalar out of range".into()))?;
        Ok(Self::from_secret(&secret_key))
    }

    fn from_secret(secret_key: &P256SecretKey) -> Self {
        let mut secret = [0u8; P256_SCALAR_SIZE];
        secret.copy_from_slice(&secret_key.to_bytes());

        let encoded = secret_key.public_key().to_encoded_point(true);
        let mut public = [0u8; P256_POINT_SIZE];
        public.copy_from_slice(encoded.as_bytes());

        Self { secret, public }
    }

    /// The compressed public key bytes
    pub fn public_key(&self) -> &[u8; P256_POINT_SIZE] {
        &self.public
    }

    /// The private scalar bytes
    pub fn secret_key(&self) -> &[u8; P256_SCALAR_SIZE] {
        &self.secret
    }
}

/// Compute a P-256 ECDH shared secret (x-coordinate of the shared point).
pub fn p256_shared_secret(
    my_secret: &[u8; P256_SCALAR_SIZE],
    their_public: &[u8; P256_POINT_SIZE],
) -> EciesResult<[u8; SHARED_SECRET_SIZE]> {
    let encoded = EncodedPoint::from_bytes(their_public)
        .map_err(|e| EciesError::InvalidPublicKey(format!("{e}")))?;
    let public: P256PublicKey = Option::from(P256PublicKey::from_encoded_point(&encoded))
        .ok_or_else(|| EciesError::InvalidPublicKey("point not on curve".into()))?;
    let secret_key = P256SecretKey::from_bytes(my_secret.into())
        .map_err(|_| EciesError::InvalidPrivateKey("scalar out of range".into()))?;

    let shared = p256::ecdh::diffie_hellman(secret_key.to_nonzero_scalar(), public.as_affine());

    let mut out = [0u8; SHARED_SECRET_SIZE];
    out.copy_from_slice(shared.raw_secret_bytes());
    Ok(out)
}

/// Encrypt an identifier under a shared secret.
///
/// Derives K_enc/K_mac from `shared_secret`, encrypts `plaintext` with
/// AES-128-CTR over a zero initial counter block and returns the ciphertext
/// together with the truncated HMAC-SHA256 tag over the ciphertext.
pub fn conceal(
    shared_secret: &[u8],
    plaintext: &[u8],
) -> EciesResult<(Vec<u8>, [u8; MAC_TAG_SIZE])> {
    let keys = derive_session_keys(shared_secret)?;
    let ciphertext = ctr_transform(&keys, plaintext);
    let tag = compute_tag(&keys, &ciphertext);
    Ok((ciphertext, tag))
}

/// Recover an identifier from a shared secret, ciphertext and tag.
///
/// The tag is verified before anything is decrypted; on mismatch the result
/// is [`EciesError::MacVerificationFailed`] with no indication of which
/// byte differed.
pub fn deconceal(
    shared_secret: &[u8],
    ciphertext: &[u8],
    mac: &[u8],
) -> EciesResult<Vec<u8>> {
    if mac.len() != MAC_TAG_SIZE {
        return Err(EciesError::InvalidCiphertext(format!(
            "Invalid MAC tag length: expected {MAC_TAG_SIZE}, got {}",
            mac.len()
        )));
    }

    let keys = derive_session_keys(shared_secret)?;
    if !verify_tag(&keys, ciphertext, mac) {
        return Err(EciesError::MacVerificationFailed);
    }

    Ok(ctr_transform(&keys, ciphertext))
}

/// Apply the AES-128-CTR keystream over a zero initial counter block.
///
/// CTR mode is its own inverse; one transform serves encrypt and decrypt.
pub fn ctr_transform(keys: &SessionKeys, data: &[u8]) -> Vec<u8> {
    let iv = [0u8; 16];
    let mut buf = data.to_vec();
    let mut cipher = Aes128Ctr::new(&keys.k_enc.into(), &iv.into());
    cipher.apply_keystream(&mut buf);
    buf
}

/// Compute the truncated HMAC-SHA256 tag over a ciphertext.
pub fn compute_tag(keys: &SessionKeys, ciphertext: &[u8]) -> [u8; MAC_TAG_SIZE] {
    let mut mac = Hmac::<Sha256>::new_from_slice(&keys.k_mac)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any size"));
    mac.update(ciphertext);
    let full = mac.finalize().into_bytes();
    full[..MAC_TAG_SIZE].try_into().expect("HMAC output is 32 bytes")
}

/// Verify a truncated MAC tag against a ciphertext.
///
/// The comparison examines every byte regardless of mismatches and reports
/// only success or failure.
pub fn verify_tag(keys: &SessionKeys, ciphertext: &[u8], tag: &[u8]) -> bool {
    let expected = compute_tag(keys, ciphertext);
    if tag.len() != MAC_TAG_SIZE {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in expected.iter().zip(tag.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x25519_keypair_from_seed_deterministic() {
        let seed = [0x42u8; 32];
        let kp1 = X25519KeyPair::from_seed(&seed);
        let kp2 = X25519KeyPair::from_seed(&seed);
        assert_eq!(kp1.public_key(), kp2.public_key());
    }

    #[test]
    fn test_x25519_shared_secret_symmetry() {
        let alice = X25519KeyPair::from_seed(&[0x01u8; 32]);
        let bob = X25519KeyPair::from_seed(&[0x02u8; 32]);
        let z_ab = x25519_shared_secret(alice.secret_key(), bob.public_key());
        let z_ba = x25519_shared_secret(bob.secret_key(), alice.public_key());
        assert_eq!(z_ab, z_ba);
    }

    #[test]
    fn test_p256_keypair_compressed_point() {
        let kp = P256KeyPair::generate();
        // Compressed SEC1 points start with 0x02 or 0x03
        assert!(kp.public_key()[0] == 0x02 || kp.public_key()[0] == 0x03);
    }

    #[test]
    fn test_p256_shared_secret_symmetry() {
        let alice = P256KeyPair::generate();
        let bob = P256KeyPair::generate();
        let z_ab = p256_shared_secret(alice.secret_key(), bob.public_key()).unwrap();
        let z_ba = p256_shared_secret(bob.secret_key(), alice.public_key()).unwrap();
        assert_eq!(z_ab, z_ba);
    }

    #[test]
    fn test_p256_invalid_public_key() {
        let kp = P256KeyPair::generate();
        let bogus = [0u8; P256_POINT_SIZE];
        assert!(p256_shared_secret(kp.secret_key(), &bogus).is_err());
    }

    #[test]
    fn test_p256_from_secret_bytes_roundtrip() {
        let kp = P256KeyPair::generate();
        let rebuilt = P256KeyPair::from_secret_bytes(kp.secret_key()).unwrap();
        assert_eq!(rebuilt.public_key(), kp.public_key());
    }

    #[test]
    fn test_conceal_deconceal_roundtrip() {
        let z = [0x5au8; 32];
        let plaintext = [0x21, 0x43, 0x65, 0x87, 0xf9];
        let (ciphertext, tag) = conceal(&z, &plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(&ciphertext[..], &plaintext[..]);

        let recovered = deconceal(&z, &ciphertext, &tag).unwrap();
        assert_eq!(&recovered[..], &plaintext[..]);
    }

    #[test]
    fn test_deconceal_rejects_tampered_ciphertext() {
        let z = [0x5au8; 32];
        let (mut ciphertext, tag) = conceal(&z, b"subscriber").unwrap();
        ciphertext[0] ^= 0x01;
        let result = deconceal(&z, &ciphertext, &tag);
        assert!(matches!(result, Err(EciesError::MacVerificationFailed)));
    }

    #[test]
    fn test_deconceal_rejects_tampered_tag() {
        let z = [0x5au8; 32];
        let (ciphertext, mut tag) = conceal(&z, b"subscriber").unwrap();
        tag[MAC_TAG_SIZE - 1] ^= 0x80;
        let result = deconceal(&z, &ciphertext, &tag);
        assert!(matches!(result, Err(EciesError::MacVerificationFailed)));
    }

    #[test]
    fn test_deconceal_rejects_bad_tag_length() {
        let z = [0x5au8; 32];
        let (ciphertext, tag) = conceal(&z, b"subscriber").unwrap();
        let result = deconceal(&z, &ciphertext, &tag[..4]);
        assert!(matches!(result, Err(EciesError::InvalidCiphertext(_))));
    }

    #[test]
    fn test_conceal_empty_shared_secret() {
        let result = conceal(&[], b"subscriber");
        assert!(matches!(
            result,
            Err(EciesError::KeyDerivation(KdfError::EmptySharedSecret))
        ));
    }

    #[test]
    fn test_conceal_empty_plaintext() {
        let z = [0x11u8; 32];
        let (ciphertext, tag) = conceal(&z, &[]).unwrap();
        assert!(ciphertext.is_empty());
        let recovered = deconceal(&z, &ciphertext, &tag).unwrap();
        assert!(recovered.is_empty());
    }

    #[test]
    fn test_verify_tag() {
        let keys = derive_session_keys(&[0x33u8; 32]).unwrap();
        let ciphertext = b"ciphertext";
        let tag = compute_tag(&keys, ciphertext);
        assert!(verify_tag(&keys, ciphertext, &tag));

        let mut wrong = tag;
        wrong[0] ^= 0x01;
        assert!(!verify_tag(&keys, ciphertext, &wrong));
        assert!(!verify_tag(&keys, ciphertext, &tag[..4]));
    }
}
