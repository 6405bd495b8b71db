//! Key derivation functions
//!
//! Two families live here:
//! - The ANSI X9.63 KDF over SHA-256 used by the SUPI concealment schemes
//!   to expand an ECDH/KEM shared secret into encryption and MAC keys.
//! - The 3GPP TS 33.220 KDF (HMAC-SHA256 over `FC || Pi || Li`) used for
//!   the 5G key hierarchy, of which this simulator derives KAUSF
//!   (TS 33.501 Annex A.2).

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// SHA-256 digest size in bytes
pub const SHA256_DIGEST_SIZE: usize = 32;

/// Size of the concealment encryption key K_enc (AES-128)
pub const K_ENC_SIZE: usize = 16;

/// Size of the concealment MAC key K_mac (HMAC-SHA256)
pub const K_MAC_SIZE: usize = 32;

/// Size of the KDF stream the session keys are sliced from
pub const SESSION_STREAM_SIZE: usize = 64;

/// Key size for 256-bit keys in the 5G key hierarchy
pub const KEY_256_SIZE: usize = 32;

/// Key size for 128-bit keys in the 5G key hierarchy
pub const KEY_128_SIZE: usize = 16;

/// KDF error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KdfError {
    /// The shared secret input was empty
    #[error("Shared secret is empty")]
    EmptySharedSecret,
}

/// ANSI X9.63 Key Derivation Function using SHA-256.
///
/// Concatenates `SHA256(Z || counter || shared_info)` blocks for
/// counter = 1, 2, ... until `key_size` bytes are available, then truncates
/// to the exact length.
pub fn x963_kdf(shared_secret: &[u8], shared_info: &[u8], key_size: usize) -> Vec<u8> {
    let blocks = key_size.div_ceil(SHA256_DIGEST_SIZE);
    let mut result = Vec::with_capacity(blocks * SHA256_DIGEST_SIZE);
    for counter in 1..=blocks as u32 {
        let mut hasher = Sha256::new();
        hasher.update(shared_secret);
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_info);
        result.extend_from_slice(&hasher.finalize());
    }
    result.truncate(key_size);
    result
}

/// Derives a key stream of `len` bytes from a shared secret.
///
/// This is the X9.63 KDF with empty `SharedInfo`. Any prefix of a longer
/// stream equals the shorter stream of that length.
pub fn derive_stream(shared_secret: &[u8], len: usize) -> Result<Vec<u8>, KdfError> {
    if shared_secret.is_empty() {
        return Err(KdfError::EmptySharedSecret);
    }
    Ok(x963_kdf(shared_secret, &[], len))
}

/// The pair of keys protecting one concealed identifier.
///
/// Derived fresh from Z for every concealment; never persisted beyond one
/// session.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionKeys {
    /// AES-128-CTR encryption key
    pub k_enc: [u8; K_ENC_SIZE],
    /// HMAC-SHA256 key
    pub k_mac: [u8; K_MAC_SIZE],
}

/// Derives K_enc and K_mac from a shared secret.
///
/// A 64-byte stream is derived; K_enc is bytes 0..16 and K_mac is bytes
/// 32..64.
pub fn derive_session_keys(shared_secret: &[u8]) -> Result<SessionKeys, KdfError> {
    let stream = derive_stream(shared_secret, SESSION_STREAM_SIZE)?;
    Ok(SessionKeys {
        k_enc: stream[..K_ENC_SIZE].try_into().expect("stream is 64 bytes"),
        k_mac: stream[SESSION_STREAM_SIZE - K_MAC_SIZE..]
            .try_into()
            .expect("stream is 64 bytes"),
    })
}

/// Compute HMAC-SHA256 over `input` with `key`.
pub fn hmac_sha256(key: &[u8], input: &[u8]) -> [u8; SHA256_DIGEST_SIZE] {
    // HMAC-SHA256 accepts keys of any size, so this never fails
    let mut mac = Hmac::<Sha256>::new_from_slice(key)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any size"));
    mac.update(input);
    let result = mac.finalize();
    let mut output = [0u8; SHA256_DIGEST_SIZE];
    output.copy_from_slice(&result.into_bytes());
    output
}

/// Calculate a KDF key using HMAC-SHA256 as specified in 3GPP TS 33.220.
///
/// The input string S is constructed as:
/// `S = FC || P0 || L0 || P1 || L1 || ... || Pn || Ln`
/// where FC is a single octet function code, Pi are the input parameters and
/// Li their lengths as 2 big-endian octets.
pub fn calculate_kdf_key(key: &[u8; KEY_256_SIZE], fc: u8, parameters: &[&[u8]]) -> [u8; KEY_256_SIZE] {
    let mut input = Vec::new();
    input.push(fc);

    for param in parameters {
        input.extend_from_slice(param);
        let len = param.len() as u16;
        input.extend_from_slice(&len.to_be_bytes());
    }

    hmac_sha256(key, &input)
}

/// FC value for KAUSF derivation (3GPP TS 33.501 Annex A.2)
pub const FC_KAUSF: u8 = 0x6A;

/// Derive KAUSF from CK and IK (3GPP TS 33.501 Annex A.2).
///
/// `KAUSF = KDF(CK || IK, FC, SN name, SQN XOR AK)`
pub fn derive_kausf(
    ck: &[u8; KEY_128_SIZE],
    ik: &[u8; KEY_128_SIZE],
    sn_name: &[u8],
    sqn_xor_ak: &[u8; 6],
) -> [u8; KEY_256_SIZE] {
    let mut key = [0u8; KEY_256_SIZE];
    key[..KEY_128_SIZE].copy_from_slice(ck);
    key[KEY_128_SIZE..].copy_from_slice(ik);

    calculate_kdf_key(&key, FC_KAUSF, &[sn_name, sqn_xor_ak])
}
