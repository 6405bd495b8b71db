//! Cryptographic engines for sucisim
//!
//! Implements the algorithm set behind 5G subscriber authentication and
//! identity privacy:
//! - Milenage (f1-f5, OPc derivation)
//! - ANSI X9.63 KDF and 3GPP TS 33.220 key derivation
//! - ECIES-style SUPI concealment (X25519 and P-256)
//! - ML-KEM-768 and hybrid X25519+ML-KEM key establishment
//!
//! All engines are pure functions over explicit inputs; session state lives
//! in `sucisim-session`.

pub mod aes;
pub mod ecies;
pub mod hybrid;
pub mod kdf;
pub mod kem;
pub mod milenage;
