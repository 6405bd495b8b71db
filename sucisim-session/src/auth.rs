//! 5G-AKA authentication vector generation
//!
//! The network-side (UDM/HSM) half of authentication: subscriber
//! credentials, the Milenage run, AUTN assembly and KAUSF derivation per
//! 3GPP TS 33.501 Annex A.2.
//!
//! OPc is derived once per (K, OP) pair and held in an explicit
//! [`OpcCache`] owned by the caller; it lives as long as the caller keeps
//! it and can simply be dropped.

use std::collections::HashMap;

use rand::rngs::OsRng;
use rand::RngCore;
use tracing::debug;

use sucisim_common::config::{decode_fixed_hex, OpType, SubscriberConfig};
use sucisim_common::Error;
use sucisim_crypto::kdf::derive_kausf;
use sucisim_crypto::milenage::{
    compute_opc, AuthVector, Milenage, AK_SIZE, AMF_SIZE, KEY_SIZE, OP_SIZE, RAND_SIZE, SQN_SIZE,
};

/// Long-term subscriber credentials as provisioned in the UDM/HSM.
#[derive(Clone, Debug)]
pub struct SubscriberCredentials {
    /// 128-bit subscriber key K
    pub k: [u8; KEY_SIZE],
    /// Whether `op` is OP or a pre-derived OPc
    pub op_type: OpType,
    /// 128-bit OP or OPc
    pub op: [u8; OP_SIZE],
    /// Authentication management field
    pub amf: [u8; AMF_SIZE],
    /// Current sequence number
    pub sqn: [u8; SQN_SIZE],
}

impl SubscriberCredentials {
    /// Decode credentials from a subscriber configuration.
    ///
    /// Hex fields are length-checked; a malformed field surfaces as
    /// [`Error::InvalidKeyLength`] naming it.
    pub fn from_config(config: &SubscriberConfig) -> Result<Self, Error> {
        Ok(Self {
            k: decode_fixed_hex("K", &config.key)?,
            op_type: config.op_type,
            op: decode_fixed_hex("OP", &config.op)?,
            amf: decode_fixed_hex("AMF", &config.amf)?,
            sqn: decode_fixed_hex("SQN", &config.sqn)?,
        })
    }
}

/// Explicit OPc cache keyed by (K, OP).
///
/// Created on first use by its owner, retained for as long as the owner
/// lives. Each (K, OP) pair is run through AES exactly once.
#[derive(Default)]
pub struct OpcCache {
    entries: HashMap<([u8; KEY_SIZE], [u8; OP_SIZE]), [u8; OP_SIZE]>,
}

impl OpcCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// OPc for (K, OP), derived on first request and cached afterwards.
    pub fn opc(&mut self, k: &[u8; KEY_SIZE], op: &[u8; OP_SIZE]) -> [u8; OP_SIZE] {
        *self
            .entries
            .entry((*k, *op))
            .or_insert_with(|| compute_opc(k, op))
    }

    /// Number of cached (K, OP) pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing has been derived yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached derivations.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A complete 5G authentication vector.
pub struct AkaVector {
    /// The random challenge used
    pub rand: [u8; RAND_SIZE],
    /// Authentication token: (SQN XOR AK) || AMF || MAC-A
    pub autn: [u8; 16],
    /// The Milenage outputs (MAC-A, RES, CK, IK, AK)
    pub milenage: AuthVector,
    /// The 5G anchor key KAUSF
    pub kausf: [u8; 32],
}

/// Draw a fresh 128-bit random challenge.
pub fn generate_rand() -> [u8; RAND_SIZE] {
    let mut rand = [0u8; RAND_SIZE];
    OsRng.fill_bytes(&mut rand);
    rand
}

/// Assemble AUTN = (SQN XOR AK) || AMF || MAC-A.
pub fn assemble_autn(
    sqn: &[u8; SQN_SIZE],
    ak: &[u8; AK_SIZE],
    amf: &[u8; AMF_SIZE],
    mac_a: &[u8; 8],
) -> [u8; 16] {
    let mut autn = [0u8; 16];
    for i in 0..SQN_SIZE {
        autn[i] = sqn[i] ^ ak[i];
    }
    autn[6..8].copy_from_slice(amf);
    autn[8..16].copy_from_slice(mac_a);
    autn
}

/// Serving network name per TS 24.501 (e.g.
/// "5G:mnc260.mcc310.3gppnetwork.org"); MNC is zero-padded to 3 digits.
pub fn serving_network_name(mcc: &str, mnc: &str) -> String {
    format!("5G:mnc{mnc:0>3}.mcc{mcc:0>3}.3gppnetwork.org")
}

/// Run one 5G-AKA vector generation.
///
/// Resolves OPc (through the cache when `op_type` is OP), runs Milenage
/// over the supplied RAND, assembles AUTN and derives KAUSF. Deterministic
/// given (credentials, rand, sn_name).
pub fn generate_aka_vector(
    credentials: &SubscriberCredentials,
    opc_cache: &mut OpcCache,
    rand: [u8; RAND_SIZE],
    sn_name: &str,
) -> AkaVector {
    let opc = match credentials.op_type {
        OpType::Opc => credentials.op,
        OpType::Op => opc_cache.opc(&credentials.k, &credentials.op),
    };

    let milenage = Milenage::new(&credentials.k, &opc).compute(&rand, &credentials.sqn, &credentials.amf);
    let autn = assemble_autn(&credentials.sqn, &milenage.ak, &credentials.amf, &milenage.mac_a);

    let mut sqn_xor_ak = [0u8; SQN_SIZE];
    for i in 0..SQN_SIZE {
        sqn_xor_ak[i] = credentials.sqn[i] ^ milenage.ak[i];
    }
    let kausf = derive_kausf(&milenage.ck, &milenage.ik, sn_name.as_bytes(), &sqn_xor_ak);

    debug!(rand = %hex::encode(rand), "aka vector generated");
    AkaVector {
        rand,
        autn,
        milenage,
        kausf,
    }
}
