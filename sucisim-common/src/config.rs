//! Configuration structures for the sucisim simulator.
//!
//! Subscriber credentials and concealment settings are loaded from YAML.
//! Key material is carried as lowercase hex strings and decoded with strict
//! length checks at the point of use.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::Supi;

/// Operator key type for authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OpType {
    /// Operator key (OP) - needs to be converted to OPc
    Op,
    /// Operator key derived (OPc) - used directly
    #[default]
    Opc,
}

/// SUPI protection scheme profile per 3GPP TS 33.501 Annex C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProtectionProfile {
    /// ECIES Profile A: X25519 key agreement
    #[default]
    A,
    /// ECIES Profile B: NIST P-256 key agreement
    B,
    /// Post-quantum profile: ML-KEM-768, optionally hybrid with X25519
    C,
}

/// Key-establishment mode for the post-quantum profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PqcMode {
    /// X25519 ECDH combined with ML-KEM-768 encapsulation
    #[default]
    Hybrid,
    /// ML-KEM-768 encapsulation only
    Pure,
}

/// Subscriber credential configuration.
///
/// Mirrors what a USIM and the home-network UDM are provisioned with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberConfig {
    /// Subscription Permanent Identifier
    pub supi: Supi,
    /// 128-bit subscriber key K (hex)
    pub key: String,
    /// Whether `op` below is OP or OPc
    #[serde(default)]
    pub op_type: OpType,
    /// 128-bit operator key OP or OPc (hex)
    pub op: String,
    /// 16-bit authentication management field (hex)
    #[serde(default = "default_amf")]
    pub amf: String,
    /// 48-bit sequence number (hex); caller-managed, monotonic in real systems
    #[serde(default = "default_sqn")]
    pub sqn: String,
}

fn default_amf() -> String {
    "8000".to_string()
}

fn default_sqn() -> String {
    "010101010101".to_string()
}

/// SUPI concealment configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcealmentConfig {
    /// Protection scheme profile
    #[serde(default)]
    pub profile: ProtectionProfile,
    /// PQC mode, only meaningful for Profile C
    #[serde(default)]
    pub pqc_mode: PqcMode,
    /// Routing indicator digits for the SUCI
    #[serde(default = "default_routing_indicator")]
    pub routing_indicator: String,
    /// Home network public key identifier
    #[serde(default = "default_hn_key_id")]
    pub hn_key_id: u8,
}

fn default_routing_indicator() -> String {
    "0".to_string()
}

fn default_hn_key_id() -> u8 {
    1
}

impl Default for ConcealmentConfig {
    fn default() -> Self {
        Self {
            profile: ProtectionProfile::default(),
            pqc_mode: PqcMode::default(),
            routing_indicator: default_routing_indicator(),
            hn_key_id: default_hn_key_id(),
        }
    }
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Subscriber credentials
    pub subscriber: SubscriberConfig,
    /// Concealment settings
    #[serde(default)]
    pub concealment: ConcealmentConfig,
}

impl SimConfig {
    /// Loads a configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses a configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, Error> {
        Ok(serde_yaml::from_str(s)?)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            subscriber: SubscriberConfig {
                supi: Supi::imsi("310260123456789"),
                key: "33".repeat(16),
                op_type: OpType::Op,
                op: "55".repeat(16),
                amf: default_amf(),
                sqn: default_sqn(),
            },
            concealment: ConcealmentConfig::default(),
        }
    }
}

/// Decodes a hex string into a fixed-size byte array.
///
/// Fails with [`Error::InvalidKeyLength`] if the decoded length does not
/// match `N`, naming the offending field.
pub fn decode_fixed_hex<const N: usize>(field: &'static str, s: &str) -> Result<[u8; N], Error> {
    let bytes = hex::decode(s.trim())?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| Error::InvalidKeyLength {
        field,
        expected: N,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let cfg = SimConfig::default();
        assert_eq!(cfg.subscriber.supi.value, "310260123456789");
        assert_eq!(cfg.subscriber.amf, "8000");
        assert_eq!(cfg.concealment.profile, ProtectionProfile::A);
        assert_eq!(cfg.concealment.routing_indicator, "0");
        assert_eq!(cfg.concealment.hn_key_id, 1);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
subscriber:
  supi:
    supi_type: Imsi
    value: "460110123456789"
  key: "465b5ce8b199b49faa5f0a2ee238a6bc"
  op_type: Op
  op: "cdc202d5123e20f62b6d676ac72cb318"
concealment:
  profile: C
  pqc_mode: Pure
  routing_indicator: "1234"
"#;
        let cfg = SimConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(cfg.subscriber.supi.value, "460110123456789");
        assert_eq!(cfg.subscriber.op_type, OpType::Op);
        assert_eq!(cfg.subscriber.amf, "8000");
        assert_eq!(cfg.concealment.profile, ProtectionProfile::C);
        assert_eq!(cfg.concealment.pqc_mode, PqcMode::Pure);
        assert_eq!(cfg.concealment.routing_indicator, "1234");
    }

    #[test]
    fn test_decode_fixed_hex() {
        let k: [u8; 16] = decode_fixed_hex("K", "465b5ce8b199b49faa5f0a2ee238a6bc").unwrap();
        assert_eq!(k[0], 0x46);
        assert_eq!(k[15], 0xbc);
    }

    #[test]
    fn test_decode_fixed_hex_wrong_length() {
        let result: Result<[u8; 16], _> = decode_fixed_hex("K", "465b5c");
        match result {
            Err(Error::InvalidKeyLength {
                field,
                expected,
                actual,
            }) => {
                assert_eq!(field, "K");
                assert_eq!(expected, 16);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_decode_fixed_hex_bad_digit() {
        let result: Result<[u8; 16], _> = decode_fixed_hex("K", "zz".repeat(16).as_str());
        assert!(matches!(result, Err(Error::HexDecode(_))));
    }
}
