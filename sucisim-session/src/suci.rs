//! SUCI string codec
//!
//! Wire format (3GPP TS 23.003 §2.2B, simplified to this simulator's
//! scope):
//!
//! `suci-<type>-<mcc>-<mnc>-<routing>-<scheme>-<keyId>-<schemeOutput>`
//!
//! The scheme output is hex-encoded and opaque without the home-network
//! private key. Its layout per scheme:
//! - Profile A (scheme 1): ephemeral X25519 public key (32) || ciphertext || MAC (8)
//! - Profile B (scheme 2): ephemeral P-256 public key (33) || ciphertext || MAC (8)
//! - Profile C (scheme 3): KEM ciphertext (1120 hybrid / 1088 pure) ||
//!   ciphertext || MAC (8)

use std::fmt;
use std::str::FromStr;

use sucisim_common::config::ProtectionProfile;
use sucisim_crypto::ecies::MAC_TAG_SIZE;

use crate::error::SessionError;

/// Protection scheme identifier for ECIES Profile A
pub const SCHEME_ECIES_A: u8 = 1;

/// Protection scheme identifier for ECIES Profile B
pub const SCHEME_ECIES_B: u8 = 2;

/// Protection scheme identifier for the post-quantum profile
pub const SCHEME_PQC: u8 = 3;

/// SUPI type field value for IMSI-based identities
pub const SUPI_TYPE_IMSI: u8 = 0;

/// Returns the protection scheme identifier for a profile.
pub fn scheme_id(profile: ProtectionProfile) -> u8 {
    match profile {
        ProtectionProfile::A => SCHEME_ECIES_A,
        ProtectionProfile::B => SCHEME_ECIES_B,
        ProtectionProfile::C => SCHEME_PQC,
    }
}

/// A parsed Subscription Concealed Identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suci {
    /// SUPI type (0 = IMSI)
    pub supi_type: u8,
    /// Mobile Country Code digits
    pub mcc: String,
    /// Mobile Network Code digits
    pub mnc: String,
    /// Routing indicator digits
    pub routing_indicator: String,
    /// Protection scheme identifier
    pub scheme_id: u8,
    /// Home network public key identifier
    pub hn_key_id: u8,
    /// Scheme output: key material || ciphertext || MAC tag
    pub scheme_output: Vec<u8>,
}

impl fmt::Display for Suci {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "suci-{}-{}-{}-{}-{}-{}-{}",
            self.supi_type,
            self.mcc,
            self.mnc,
            self.routing_indicator,
            self.scheme_id,
            self.hn_key_id,
            hex::encode(&self.scheme_output)
        )
    }
}

impl FromStr for Suci {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('-').collect();
        if fields.len() != 8 {
            return Err(SessionError::Codec(format!(
                "expected 8 '-'-separated fields, got {}",
                fields.len()
            )));
        }
        if fields[0] != "suci" {
            return Err(SessionError::Codec(format!(
                "missing 'suci' prefix in {s:?}"
            )));
        }

        let supi_type = fields[1]
            .parse::<u8>()
            .map_err(|_| SessionError::Codec(format!("invalid SUPI type {:?}", fields[1])))?;
        let scheme_id = fields[5]
            .parse::<u8>()
            .map_err(|_| SessionError::Codec(format!("invalid scheme id {:?}", fields[5])))?;
        let hn_key_id = fields[6]
            .parse::<u8>()
            .map_err(|_| SessionError::Codec(format!("invalid key id {:?}", fields[6])))?;
        let scheme_output = hex::decode(fields[7])
            .map_err(|e| SessionError::Codec(format!("invalid scheme output hex: {e}")))?;

        Ok(Suci {
            supi_type,
            mcc: fields[2].to_string(),
            mnc: fields[3].to_string(),
            routing_indicator: fields[4].to_string(),
            scheme_id,
            hn_key_id,
            scheme_output,
        })
    }
}

/// Borrowed view of the three components of a scheme output.
#[derive(Debug, Clone, Copy)]
pub struct SchemeOutputParts<'a> {
    /// Ephemeral public key (A/B) or KEM ciphertext (C)
    pub key_material: &'a [u8],
    /// Encrypted MSIN
    pub ciphertext: &'a [u8],
    /// Truncated HMAC-SHA256 tag
    pub mac_tag: &'a [u8],
}

/// Concatenate key material, ciphertext and MAC tag into a scheme output.
pub fn assemble_scheme_output(
    key_material: &[u8],
    ciphertext: &[u8],
    mac_tag: &[u8; MAC_TAG_SIZE],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(key_material.len() + ciphertext.len() + MAC_TAG_SIZE);
    out.extend_from_slice(key_material);
    out.extend_from_slice(ciphertext);
    out.extend_from_slice(mac_tag);
    out
}

/// Split a scheme output at a known key-material width.
///
/// The MAC tag is the trailing 8 bytes; the ciphertext is whatever lies
/// between it and the key material.
pub fn split_scheme_output(
    data: &[u8],
    key_material_len: usize,
) -> Result<SchemeOutputParts<'_>, SessionError> {
    if data.len() < key_material_len + MAC_TAG_SIZE {
        return Err(SessionError::Codec(format!(
            "scheme output too short: {} bytes, need at least {}",
            data.len(),
            key_material_len + MAC_TAG_SIZE
        )));
    }
    let mac_start = data.len() - MAC_TAG_SIZE;
    Ok(SchemeOutputParts {
        key_material: &data[..key_material_len],
        ciphertext: &data[key_material_len..mac_start],
        mac_tag: &data[mac_start..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Suci {
        Suci {
            supi_type: SUPI_TYPE_IMSI,
            mcc: "310".to_string(),
            mnc: "260".to_string(),
            routing_indicator: "0".to_string(),
            scheme_id: SCHEME_ECIES_A,
            hn_key_id: 1,
            scheme_output: vec![0xab, 0xcd, 0xef],
        }
    }

    #[test]
    fn test_display_format() {
        assert_eq!(sample().to_string(), "suci-0-310-260-0-1-1-abcdef");
    }

    #[test]
    fn test_parse_roundtrip() {
        let suci = sample();
        let parsed: Suci = suci.to_string().parse().unwrap();
        assert_eq!(parsed, suci);
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        let result: Result<Suci, _> = "supi-0-310-260-0-1-1-abcdef".parse();
        assert!(matches!(result, Err(SessionError::Codec(_))));
    }

    #[test]
    fn test_parse_rejects_field_count() {
        let result: Result<Suci, _> = "suci-0-310-260-0-1-abcdef".parse();
        assert!(matches!(result, Err(SessionError::Codec(_))));
    }

    #[test]
    fn test_parse_rejects_bad_hex() {
        let result: Result<Suci, _> = "suci-0-310-260-0-1-1-xyz".parse();
        assert!(matches!(result, Err(SessionError::Codec(_))));
    }

    #[test]
    fn test_scheme_output_split() {
        let key_material = [0x01u8; 32];
        let ciphertext = [0x02u8; 5];
        let mac_tag = [0x03u8; MAC_TAG_SIZE];
        let output = assemble_scheme_output(&key_material, &ciphertext, &mac_tag);
        assert_eq!(output.len(), 32 + 5 + 8);

        let parts = split_scheme_output(&output, 32).unwrap();
        assert_eq!(parts.key_material, &key_material);
        assert_eq!(parts.ciphertext, &ciphertext);
        assert_eq!(parts.mac_tag, &mac_tag);
    }

    #[test]
    fn test_scheme_output_split_too_short() {
        let result = split_scheme_output(&[0u8; 16], 32);
        assert!(matches!(result, Err(SessionError::Codec(_))));
    }

    #[test]
    fn test_scheme_ids() {
        assert_eq!(scheme_id(ProtectionProfile::A), 1);
        assert_eq!(scheme_id(ProtectionProfile::B), 2);
        assert_eq!(scheme_id(ProtectionProfile::C), 3);
    }
}
