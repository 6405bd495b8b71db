//! SUPI routing split and MSIN byte coding
//!
//! The MCC/MNC split uses a fixed-width heuristic (3-digit MCC, 2- or
//! 3-digit MNC from a small known-operator table). It only produces the
//! simulated routing metadata of the SUCI; it carries no security weight.

use sucisim_common::types::{Supi, SupiType};

use crate::error::SessionError;

/// The routing components of an IMSI-based SUPI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupiParts {
    /// Mobile Country Code (3 digits)
    pub mcc: String,
    /// Mobile Network Code (2 or 3 digits)
    pub mnc: String,
    /// Mobile Subscriber Identification Number (the concealed portion)
    pub msin: String,
}

/// MCCs known to assign 3-digit MNCs; everything else splits as 2 digits.
fn mnc_digits(mcc: &str) -> usize {
    match mcc {
        "310" | "311" | "312" => 3,
        _ => 2,
    }
}

/// Split an IMSI-based SUPI into MCC, MNC and MSIN.
pub fn split_supi(supi: &Supi) -> Result<SupiParts, SessionError> {
    if supi.supi_type != SupiType::Imsi {
        return Err(SessionError::InvalidSupi(format!(
            "only IMSI-based SUPIs can be concealed, got {supi}"
        )));
    }
    let value = supi.value.as_str();
    if value.len() < 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SessionError::InvalidSupi(format!(
            "IMSI must be at least 6 decimal digits, got {value:?}"
        )));
    }

    let mcc = &value[..3];
    let mnc_len = mnc_digits(mcc);
    let mnc = &value[3..3 + mnc_len];
    let msin = &value[3 + mnc_len..];

    Ok(SupiParts {
        mcc: mcc.to_string(),
        mnc: mnc.to_string(),
        msin: msin.to_string(),
    })
}

/// BCD-encode a digit string: two digits per byte, nibble-swapped per
/// 3GPP TS 23.003, padded with 0xF for odd lengths.
pub fn bcd_encode(digits: &str) -> Result<Vec<u8>, SessionError> {
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SessionError::InvalidSupi(format!(
            "MSIN must be decimal digits, got {digits:?}"
        )));
    }

    let mut nibbles: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    if nibbles.len() % 2 != 0 {
        nibbles.push(0x0f);
    }

    Ok(nibbles
        .chunks(2)
        .map(|pair| (pair[1] << 4) | pair[0])
        .collect())
}

/// Decode nibble-swapped BCD bytes back into a digit string, dropping the
/// 0xF filler nibble.
pub fn bcd_decode(bytes: &[u8]) -> String {
    let mut digits = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let lo = b & 0x0f;
        let hi = (b >> 4) & 0x0f;
        digits.push(char::from_digit(lo as u32, 16).unwrap_or('?'));
        if hi != 0x0f {
            digits.push(char::from_digit(hi as u32, 16).unwrap_or('?'));
        }
    }
    digits
}
