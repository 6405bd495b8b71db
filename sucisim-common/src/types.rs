//! Core identity types: PLMN and SUPI.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Public Land Mobile Network identifier.
///
/// A PLMN uniquely identifies a mobile network and consists of:
/// - MCC (Mobile Country Code): 3 decimal digits
/// - MNC (Mobile Network Code): 2 or 3 decimal digits
///
/// The `long_mnc` field indicates whether the MNC uses 3 digits (true) or 2
/// digits (false).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Plmn {
    /// Mobile Country Code (3 digits, range 0-999)
    pub mcc: u16,
    /// Mobile Network Code (2-3 digits, range 0-999)
    pub mnc: u16,
    /// True if MNC is 3 digits, false if 2 digits
    pub long_mnc: bool,
}

impl Plmn {
    /// Creates a new PLMN with the given MCC and MNC.
    pub const fn new(mcc: u16, mnc: u16, long_mnc: bool) -> Self {
        Self { mcc, mnc, long_mnc }
    }

    /// Returns the MCC as a zero-padded 3-digit string.
    pub fn mcc_string(&self) -> String {
        format!("{:03}", self.mcc)
    }

    /// Returns the MNC as a zero-padded 2- or 3-digit string.
    pub fn mnc_string(&self) -> String {
        if self.long_mnc {
            format!("{:03}", self.mnc)
        } else {
            format!("{:02}", self.mnc)
        }
    }
}

impl fmt::Debug for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plmn({}-{})", self.mcc_string(), self.mnc_string())
    }
}

impl fmt::Display for Plmn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mcc_string(), self.mnc_string())
    }
}

/// Defines the type of Subscription Permanent Identifier per 3GPP TS 23.003.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupiType {
    /// International Mobile Subscriber Identity (IMSI-based SUPI)
    Imsi,
    /// Network Access Identifier (NAI-based SUPI)
    Nai,
}

impl SupiType {
    /// Returns the string prefix for this SUPI type.
    pub fn prefix(&self) -> &'static str {
        match self {
            SupiType::Imsi => "imsi",
            SupiType::Nai => "nai",
        }
    }
}

impl fmt::Display for SupiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Subscription Permanent Identifier (SUPI).
///
/// SUPI is the permanent identity of a subscriber in 5G networks. It can be
/// either IMSI-based or NAI-based per 3GPP TS 23.003.
///
/// Format: `<type>-<value>` (e.g., "imsi-310260123456789")
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Supi {
    /// The type of SUPI (IMSI or NAI)
    pub supi_type: SupiType,
    /// The SUPI value (e.g., "310260123456789" for IMSI)
    pub value: String,
}

impl Supi {
    /// Creates a new SUPI with the given type and value.
    pub fn new(supi_type: SupiType, value: impl Into<String>) -> Self {
        Self {
            supi_type,
            value: value.into(),
        }
    }

    /// Creates a new IMSI-based SUPI.
    pub fn imsi(value: impl Into<String>) -> Self {
        Self::new(SupiType::Imsi, value)
    }

    /// Parses a SUPI from a string in the format "type-value".
    ///
    /// Returns the parsed SUPI, or None if the format is invalid.
    pub fn parse(s: &str) -> Option<Self> {
        let (type_str, value) = s.split_once('-')?;
        let supi_type = match type_str.to_lowercase().as_str() {
            "imsi" => SupiType::Imsi,
            "nai" => SupiType::Nai,
            _ => return None,
        };
        Some(Self::new(supi_type, value))
    }

    /// Returns true if this SUPI has a non-empty value.
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

impl fmt::Debug for Supi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Supi({}-{})", self.supi_type, self.value)
    }
}

impl fmt::Display for Supi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.supi_type, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plmn_strings() {
        let plmn = Plmn::new(310, 260, true);
        assert_eq!(plmn.mcc_string(), "310");
        assert_eq!(plmn.mnc_string(), "260");

        let plmn = Plmn::new(460, 11, false);
        assert_eq!(plmn.mnc_string(), "11");
        assert_eq!(plmn.to_string(), "460-11");
    }

    #[test]
    fn test_supi_parse_imsi() {
        let supi = Supi::parse("imsi-310260123456789").unwrap();
        assert_eq!(supi.supi_type, SupiType::Imsi);
        assert_eq!(supi.value, "310260123456789");
        assert_eq!(supi.to_string(), "imsi-310260123456789");
    }

    #[test]
    fn test_supi_parse_invalid() {
        assert!(Supi::parse("bogus").is_none());
        assert!(Supi::parse("guti-12345").is_none());
    }
}
