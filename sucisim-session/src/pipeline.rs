//! SUPI concealment pipeline
//!
//! [`ConcealmentSession`] drives the device-side pipeline as a strictly
//! ordered state machine:
//!
//! `Idle -> HnKeyGenerated -> Provisioned -> EphemeralGenerated ->
//! SharedSecretComputed -> KeysDerived -> Encrypted -> MacComputed ->
//! SuciAssembled`
//!
//! Every stage either fully updates the session or fails and leaves prior
//! state untouched. Re-running an earlier stage invalidates the artifacts
//! of everything after it. A session is owned by exactly one simulation
//! run; the network side shares nothing with it and operates only on the
//! SUCI string and the home-network key pair (see [`deconceal_suci`]).

use std::fmt;

use tracing::debug;

use sucisim_common::config::{PqcMode, ProtectionProfile, SimConfig};
use sucisim_common::types::Supi;
use sucisim_crypto::ecies::{
    ctr_transform, compute_tag, p256_shared_secret, verify_tag, x25519_shared_secret,
    P256KeyPair, X25519KeyPair, MAC_TAG_SIZE, P256_POINT_SIZE, X25519_KEY_SIZE,
};
use sucisim_crypto::hybrid::{self, HybridKeyPair};
use sucisim_crypto::kdf::{derive_session_keys, SessionKeys};
use sucisim_crypto::kem::{self, MlKemKeyPair};

use crate::error::SessionError;
use crate::suci::{
    assemble_scheme_output, scheme_id, split_scheme_output, Suci, SCHEME_ECIES_A, SCHEME_ECIES_B,
    SCHEME_PQC, SUPI_TYPE_IMSI,
};
use crate::supi::{bcd_decode, bcd_encode, split_supi, SupiParts};

/// Stages of the concealment pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum PipelineStage {
    /// Fresh session, nothing computed
    #[default]
    Idle,
    /// Home-network key pair generated
    HnKeyGenerated,
    /// Home-network public key provisioned, SUPI routing split
    Provisioned,
    /// Ephemeral key material generated
    EphemeralGenerated,
    /// Shared secret Z established
    SharedSecretComputed,
    /// K_enc/K_mac derived from Z
    KeysDerived,
    /// MSIN encrypted
    Encrypted,
    /// MAC tag computed over the ciphertext
    MacComputed,
    /// SUCI assembled
    SuciAssembled,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Idle => "IDLE",
            PipelineStage::HnKeyGenerated => "HN-KEY-GENERATED",
            PipelineStage::Provisioned => "PROVISIONED",
            PipelineStage::EphemeralGenerated => "EPHEMERAL-GENERATED",
            PipelineStage::SharedSecretComputed => "SHARED-SECRET-COMPUTED",
            PipelineStage::KeysDerived => "KEYS-DERIVED",
            PipelineStage::Encrypted => "ENCRYPTED",
            PipelineStage::MacComputed => "MAC-COMPUTED",
            PipelineStage::SuciAssembled => "SUCI-ASSEMBLED",
        };
        write!(f, "{name}")
    }
}

/// Home-network long-term key pair, one variant per protection scheme.
#[derive(Clone)]
pub enum HomeNetworkKeyPair {
    /// Profile A: X25519
    X25519(X25519KeyPair),
    /// Profile B: NIST P-256
    P256(P256KeyPair),
    /// Profile C hybrid: X25519 + ML-KEM-768
    Hybrid(HybridKeyPair),
    /// Profile C pure: ML-KEM-768 only
    MlKem(MlKemKeyPair),
}

impl HomeNetworkKeyPair {
    /// Generate a fresh key pair for the given profile.
    pub fn generate(profile: ProtectionProfile, pqc_mode: PqcMode) -> Self {
        match (profile, pqc_mode) {
            (ProtectionProfile::A, _) => Self::X25519(X25519KeyPair::generate()),
            (ProtectionProfile::B, _) => Self::P256(P256KeyPair::generate()),
            (ProtectionProfile::C, PqcMode::Hybrid) => Self::Hybrid(HybridKeyPair::generate()),
            (ProtectionProfile::C, PqcMode::Pure) => Self::MlKem(MlKemKeyPair::generate()),
        }
    }

    /// The shareable public half of this key pair.
    pub fn public_key(&self) -> HomeNetworkPublicKey {
        match self {
            Self::X25519(kp) => HomeNetworkPublicKey::X25519(*kp.public_key()),
            Self::P256(kp) => HomeNetworkPublicKey::P256(*kp.public_key()),
            Self::Hybrid(kp) => HomeNetworkPublicKey::Hybrid {
                x25519: *kp.x25519().public_key(),
                kem_ek: kp.kem().encapsulation_key().to_vec(),
            },
            Self::MlKem(kp) => HomeNetworkPublicKey::MlKem {
                kem_ek: kp.encapsulation_key().to_vec(),
            },
        }
    }

    /// The scheme identifier this key pair serves.
    fn scheme_id(&self) -> u8 {
        match self {
            Self::X25519(_) => SCHEME_ECIES_A,
            Self::P256(_) => SCHEME_ECIES_B,
            Self::Hybrid(_) | Self::MlKem(_) => SCHEME_PQC,
        }
    }

    /// Width of the key-material prefix in scheme outputs for this key.
    fn key_material_len(&self) -> usize {
        match self {
            Self::X25519(_) => X25519_KEY_SIZE,
            Self::P256(_) => P256_POINT_SIZE,
            Self::Hybrid(_) => hybrid::COMBINED_CIPHERTEXT_SIZE,
            Self::MlKem(_) => kem::CIPHERTEXT_SIZE,
        }
    }
}

/// Home-network public key as provisioned into the device.
#[derive(Clone)]
pub enum HomeNetworkPublicKey {
    /// Profile A: X25519 public key
    X25519([u8; X25519_KEY_SIZE]),
    /// Profile B: compressed P-256 point
    P256([u8; P256_POINT_SIZE]),
    /// Profile C hybrid: X25519 public key and ML-KEM encapsulation key
    Hybrid {
        /// X25519 public key
        x25519: [u8; X25519_KEY_SIZE],
        /// ML-KEM-768 encapsulation key bytes
        kem_ek: Vec<u8>,
    },
    /// Profile C pure: ML-KEM encapsulation key only
    MlKem {
        /// ML-KEM-768 encapsulation key bytes
        kem_ek: Vec<u8>,
    },
}

/// Device-side ephemeral key material, fresh per concealment.
#[derive(Clone)]
pub enum EphemeralKeyPair {
    /// X25519 pair (Profile A and Profile C hybrid)
    X25519(X25519KeyPair),
    /// P-256 pair (Profile B)
    P256(P256KeyPair),
    /// No classical ephemeral key (Profile C pure: the KEM encapsulation
    /// in the next stage is the ephemeral operation)
    None,
}

/// The device-side concealment session.
///
/// One owned state struct per simulation run. All pipeline methods take
/// `&mut self`, giving each session exclusive single-task access.
pub struct ConcealmentSession {
    profile: ProtectionProfile,
    pqc_mode: PqcMode,
    routing_indicator: String,
    hn_key_id: u8,
    supi: Supi,
    stage: PipelineStage,
    hn_keys: Option<HomeNetworkKeyPair>,
    hn_public: Option<HomeNetworkPublicKey>,
    parts: Option<SupiParts>,
    ephemeral: Option<EphemeralKeyPair>,
    shared_secret: Option<Vec<u8>>,
    key_material: Option<Vec<u8>>,
    session_keys: Option<SessionKeys>,
    encrypted_msin: Option<Vec<u8>>,
    mac_tag: Option<[u8; MAC_TAG_SIZE]>,
    suci: Option<Suci>,
}

impl ConcealmentSession {
    /// Create an idle session for a subscriber and profile.
    pub fn new(supi: Supi, profile: ProtectionProfile, pqc_mode: PqcMode) -> Self {
        Self {
            profile,
            pqc_mode,
            routing_indicator: "0".to_string(),
            hn_key_id: 1,
            supi,
            stage: PipelineStage::Idle,
            hn_keys: None,
            hn_public: None,
            parts: None,
            ephemeral: None,
            shared_secret: None,
            key_material: None,
            session_keys: None,
            encrypted_msin: None,
            mac_tag: None,
            suci: None,
        }
    }

    /// Create a session from a simulator configuration.
    pub fn from_config(config: &SimConfig) -> Self {
        let mut session = Self::new(
            config.subscriber.supi.clone(),
            config.concealment.profile,
            config.concealment.pqc_mode,
        );
        session.routing_indicator = config.concealment.routing_indicator.clone();
        session.hn_key_id = config.concealment.hn_key_id;
        session
    }

    /// The stage the pipeline has reached.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// The protection profile this session runs.
    pub fn profile(&self) -> ProtectionProfile {
        self.profile
    }

    /// Clear all generated artifacts and return to `Idle`.
    pub fn reset(&mut self) {
        debug!(stage = %self.stage, "resetting concealment session");
        self.enter(PipelineStage::Idle);
    }

    /// Stage 1: generate the home-network long-term key pair.
    pub fn generate_home_network_key(&mut self) -> Result<&HomeNetworkKeyPair, SessionError> {
        let keys = HomeNetworkKeyPair::generate(self.profile, self.pqc_mode);
        self.enter(PipelineStage::HnKeyGenerated);
        self.hn_keys = Some(keys);
        debug!(profile = ?self.profile, "home network key pair generated");
        Ok(self.hn_keys.as_ref().expect("just set"))
    }

    /// Stage 2: provision the home-network public key into the device and
    /// split the SUPI into routing components.
    pub fn provision(&mut self) -> Result<&HomeNetworkPublicKey, SessionError> {
        let hn_keys = self.require_hn_keys("provision")?;
        let public = hn_keys.public_key();
        let parts = split_supi(&self.supi)?;

        self.enter(PipelineStage::Provisioned);
        self.hn_public = Some(public);
        self.parts = Some(parts);
        debug!(supi = %self.supi, "device provisioned with home network public key");
        Ok(self.hn_public.as_ref().expect("just set"))
    }

    /// Stage 3: generate fresh ephemeral key material.
    ///
    /// Never reuses ephemeral material: a new pair is drawn on every call.
    pub fn generate_ephemeral_key(&mut self) -> Result<(), SessionError> {
        self.require_stage("generate_ephemeral_key", PipelineStage::Provisioned)?;
        let ephemeral = match (self.profile, self.pqc_mode) {
            (ProtectionProfile::A, _) => EphemeralKeyPair::X25519(X25519KeyPair::generate()),
            (ProtectionProfile::B, _) => EphemeralKeyPair::P256(P256KeyPair::generate()),
            (ProtectionProfile::C, PqcMode::Hybrid) => {
                EphemeralKeyPair::X25519(X25519KeyPair::generate())
            }
            (ProtectionProfile::C, PqcMode::Pure) => EphemeralKeyPair::None,
        };
        self.install_ephemeral_key(ephemeral)
    }

    /// Stage 3 (alternative): install caller-supplied ephemeral key
    /// material, for deterministic runs.
    ///
    /// The variant must match the session profile.
    pub fn install_ephemeral_key(&mut self, keys: EphemeralKeyPair) -> Result<(), SessionError> {
        self.require_stage("install_ephemeral_key", PipelineStage::Provisioned)?;
        let matches_profile = matches!(
            (&keys, self.profile, self.pqc_mode),
            (EphemeralKeyPair::X25519(_), ProtectionProfile::A, _)
                | (EphemeralKeyPair::P256(_), ProtectionProfile::B, _)
                | (EphemeralKeyPair::X25519(_), ProtectionProfile::C, PqcMode::Hybrid)
                | (EphemeralKeyPair::None, ProtectionProfile::C, PqcMode::Pure)
        );
        if !matches_profile {
            return Err(SessionError::PrimitiveUnavailable(format!(
                "ephemeral key does not match profile {:?}",
                self.profile
            )));
        }

        self.enter(PipelineStage::EphemeralGenerated);
        self.ephemeral = Some(keys);
        debug!(profile = ?self.profile, "ephemeral key material installed");
        Ok(())
    }

    /// Stage 4: establish the shared secret Z.
    ///
    /// Profiles A/B run ECDH between the ephemeral private key and the
    /// home-network public key. Profile C encapsulates against the
    /// home-network KEM key (hybrid mode additionally runs X25519 ECDH and
    /// combines: `Z = SHA256(Z_ecdh || Z_kem)`). The key material destined
    /// for the scheme output (ephemeral public key or KEM ciphertext) is
    /// captured here as well.
    pub fn compute_shared_secret(&mut self) -> Result<(), SessionError> {
        let operation = "compute_shared_secret";
        self.require_stage(operation, PipelineStage::EphemeralGenerated)?;
        let hn_public = self.hn_public.as_ref().ok_or(SessionError::PreconditionNotMet {
            operation,
            required: PipelineStage::Provisioned,
            current: self.stage,
        })?;
        let ephemeral = self.ephemeral.as_ref().ok_or(SessionError::PreconditionNotMet {
            operation,
            required: PipelineStage::EphemeralGenerated,
            current: self.stage,
        })?;

        let (z, key_material): (Vec<u8>, Vec<u8>) = match (ephemeral, hn_public) {
            (EphemeralKeyPair::X25519(eph), HomeNetworkPublicKey::X25519(hn_pub)) => {
                let z = x25519_shared_secret(eph.secret_key(), hn_pub);
                (z.to_vec(), eph.public_key().to_vec())
            }
            (EphemeralKeyPair::P256(eph), HomeNetworkPublicKey::P256(hn_pub)) => {
                let z = p256_shared_secret(eph.secret_key(), hn_pub)?;
                (z.to_vec(), eph.public_key().to_vec())
            }
            (EphemeralKeyPair::X25519(eph), HomeNetworkPublicKey::Hybrid { x25519, kem_ek }) => {
                let (combined_ct, z) = hybrid::encapsulate_with_keypair(eph, x25519, kem_ek)?;
                (z.to_vec(), combined_ct)
            }
            (EphemeralKeyPair::None, HomeNetworkPublicKey::MlKem { kem_ek }) => {
                let (kem_ct, z) = kem::encapsulate(kem_ek)?;
                (z, kem_ct)
            }
            _ => {
                return Err(SessionError::PrimitiveUnavailable(
                    "ephemeral key material does not match the provisioned public key".into(),
                ))
            }
        };

        self.enter(PipelineStage::SharedSecretComputed);
        self.shared_secret = Some(z);
        self.key_material = Some(key_material);
        debug!("shared secret established");
        Ok(())
    }

    /// Stage 5: derive K_enc and K_mac from Z.
    pub fn derive_keys(&mut self) -> Result<(), SessionError> {
        let z = self.require_field(
            "derive_keys",
            PipelineStage::SharedSecretComputed,
            &self.shared_secret,
        )?;
        let keys = derive_session_keys(z)?;

        self.enter(PipelineStage::KeysDerived);
        self.session_keys = Some(keys);
        debug!("session keys derived");
        Ok(())
    }

    /// Stage 6: BCD-encode and encrypt the MSIN.
    pub fn encrypt_identifier(&mut self) -> Result<(), SessionError> {
        let operation = "encrypt_identifier";
        let keys = self
            .require_field(operation, PipelineStage::KeysDerived, &self.session_keys)?
            .clone();
        let parts = self.require_field(operation, PipelineStage::Provisioned, &self.parts)?;

        let msin_bytes = bcd_encode(&parts.msin)?;
        let ciphertext = ctr_transform(&keys, &msin_bytes);

        self.enter(PipelineStage::Encrypted);
        self.encrypted_msin = Some(ciphertext);
        debug!("identifier encrypted");
        Ok(())
    }

    /// Stage 7: compute the MAC tag over the ciphertext.
    pub fn compute_mac(&mut self) -> Result<(), SessionError> {
        let operation = "compute_mac";
        let keys = self
            .require_field(operation, PipelineStage::KeysDerived, &self.session_keys)?
            .clone();
        let ciphertext = self
            .require_field(operation, PipelineStage::Encrypted, &self.encrypted_msin)?
            .clone();

        let tag = compute_tag(&keys, &ciphertext);

        self.enter(PipelineStage::MacComputed);
        self.mac_tag = Some(tag);
        debug!(mac = %hex::encode(tag), "mac tag computed");
        Ok(())
    }

    /// Stage 8: assemble the SUCI.
    pub fn assemble_suci(&mut self) -> Result<&Suci, SessionError> {
        let operation = "assemble_suci";
        let key_material = self
            .require_field(operation, PipelineStage::SharedSecretComputed, &self.key_material)?
            .clone();
        let ciphertext = self
            .require_field(operation, PipelineStage::Encrypted, &self.encrypted_msin)?
            .clone();
        let mac_tag = *self.require_field(operation, PipelineStage::MacComputed, &self.mac_tag)?;
        let parts = self
            .require_field(operation, PipelineStage::Provisioned, &self.parts)?
            .clone();

        let suci = Suci {
            supi_type: SUPI_TYPE_IMSI,
            mcc: parts.mcc,
            mnc: parts.mnc,
            routing_indicator: self.routing_indicator.clone(),
            scheme_id: scheme_id(self.profile),
            hn_key_id: self.hn_key_id,
            scheme_output: assemble_scheme_output(&key_material, &ciphertext, &mac_tag),
        };

        self.enter(PipelineStage::SuciAssembled);
        self.suci = Some(suci);
        let suci = self.suci.as_ref().expect("just set");
        debug!(suci = %suci, "suci assembled");
        Ok(suci)
    }

    /// The home-network key pair, once generated. The network side needs
    /// this (its private half) for de-concealment.
    pub fn home_network_keys(&self) -> Option<&HomeNetworkKeyPair> {
        self.hn_keys.as_ref()
    }

    /// The established shared secret Z, once computed.
    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_deref()
    }

    /// The assembled SUCI, once available.
    pub fn suci(&self) -> Option<&Suci> {
        self.suci.as_ref()
    }

    /// Read-only report of the session structure; does not mutate the
    /// pipeline.
    pub fn visualize_structure(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("stage:    {}\n", self.stage));
        out.push_str(&format!("supi:     {}\n", self.supi));
        if let Some(parts) = &self.parts {
            out.push_str(&format!(
                "routing:  mcc={} mnc={} msin={}\n",
                parts.mcc, parts.mnc, parts.msin
            ));
        }
        if let Some(z) = &self.shared_secret {
            out.push_str(&format!("z:        {}\n", hex::encode(z)));
        }
        if let Some(keys) = &self.session_keys {
            out.push_str(&format!("k_enc:    {}\n", hex::encode(keys.k_enc)));
            out.push_str(&format!("k_mac:    {}\n", hex::encode(keys.k_mac)));
        }
        if let Some(ct) = &self.encrypted_msin {
            out.push_str(&format!("cipher:   {}\n", hex::encode(ct)));
        }
        if let Some(tag) = &self.mac_tag {
            out.push_str(&format!("mac:      {}\n", hex::encode(tag)));
        }
        if let Some(suci) = &self.suci {
            out.push_str(&format!("suci:     {suci}\n"));
        }
        out
    }

    /// Enter a stage, invalidating the artifacts of every later stage.
    fn enter(&mut self, stage: PipelineStage) {
        use PipelineStage::*;
        self.stage = stage;
        if stage < SuciAssembled {
            self.suci = None;
        }
        if stage < MacComputed {
            self.mac_tag = None;
        }
        if stage < Encrypted {
            self.encrypted_msin = None;
        }
        if stage < KeysDerived {
            self.session_keys = None;
        }
        if stage < SharedSecretComputed {
            self.shared_secret = None;
            self.key_material = None;
        }
        if stage < EphemeralGenerated {
            self.ephemeral = None;
        }
        if stage < Provisioned {
            self.hn_public = None;
            self.parts = None;
        }
        if stage < HnKeyGenerated {
            self.hn_keys = None;
        }
    }

    fn require_stage(
        &self,
        operation: &'static str,
        required: PipelineStage,
    ) -> Result<(), SessionError> {
        if self.stage < required {
            return Err(SessionError::PreconditionNotMet {
                operation,
                required,
                current: self.stage,
            });
        }
        Ok(())
    }

    fn require_hn_keys(
        &self,
        operation: &'static str,
    ) -> Result<&HomeNetworkKeyPair, SessionError> {
        self.hn_keys.as_ref().ok_or(SessionError::PreconditionNotMet {
            operation,
            required: PipelineStage::HnKeyGenerated,
            current: self.stage,
        })
    }

    fn require_field<'a, T>(
        &self,
        operation: &'static str,
        required: PipelineStage,
        field: &'a Option<T>,
    ) -> Result<&'a T, SessionError> {
        field.as_ref().ok_or(SessionError::PreconditionNotMet {
            operation,
            required,
            current: self.stage,
        })
    }
}

/// The result of network-side de-concealment.
pub struct Deconcealed {
    /// The recovered SUPI
    pub supi: Supi,
    /// The recovered MSIN digits
    pub msin: String,
    /// The shared secret the network derived; bit-identical to the
    /// device-side Z on an untampered exchange
    pub shared_secret: Vec<u8>,
}

/// Network-side de-concealment (SIDF role).
///
/// Recomputes Z by the operation symmetric to the device side, rederives
/// K_enc/K_mac, verifies the MAC tag before decrypting, and recovers the
/// SUPI. Operates purely on the received SUCI and the home-network key
/// pair; no state is shared with the device-side session.
pub fn deconceal_suci(
    hn_keys: &HomeNetworkKeyPair,
    suci: &Suci,
) -> Result<Deconcealed, SessionError> {
    if suci.scheme_id != hn_keys.scheme_id() {
        return Err(SessionError::Codec(format!(
            "scheme {} does not match the home network key (expects {})",
            suci.scheme_id,
            hn_keys.scheme_id()
        )));
    }

    let parts = split_scheme_output(&suci.scheme_output, hn_keys.key_material_len())?;

    let z: Vec<u8> = match hn_keys {
        HomeNetworkKeyPair::X25519(kp) => {
            let eph_pub: [u8; X25519_KEY_SIZE] = parts
                .key_material
                .try_into()
                .expect("split_scheme_output returns the exact width");
            x25519_shared_secret(kp.secret_key(), &eph_pub).to_vec()
        }
        HomeNetworkKeyPair::P256(kp) => {
            let eph_pub: [u8; P256_POINT_SIZE] = parts
                .key_material
                .try_into()
                .expect("split_scheme_output returns the exact width");
            p256_shared_secret(kp.secret_key(), &eph_pub)?.to_vec()
        }
        HomeNetworkKeyPair::Hybrid(kp) => hybrid::decapsulate(
            kp.x25519().secret_key(),
            kp.kem().decapsulation_key(),
            parts.key_material,
        )?
        .to_vec(),
        HomeNetworkKeyPair::MlKem(kp) => {
            kem::decapsulate(kp.decapsulation_key(), parts.key_material)?
        }
    };

    let keys = derive_session_keys(&z)?;
    if !verify_tag(&keys, parts.ciphertext, parts.mac_tag) {
        return Err(SessionError::MacVerificationFailed);
    }

    let msin_bytes = ctr_transform(&keys, parts.ciphertext);
    let msin = bcd_decode(&msin_bytes);
    let supi = Supi::imsi(format!("{}{}{}", suci.mcc, suci.mnc, msin));

    debug!(supi = %supi, "supi deconcealed");
    Ok(Deconcealed {
        supi,
        msin,
        shared_secret: z,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(profile: ProtectionProfile, pqc_mode: PqcMode) -> ConcealmentSession {
        ConcealmentSession::new(Supi::imsi("310260123456789"), profile, pqc_mode)
    }

    fn run_full_pipeline(session: &mut ConcealmentSession) -> Suci {
        session.generate_home_network_key().unwrap();
        session.provision().unwrap();
        session.generate_ephemeral_key().unwrap();
        session.compute_shared_secret().unwrap();
        session.derive_keys().unwrap();
        session.encrypt_identifier().unwrap();
        session.compute_mac().unwrap();
        session.assemble_suci().unwrap().clone()
    }

    #[test]
    fn test_pipeline_stage_order() {
        assert!(PipelineStage::Idle < PipelineStage::HnKeyGenerated);
        assert!(PipelineStage::KeysDerived < PipelineStage::SuciAssembled);
    }

    #[test]
    fn test_derive_keys_before_shared_secret_fails() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        let err = s.derive_keys().unwrap_err();
        match err {
            SessionError::PreconditionNotMet {
                required, current, ..
            } => {
                assert_eq!(required, PipelineStage::SharedSecretComputed);
                assert_eq!(current, PipelineStage::Idle);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(s.stage(), PipelineStage::Idle);
    }

    #[test]
    fn test_each_stage_requires_predecessor() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        assert!(s.provision().is_err());
        assert!(s.generate_ephemeral_key().is_err());
        assert!(s.compute_shared_secret().is_err());
        assert!(s.encrypt_identifier().is_err());
        assert!(s.compute_mac().is_err());
        assert!(s.assemble_suci().is_err());
        // Failures leave the session untouched
        assert_eq!(s.stage(), PipelineStage::Idle);
    }

    #[test]
    fn test_full_pipeline_profile_a() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        let suci = run_full_pipeline(&mut s);
        assert_eq!(s.stage(), PipelineStage::SuciAssembled);
        assert_eq!(suci.scheme_id, SCHEME_ECIES_A);
        assert_eq!(suci.mcc, "310");
        assert_eq!(suci.mnc, "260");
        // 32-byte ephemeral key + 5-byte BCD MSIN + 8-byte MAC
        assert_eq!(suci.scheme_output.len(), 32 + 5 + 8);
    }

    #[test]
    fn test_reset_clears_session() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        run_full_pipeline(&mut s);
        s.reset();
        assert_eq!(s.stage(), PipelineStage::Idle);
        assert!(s.suci().is_none());
        assert!(s.shared_secret().is_none());
        assert!(s.home_network_keys().is_none());
    }

    #[test]
    fn test_rerunning_earlier_stage_invalidates_later_artifacts() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        run_full_pipeline(&mut s);

        // Fresh ephemeral key: everything downstream of it must be gone
        s.generate_ephemeral_key().unwrap();
        assert_eq!(s.stage(), PipelineStage::EphemeralGenerated);
        assert!(s.shared_secret().is_none());
        assert!(s.suci().is_none());
    }

    #[test]
    fn test_install_mismatched_ephemeral_key_rejected() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        s.generate_home_network_key().unwrap();
        s.provision().unwrap();
        let err = s
            .install_ephemeral_key(EphemeralKeyPair::P256(P256KeyPair::generate()))
            .unwrap_err();
        assert!(matches!(err, SessionError::PrimitiveUnavailable(_)));
        assert_eq!(s.stage(), PipelineStage::Provisioned);
    }

    #[test]
    fn test_fresh_ephemeral_keys_per_run() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        let first = run_full_pipeline(&mut s);

        let mut s2 = session(ProtectionProfile::A, PqcMode::Hybrid);
        let second = run_full_pipeline(&mut s2);

        // Independent sessions never share ephemeral material
        assert_ne!(first.scheme_output, second.scheme_output);
    }

    #[test]
    fn test_visualize_structure_is_read_only() {
        let mut s = session(ProtectionProfile::A, PqcMode::Hybrid);
        s.generate_home_network_key().unwrap();
        s.provision().unwrap();
        let stage_before = s.stage();
        let report = s.visualize_structure();
        assert!(report.contains("PROVISIONED"));
        assert!(report.contains("mcc=310"));
        assert_eq!(s.stage(), stage_before);
    }
}
