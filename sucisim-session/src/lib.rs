//! SUPI concealment sessions and 5G-AKA vector generation for sucisim
//!
//! This crate owns the stateful side of the simulator:
//! - [`pipeline::ConcealmentSession`]: the strictly ordered device-side
//!   pipeline from home-network key generation to SUCI assembly
//! - [`pipeline::deconceal_suci`]: the network-side mirror operating purely
//!   on the received SUCI and the home-network private key
//! - [`suci`]: the SUCI string codec
//! - [`auth`]: the 5G-AKA authentication-vector flow (Milenage, AUTN,
//!   KAUSF) with an explicit OPc cache
//!
//! The crypto engines it drives live in `sucisim-crypto` and are pure
//! functions; all mutable state is confined to session structs owned by the
//! caller.

pub mod auth;
pub mod error;
pub mod pipeline;
pub mod suci;
pub mod supi;

pub use error::SessionError;
pub use pipeline::{
    deconceal_suci, ConcealmentSession, Deconcealed, EphemeralKeyPair, HomeNetworkKeyPair,
    HomeNetworkPublicKey, PipelineStage,
};
pub use suci::Suci;
