//! Common types and utilities for sucisim
//!
//! This crate provides the shared types, configuration structures, and
//! logging utilities used across the sucisim crates.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    ConcealmentConfig, OpType, PqcMode, ProtectionProfile, SimConfig, SubscriberConfig,
};
pub use error::Error;
pub use logging::{init_logging, HexDump, LogLevel};
pub use types::{Plmn, Supi, SupiType};
