//! # secretscan-detectors
//!
//! Concrete credential detectors and validators built on `secretscan-core`,
//! plus a registry that layers operator-configured (`secretscan-config`)
//! detectors on top of this crate's hand-written built-ins.

pub mod builtin;
pub mod prefilter;
pub mod registry;
pub mod secrets;

pub use registry::{build_detectors, build_validation_engine, RegistryError};
