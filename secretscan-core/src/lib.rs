//! # secretscan-core
//!
//! Streaming credential detection and validation runtime.
//!
//! The crate is organised around the three subsystems a credential
//! plugin builds on:
//!
//! - [`detect`] — the buffer-managed streaming matcher ([`detect::engine::DetectionEngine`]),
//!   the simple regex-to-secret adapter ([`detect::simple::SimpleTokenDetector`]) and the
//!   composite n-tuple matcher ([`detect::tuple::NTupleDetector`]).
//! - [`validate`] — the type-indexed dispatcher ([`validate::engine::ValidationEngine`]) and
//!   the declarative HTTP-request validator template ([`validate::http::HttpValidator`]).
//! - [`secret`] and [`cancel`] — the shared `Secret`/`ValidationStatus` data model and the
//!   cooperative cancellation primitive threaded through both subsystems.
//!
//! Walking file systems, choosing concrete regexes/validator URLs, persisting
//! scan results and wiring up a CLI are all left to callers — this crate is a
//! library, not a scanner.

pub mod cancel;
pub mod detect;
pub mod secret;
pub mod validate;

pub use cancel::CancellationToken;
pub use secret::{Secret, SecretKind, ValidationOutcome, ValidationStatus};
