//! vetrun signature verification
//!
//! Wraps the platform trust-verification primitive behind the
//! [`SignatureVerifier`] trait. The launch and download pipelines depend
//! only on the trait; [`PlatformVerifier`] supplies the per-platform
//! implementation and [`FixedVerifier`] supplies a deterministic one for
//! tests and embedders that bring their own trust decision.

mod certificate;
mod error;
mod fixed;
mod platform;
mod verifier;

pub use certificate::CertificateInfo;
pub use error::SignError;
pub use fixed::FixedVerifier;
pub use platform::PlatformVerifier;
pub use verifier::SignatureVerifier;

pub type Result<T> = std::result::Result<T, SignError>;
