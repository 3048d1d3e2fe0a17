//! Infrastructure error plumbing
//!
//! Foreign errors (`reqwest`, `keyring`) are converted into [`ManiError`]
//! through the [`InfraError`] newtype so the conversions stay on the
//! infrastructure side of the workspace.
//!
//! [`ManiError`]: mani_domain::ManiError

pub mod conversions;

pub use conversions::InfraError;
