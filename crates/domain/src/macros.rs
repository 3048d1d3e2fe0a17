//! Macro for implementing Display and FromStr for simple domain enums
//!
//! Generates both conversions from a single variant table, with
//! case-insensitive parsing and a consistent lowercase representation.
//!
//! # Example
//!
//! ```rust
//! use mani_domain::impl_domain_enum_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum MediaKind {
//!     Video,
//!     Image,
//! }
//!
//! impl_domain_enum_conversions!(MediaKind {
//!     Video => "video",
//!     Image => "image",
//! });
//! ```

/// Implements Display and FromStr traits for unit-variant enums
///
/// # Arguments
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their string
///   representations (must be lowercase)
#[macro_export]
macro_rules! impl_domain_enum_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
