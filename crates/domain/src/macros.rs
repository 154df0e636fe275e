//! Macro for implementing Display and FromStr for domain enums
//!
//! Status-like enums (batch item statuses, conflict resolutions, store
//! backends) share one string mapping for both directions. Parsing is
//! case-insensitive; output is always the canonical lowercase form.
//!
//! # Example
//!
//! ```rust
//! use fieldsync_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum ReplayPhase {
//!     Idle,
//!     Draining,
//!     Stopped,
//! }
//!
//! impl_domain_status_conversions!(ReplayPhase {
//!     Idle => "idle",
//!     Draining => "draining",
//!     Stopped => "stopped",
//! });
//!
//! assert_eq!(ReplayPhase::Draining.to_string(), "draining");
//! assert_eq!("IDLE".parse::<ReplayPhase>(), Ok(ReplayPhase::Idle));
//! ```

/// Implements Display and FromStr traits for status enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
