//! Display and `FromStr` for the small closed enums of the domain
//!
//! ```rust
//! use restorekit_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Transfer {
//!     Queued,
//!     Sent,
//! }
//!
//! impl_domain_status_conversions!(Transfer {
//!     Queued => "queued",
//!     Sent => "sent",
//! });
//!
//! assert_eq!(Transfer::Sent.as_str(), "sent");
//! assert_eq!("QUEUED".parse::<Transfer>().unwrap(), Transfer::Queued);
//! ```

/// Generates `as_str`, `Display` and a case-insensitive `FromStr`.
///
/// The string literals must be lowercase. Parsing failures surface as
/// [`RestoreKitError::InvalidInput`](crate::RestoreKitError::InvalidInput)
/// naming the enum.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// Lowercase name used in logs and config files.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = $crate::RestoreKitError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err($crate::RestoreKitError::InvalidInput(format!(
                        "unknown {}: {s:?}",
                        stringify!($enum_name)
                    ))),
                }
            }
        }
    };
}
