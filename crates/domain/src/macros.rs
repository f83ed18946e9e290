//! Macro for implementing Display and FromStr for state enums
//!
//! Eliminates boilerplate for enums that travel as plain strings in logs,
//! config files and diagnostics. Parsing is case-insensitive.
//!
//! # Example
//!
//! ```rust
//! use banklink_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum LinkState {
//!     Idle,
//!     Linked,
//! }
//!
//! impl_domain_status_conversions!(LinkState {
//!     Idle => "idle",
//!     Linked => "linked",
//! });
//! ```

/// Implements Display and FromStr traits for status enums
///
/// * `$enum_name` - The name of the enum type
/// * `$variant => $str` - Mapping of enum variants to their lowercase string
///   representations
#[macro_export]
macro_rules! impl_domain_status_conversions {
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

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        Unpaired,
        Paired,
    }

    impl_domain_status_conversions!(Phase {
        Unpaired => "unpaired",
        Paired => "paired",
    });

    #[test]
    fn display_uses_lowercase_names() {
        assert_eq!(Phase::Unpaired.to_string(), "unpaired");
        assert_eq!(Phase::Paired.to_string(), "paired");
    }

    #[test]
    fn from_str_ignores_case() {
        assert_eq!(Phase::from_str("PAIRED").unwrap(), Phase::Paired);
        assert_eq!(Phase::from_str("UnPaired").unwrap(), Phase::Unpaired);
    }

    #[test]
    fn from_str_rejects_unknown_values() {
        let result = Phase::from_str("linked");
        assert!(result.unwrap_err().contains("Invalid Phase: linked"));
        assert!(Phase::from_str("").is_err());
    }
}
