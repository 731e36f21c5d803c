//! Nepali mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The number is not 10 digits long.
    #[error("phone number must be exactly 10 digits (got {got})")]
    WrongLength {
        /// Number of digits supplied.
        got: usize,
    },
    /// The input contains non-digit characters.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// The number does not start with a valid mobile prefix.
    #[error("phone number must start with 98, 97, or 96")]
    InvalidPrefix,
}

/// A Nepali mobile phone number.
///
/// Delivery orders require a reachable mobile number, so the same rule the
/// registration form applies is enforced here: ten digits starting with 98,
/// 97, or 96.
///
/// ## Examples
///
/// ```
/// use khaja_core::Phone;
///
/// assert!(Phone::parse("9841234567").is_ok());
/// assert!(Phone::parse("9612345678").is_ok());
///
/// assert!(Phone::parse("").is_err());           // empty
/// assert!(Phone::parse("0141234567").is_err()); // landline prefix
/// assert!(Phone::parse("98412345").is_err());   // too short
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, contains non-digits, is not
    /// ten digits long, or does not start with 98/97/96.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() != 10 {
            return Err(PhoneError::WrongLength { got: s.len() });
        }

        if !(s.starts_with("98") || s.starts_with("97") || s.starts_with("96")) {
            return Err(PhoneError::InvalidPrefix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the phone number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Phone` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = PhoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_prefixes() {
        assert!(Phone::parse("9841234567").is_ok());
        assert!(Phone::parse("9741234567").is_ok());
        assert!(Phone::parse("9612345678").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert!(matches!(
            Phone::parse("98412345"),
            Err(PhoneError::WrongLength { got: 8 })
        ));
        assert!(matches!(
            Phone::parse("98412345678"),
            Err(PhoneError::WrongLength { got: 11 })
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            Phone::parse("98a1234567"),
            Err(PhoneError::NonDigit)
        ));
    }

    #[test]
    fn test_parse_invalid_prefix() {
        assert!(matches!(
            Phone::parse("0141234567"),
            Err(PhoneError::InvalidPrefix)
        ));
        assert!(matches!(
            Phone::parse("9912345678"),
            Err(PhoneError::InvalidPrefix)
        ));
    }

    #[test]
    fn test_display() {
        let phone = Phone::parse("9841234567").unwrap();
        assert_eq!(format!("{phone}"), "9841234567");
    }
}
