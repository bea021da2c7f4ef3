//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum PhoneError {
    /// The input string is empty.
    #[error("phone number cannot be empty")]
    Empty,
    /// The input is not exactly 10 digits.
    #[error("phone number must be exactly 10 digits")]
    WrongLength,
    /// The input contains non-digit characters.
    #[error("phone number must contain only digits")]
    NonDigit,
    /// The first digit is outside the mobile range.
    #[error("phone number must start with 6-9")]
    NotMobile,
}

/// A 10-digit Indian mobile number.
///
/// OTP dispatch is only enabled for inputs that parse into this type.
///
/// ## Constraints
///
/// - Exactly 10 ASCII digits
/// - First digit in 6-9 (mobile numbering range)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not exactly 10 digits,
    /// contains non-digit characters, or starts outside the 6-9 mobile range.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        if !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NonDigit);
        }

        if s.len() != 10 {
            return Err(PhoneError::WrongLength);
        }

        if !s.starts_with(['6', '7', '8', '9']) {
            return Err(PhoneError::NotMobile);
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
    fn test_parse_valid() {
        assert!(Phone::parse("9876543210").is_ok());
        assert!(Phone::parse("6000000000").is_ok());
    }

    #[test]
    fn test_parse_eight_digits_rejected() {
        assert!(matches!(
            Phone::parse("98765432"),
            Err(PhoneError::WrongLength)
        ));
    }

    #[test]
    fn test_parse_eleven_digits_rejected() {
        assert!(matches!(
            Phone::parse("98765432101"),
            Err(PhoneError::WrongLength)
        ));
    }

    #[test]
    fn test_parse_non_digit() {
        assert!(matches!(
            Phone::parse("98765-4321"),
            Err(PhoneError::NonDigit)
        ));
        assert!(matches!(
            Phone::parse("+919876543"),
            Err(PhoneError::NonDigit)
        ));
    }

    #[test]
    fn test_parse_landline_prefix_rejected() {
        assert!(matches!(
            Phone::parse("1234567890"),
            Err(PhoneError::NotMobile)
        ));
    }

    #[test]
    fn test_parse_empty() {
        assert!(matches!(Phone::parse(""), Err(PhoneError::Empty)));
    }

    #[test]
    fn test_display() {
        let phone = Phone::parse("9876543210").unwrap();
        assert_eq!(phone.to_string(), "9876543210");
    }
}
