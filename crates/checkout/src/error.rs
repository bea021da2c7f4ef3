//! Unified error handling for the checkout orchestrator.
//!
//! The taxonomy follows three tiers: validation errors are blocked locally
//! and never reach the backend, backend errors are surfaced for a one-shot
//! notice with no automatic retry, and state errors are prevented by gating
//! the triggering action. Nothing here is fatal to the page: every failure
//! returns control to the current step.

use thiserror::Error;

use hearthside_core::{EmailError, OtpError, PhoneError};

use crate::backend::BackendError;
use crate::store::StorageError;
use crate::types::CheckoutStep;

/// Application-level error type for the checkout flow.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Email failed format or allow-list validation.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// Phone number failed the 10-digit mobile gate.
    #[error("invalid phone: {0}")]
    Phone(#[from] PhoneError),

    /// OTP failed the 6-digit gate.
    #[error("invalid OTP: {0}")]
    Otp(#[from] OtpError),

    /// A required address field is empty.
    #[error("incomplete address: missing {0}")]
    IncompleteAddress(&'static str),

    /// Commerce backend call failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Durable key-value storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The action is not available from the current step.
    #[error("action not available from step {0:?}")]
    WrongStep(CheckoutStep),

    /// Place-order was triggered without a shipping/tax calculation.
    #[error("no shipping calculation available")]
    NoCalculation,

    /// Place-order was triggered before a payment method was selected.
    #[error("no payment method selected")]
    NoPaymentMethod,

    /// There is no cart to act on.
    #[error("no cart loaded")]
    NoCart,
}

impl CheckoutError {
    /// Whether this error was blocked locally, before any network call.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Email(_) | Self::Phone(_) | Self::Otp(_) | Self::IncompleteAddress(_)
        )
    }
}

/// Result type alias for [`CheckoutError`].
pub type Result<T> = std::result::Result<T, CheckoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = CheckoutError::IncompleteAddress("city");
        assert_eq!(err.to_string(), "incomplete address: missing city");

        let err = CheckoutError::NoCalculation;
        assert_eq!(err.to_string(), "no shipping calculation available");
    }

    #[test]
    fn test_is_validation() {
        assert!(CheckoutError::IncompleteAddress("zip").is_validation());
        assert!(CheckoutError::Phone(PhoneError::WrongLength).is_validation());
        assert!(!CheckoutError::NoCalculation.is_validation());
        assert!(!CheckoutError::WrongStep(CheckoutStep::Cart).is_validation());
    }
}
