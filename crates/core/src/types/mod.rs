//! Core types for Hearthside Foods.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod money;
pub mod otp;
pub mod phone;

pub use email::{Email, EmailError};
pub use money::{CurrencyCode, Money};
pub use otp::{OtpCode, OtpError};
pub use phone::{Phone, PhoneError};
