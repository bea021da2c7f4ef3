//! Hearthside Core - Shared types library.
//!
//! This crate provides the validated domain types used across the Hearthside
//! Foods components:
//! - `checkout` - Cart/checkout orchestrator consumed by the storefront shells
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Anything that
//! reaches the commerce backend lives in the consuming crates.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for money, emails, phone numbers, and OTPs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
