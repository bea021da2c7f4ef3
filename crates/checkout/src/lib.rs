//! Hearthside checkout - cart/checkout orchestrator.
//!
//! The catalog, inventory, and order fulfillment for the Hearthside Foods
//! storefront live in an external commerce backend. This crate owns the one
//! subsystem with real engineering weight on the client side: resolving which
//! cart belongs to the current visitor (guest or authenticated), merging carts
//! across a login transition, recomputing shipping/tax when address data
//! changes, driving the multi-step checkout state machine, and placing an
//! order through one of two payment paths while emitting best-effort funnel
//! analytics.
//!
//! # Architecture
//!
//! - [`store`] - injectable key-value identity store (cart ids, session id,
//!   pending-payment payload)
//! - [`backend`] - the [`backend::CommerceBackend`] trait and its HTTP
//!   implementation
//! - [`address`] - canonical address extraction from heterogeneous profiles
//! - [`pricing`] - shipping/tax breakdown from a tax-inclusive subtotal
//! - [`flow`] - the 4-step checkout state machine and order placement
//! - [`tracking`] - fire-and-forget funnel events
//!
//! The orchestrator is generic over the backend and storage so that both the
//! full-page checkout and the cart drawer consume the same logic, and tests
//! run against in-memory fakes without a network.
//!
//! # Example
//!
//! ```rust,ignore
//! use hearthside_checkout::flow::CheckoutFlow;
//!
//! let mut flow = CheckoutFlow::new(backend, store, tracker, config);
//! flow.load_cart().await?;
//! flow.proceed_to_checkout().await?;   // Cart -> LoginPhone (guest)
//! flow.send_otp("9876543210").await?;  // LoginPhone -> LoginOtp
//! flow.verify_otp("123456").await?;    // LoginOtp -> Checkout, cart merged
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod address;
pub mod backend;
pub mod config;
pub mod error;
pub mod flow;
pub mod order;
pub mod pricing;
pub mod store;
pub mod tracking;
pub mod types;

pub use config::CheckoutConfig;
pub use error::{CheckoutError, Result};
pub use flow::CheckoutFlow;
pub use types::CheckoutStep;
