//! Persistent identity store.
//!
//! Durable client-side state (cart ids, customer id, checkout session id,
//! pending-payment payload) used to live as ad hoc global reads and writes.
//! It is wrapped here behind a single injectable key-value interface so every
//! consumer can be tested against [`InMemoryStore`] and the platform shell can
//! plug in whatever durable storage it has.
//!
//! Writes are last-writer-wins with no locking; they are sequenced by the
//! checkout flow's single-threaded transitions.

use std::collections::HashMap;
use std::sync::Mutex;

use thiserror::Error;

use crate::types::PendingGatewayOrder;

/// Errors from the underlying key-value storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage backend rejected the operation.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A stored payload could not be decoded.
    #[error("corrupt stored value for {key}: {reason}")]
    Corrupt {
        /// The key whose value failed to decode.
        key: &'static str,
        /// Decoder error text.
        reason: String,
    },
}

/// Minimal durable key-value interface.
///
/// Implementations must be cheap to call; no network side effects.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a value if present.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Backend`] if the store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Storage keys for checkout state.
pub mod keys {
    /// Key for the cart owned by the authenticated customer.
    pub const CART_ID: &str = "cart_id";

    /// Key for the guest cart, before any login.
    pub const GUEST_CART_ID: &str = "guest_cart_id";

    /// Key for the authenticated customer id.
    pub const CUSTOMER_ID: &str = "customer_id";

    /// Key for the current checkout session id.
    pub const CHECKOUT_SESSION_ID: &str = "checkout_session_id";

    /// Key for the pending gateway-order payload (JSON).
    pub const PENDING_GATEWAY_ORDER: &str = "pending_gateway_order";

    /// Key for the most recently placed order id.
    pub const LAST_ORDER_ID: &str = "last_order_id";
}

/// A visitor identity snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// Authenticated customer id, if logged in.
    pub customer_id: Option<String>,
    /// Cart owned by the authenticated customer.
    pub cart_id: Option<String>,
    /// Guest cart reference, pre-login only.
    pub guest_cart_id: Option<String>,
}

impl Identity {
    /// The cart reference to use for fetches: the customer cart when present,
    /// otherwise the guest cart.
    #[must_use]
    pub fn effective_cart_id(&self) -> Option<&str> {
        self.cart_id.as_deref().or(self.guest_cart_id.as_deref())
    }

    /// Whether an authenticated customer exists.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.customer_id.is_some()
    }
}

/// Typed access to the checkout's durable state.
///
/// Pure state bookkeeping; nothing here performs network calls.
pub struct IdentityStore {
    store: Box<dyn KeyValueStore>,
}

impl IdentityStore {
    /// Wrap a key-value store.
    #[must_use]
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the current identity snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be read.
    pub fn identity(&self) -> Result<Identity, StorageError> {
        Ok(Identity {
            customer_id: self.store.get(keys::CUSTOMER_ID)?,
            cart_id: self.store.get(keys::CART_ID)?,
            guest_cart_id: self.store.get(keys::GUEST_CART_ID)?,
        })
    }

    /// Record a cart id under the current ownership: guest key before login,
    /// customer key after.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn set_cart_id(&self, cart_id: &str) -> Result<(), StorageError> {
        if self.store.get(keys::CUSTOMER_ID)?.is_some() {
            self.store.set(keys::CART_ID, cart_id)
        } else {
            self.store.set(keys::GUEST_CART_ID, cart_id)
        }
    }

    /// Promote the guest cart once login succeeds.
    ///
    /// Stores the customer id. If the backend reported a merge, the merged
    /// cart id is adopted and the guest reference discarded; otherwise the
    /// guest cart id is retained as the fallback cart id. Post-login at most
    /// one cart reference is authoritative.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn promote_guest_cart(
        &self,
        customer_id: &str,
        merged_cart_id: Option<&str>,
    ) -> Result<(), StorageError> {
        self.store.set(keys::CUSTOMER_ID, customer_id)?;

        if let Some(merged) = merged_cart_id {
            self.store.set(keys::CART_ID, merged)?;
        } else if let Some(guest) = self.store.get(keys::GUEST_CART_ID)? {
            self.store.set(keys::CART_ID, &guest)?;
        }

        self.store.remove(keys::GUEST_CART_ID)
    }

    /// Drop the effective cart reference (expired cart, or post-order).
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn clear_cart_refs(&self) -> Result<(), StorageError> {
        self.store.remove(keys::CART_ID)?;
        self.store.remove(keys::GUEST_CART_ID)
    }

    /// Persist the checkout session id.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn set_session_id(&self, session_id: &str) -> Result<(), StorageError> {
        self.store.set(keys::CHECKOUT_SESSION_ID, session_id)
    }

    /// Discard the checkout session id.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn clear_session_id(&self) -> Result<(), StorageError> {
        self.store.remove(keys::CHECKOUT_SESSION_ID)
    }

    /// Persist the pending gateway-order payload before redirecting.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if serialization or the write fails.
    pub fn save_pending_order(&self, pending: &PendingGatewayOrder) -> Result<(), StorageError> {
        let json = serde_json::to_string(pending).map_err(|e| StorageError::Corrupt {
            key: keys::PENDING_GATEWAY_ORDER,
            reason: e.to_string(),
        })?;
        self.store.set(keys::PENDING_GATEWAY_ORDER, &json)
    }

    /// Load the pending gateway-order payload, if one was persisted.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the read fails or the payload does not
    /// decode.
    pub fn load_pending_order(&self) -> Result<Option<PendingGatewayOrder>, StorageError> {
        self.store
            .get(keys::PENDING_GATEWAY_ORDER)?
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| StorageError::Corrupt {
                    key: keys::PENDING_GATEWAY_ORDER,
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Remove the pending gateway-order payload.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn clear_pending_order(&self) -> Result<(), StorageError> {
        self.store.remove(keys::PENDING_GATEWAY_ORDER)
    }

    /// Persist the human-readable id of a successfully placed order.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the store cannot be written.
    pub fn remember_order(&self, order_id: &str) -> Result<(), StorageError> {
        self.store.set(keys::LAST_ORDER_ID, order_id)
    }
}

/// Mutex-over-hashmap store for tests and in-process embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self
            .values
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> IdentityStore {
        IdentityStore::new(Box::new(InMemoryStore::new()))
    }

    #[test]
    fn test_empty_identity() {
        let store = store();
        let identity = store.identity().unwrap();
        assert_eq!(identity, Identity::default());
        assert!(!identity.is_authenticated());
        assert!(identity.effective_cart_id().is_none());
    }

    #[test]
    fn test_set_cart_id_guest_then_customer() {
        let store = store();

        store.set_cart_id("cart-guest").unwrap();
        let identity = store.identity().unwrap();
        assert_eq!(identity.guest_cart_id.as_deref(), Some("cart-guest"));
        assert!(identity.cart_id.is_none());

        store.promote_guest_cart("cust-1", None).unwrap();
        store.set_cart_id("cart-new").unwrap();
        let identity = store.identity().unwrap();
        assert_eq!(identity.cart_id.as_deref(), Some("cart-new"));
        assert!(identity.guest_cart_id.is_none());
    }

    #[test]
    fn test_promote_with_merge_discards_guest_id() {
        let store = store();
        store.set_cart_id("cart-guest").unwrap();

        store
            .promote_guest_cart("cust-1", Some("cart-merged"))
            .unwrap();

        let identity = store.identity().unwrap();
        assert_eq!(identity.customer_id.as_deref(), Some("cust-1"));
        assert_eq!(identity.cart_id.as_deref(), Some("cart-merged"));
        assert!(identity.guest_cart_id.is_none());
        assert_eq!(identity.effective_cart_id(), Some("cart-merged"));
    }

    #[test]
    fn test_promote_without_merge_keeps_guest_cart_as_fallback() {
        let store = store();
        store.set_cart_id("cart-guest").unwrap();

        store.promote_guest_cart("cust-1", None).unwrap();

        let identity = store.identity().unwrap();
        assert_eq!(identity.cart_id.as_deref(), Some("cart-guest"));
        assert!(identity.guest_cart_id.is_none());
    }

    #[test]
    fn test_clear_cart_refs() {
        let store = store();
        store.set_cart_id("cart-guest").unwrap();
        store.promote_guest_cart("cust-1", Some("cart-m")).unwrap();

        store.clear_cart_refs().unwrap();

        let identity = store.identity().unwrap();
        assert!(identity.effective_cart_id().is_none());
        // Customer identity survives order completion.
        assert_eq!(identity.customer_id.as_deref(), Some("cust-1"));
    }

    #[test]
    fn test_pending_order_roundtrip() {
        use crate::types::{Address, PendingGatewayOrder};
        use hearthside_core::{CurrencyCode, Money};
        use rust_decimal::Decimal;

        let store = store();
        assert!(store.load_pending_order().unwrap().is_none());

        let pending = PendingGatewayOrder {
            order_reference: "HS-1234567890".to_owned(),
            email: "asha@gmail.com".to_owned(),
            address: Address::default(),
            lines: Vec::new(),
            total: Money::new(Decimal::from(620), CurrencyCode::INR),
        };
        store.save_pending_order(&pending).unwrap();
        assert_eq!(store.load_pending_order().unwrap(), Some(pending));

        store.clear_pending_order().unwrap();
        assert!(store.load_pending_order().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_pending_order_reported() {
        let kv = InMemoryStore::new();
        kv.set(keys::PENDING_GATEWAY_ORDER, "not json").unwrap();
        let store = IdentityStore::new(Box::new(kv));

        assert!(matches!(
            store.load_pending_order(),
            Err(StorageError::Corrupt { .. })
        ));
    }
}
