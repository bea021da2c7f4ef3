//! The checkout state machine.
//!
//! Four steps gate which operations may run: `Cart -> LoginPhone -> LoginOtp
//! -> Checkout`, with an authenticated visitor skipping straight from `Cart`
//! to `Checkout` and an explicit back/close action returning to `Cart` from
//! anywhere. The flow is single-threaded and event-driven: every backend
//! interaction is awaited, and the two in-flight flags (`calculating`,
//! `placing_order`) exist to suppress re-entrant triggers, not to synchronize
//! threads.
//!
//! Both the full-page checkout and the cart drawer are thin shells over this
//! one orchestrator.

use tracing::instrument;
use uuid::Uuid;

use hearthside_core::{Email, OtpCode, Phone};

use crate::address::normalize_profile;
use crate::backend::{CommerceBackend, OrderRequest};
use crate::config::CheckoutConfig;
use crate::error::{CheckoutError, Result};
use crate::order;
use crate::pricing;
use crate::store::IdentityStore;
use crate::tracking::{FunnelEvent, FunnelTracker};
use crate::types::{
    Address, CalculationResult, Cart, CartStatus, CheckoutStep, Confirmation, PaymentMethod,
    RedirectDescriptor,
};

/// What a successful place-order produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderOutcome {
    /// Cash-on-delivery order accepted; navigate to confirmation.
    Confirmation(Confirmation),
    /// Gateway payment initiated; submit this form and leave the app.
    Redirect(RedirectDescriptor),
}

/// The cart/checkout orchestrator.
///
/// Holds the current step, the cart snapshot, the address form, and the last
/// pricing calculation. All durable state goes through the [`IdentityStore`];
/// all backend traffic goes through the [`CommerceBackend`].
pub struct CheckoutFlow<B: CommerceBackend> {
    backend: B,
    store: IdentityStore,
    tracker: FunnelTracker,
    config: CheckoutConfig,

    step: CheckoutStep,
    session_id: Option<String>,
    phone: Option<Phone>,
    address: Address,
    address_auto_filled: bool,
    email: String,
    cart: Option<Cart>,
    calculation: Option<CalculationResult>,
    payment_method: Option<PaymentMethod>,

    // In-flight guards; see module docs.
    calculating: bool,
    placing_order: bool,
}

impl<B: CommerceBackend> CheckoutFlow<B> {
    /// Create a flow at the `Cart` step.
    #[must_use]
    pub fn new(
        backend: B,
        store: IdentityStore,
        tracker: FunnelTracker,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            backend,
            store,
            tracker,
            config,
            step: CheckoutStep::Cart,
            session_id: None,
            phone: None,
            address: Address::default(),
            address_auto_filled: false,
            email: String::new(),
            cart: None,
            calculation: None,
            payment_method: None,
            calculating: false,
            placing_order: false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    /// The current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// The current checkout session id, if a checkout attempt is underway.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The last-fetched cart snapshot.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    /// The address form contents.
    #[must_use]
    pub const fn address(&self) -> &Address {
        &self.address
    }

    /// Whether the address form was filled from the profile.
    #[must_use]
    pub const fn was_address_auto_filled(&self) -> bool {
        self.address_auto_filled
    }

    /// The pricing summary for the current address/cart pair, if computed.
    #[must_use]
    pub const fn calculation(&self) -> Option<&CalculationResult> {
        self.calculation.as_ref()
    }

    /// The selected payment method, if any.
    #[must_use]
    pub const fn payment_method(&self) -> Option<PaymentMethod> {
        self.payment_method
    }

    /// Whether a price calculation is in flight.
    #[must_use]
    pub const fn is_calculating(&self) -> bool {
        self.calculating
    }

    /// Whether an order submission is in flight.
    #[must_use]
    pub const fn is_placing_order(&self) -> bool {
        self.placing_order
    }

    /// Whether the send-OTP control should be enabled for this input.
    #[must_use]
    pub fn can_send_otp(input: &str) -> bool {
        Phone::parse(input).is_ok()
    }

    /// Whether the verify control should be enabled for this input.
    #[must_use]
    pub fn can_verify_otp(input: &str) -> bool {
        OtpCode::parse(input).is_ok()
    }

    /// Whether the place-order control should be enabled.
    #[must_use]
    pub const fn can_place_order(&self) -> bool {
        matches!(self.step, CheckoutStep::Checkout)
            && self.calculation.is_some()
            && !self.placing_order
    }

    // ─────────────────────────────────────────────────────────────────────
    // Cart step
    // ─────────────────────────────────────────────────────────────────────

    /// Load the visitor's cart using the stored identity.
    ///
    /// An expired cart reference is dropped and the cart shown empty; a
    /// failed fetch is logged and likewise falls back to empty, so the cart
    /// view always renders.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the identity store cannot be read/written.
    #[instrument(skip(self))]
    pub async fn load_cart(&mut self) -> Result<()> {
        let identity = self.store.identity()?;
        let Some(cart_id) = identity.effective_cart_id() else {
            self.cart = None;
            return Ok(());
        };

        match self
            .backend
            .cart_get(identity.customer_id.as_deref(), cart_id)
            .await
        {
            Ok(CartStatus::Active(cart)) => {
                self.cart = Some(cart);
            }
            Ok(CartStatus::Expired) => {
                tracing::warn!("cart {cart_id} expired, dropping local reference");
                self.store.clear_cart_refs()?;
                self.cart = None;
            }
            Err(e) => {
                tracing::warn!("failed to fetch cart {cart_id}: {e}");
                self.cart = None;
            }
        }
        Ok(())
    }

    /// Change a line's quantity and refresh the cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoCart`] without a loaded cart, or the
    /// backend error from the mutation.
    #[instrument(skip(self))]
    pub async fn update_line(&mut self, line_id: &str, quantity: u32) -> Result<()> {
        let cart_id = self.cart.as_ref().ok_or(CheckoutError::NoCart)?.id.clone();
        let updated = self
            .backend
            .cart_update_line(&cart_id, line_id, quantity)
            .await?;
        self.cart = Some(updated);
        self.invalidate_calculation();
        Ok(())
    }

    /// Remove a line and refresh the cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::NoCart`] without a loaded cart, or the
    /// backend error from the mutation.
    #[instrument(skip(self))]
    pub async fn remove_line(&mut self, line_id: &str) -> Result<()> {
        let cart_id = self.cart.as_ref().ok_or(CheckoutError::NoCart)?.id.clone();
        let updated = self.backend.cart_remove_line(&cart_id, line_id).await?;
        self.cart = Some(updated);
        self.invalidate_calculation();
        Ok(())
    }

    /// Proceed from the cart: straight to `Checkout` for an authenticated
    /// visitor, otherwise to `LoginPhone`.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::WrongStep`] outside the `Cart` step and
    /// [`CheckoutError::NoCart`] without a loaded, non-empty cart.
    #[instrument(skip(self))]
    pub async fn proceed_to_checkout(&mut self) -> Result<()> {
        if self.step != CheckoutStep::Cart {
            return Err(CheckoutError::WrongStep(self.step));
        }
        if self.cart.as_ref().is_none_or(Cart::is_empty) {
            return Err(CheckoutError::NoCart);
        }

        if self.store.identity()?.is_authenticated() {
            self.enter_checkout().await
        } else {
            self.step = CheckoutStep::LoginPhone;
            self.tracker
                .emit(FunnelEvent::LoginShown, None, self.step);
            Ok(())
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // OTP login
    // ─────────────────────────────────────────────────────────────────────

    /// Dispatch an OTP to a 10-digit mobile number; moves to `LoginOtp`.
    ///
    /// Also valid from `LoginOtp` (resend).
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed number (no network call is
    /// made), [`CheckoutError::WrongStep`] outside the login steps, or the
    /// backend error from dispatch.
    #[instrument(skip_all)]
    pub async fn send_otp(&mut self, phone_input: &str) -> Result<()> {
        if !matches!(
            self.step,
            CheckoutStep::LoginPhone | CheckoutStep::LoginOtp
        ) {
            return Err(CheckoutError::WrongStep(self.step));
        }
        let phone = Phone::parse(phone_input)?;

        self.backend.send_otp(&phone).await?;
        self.phone = Some(phone);
        self.step = CheckoutStep::LoginOtp;
        self.tracker
            .emit(FunnelEvent::OtpSent, self.session_id.as_deref(), self.step);
        Ok(())
    }

    /// Verify a 6-digit OTP; on success promotes the guest cart, reloads the
    /// cart and profile, and moves to `Checkout`.
    ///
    /// On failure the flow stays in `LoginOtp` so the code can be re-entered
    /// or resent.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed code (no network call is
    /// made), [`CheckoutError::WrongStep`] outside `LoginOtp`, or the backend
    /// error from verification.
    #[instrument(skip_all)]
    pub async fn verify_otp(&mut self, otp_input: &str) -> Result<()> {
        if self.step != CheckoutStep::LoginOtp {
            return Err(CheckoutError::WrongStep(self.step));
        }
        let Some(phone) = self.phone.clone() else {
            return Err(CheckoutError::WrongStep(self.step));
        };
        let code = OtpCode::parse(otp_input)?;

        let guest_cart_id = self.store.identity()?.guest_cart_id;
        let verification = self
            .backend
            .verify_otp(&phone, &code, guest_cart_id.as_deref())
            .await?;

        // Best-effort merge: a reported merge id replaces the guest cart,
        // otherwise the guest cart is retained as the fallback.
        self.store.promote_guest_cart(
            &verification.customer_id,
            verification.merged_cart_id.as_deref(),
        )?;
        self.tracker.emit(
            FunnelEvent::OtpVerified,
            self.session_id.as_deref(),
            self.step,
        );

        self.load_cart().await?;
        self.enter_checkout().await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Checkout step
    // ─────────────────────────────────────────────────────────────────────

    /// Enter (or re-enter) the `Checkout` step.
    ///
    /// Generates a session id on first entry of a checkout attempt and
    /// re-runs address normalization against the freshest profile on every
    /// entry, so the form never shows data staler than the last successful
    /// profile fetch.
    async fn enter_checkout(&mut self) -> Result<()> {
        self.step = CheckoutStep::Checkout;

        if self.session_id.is_none() {
            let session_id = Uuid::new_v4().to_string();
            self.store.set_session_id(&session_id)?;
            self.session_id = Some(session_id);
            self.tracker.emit(
                FunnelEvent::CheckoutStarted,
                self.session_id.as_deref(),
                self.step,
            );
        }

        self.refresh_address_form().await?;
        Ok(())
    }

    /// Re-run address normalization against a fresh profile fetch.
    ///
    /// A failed fetch or a profile with no address candidate leaves the form
    /// untouched; normalization finding nothing is the empty-state default.
    async fn refresh_address_form(&mut self) -> Result<()> {
        let Some(customer_id) = self.store.identity()?.customer_id else {
            return Ok(());
        };

        match self.backend.profile_get(&customer_id).await {
            Ok(profile) => {
                if let Some(normalized) =
                    normalize_profile(&profile, &self.config.default_country)
                {
                    self.address = normalized.address;
                    self.address_auto_filled = normalized.was_auto_filled;
                    self.invalidate_calculation();
                }
                if self.email.is_empty()
                    && let Some(email) = profile.get("email").and_then(serde_json::Value::as_str)
                {
                    self.email = email.to_owned();
                }
            }
            Err(e) => {
                tracing::warn!("profile fetch failed for {customer_id}: {e}");
            }
        }
        Ok(())
    }

    /// Replace the address form contents. Invalidates the calculation; the
    /// flow does not recompute on its own, so the shell calls
    /// [`CheckoutFlow::recalculate`] after the edit settles.
    pub fn set_address(&mut self, address: Address) {
        self.address = address;
        self.address_auto_filled = false;
        self.invalidate_calculation();
    }

    /// Replace the email field. Invalidates the calculation; as with
    /// [`CheckoutFlow::set_address`], the shell owns triggering
    /// [`CheckoutFlow::recalculate`].
    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_owned();
        self.invalidate_calculation();
    }

    /// Whether the address and email satisfy the completeness invariant that
    /// gates price calculation.
    #[must_use]
    pub fn inputs_complete(&self) -> bool {
        self.address.is_complete() && Email::parse_for_checkout(&self.email).is_ok()
    }

    /// Recompute shipping/tax for the current address/cart pair.
    ///
    /// Shells call this after every form edit; it is a silent no-op (returns
    /// `Ok(false)`) while a calculation is in flight, outside the `Checkout`
    /// step, or while the completeness invariant does not hold, so no network
    /// call is ever made for an incomplete address. Superseded responses are
    /// not cancelled; a slow, stale response can overwrite fresher data
    /// (known last-response-wins risk).
    ///
    /// # Errors
    ///
    /// Returns the backend error if the quote request fails; the previous
    /// calculation stays invalidated.
    #[instrument(skip(self))]
    pub async fn recalculate(&mut self) -> Result<bool> {
        if self.calculating || self.step != CheckoutStep::Checkout || !self.inputs_complete() {
            return Ok(false);
        }
        let Some(cart) = self.cart.clone() else {
            return Ok(false);
        };

        self.calculating = true;
        let response = self
            .backend
            .shipping_calculate(&self.address, &cart.lines)
            .await;
        self.calculating = false;

        let backend_calc = response?;
        self.calculation = Some(pricing::compute_breakdown(
            cart.subtotal(),
            &backend_calc,
            self.config.free_shipping_threshold,
            self.config.currency,
        ));
        Ok(true)
    }

    /// Record the selected payment method.
    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
        self.tracker.emit(
            FunnelEvent::PaymentSelected,
            self.session_id.as_deref(),
            self.step,
        );
    }

    /// Place the order through the selected payment path.
    ///
    /// Returns `Ok(None)` when a submission is already in flight (repeated
    /// clicks are suppressed). On any failure, state is left unchanged so the
    /// action can simply be retried.
    ///
    /// # Errors
    ///
    /// Returns validation errors for a bad email or incomplete address (no
    /// network call is made), state errors when no calculation, cart, or
    /// payment method is present, or the backend error from submission.
    #[instrument(skip(self))]
    pub async fn place_order(&mut self) -> Result<Option<OrderOutcome>> {
        if self.placing_order {
            return Ok(None);
        }
        if self.step != CheckoutStep::Checkout {
            return Err(CheckoutError::WrongStep(self.step));
        }

        let email = Email::parse_for_checkout(&self.email)?;
        if let Some(field) = self.address.first_missing_field() {
            return Err(CheckoutError::IncompleteAddress(field));
        }
        let method = self.payment_method.ok_or(CheckoutError::NoPaymentMethod)?;
        let calculation = self
            .calculation
            .clone()
            .ok_or(CheckoutError::NoCalculation)?;
        let cart = self.cart.clone().ok_or(CheckoutError::NoCart)?;
        if cart.is_empty() {
            return Err(CheckoutError::NoCart);
        }

        self.placing_order = true;
        let result = self
            .submit_order(method, email.as_str(), &cart, &calculation)
            .await;
        self.placing_order = false;
        result.map(Some)
    }

    async fn submit_order(
        &mut self,
        method: PaymentMethod,
        email: &str,
        cart: &Cart,
        calculation: &CalculationResult,
    ) -> Result<OrderOutcome> {
        match method {
            PaymentMethod::CashOnDelivery => {
                let request = OrderRequest {
                    store_name: self.config.store_name.clone(),
                    email: email.to_owned(),
                    address: self.address.clone(),
                    lines: order::order_lines(cart),
                    payment_method: method,
                    session_id: self.session_id.clone().unwrap_or_default(),
                };
                let receipt = self.backend.order_create(&request).await?;

                // The order exists now; cart deletion is best-effort.
                if let Err(e) = self.backend.cart_delete(&cart.id).await {
                    tracing::warn!("failed to delete backend cart {}: {e}", cart.id);
                }
                self.store.clear_cart_refs()?;
                self.store.remember_order(&receipt.order_id)?;
                self.tracker.emit(
                    FunnelEvent::OrderPlaced,
                    self.session_id.as_deref(),
                    self.step,
                );

                let total = calculation.total;
                self.reset_after_order()?;
                Ok(OrderOutcome::Confirmation(Confirmation {
                    order_id: receipt.order_id,
                    total,
                }))
            }
            PaymentMethod::Gateway => {
                let reference = order::generate_order_reference();
                let pending = order::build_pending_order(
                    reference,
                    email,
                    &self.address,
                    cart,
                    calculation.total,
                );
                // Persisted first so the order is recoverable if the browser
                // returns mid-flow.
                self.store.save_pending_order(&pending)?;

                let session = self.backend.payment_initiate(&pending).await?;
                self.tracker.emit(
                    FunnelEvent::OrderPlaced,
                    self.session_id.as_deref(),
                    self.step,
                );
                Ok(OrderOutcome::Redirect(order::build_redirect(session)))
            }
        }
    }

    /// Explicit back/close: return to `Cart`, clearing the session id, the
    /// calculation, and the address form.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the session id cannot be removed.
    pub fn back_to_cart(&mut self) -> Result<()> {
        self.step = CheckoutStep::Cart;
        self.session_id = None;
        self.store.clear_session_id()?;
        self.calculation = None;
        self.address = Address::default();
        self.address_auto_filled = false;
        self.email.clear();
        self.payment_method = None;
        Ok(())
    }

    fn reset_after_order(&mut self) -> Result<()> {
        self.cart = None;
        self.back_to_cart()
    }

    fn invalidate_calculation(&mut self) {
        self.calculation = None;
    }
}
