//! Data model for the cart/checkout subsystem.
//!
//! The cart itself is owned by the commerce backend; the client only holds a
//! reference id and the snapshot returned by the last fetch. Everything here
//! serializes with the backend's camelCase field names.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use hearthside_core::Money;

// ─────────────────────────────────────────────────────────────────────────────
// Checkout steps
// ─────────────────────────────────────────────────────────────────────────────

/// The four steps of the checkout flow.
///
/// Discriminants match the step indices used by the funnel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    /// Reviewing the cart contents.
    #[default]
    Cart = 0,
    /// Entering a phone number for OTP login.
    LoginPhone = 1,
    /// Entering the dispatched OTP.
    LoginOtp = 2,
    /// Address form, pricing summary, and payment selection.
    Checkout = 3,
}

impl CheckoutStep {
    /// Numeric step index, as reported to the funnel.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cart
// ─────────────────────────────────────────────────────────────────────────────

/// A single cart line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartLine {
    /// The line's unique ID within the cart.
    pub id: String,
    /// The purchasable variant this line refers to.
    #[serde(rename = "merchandiseId")]
    pub merchandise_id: String,
    /// Display title for the merchandise.
    pub title: String,
    /// Tax-inclusive unit price.
    #[serde(rename = "unitPrice")]
    pub unit_price: Money,
    /// Quantity of units.
    pub quantity: u32,
}

impl CartLine {
    /// Tax-inclusive line total (unit price x quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount * Decimal::from(self.quantity)
    }
}

/// A cart snapshot fetched from the commerce backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cart {
    /// The backend cart ID.
    pub id: String,
    /// Ordered cart lines.
    pub lines: Vec<CartLine>,
    /// Hosted checkout URL, when the backend provides one.
    #[serde(rename = "checkoutUrl")]
    pub checkout_url: Option<String>,
}

impl Cart {
    /// Tax-inclusive subtotal over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Result of fetching a cart by ID.
#[derive(Debug, Clone)]
pub enum CartStatus {
    /// The cart exists and is usable.
    Active(Cart),
    /// The backend reported the cart reference as expired.
    Expired,
}

// ─────────────────────────────────────────────────────────────────────────────
// Address
// ─────────────────────────────────────────────────────────────────────────────

/// A shipping address, as edited by the checkout form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// First name.
    #[serde(rename = "firstName")]
    pub first_name: String,
    /// Last name.
    #[serde(rename = "lastName")]
    pub last_name: String,
    /// Address line 1.
    pub address1: String,
    /// Address line 2.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    /// City.
    pub city: String,
    /// Province/state.
    pub province: String,
    /// Province/state code.
    #[serde(rename = "provinceCode")]
    pub province_code: String,
    /// Country.
    pub country: String,
    /// Postal/ZIP code.
    pub zip: String,
    /// Contact phone number.
    pub phone: String,
    /// Whether this was the customer's default address.
    #[serde(rename = "isDefault", default)]
    pub is_default: bool,
}

impl Address {
    /// Required fields checked by [`Address::first_missing_field`].
    ///
    /// `address2` and `province_code` are optional; everything else must be
    /// non-empty before a price calculation may be attempted.
    const REQUIRED: &'static [(&'static str, fn(&Self) -> &str)] = &[
        ("firstName", |a| &a.first_name),
        ("lastName", |a| &a.last_name),
        ("address1", |a| &a.address1),
        ("city", |a| &a.city),
        ("province", |a| &a.province),
        ("country", |a| &a.country),
        ("zip", |a| &a.zip),
        ("phone", |a| &a.phone),
    ];

    /// The first required field that is empty, if any.
    #[must_use]
    pub fn first_missing_field(&self) -> Option<&'static str> {
        Self::REQUIRED
            .iter()
            .find(|(_, get)| get(self).trim().is_empty())
            .map(|(name, _)| *name)
    }

    /// Whether every required field is non-empty.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_missing_field().is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Pricing
// ─────────────────────────────────────────────────────────────────────────────

/// A shipping quote from the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShippingQuote {
    /// Display title for the shipping method.
    pub title: String,
    /// Quoted shipping price.
    pub price: Money,
}

/// Raw shipping/tax response from `shipping.calculate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendCalculation {
    /// Quoted shipping method and price.
    pub shipping: ShippingQuote,
    /// Tax amount already included in the subtotal.
    pub tax: Money,
}

/// A derived pricing summary, consistent with its last-known inputs.
///
/// Invalidated (set back to `None` on the flow) whenever address fields or
/// cart contents change, so a stale summary is never displayed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CalculationResult {
    /// Shipping method and the effective (possibly zeroed) charge.
    pub shipping: ShippingQuote,
    /// Informational tax amount included in the subtotal.
    pub tax: Money,
    /// Effective tax percent the amount was derived from.
    #[serde(rename = "taxPercent")]
    pub tax_percent: Decimal,
    /// Subtotal plus effective shipping. Tax does not add to this.
    pub total: Money,
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders and payment
// ─────────────────────────────────────────────────────────────────────────────

/// Supported payment paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Pay on delivery; order is placed directly with the backend.
    CashOnDelivery,
    /// External payment gateway; control leaves the application.
    Gateway,
}

/// A cart line flattened for order submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    /// The purchasable variant.
    #[serde(rename = "merchandiseId")]
    pub merchandise_id: String,
    /// Quantity of units.
    pub quantity: u32,
    /// Tax-inclusive unit price.
    #[serde(rename = "unitPrice")]
    pub unit_price: Money,
}

/// Confirmation destination after a successful cash-on-delivery order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    /// Human-readable order id from the backend.
    pub order_id: String,
    /// Tax-inclusive order total.
    pub total: Money,
}

/// A structured cross-origin form submission for the gateway redirect.
///
/// The orchestrator never touches a DOM; the platform shell builds and
/// submits the actual form from this descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDescriptor {
    /// Target URL on the payment gateway.
    pub url: String,
    /// Form method, always `POST`.
    pub method: &'static str,
    /// Form fields, in submission order.
    pub fields: Vec<(String, String)>,
}

/// Pending-order payload persisted before transferring control to the
/// gateway, so the order can be recovered if the browser returns mid-flow.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingGatewayOrder {
    /// Locally generated order reference carried through the redirect.
    #[serde(rename = "orderReference")]
    pub order_reference: String,
    /// Customer email.
    pub email: String,
    /// Shipping address at submission time.
    pub address: Address,
    /// Flattened order lines.
    pub lines: Vec<OrderLine>,
    /// Computed tax-inclusive total.
    pub total: Money,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hearthside_core::CurrencyCode;

    fn line(unit: i64, quantity: u32) -> CartLine {
        CartLine {
            id: format!("line-{unit}-{quantity}"),
            merchandise_id: "var-1".to_owned(),
            title: "Millet Crunch".to_owned(),
            unit_price: Money::new(Decimal::from(unit), CurrencyCode::INR),
            quantity,
        }
    }

    #[test]
    fn test_step_indices() {
        assert_eq!(CheckoutStep::Cart.index(), 0);
        assert_eq!(CheckoutStep::LoginPhone.index(), 1);
        assert_eq!(CheckoutStep::LoginOtp.index(), 2);
        assert_eq!(CheckoutStep::Checkout.index(), 3);
    }

    #[test]
    fn test_cart_subtotal_and_quantity() {
        let cart = Cart {
            id: "cart-1".to_owned(),
            lines: vec![line(150, 2), line(20, 1)],
            checkout_url: None,
        };
        assert_eq!(cart.subtotal(), Decimal::from(320));
        assert_eq!(cart.total_quantity(), 3);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_address_completeness() {
        let mut address = Address {
            first_name: "Asha".to_owned(),
            last_name: "Rao".to_owned(),
            address1: "12 Lake Road".to_owned(),
            address2: None,
            city: "Pune".to_owned(),
            province: "Maharashtra".to_owned(),
            province_code: String::new(),
            country: "India".to_owned(),
            zip: "411001".to_owned(),
            phone: "9876543210".to_owned(),
            is_default: false,
        };
        assert!(address.is_complete());

        address.city = "  ".to_owned();
        assert_eq!(address.first_missing_field(), Some("city"));
        assert!(!address.is_complete());
    }

    #[test]
    fn test_address_default_is_incomplete() {
        assert!(!Address::default().is_complete());
    }
}
