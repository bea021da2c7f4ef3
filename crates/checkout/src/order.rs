//! Order payload construction.
//!
//! Pure builders for the two payment paths. The flow owns sequencing and the
//! in-flight guard; everything here is a value transformation so the gateway
//! redirect can be tested without a DOM.

use rand::Rng;

use hearthside_core::Money;

use crate::backend::PaymentSession;
use crate::types::{Address, Cart, CartLine, OrderLine, PendingGatewayOrder, RedirectDescriptor};

/// Prefix for locally generated gateway order references.
const ORDER_REFERENCE_PREFIX: &str = "HS";

/// Flatten cart lines into order submission lines.
#[must_use]
pub fn order_lines(cart: &Cart) -> Vec<OrderLine> {
    cart.lines.iter().map(order_line).collect()
}

fn order_line(line: &CartLine) -> OrderLine {
    OrderLine {
        merchandise_id: line.merchandise_id.clone(),
        quantity: line.quantity,
        unit_price: line.unit_price,
    }
}

/// Generate a human-readable order reference, e.g. `HS-1837465920`.
///
/// Carried through the gateway redirect so the pending order can be matched
/// when the browser returns.
#[must_use]
pub fn generate_order_reference() -> String {
    let mut rng = rand::rng();
    let digits: u64 = rng.random_range(1_000_000_000..10_000_000_000);
    format!("{ORDER_REFERENCE_PREFIX}-{digits}")
}

/// Build the pending-order payload persisted before transferring control to
/// the gateway.
#[must_use]
pub fn build_pending_order(
    order_reference: String,
    email: &str,
    address: &Address,
    cart: &Cart,
    total: Money,
) -> PendingGatewayOrder {
    PendingGatewayOrder {
        order_reference,
        email: email.to_owned(),
        address: address.clone(),
        lines: order_lines(cart),
        total,
    }
}

/// Turn payment-initiation parameters into a redirect descriptor.
///
/// The descriptor models a same-origin-method, cross-origin-target form
/// submission; the platform shell performs the actual navigation. No response
/// is awaited - control leaves the application.
#[must_use]
pub fn build_redirect(session: PaymentSession) -> RedirectDescriptor {
    RedirectDescriptor {
        url: session.action_url,
        method: "POST",
        fields: session.fields,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hearthside_core::CurrencyCode;
    use rust_decimal::Decimal;

    fn cart() -> Cart {
        Cart {
            id: "cart-1".to_owned(),
            lines: vec![
                CartLine {
                    id: "line-1".to_owned(),
                    merchandise_id: "var-1".to_owned(),
                    title: "Millet Crunch".to_owned(),
                    unit_price: Money::new(Decimal::from(150), CurrencyCode::INR),
                    quantity: 2,
                },
                CartLine {
                    id: "line-2".to_owned(),
                    merchandise_id: "var-2".to_owned(),
                    title: "Jaggery Bites".to_owned(),
                    unit_price: Money::new(Decimal::from(20), CurrencyCode::INR),
                    quantity: 1,
                },
            ],
            checkout_url: None,
        }
    }

    #[test]
    fn test_order_lines_preserve_order_and_quantities() {
        let lines = order_lines(&cart());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].merchandise_id, "var-1");
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[1].merchandise_id, "var-2");
    }

    #[test]
    fn test_order_reference_shape() {
        let reference = generate_order_reference();
        let (prefix, digits) = reference.split_once('-').unwrap();
        assert_eq!(prefix, "HS");
        assert_eq!(digits.len(), 10);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_build_redirect_is_post_with_fields() {
        let session = PaymentSession {
            action_url: "https://pay.example/submit".to_owned(),
            fields: vec![
                ("txn".to_owned(), "t-1".to_owned()),
                ("checksum".to_owned(), "abc".to_owned()),
            ],
        };
        let redirect = build_redirect(session);
        assert_eq!(redirect.url, "https://pay.example/submit");
        assert_eq!(redirect.method, "POST");
        assert_eq!(redirect.fields.len(), 2);
        assert_eq!(redirect.fields[0].0, "txn");
    }

    #[test]
    fn test_pending_order_snapshot() {
        let cart = cart();
        let total = Money::new(Decimal::from(320), CurrencyCode::INR);
        let pending = build_pending_order(
            "HS-1234567890".to_owned(),
            "asha@gmail.com",
            &Address::default(),
            &cart,
            total,
        );
        assert_eq!(pending.order_reference, "HS-1234567890");
        assert_eq!(pending.lines.len(), 2);
        assert_eq!(pending.total, total);
    }
}
