//! Shipping/tax breakdown from a tax-inclusive subtotal.
//!
//! Prices in the storefront are tax-inclusive: the tax line is informational
//! and never adds to the total. The breakdown is a pure function of its
//! inputs, so identical address/cart pairs always produce identical results;
//! the flow owns invalidating a stored result when any input changes.

use rust_decimal::Decimal;

use hearthside_core::{CurrencyCode, Money};

use crate::types::{BackendCalculation, CalculationResult, ShippingQuote};

/// Derive the displayed pricing summary from the backend's quote.
///
/// Steps:
/// 1. The included tax percent is derived against the tax-excluded base:
///    `tax / (subtotal - tax) * 100`.
/// 2. The percent is doubled and base/tax recomputed from the doubled
///    percent. This matches observed production behavior (possibly
///    reconstructing a two-component tax split); it is preserved as-is
///    pending product-owner clarification.
/// 3. Shipping is taken from the quote unless the subtotal reaches
///    `free_shipping_threshold`, in which case it is forced to zero.
/// 4. `total = subtotal + shipping`; tax is already inside the subtotal.
#[must_use]
pub fn compute_breakdown(
    subtotal: Decimal,
    backend: &BackendCalculation,
    free_shipping_threshold: Decimal,
    currency: CurrencyCode,
) -> CalculationResult {
    let quoted_tax = backend.tax.amount;

    let included_percent = included_tax_percent(subtotal, quoted_tax);
    let effective_percent = included_percent * Decimal::TWO;

    // Recompute base and tax from the doubled percent.
    let divisor = Decimal::ONE + effective_percent / Decimal::ONE_HUNDRED;
    let base = if divisor.is_zero() {
        subtotal
    } else {
        subtotal / divisor
    };
    let tax_amount = subtotal - base;

    let shipping_price = if subtotal >= free_shipping_threshold {
        Decimal::ZERO
    } else {
        backend.shipping.price.amount
    };

    CalculationResult {
        shipping: ShippingQuote {
            title: backend.shipping.title.clone(),
            price: Money::new(shipping_price, currency),
        },
        tax: Money::new(tax_amount, currency),
        tax_percent: effective_percent,
        total: Money::new(subtotal + shipping_price, currency),
    }
}

/// Percent of the tax-excluded base represented by the included tax amount.
///
/// Returns zero when the base would be zero or negative.
fn included_tax_percent(subtotal: Decimal, tax: Decimal) -> Decimal {
    let base = subtotal - tax;
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    tax / base * Decimal::ONE_HUNDRED
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn quote(shipping: i64, tax: i64) -> BackendCalculation {
        BackendCalculation {
            shipping: ShippingQuote {
                title: "Standard".to_owned(),
                price: Money::new(Decimal::from(shipping), CurrencyCode::INR),
            },
            tax: Money::new(Decimal::from(tax), CurrencyCode::INR),
        }
    }

    #[test]
    fn test_free_shipping_at_threshold() {
        // subtotal 620, quoted shipping 60: shipping forced to 0, total 620.
        let result = compute_breakdown(
            Decimal::from(620),
            &quote(60, 20),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert!(result.shipping.price.is_zero());
        assert_eq!(result.total.amount, Decimal::from(620));
    }

    #[test]
    fn test_shipping_charged_below_threshold() {
        // subtotal 300, quoted shipping 60: shipping stays 60, total 360.
        let result = compute_breakdown(
            Decimal::from(300),
            &quote(60, 20),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(result.shipping.price.amount, Decimal::from(60));
        assert_eq!(result.total.amount, Decimal::from(360));
    }

    #[test]
    fn test_exactly_at_threshold_is_free() {
        let result = compute_breakdown(
            Decimal::from(500),
            &quote(60, 20),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert!(result.shipping.price.is_zero());
        assert_eq!(result.total.amount, Decimal::from(500));
    }

    #[test]
    fn test_tax_percent_is_doubled() {
        // subtotal 110, tax 10: included percent = 10/100*100 = 10%,
        // doubled to 20%; base = 110/1.2, tax = 110 - base.
        let result = compute_breakdown(
            Decimal::from(110),
            &quote(60, 10),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(result.tax_percent, Decimal::from(20));

        let expected_base = Decimal::from(110) / Decimal::new(12, 1);
        let expected_tax = Decimal::from(110) - expected_base;
        assert_eq!(result.tax.amount, expected_tax);
    }

    #[test]
    fn test_tax_does_not_add_to_total() {
        let result = compute_breakdown(
            Decimal::from(300),
            &quote(60, 30),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(result.total.amount, Decimal::from(360));
        assert!(!result.tax.is_zero());
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let backend = quote(60, 17);
        let first = compute_breakdown(
            Decimal::from(433),
            &backend,
            Decimal::from(500),
            CurrencyCode::INR,
        );
        let second = compute_breakdown(
            Decimal::from(433),
            &backend,
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_tax_quote() {
        let result = compute_breakdown(
            Decimal::from(300),
            &quote(60, 0),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(result.tax_percent, Decimal::ZERO);
        assert!(result.tax.is_zero());
        assert_eq!(result.total.amount, Decimal::from(360));
    }

    #[test]
    fn test_degenerate_tax_equal_to_subtotal() {
        // Base would be zero; percent clamps to zero instead of dividing by it.
        let result = compute_breakdown(
            Decimal::from(50),
            &quote(60, 50),
            Decimal::from(500),
            CurrencyCode::INR,
        );
        assert_eq!(result.tax_percent, Decimal::ZERO);
        assert!(result.tax.is_zero());
    }
}
