//! Commerce backend API client.
//!
//! The catalog, cart storage, order fulfillment, and OTP delivery all live in
//! the external commerce backend. This module defines the endpoint surface the
//! checkout consumes ([`CommerceBackend`]) and its HTTP implementation
//! ([`HttpBackend`]). Tests implement the trait with an in-memory fake.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use hearthside_core::{OtpCode, Phone};

use crate::config::CheckoutConfig;
use crate::types::{
    Address, BackendCalculation, Cart, CartLine, CartStatus, OrderLine, PaymentMethod,
    PendingGatewayOrder,
};

/// Errors that can occur when calling the commerce backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        message: String,
    },

    /// API answered 2xx but reported the operation as unsuccessful.
    #[error("rejected: {0}")]
    Rejected(String),

    /// Failed to parse a response body.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result of a successful OTP verification.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpVerification {
    /// The authenticated customer id.
    pub customer_id: String,
    /// The merged cart id, when the backend reconciled the guest cart.
    pub merged_cart_id: Option<String>,
}

/// Order submission payload for `orders.create`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Store display name, for multi-store order attribution.
    #[serde(rename = "storeName")]
    pub store_name: String,
    /// Customer email.
    pub email: String,
    /// Shipping address.
    pub address: Address,
    /// Flattened order lines.
    pub lines: Vec<OrderLine>,
    /// Selected payment path.
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    /// Checkout session id, for backend-side funnel correlation.
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Acknowledgement of a placed order.
#[derive(Debug, Clone)]
pub struct OrderReceipt {
    /// Human-readable order id.
    pub order_id: String,
}

/// Payment-initiation parameters for the gateway redirect.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// Gateway form action URL.
    pub action_url: String,
    /// Form parameters, in submission order.
    pub fields: Vec<(String, String)>,
}

/// The commerce backend surface consumed by the checkout flow.
///
/// One method per endpoint; see the HTTP paths on [`HttpBackend`].
#[allow(async_fn_in_trait)] // consumed generically, never as dyn
pub trait CommerceBackend {
    /// Fetch a cart by id, scoped to a customer when one is known.
    async fn cart_get(
        &self,
        customer_id: Option<&str>,
        cart_id: &str,
    ) -> Result<CartStatus, BackendError>;

    /// Change a line's quantity.
    async fn cart_update_line(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
    ) -> Result<Cart, BackendError>;

    /// Remove a line.
    async fn cart_remove_line(&self, cart_id: &str, line_id: &str) -> Result<Cart, BackendError>;

    /// Delete the cart after a successful order.
    async fn cart_delete(&self, cart_id: &str) -> Result<(), BackendError>;

    /// Fetch the customer profile with addresses.
    ///
    /// The address collection shape varies by backend version, so the raw
    /// JSON value is returned and normalized by [`crate::address`].
    async fn profile_get(&self, customer_id: &str) -> Result<serde_json::Value, BackendError>;

    /// Quote shipping and included tax for an address and cart lines.
    async fn shipping_calculate(
        &self,
        address: &Address,
        lines: &[CartLine],
    ) -> Result<BackendCalculation, BackendError>;

    /// Place an order.
    async fn order_create(&self, order: &OrderRequest) -> Result<OrderReceipt, BackendError>;

    /// Dispatch an OTP to a validated mobile number.
    async fn send_otp(&self, phone: &Phone) -> Result<(), BackendError>;

    /// Verify an OTP; passes the guest cart id so the backend can merge it.
    async fn verify_otp(
        &self,
        phone: &Phone,
        code: &OtpCode,
        guest_cart_id: Option<&str>,
    ) -> Result<OtpVerification, BackendError>;

    /// Request payment-initiation parameters for the gateway redirect.
    async fn payment_initiate(
        &self,
        pending: &PendingGatewayOrder,
    ) -> Result<PaymentSession, BackendError>;
}

/// HTTP client for the commerce backend.
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a new backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build or the API token
    /// is not a valid header value.
    pub fn new(config: &CheckoutConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.backend_api_token.expose_secret());
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|e| BackendError::Parse(format!("invalid API token format: {e}")))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_base_url.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{path}")
    }

    /// POST a JSON body and decode a JSON response.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BackendError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))
    }
}

impl CommerceBackend for HttpBackend {
    async fn cart_get(
        &self,
        customer_id: Option<&str>,
        cart_id: &str,
    ) -> Result<CartStatus, BackendError> {
        let body = serde_json::json!({
            "customerId": customer_id,
            "cartId": cart_id,
        });
        let response: CartGetResponse = self.post("cart/get", &body).await?;

        if response.expired {
            return Ok(CartStatus::Expired);
        }
        response
            .cart
            .map(CartStatus::Active)
            .ok_or_else(|| BackendError::Parse("cart.get returned neither cart nor expired".into()))
    }

    async fn cart_update_line(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
    ) -> Result<Cart, BackendError> {
        let body = serde_json::json!({
            "cartId": cart_id,
            "lineId": line_id,
            "quantity": quantity,
        });
        let response: CartMutationResponse = self.post("cart/update", &body).await?;
        Ok(response.cart)
    }

    async fn cart_remove_line(&self, cart_id: &str, line_id: &str) -> Result<Cart, BackendError> {
        let body = serde_json::json!({
            "cartId": cart_id,
            "lineId": line_id,
        });
        let response: CartMutationResponse = self.post("cart/remove", &body).await?;
        Ok(response.cart)
    }

    async fn cart_delete(&self, cart_id: &str) -> Result<(), BackendError> {
        let body = serde_json::json!({ "cartId": cart_id });
        let _: AckResponse = self.post("cart/delete", &body).await?;
        Ok(())
    }

    async fn profile_get(&self, customer_id: &str) -> Result<serde_json::Value, BackendError> {
        let body = serde_json::json!({ "customerId": customer_id });
        let response: ProfileGetResponse = self.post("profile/get", &body).await?;
        Ok(response.customer)
    }

    async fn shipping_calculate(
        &self,
        address: &Address,
        lines: &[CartLine],
    ) -> Result<BackendCalculation, BackendError> {
        let body = serde_json::json!({
            "address": address,
            "lines": lines,
        });
        self.post("shipping/calculate", &body).await
    }

    async fn order_create(&self, order: &OrderRequest) -> Result<OrderReceipt, BackendError> {
        let body = serde_json::to_value(order).map_err(|e| BackendError::Parse(e.to_string()))?;
        let response: OrderCreateResponse = self.post("orders/create", &body).await?;

        if !response.success {
            return Err(BackendError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "order was not accepted".to_owned()),
            ));
        }
        response
            .order_id
            .map(|order_id| OrderReceipt { order_id })
            .ok_or_else(|| BackendError::Parse("orders.create succeeded without an id".into()))
    }

    async fn send_otp(&self, phone: &Phone) -> Result<(), BackendError> {
        let body = serde_json::json!({ "phone": phone.as_str() });
        let response: AckResponse = self.post("auth/send-otp", &body).await?;

        if !response.success {
            return Err(BackendError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "OTP dispatch failed".to_owned()),
            ));
        }
        Ok(())
    }

    async fn verify_otp(
        &self,
        phone: &Phone,
        code: &OtpCode,
        guest_cart_id: Option<&str>,
    ) -> Result<OtpVerification, BackendError> {
        let body = serde_json::json!({
            "phone": phone.as_str(),
            "otp": code.as_str(),
            "guestCartId": guest_cart_id,
        });
        let response: VerifyOtpResponse = self.post("auth/verify-otp", &body).await?;

        if !response.success {
            return Err(BackendError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "OTP verification failed".to_owned()),
            ));
        }
        let customer_id = response
            .customer_id
            .ok_or_else(|| BackendError::Parse("verify-otp succeeded without a customer".into()))?;
        Ok(OtpVerification {
            customer_id,
            merged_cart_id: response.merged_cart_id,
        })
    }

    async fn payment_initiate(
        &self,
        pending: &PendingGatewayOrder,
    ) -> Result<PaymentSession, BackendError> {
        let body =
            serde_json::to_value(pending).map_err(|e| BackendError::Parse(e.to_string()))?;
        let response: PaymentInitiateResponse = self.post("payment/initiate", &body).await?;
        Ok(PaymentSession {
            action_url: response.action_url,
            fields: response.fields.into_iter().map(Into::into).collect(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire response types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CartGetResponse {
    cart: Option<Cart>,
    #[serde(default)]
    expired: bool,
}

#[derive(Debug, Deserialize)]
struct CartMutationResponse {
    cart: Cart,
}

#[derive(Debug, Deserialize)]
struct AckResponse {
    #[serde(default = "default_true")]
    success: bool,
    message: Option<String>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ProfileGetResponse {
    customer: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OrderCreateResponse {
    success: bool,
    #[serde(rename = "orderId")]
    order_id: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyOtpResponse {
    success: bool,
    #[serde(rename = "customerId")]
    customer_id: Option<String>,
    #[serde(rename = "mergedCartId")]
    merged_cart_id: Option<String>,
    message: Option<String>,
}

/// Gateway parameters arrive as an ordered list of `{name, value}` pairs.
#[derive(Debug, Deserialize)]
struct PaymentInitiateResponse {
    #[serde(rename = "actionUrl")]
    action_url: String,
    fields: Vec<PaymentField>,
}

#[derive(Debug, Deserialize)]
struct PaymentField {
    name: String,
    value: String,
}

impl From<PaymentField> for (String, String) {
    fn from(field: PaymentField) -> Self {
        (field.name, field.value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_get_response_shapes() {
        let active: CartGetResponse = serde_json::from_str(
            r#"{"cart":{"id":"c1","lines":[],"checkoutUrl":null}}"#,
        )
        .unwrap();
        assert!(!active.expired);
        assert_eq!(active.cart.unwrap().id, "c1");

        let expired: CartGetResponse = serde_json::from_str(r#"{"cart":null,"expired":true}"#)
            .unwrap();
        assert!(expired.expired);
    }

    #[test]
    fn test_verify_otp_response() {
        let ok: VerifyOtpResponse = serde_json::from_str(
            r#"{"success":true,"customerId":"cust-1","mergedCartId":"cart-m"}"#,
        )
        .unwrap();
        assert!(ok.success);
        assert_eq!(ok.customer_id.as_deref(), Some("cust-1"));
        assert_eq!(ok.merged_cart_id.as_deref(), Some("cart-m"));

        let failed: VerifyOtpResponse =
            serde_json::from_str(r#"{"success":false,"message":"wrong code"}"#).unwrap();
        assert!(!failed.success);
        assert!(failed.customer_id.is_none());
    }

    #[test]
    fn test_payment_fields_preserve_order() {
        let response: PaymentInitiateResponse = serde_json::from_str(
            r#"{
                "actionUrl": "https://pay.example/submit",
                "fields": [
                    {"name": "txn", "value": "t-1"},
                    {"name": "amount", "value": "620.00"},
                    {"name": "checksum", "value": "abc"}
                ]
            }"#,
        )
        .unwrap();

        let fields: Vec<(String, String)> = response.fields.into_iter().map(Into::into).collect();
        assert_eq!(fields[0].0, "txn");
        assert_eq!(fields[1], ("amount".to_owned(), "620.00".to_owned()));
        assert_eq!(fields[2].0, "checksum");
    }

    #[test]
    fn test_order_request_serializes_camel_case() {
        let order = OrderRequest {
            store_name: "Hearthside Foods".to_owned(),
            email: "asha@gmail.com".to_owned(),
            address: Address::default(),
            lines: Vec::new(),
            payment_method: PaymentMethod::CashOnDelivery,
            session_id: "sess-1".to_owned(),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["storeName"], "Hearthside Foods");
        assert_eq!(json["paymentMethod"], "cash_on_delivery");
        assert_eq!(json["sessionId"], "sess-1");
    }
}
