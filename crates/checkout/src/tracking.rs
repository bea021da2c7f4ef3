//! Best-effort funnel analytics.
//!
//! Tracking marks checkout progress and is never required for correctness:
//! emission happens at state transitions, observes them without gating them,
//! and every failure is swallowed. The preferred transport is a non-blocking
//! beacon that survives page unload; when the platform has none, a plain
//! network call is made and forgotten.

use std::sync::Arc;

use serde::Serialize;
use url::Url;

use crate::config::CheckoutConfig;
use crate::types::CheckoutStep;

/// Funnel events emitted at state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunnelEvent {
    /// A checkout session was started (entering the checkout step).
    CheckoutStarted,
    /// The phone login screen was shown.
    LoginShown,
    /// An OTP was dispatched.
    OtpSent,
    /// An OTP was verified.
    OtpVerified,
    /// A payment method was selected.
    PaymentSelected,
    /// An order was submitted.
    OrderPlaced,
}

/// A single tracking payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TrackingPayload {
    /// The funnel event.
    pub event: FunnelEvent,
    /// Current checkout session id, when one exists.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    /// Numeric step index at emission time.
    pub step: u8,
}

/// Transport for tracking payloads.
///
/// Both methods are infallible from the caller's perspective; transports
/// swallow their own failures.
pub trait TrackingTransport: Send + Sync {
    /// Hand the payload to an unload-surviving, non-blocking channel.
    ///
    /// Returns `false` when no such channel is available, in which case the
    /// caller falls back to [`TrackingTransport::send`].
    fn beacon(&self, payload: &TrackingPayload) -> bool;

    /// Fire a best-effort network call and forget it.
    fn send(&self, payload: &TrackingPayload);
}

/// Funnel tracking emitter.
#[derive(Clone)]
pub struct FunnelTracker {
    transport: Arc<dyn TrackingTransport>,
}

impl FunnelTracker {
    /// Create a tracker over a transport.
    #[must_use]
    pub fn new(transport: Arc<dyn TrackingTransport>) -> Self {
        Self { transport }
    }

    /// A tracker that drops every event (tracking disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTransport))
    }

    /// Build a tracker from configuration: an HTTP transport posting to
    /// `tracking_url` when one is set, otherwise disabled.
    #[must_use]
    pub fn from_config(config: &CheckoutConfig) -> Self {
        config.tracking_url.as_ref().map_or_else(Self::disabled, |endpoint| {
            Self::new(Arc::new(HttpTransport::new(
                reqwest::Client::new(),
                endpoint.clone(),
            )))
        })
    }

    /// Emit an event. Never blocks, never fails.
    pub fn emit(&self, event: FunnelEvent, session_id: Option<&str>, step: CheckoutStep) {
        let payload = TrackingPayload {
            event,
            session_id: session_id.map(str::to_owned),
            step: step.index(),
        };

        if !self.transport.beacon(&payload) {
            self.transport.send(&payload);
        }
    }
}

/// Transport that drops every payload.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransport;

impl TrackingTransport for NoopTransport {
    fn beacon(&self, _payload: &TrackingPayload) -> bool {
        true
    }

    fn send(&self, _payload: &TrackingPayload) {}
}

/// HTTP transport posting to the `tracking.checkout` endpoint.
///
/// There is no beacon channel in a plain HTTP environment, so every payload
/// goes through a detached request whose outcome is logged and dropped.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport posting to the given endpoint.
    #[must_use]
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }
}

impl TrackingTransport for HttpTransport {
    fn beacon(&self, _payload: &TrackingPayload) -> bool {
        false
    }

    fn send(&self, payload: &TrackingPayload) {
        let request = self.client.post(self.endpoint.clone()).json(payload);

        // Detached: the flow never waits on tracking.
        tokio::spawn(async move {
            if let Err(e) = request.send().await {
                tracing::warn!("funnel tracking emission failed: {e}");
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records payloads and reports whether beaconing is available.
    struct RecordingTransport {
        beacon_available: bool,
        beaconed: Mutex<Vec<TrackingPayload>>,
        sent: Mutex<Vec<TrackingPayload>>,
    }

    impl RecordingTransport {
        fn new(beacon_available: bool) -> Self {
            Self {
                beacon_available,
                beaconed: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl TrackingTransport for RecordingTransport {
        fn beacon(&self, payload: &TrackingPayload) -> bool {
            if self.beacon_available {
                self.beaconed.lock().unwrap().push(payload.clone());
            }
            self.beacon_available
        }

        fn send(&self, payload: &TrackingPayload) {
            self.sent.lock().unwrap().push(payload.clone());
        }
    }

    #[test]
    fn test_beacon_preferred() {
        let transport = Arc::new(RecordingTransport::new(true));
        let tracker = FunnelTracker::new(Arc::clone(&transport) as Arc<dyn TrackingTransport>);

        tracker.emit(
            FunnelEvent::CheckoutStarted,
            Some("sess-1"),
            CheckoutStep::Checkout,
        );

        assert_eq!(transport.beaconed.lock().unwrap().len(), 1);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_falls_back_to_send() {
        let transport = Arc::new(RecordingTransport::new(false));
        let tracker = FunnelTracker::new(Arc::clone(&transport) as Arc<dyn TrackingTransport>);

        tracker.emit(FunnelEvent::OtpSent, None, CheckoutStep::LoginOtp);

        assert!(transport.beaconed.lock().unwrap().is_empty());
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].event, FunnelEvent::OtpSent);
        assert_eq!(sent[0].step, 2);
        assert!(sent[0].session_id.is_none());
    }

    #[test]
    fn test_payload_serialization() {
        let payload = TrackingPayload {
            event: FunnelEvent::OrderPlaced,
            session_id: Some("sess-9".to_owned()),
            step: CheckoutStep::Checkout.index(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["event"], "order_placed");
        assert_eq!(json["sessionId"], "sess-9");
        assert_eq!(json["step"], 3);
    }

    #[test]
    fn test_disabled_tracker_drops_silently() {
        let tracker = FunnelTracker::disabled();
        tracker.emit(FunnelEvent::LoginShown, None, CheckoutStep::LoginPhone);
    }

    fn config_with_tracking(tracking_url: Option<Url>) -> CheckoutConfig {
        use hearthside_core::CurrencyCode;
        use rust_decimal::Decimal;
        use secrecy::SecretString;

        CheckoutConfig {
            backend_base_url: "https://api.example.test/v1/".parse().unwrap(),
            backend_api_token: SecretString::from("token-for-tests"),
            store_name: "Hearthside Foods".to_owned(),
            free_shipping_threshold: Decimal::from(500),
            default_country: "India".to_owned(),
            currency: CurrencyCode::INR,
            tracking_url,
        }
    }

    #[test]
    fn test_from_config_without_endpoint_is_disabled() {
        let tracker = FunnelTracker::from_config(&config_with_tracking(None));
        tracker.emit(FunnelEvent::LoginShown, None, CheckoutStep::LoginPhone);
    }

    #[tokio::test]
    async fn test_from_config_with_endpoint_emits_detached() {
        let endpoint: Url = "https://tracking.example.test/checkout".parse().unwrap();
        let tracker = FunnelTracker::from_config(&config_with_tracking(Some(endpoint)));
        // Fire-and-forget against an unreachable endpoint; must not block or fail.
        tracker.emit(
            FunnelEvent::CheckoutStarted,
            Some("sess-1"),
            CheckoutStep::Checkout,
        );
    }
}
