//----------------------------------------------   Webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use serde_json::json;
use storefront_payment_engine::{db_types::PaymentRef, CheckoutDatabase, OrderFlowApi, PaymentGatewayError};

use crate::{
    config::StripeConfig,
    errors::ServerError,
    integrations::stripe::{verify_webhook_signature, EventKind, WebhookEvent, SIGNATURE_HEADER},
    route,
};

route!(stripe_webhook => Post "/webhook/stripe" impl CheckoutDatabase);
/// Ingestion point for the payment provider's asynchronous events.
///
/// Nothing in the request is trusted until the signature over the raw body verifies against the shared webhook
/// secret. After that, payment-succeeded and payment-failed events transition the named payment (and its order)
/// atomically; every other event type is acknowledged and ignored so the provider can add event kinds without
/// breaking us. Redeliveries of an event the store has already applied are no-ops.
pub async fn stripe_webhook<B>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B>>,
    config: web::Data<StripeConfig>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutDatabase,
{
    trace!("🔔️ Received webhook request: {}", req.uri());
    if config.signature_checks {
        let signature = req
            .headers()
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServerError::InvalidWebhookSignature("No signature header found in request.".to_string()))?;
        verify_webhook_signature(config.webhook_secret.reveal(), signature, &body, config.signature_tolerance)?;
        trace!("🔔️ Webhook signature check ✅️");
    } else {
        trace!("🔔️ Webhook signature checks are disabled. Allowing request.");
    }
    let event = WebhookEvent::from_payload(&body)?;
    let payment_ref = PaymentRef::from(event.payment_id());
    let outcome = match event.kind() {
        EventKind::PaymentSucceeded => Some(api.confirm_payment(&payment_ref).await),
        EventKind::PaymentFailed => Some(api.fail_payment(&payment_ref).await),
        EventKind::Other => {
            debug!("🔔️ Ignoring {} event", event.event_type);
            None
        },
    };
    if let Some(result) = outcome {
        match result {
            Ok(update) if update.changed => {
                info!("🔔️ Payment {payment_ref} is now {}. Order #{} follows.", update.payment.status, update.order.id)
            },
            Ok(_) => debug!("🔔️ {} event for {payment_ref} was a replay. No state was changed.", event.event_type),
            Err(PaymentGatewayError::PaymentNotFound(_)) => {
                // The provider knows a payment id we never created. That is a reconciliation/provider desync and
                // must be observable, not quietly acknowledged.
                error!("🔔️ Received a {} event for unknown payment {payment_ref}", event.event_type);
                return Err(ServerError::PaymentDesync(format!("No payment exists with reference {payment_ref}")));
            },
            Err(e) => {
                warn!("🔔️ Could not apply {} event for {payment_ref}. {e}", event.event_type);
                return Err(e.into());
            },
        }
    }
    Ok(HttpResponse::Ok().json(json!({ "status": "success" })))
}
