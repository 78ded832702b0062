use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::db::{self, NewInvoice};
use crate::error::{ApiError, ApiResult};
use crate::gateway::{BillingAddress, Customer, InvoiceDraft};
use crate::handlers::present;
use crate::model::{Event, User};
use crate::server::AppState;
use crate::util::extract_last10_digits;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    /// Minor currency units.
    pub amount: Option<i64>,
    pub event_id: Option<i64>,
    pub mobile_number: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceResponse {
    pub is_ok: bool,
    pub invoice_id: String,
    pub invoice_url: String,
}

/// `POST /api/invoices`
///
/// The gateway is called before anything is written locally, so a local
/// invoice exists only for invoices the gateway accepted. Submissions carry
/// no idempotency key; a retried request issues a second invoice.
#[instrument(skip_all)]
pub async fn create_invoice(
    State(state): State<AppState>,
    body: Result<Json<CreateInvoiceRequest>, JsonRejection>,
) -> ApiResult<Json<CreateInvoiceResponse>> {
    let Json(req) = body.map_err(|e| ApiError::validation(e.body_text()))?;
    let (Some(amount), Some(event_id), Some(raw_mobile)) = (
        req.amount,
        req.event_id,
        present(req.mobile_number.as_deref()),
    ) else {
        return Err(ApiError::validation(
            "amount, eventId and mobileNumber are required",
        ));
    };
    if amount <= 0 {
        return Err(ApiError::validation("amount must be positive"));
    }

    let mobile = extract_last10_digits(raw_mobile);
    if mobile.is_empty() {
        return Err(ApiError::validation("mobileNumber must contain digits"));
    }
    let user = db::find_user_by_mobile(&state.pool, &mobile)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    let event = db::find_event(&state.pool, event_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    let local_id = Uuid::new_v4().to_string();
    let draft = invoice_draft(&user, &event, amount, &state.currency, &local_id);
    let issued = state
        .gateway
        .create_invoice(&draft)
        .await
        .map_err(|err| ApiError::Gateway(format!("{err:#}")))?;

    let record = NewInvoice {
        invoice_id: local_id,
        amount: amount as f64 / 100.0,
        user_id: user.id,
        event_id: event.id,
        gateway_invoice_id: issued.id.clone(),
        short_url: issued.short_url.clone(),
    };
    if let Err(err) = db::insert_invoice(&state.pool, &record).await {
        // The gateway invoice already exists; nothing reconciles it.
        error!(?err, gateway_invoice_id = %issued.id, "gateway invoice not recorded locally");
        return Err(err.into());
    }

    info!(
        gateway_invoice_id = %issued.id,
        user_id = user.id,
        event_id = event.id,
        amount,
        "invoice created"
    );
    Ok(Json(CreateInvoiceResponse {
        is_ok: true,
        invoice_id: issued.id,
        invoice_url: issued.short_url,
    }))
}

fn invoice_draft(
    user: &User,
    event: &Event,
    amount_minor: i64,
    currency: &str,
    receipt: &str,
) -> InvoiceDraft {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    InvoiceDraft {
        customer: Customer {
            name: user.name.clone(),
            email: text(&user.email),
            contact: user.mobile_number.clone(),
            billing_address: BillingAddress {
                line1: text(&user.address_line1),
                city: text(&user.city),
                state: text(&user.state),
                zipcode: text(&user.pincode),
                country: "in".to_string(),
            },
        },
        item_name: event.title.clone(),
        amount_minor,
        currency: currency.to_string(),
        description: format!("Registration for {}", event.title),
        receipt: receipt.to_string(),
    }
}
