use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::fmt;
use tracing::{info, warn};

use crate::config::Config;

pub mod model;

pub use model::{BillingAddress, Customer, GatewayInvoice, InvoiceDraft};

use model::GatewayErrorBody;

const RAZORPAY_API_BASE: &str = "https://api.razorpay.com/";

/// Invoice-issuing side of the payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<GatewayInvoice>;
}

#[derive(Clone)]
pub struct RazorpayClient {
    http: Client,
    base_url: Url,
    key_id: String,
    key_secret: String,
}

impl fmt::Debug for RazorpayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RazorpayClient")
            .field("base_url", &self.base_url)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl RazorpayClient {
    pub fn new(key_id: String, key_secret: String) -> Result<Self> {
        let base_url = Url::parse(RAZORPAY_API_BASE).context("invalid default gateway URL")?;
        Self::with_base_url(key_id, key_secret, base_url)
    }

    pub fn with_base_url(key_id: String, key_secret: String, base_url: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent("eventdesk/0.1")
            .build()
            .context("failed to build gateway HTTP client")?;
        Ok(Self {
            http,
            base_url,
            key_id,
            key_secret,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let base_url = Url::parse(&cfg.gateway.base_url).context("invalid gateway.base_url")?;
        Self::with_base_url(
            cfg.gateway.key_id.clone(),
            cfg.gateway.key_secret.clone(),
            base_url,
        )
    }

    pub fn build_request(&self, body: &Value) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join("v1/invoices")
            .context("invalid gateway base URL")?;
        self.http
            .post(endpoint)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .header("Content-Type", "application/json")
            .json(body)
            .build()
            .context("failed to build gateway request")
    }

    async fn execute_create(&self, body: Value) -> Result<GatewayInvoice> {
        let request = self.build_request(&body)?;
        let receipt = body["receipt"].as_str().unwrap_or_default();
        info!(url = %request.url(), receipt, "creating gateway invoice");

        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach payment gateway")?;

        let status = res.status();
        let response_body = res
            .text()
            .await
            .context("failed to read gateway response")?;

        if !status.is_success() {
            warn!(%status, body = %response_body, "gateway rejected invoice");
            return Err(anyhow!(describe_gateway_error(status.as_u16(), &response_body)));
        }

        let invoice: GatewayInvoice =
            serde_json::from_str(&response_body).context("invalid gateway response JSON")?;
        info!(invoice_id = %invoice.id, status = %invoice.status, "gateway invoice created");
        Ok(invoice)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    async fn create_invoice(&self, draft: &InvoiceDraft) -> Result<GatewayInvoice> {
        let body = build_invoice_request(draft);
        self.execute_create(body).await
    }
}

/// JSON body for `POST v1/invoices`.
pub fn build_invoice_request(draft: &InvoiceDraft) -> Value {
    let address = &draft.customer.billing_address;
    json!({
        "type": "invoice",
        "description": draft.description,
        "receipt": draft.receipt,
        "currency": draft.currency,
        "sms_notify": 1,
        "email_notify": 1,
        "customer": {
            "name": draft.customer.name,
            "email": draft.customer.email,
            "contact": draft.customer.contact,
            "billing_address": {
                "line1": address.line1,
                "city": address.city,
                "state": address.state,
                "zipcode": address.zipcode,
                "country": address.country,
            }
        },
        "line_items": [
            {
                "name": draft.item_name,
                "amount": draft.amount_minor,
                "currency": draft.currency,
                "quantity": 1,
            }
        ],
    })
}

/// Prefer the gateway's own description; fall back to the raw body.
fn describe_gateway_error(status: u16, body: &str) -> String {
    match serde_json::from_str::<GatewayErrorBody>(body) {
        Ok(parsed) if parsed.error.code.is_empty() => parsed.error.description,
        Ok(parsed) => format!("{}: {}", parsed.error.code, parsed.error.description),
        Err(_) => format!("gateway error {status}: {body}"),
    }
}
