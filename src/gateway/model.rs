use serde::{Deserialize, Serialize};

/// Billing address sent with the gateway customer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BillingAddress {
    pub line1: String,
    pub city: String,
    pub state: String,
    pub zipcode: String,
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub billing_address: BillingAddress,
}

/// Everything the gateway needs to issue an invoice for one event registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub customer: Customer,
    pub item_name: String,
    /// Minor currency units (paise for INR).
    pub amount_minor: i64,
    pub currency: String,
    pub description: String,
    pub receipt: String,
}

/// The subset of the gateway's invoice entity mirrored locally.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct GatewayInvoice {
    pub id: String,
    pub short_url: String,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorBody {
    pub error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct GatewayErrorDetail {
    #[serde(default)]
    pub code: String,
    pub description: String,
}
