//! JSON-LD resources served by the storefront API.
//!
//! # Design
//! These types mirror the mock-server's schema but are defined independently.
//! Integration tests catch any schema drift between the two crates. Field
//! names follow the API's camelCase; relations are IRIs such as `/people/8`.

use serde::{Deserialize, Serialize};

/// A hydra collection page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T> {
    #[serde(rename = "hydra:member", default = "Vec::new")]
    pub members: Vec<T>,
    #[serde(
        rename = "hydra:totalItems",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub total_items: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub product: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderClient {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: u64,
    pub order_date: String,
    pub status: OrderStatus,
    pub price: f64,
    #[serde(default)]
    pub client: Option<OrderClient>,
}

/// Request payload for creating an invoice against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    pub due_date: String,
    pub payer: String,
    pub status: String,
    pub wallet: String,
    pub payment_type: String,
    pub price: f64,
    pub receiver: String,
    pub order: String,
}

/// An invoice as returned by the API after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "@id")]
    pub iri: String,
    pub id: u64,
    #[serde(flatten)]
    pub fields: NewInvoice,
}

/// Filters for listing sales orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderQuery {
    pub page: u32,
    pub items_per_page: u32,
    /// IRI of the selling party, e.g. `/people/8`.
    pub provider: Option<String>,
    /// Status ids; sent as `status[0]`, `status[1]`, ...
    pub statuses: Vec<u64>,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            page: 1,
            items_per_page: 50,
            provider: None,
            statuses: Vec::new(),
        }
    }
}
