use std::{collections::HashMap, sync::Arc};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const LD_JSON: &str = "application/ld+json";
pub const DEFAULT_API_TOKEN: &str = "secret-token";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub product: String,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub price: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub id: u64,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Client {
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesOrder {
    pub id: u64,
    pub order_date: String,
    pub status: Status,
    pub price: f64,
    pub provider: String,
    pub client: Option<Client>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoice {
    pub due_date: String,
    pub payer: String,
    pub status: String,
    pub wallet: String,
    pub payment_type: String,
    pub price: f64,
    pub receiver: String,
    pub order: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "@id")]
    pub iri: String,
    pub id: u64,
    #[serde(flatten)]
    pub fields: CreateInvoice,
}

pub struct Db {
    api_token: String,
    products: Vec<Product>,
    orders: Vec<SalesOrder>,
    invoices: RwLock<Vec<Invoice>>,
}

pub type AppState = Arc<Db>;

pub fn app() -> Router {
    app_with_token(DEFAULT_API_TOKEN)
}

pub fn app_with_token(api_token: &str) -> Router {
    let db: AppState = Arc::new(Db {
        api_token: api_token.to_string(),
        products: seed_products(),
        orders: seed_orders(),
        invoices: RwLock::new(Vec::new()),
    });
    Router::new()
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/orders", get(list_orders))
        .route("/invoices", post(create_invoice))
        .with_state(db)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(listener: TcpListener, api_token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_token(api_token)).await
}

/// A JSON body served as `application/ld+json`.
struct LdJson(Value);

impl IntoResponse for LdJson {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, LD_JSON)], Json(self.0)).into_response()
    }
}

fn failure(status: StatusCode, body: Value) -> Response {
    (status, LdJson(body)).into_response()
}

/// Reject requests without the tenant header or a valid `API-TOKEN`.
fn authorize(db: &Db, headers: &HeaderMap) -> Result<(), Response> {
    if !headers.contains_key("app-domain") {
        return Err(failure(
            StatusCode::BAD_REQUEST,
            json!({"hydra:description": "Missing App-Domain header"}),
        ));
    }
    match headers.get("api-token").and_then(|v| v.to_str().ok()) {
        None => Err(failure(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Unauthorized"}),
        )),
        Some(token) if token != db.api_token => Err(failure(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Invalid credentials."}),
        )),
        Some(_) => Ok(()),
    }
}

fn collection<T: Serialize>(id: &str, context: &str, members: &[T], total: usize) -> LdJson {
    LdJson(json!({
        "@context": format!("/contexts/{context}"),
        "@id": id,
        "@type": "hydra:Collection",
        "hydra:member": members,
        "hydra:totalItems": total,
    }))
}

async fn list_products(
    State(db): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = authorize(&db, &headers) {
        return rejection;
    }
    let needle = params.get("product").map(|p| p.to_lowercase());
    let matching: Vec<&Product> = db
        .products
        .iter()
        .filter(|p| match &needle {
            Some(needle) => p.product.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();
    collection("/products", "Product", &matching, matching.len()).into_response()
}

async fn get_product(
    State(db): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Err(rejection) = authorize(&db, &headers) {
        return rejection;
    }
    match db.products.iter().find(|p| p.id == id) {
        Some(product) => LdJson(json!(product)).into_response(),
        None => failure(StatusCode::NOT_FOUND, json!({"hydra:description": "Not Found"})),
    }
}

async fn list_orders(
    State(db): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Err(rejection) = authorize(&db, &headers) {
        return rejection;
    }

    let page: usize = params.get("page").and_then(|v| v.parse().ok()).unwrap_or(1).max(1);
    let per_page: usize = params
        .get("itemsPerPage")
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
        .max(1);
    let provider = params.get("provider");
    let statuses: Vec<u64> = params
        .iter()
        .filter(|(k, _)| k.starts_with("status["))
        .filter_map(|(_, v)| v.parse().ok())
        .collect();

    let matching: Vec<&SalesOrder> = db
        .orders
        .iter()
        .filter(|o| match provider {
            Some(p) => &o.provider == p,
            None => true,
        })
        .filter(|o| statuses.is_empty() || statuses.contains(&o.status.id))
        .collect();
    let page_items: Vec<&SalesOrder> = matching
        .iter()
        .skip((page - 1).saturating_mul(per_page))
        .take(per_page)
        .copied()
        .collect();

    collection("/orders", "Order", &page_items, matching.len()).into_response()
}

async fn create_invoice(
    State(db): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Err(rejection) = authorize(&db, &headers) {
        return rejection;
    }
    let input: CreateInvoice = match serde_json::from_slice(&body) {
        Ok(input) => input,
        Err(e) => {
            return failure(
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({"hydra:description": e.to_string()}),
            )
        }
    };
    if input.price <= 0.0 {
        return failure(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"hydra:description": "price: This value should be positive."}),
        );
    }

    let mut invoices = db.invoices.write().await;
    let id = invoices.len() as u64 + 1;
    let invoice = Invoice {
        iri: format!("/invoices/{id}"),
        id,
        fields: input,
    };
    invoices.push(invoice.clone());
    (StatusCode::CREATED, LdJson(json!(invoice))).into_response()
}

fn seed_products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            product: "Espresso".to_string(),
            description: Some("Single shot".to_string()),
            kind: "product".to_string(),
            price: 6.5,
        },
        Product {
            id: 2,
            product: "Pão de queijo".to_string(),
            description: None,
            kind: "product".to_string(),
            price: 4.0,
        },
        Product {
            id: 3,
            product: "Delivery".to_string(),
            description: Some("Within 5 km".to_string()),
            kind: "service".to_string(),
            price: 10.0,
        },
    ]
}

fn seed_orders() -> Vec<SalesOrder> {
    let waiting = Status {
        id: 6,
        status: "waiting payment".to_string(),
    };
    let paid = Status {
        id: 7,
        status: "paid".to_string(),
    };
    vec![
        SalesOrder {
            id: 101,
            order_date: "2024-03-18T09:30:00-03:00".to_string(),
            status: waiting.clone(),
            price: 80.0,
            provider: "/people/8".to_string(),
            client: Some(Client {
                name: "Ana Souza".to_string(),
            }),
        },
        SalesOrder {
            id: 102,
            order_date: "2024-03-19T14:10:00-03:00".to_string(),
            status: paid,
            price: 42.5,
            provider: "/people/8".to_string(),
            client: None,
        },
        SalesOrder {
            id: 103,
            order_date: "2024-03-20T11:00:00-03:00".to_string(),
            status: waiting,
            price: 15.0,
            provider: "/people/9".to_string(),
            client: None,
        },
    ]
}
