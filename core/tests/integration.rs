//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `ApiClient` over
//! `UreqTransport` so header, token, query and body handling are checked
//! against a real HTTP stack.

use std::net::SocketAddr;
use std::sync::Arc;

use storefront_core::{
    ApiClient, ApiError, ClientConfig, HttpMethod, MemoryStore, NewInvoice, OrderQuery,
    RequestOptions, Session, SessionProvider, StaticSession, StoredSession, UreqTransport,
    LD_JSON, SESSION_KEY,
};
use ureq::http::Request;

const TOKEN: &str = "integration-token";

/// Start the mock server on its own thread and runtime.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, TOKEN).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr, sessions: Arc<dyn SessionProvider>) -> ApiClient<UreqTransport> {
    let config = ClientConfig::new(&format!("http://{addr}"), "shop.example.com");
    ApiClient::from_config(&config, sessions)
}

fn token_session(token: &str) -> Arc<dyn SessionProvider> {
    Arc::new(StaticSession(Some(Session {
        token: Some(token.to_string()),
        api_key: None,
    })))
}

fn invoice() -> NewInvoice {
    NewInvoice {
        due_date: "2024-03-21".to_string(),
        payer: "/people/7".to_string(),
        status: "/statuses/37".to_string(),
        wallet: "/wallets/3".to_string(),
        payment_type: "/payment_types/4".to_string(),
        price: 80.0,
        receiver: "/people/8".to_string(),
        order: "orders/101".to_string(),
    }
}

#[tokio::test]
async fn storefront_flow() {
    let addr = start_server();

    // Session persisted by the login screen, in the prefixed format.
    let store = MemoryStore::new();
    store
        .set(SESSION_KEY, format!(r#"__q_objt|{{"token":"{TOKEN}","people":[8]}}"#))
        .await;
    let client = client(addr, Arc::new(StoredSession::new(store.clone())));

    // Step 1: products.
    let products = client.list_products().await.unwrap();
    assert_eq!(products.total_items, Some(3));
    assert_eq!(products.members[0].product, "Espresso");

    // Step 2: sales orders waiting payment for provider 8.
    let query = OrderQuery {
        provider: Some("/people/8".to_string()),
        statuses: vec![6],
        ..OrderQuery::default()
    };
    let orders = client.list_sales_orders(&query).await.unwrap();
    assert_eq!(orders.members.len(), 1);
    assert_eq!(orders.members[0].id, 101);
    assert_eq!(
        orders.members[0].client.as_ref().map(|c| c.name.as_str()),
        Some("Ana Souza")
    );

    // Step 3: invoice for that order.
    let created = client.create_invoice(&invoice()).await.unwrap();
    assert_eq!(created.iri, "/invoices/1");
    assert_eq!(created.fields, invoice());

    // Step 4: plain post through fetch returns the raw response.
    let response = client.post("/invoices", &invoice()).await.unwrap().unwrap();
    assert_eq!(response.status, 201);
    assert_eq!(response.header("content-type"), Some(LD_JSON));

    // Step 5: unknown product maps to NotFound.
    let err = client
        .try_fetch("/products/999", RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));

    // Step 6: logout; fetch now swallows the rejection, try_fetch reports it.
    store.remove(SESSION_KEY).await;
    let dropped = client.fetch("/products", RequestOptions::new()).await.unwrap();
    assert!(dropped.is_none());
    let err = client.list_products().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { status: 401, ref message } if message == "Unauthorized"));
}

#[tokio::test]
async fn invalid_credentials_are_swallowed_by_fetch() {
    let addr = start_server();
    let client = client(addr, token_session("stale"));

    let resp = client
        .fetch("/orders", RequestOptions::new().param("page", 1))
        .await
        .unwrap();
    assert!(resp.is_none());

    let err = client
        .try_post("/invoices", &invoice())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { ref message, .. } if message == "Invalid credentials."));
}

#[tokio::test]
async fn validation_errors_carry_server_message() {
    let addr = start_server();
    let client = client(addr, token_session(TOKEN));

    let mut bad = invoice();
    bad.price = 0.0;
    let err = client.create_invoice(&bad).await.unwrap_err();
    match err {
        ApiError::Http { status, message, .. } => {
            assert_eq!(status, 422);
            assert_eq!(message, "price: This value should be positive.");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn execute_skips_client_headers() {
    let addr = start_server();
    let client = client(addr, token_session(TOKEN));

    // Sent without App-Domain or API-TOKEN: the server sees a bare request.
    let raw = Request::builder()
        .method(HttpMethod::Post.as_str())
        .uri(format!("http://{addr}/invoices"))
        .body(serde_json::to_string(&invoice()).unwrap())
        .unwrap();
    let response = client.execute(raw).await.unwrap();
    assert_eq!(response.status().as_u16(), 400);
    assert!(response.body().contains("Missing App-Domain header"));
}

#[tokio::test]
async fn params_with_spaces_and_utf8_reach_the_server() {
    let addr = start_server();
    let client = client(addr, token_session(TOKEN));

    let response = client
        .fetch("/products", RequestOptions::new().param("product", "pão de queijo"))
        .await
        .unwrap()
        .unwrap();
    let page: storefront_core::Collection<storefront_core::Product> = response.json().unwrap();
    assert_eq!(page.total_items, Some(1));
    assert_eq!(page.members[0].product, "Pão de queijo");

    let response = client
        .fetch("/products", RequestOptions::new().param("product", "a b"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn transport_failure_propagates() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client = client(addr, token_session(TOKEN));

    let err = client
        .fetch("/products", RequestOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
