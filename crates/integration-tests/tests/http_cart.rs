//! End-to-end storefront API flows against a fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use sanital_integration_tests::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, FakeBackend, PASSWORD, TestClient, checkout_form,
};
use sanital_storefront::storage::{KeyValueStorage, MemoryStorage};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);
    let (status, body) = client.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    // The record without an id is skipped
    let (status, products) = client.get("/api/products").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 3);
    assert_eq!(products[0]["id"], json!("P1"));
    assert_eq!(products[0]["price"], json!(10.0));
    assert_eq!(products[0]["price_formatted"], json!("€10.00"));
    assert_eq!(products[0]["image"], json!("/img/p1.jpg"));
    assert_eq!(products[1]["id"], json!("2"));

    let (_, filtered) = client.get("/api/products?category=Detergenti").await;
    assert_eq!(filtered.as_array().unwrap().len(), 2);

    let (_, found) = client.get("/api/products?q=guanti").await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    let (_, too_short) = client.get("/api/products?q=gu").await;
    assert!(too_short.as_array().unwrap().is_empty());

    let (_, featured) = client.get("/api/products/featured").await;
    assert_eq!(featured.as_array().unwrap().len(), 2);

    let (_, categories) = client.get("/api/products/categories").await;
    assert_eq!(
        categories,
        json!([{"name": "Detergenti", "count": 2}, {"name": "Protezione", "count": 1}])
    );

    // Served from the cached list
    assert_eq!(backend.recorded(|r| r.product_requests), 1);

    let (status, _) = client.get("/api/products/P404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cart_flow() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let (status, cart) = client
        .post("/api/cart/add", json!({"product_id": "P1", "quantity": 2}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], json!(2));
    assert_eq!(cart["total_price"], json!(20.0));

    let (_, cart) = client.post("/api/cart/add", json!({"product_id": "P1"})).await;
    assert_eq!(cart["total_items"], json!(3));
    assert_eq!(cart["subtotal"], json!("€30.00"));
    assert_eq!(cart["items"].as_array().unwrap().len(), 1);

    let (_, cart) = client.post("/api/cart/add", json!({"product_id": "2"})).await;
    assert_eq!(cart["total_price"], json!(34.5));

    let (_, count) = client.get("/api/cart/count").await;
    assert_eq!(count, json!({"count": 4}));

    let (_, cart) = client
        .post("/api/cart/update", json!({"product_id": "P1", "quantity": 0}))
        .await;
    assert_eq!(cart["total_items"], json!(1));

    let (_, cart) = client.post("/api/cart/remove", json!({"product_id": "2"})).await;
    assert_eq!(cart["items"], json!([]));
    assert_eq!(cart["total_price"], json!(0.0));
}

#[tokio::test]
async fn test_cart_rejects_unknown_product_and_zero_quantity() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let (status, body) = client.post("/api/cart/add", json!({"product_id": "nope"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = client
        .post("/api/cart/add", json!({"product_id": "P1", "quantity": 0}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, cart) = client.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(0));
}

#[tokio::test]
async fn test_carts_are_per_visitor_and_persisted() {
    let backend = FakeBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let mut client = TestClient::with_storage(&backend, storage.clone());

    client
        .post("/api/cart/add", json!({"product_id": "P3", "quantity": 2}))
        .await;

    let keys = storage.keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("sanital_cart:"));
    let blob: serde_json::Value =
        serde_json::from_str(&storage.get(&keys[0]).unwrap().unwrap()).unwrap();
    assert_eq!(blob[0]["product"]["id"], json!("P3"));
    assert_eq!(blob[0]["quantity"], json!(2));

    // A new visitor starts empty
    client.forget_session();
    let (_, cart) = client.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(0));

    // Another storefront over the same storage leaves existing carts alone
    let mut other = TestClient::with_storage(&backend, storage.clone());
    other
        .post("/api/cart/add", json!({"product_id": "P1"}))
        .await;
    assert_eq!(storage.keys().len(), 2);
    assert_eq!(client.storage.keys(), storage.keys());
}

#[tokio::test]
async fn test_cart_survives_storefront_restart() {
    let backend = FakeBackend::start().await;
    let storage = Arc::new(MemoryStorage::new());
    let mut before = TestClient::with_storage(&backend, storage.clone());

    let (_, health) = before.get("/health").await;
    assert_eq!(health, json!("ok"));
    assert!(before.cookie("sanital_cart_id").is_none());

    before
        .post("/api/cart/add", json!({"product_id": "P3", "quantity": 2}))
        .await;
    let cart_id = before.cookie("sanital_cart_id").unwrap().to_string();

    // A fresh app over the same storage, same browser cookies
    let mut after = TestClient::with_storage(&backend, storage.clone());
    after.adopt_cookies(&before);
    let (status, cart) = after.get("/api/cart").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], json!(2));
    assert_eq!(cart["items"][0]["product"]["id"], json!("P3"));
    assert_eq!(after.cookie("sanital_cart_id"), Some(cart_id.as_str()));

    // Logging in does not replace the cart
    after.login(CUSTOMER_EMAIL).await;
    let (_, cart) = after.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(2));
    assert_eq!(storage.keys(), vec![format!("sanital_cart:{cart_id}")]);
}

#[tokio::test]
async fn test_malformed_cart_cookie_replaced() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let request = Request::builder()
        .uri("/api/cart")
        .header(header::COOKIE, "sanital_cart_id=../../etc/passwd")
        .body(Body::empty())
        .unwrap();
    let (status, cart) = client.send_request(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["total_items"], json!(0));

    let issued = client.cookie("sanital_cart_id").unwrap();
    assert!(uuid::Uuid::parse_str(issued).is_ok());
}

#[tokio::test]
async fn test_login_and_me() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let (status, _) = client.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = client
        .post(
            "/api/auth/login",
            json!({"email": CUSTOMER_EMAIL, "password": "wrong"}),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Customer tokens carry no role, so it comes from the profile
    let user = client.login(CUSTOMER_EMAIL).await;
    assert_eq!(user["id"], json!("u-customer"));
    assert_eq!(user["role"], json!("user"));
    assert!(user.get("token").is_none());

    let (status, me) = client.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], json!(CUSTOMER_EMAIL));

    let (status, _) = client.post("/api/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = client.get("/api/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_validation() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let form = |password: &str, confirm: &str| {
        json!({
            "first_name": "Mario", "last_name": "Rossi", "email": CUSTOMER_EMAIL,
            "password": password, "confirm_password": confirm
        })
    };

    let (status, body) = client.post("/api/auth/register", form("segreto", "altro1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("passwords do not match"));

    let (status, _) = client.post("/api/auth/register", form("abc", "abc")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client.post("/api/auth/register", form(PASSWORD, PASSWORD)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_checkout_places_order_and_clears_cart() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    client
        .post("/api/cart/add", json!({"product_id": "P1", "quantity": 2}))
        .await;

    let (status, _) = client.post("/api/checkout", checkout_form()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging in keeps the cart
    client.login(CUSTOMER_EMAIL).await;
    let (_, cart) = client.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(2));

    let (status, placed) = client.post("/api/checkout", checkout_form()).await;
    assert_eq!(status, StatusCode::CREATED, "{placed}");
    assert_eq!(placed["order_id"], json!("order-1"));
    assert_eq!(placed["payment_method"], json!("bank_transfer"));

    let order = backend.recorded(|r| r.orders[0].clone());
    assert_eq!(order["products"], json!([{"product": "P1", "quantity": 2, "price": 10.0}]));
    assert_eq!(order["shippingAddress"]["country"], json!("Italia"));
    assert_eq!(order["shippingAddress"]["fullName"], json!("Mario Rossi"));
    assert_eq!(order["billingAddress"], order["shippingAddress"]);
    assert_eq!(order["payment"], json!({"method": "bank_transfer", "status": "pending"}));
    assert_eq!(order["financials"]["grandTotal"], json!(20.0));
    assert_eq!(order["notes"], json!("Citofono 3"));

    let (_, cart) = client.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(0));

    let (status, body) = client.post("/api/checkout", checkout_form()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("cart is empty"));
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let backend = FakeBackend::start_failing_orders().await;
    let mut client = TestClient::new(&backend);

    client.login(CUSTOMER_EMAIL).await;
    client
        .post("/api/cart/add", json!({"product_id": "P3", "quantity": 1}))
        .await;

    let (status, body) = client.post("/api/checkout", checkout_form()).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], json!("External service error"));

    let (_, cart) = client.get("/api/cart").await;
    assert_eq!(cart["total_items"], json!(1));
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);

    let (status, _) = client
        .send(Method::DELETE, "/api/admin/products/P1", None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    client.login(CUSTOMER_EMAIL).await;
    let (status, _) = client
        .send(Method::DELETE, "/api/admin/products/P1", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    client.forget_session();
    let admin = client.login(ADMIN_EMAIL).await;
    assert_eq!(admin["is_admin"], json!(true));

    let (status, _) = client
        .send(Method::DELETE, "/api/admin/products/P1", None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(backend.recorded(|r| r.deleted.clone()), vec!["P1".to_string()]);

    let (status, _) = client
        .send(Method::PATCH, "/api/admin/products/P1", Some(json!({})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = client
        .send(
            Method::PATCH,
            "/api/admin/products/P1",
            Some(json!({"price": 11.5, "onHomepage": false})),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

fn multipart_request(csv: &str) -> Request<Body> {
    let boundary = "sanital-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"products.csv\"\r\nContent-Type: text/csv\r\n\r\n{csv}\r\n--{boundary}--\r\n"
    );
    Request::builder()
        .method(Method::POST)
        .uri("/api/admin/products/upload-csv")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_csv_import() {
    let backend = FakeBackend::start().await;
    let mut client = TestClient::new(&backend);
    client.login(ADMIN_EMAIL).await;

    let (status, body) = client
        .send_request(multipart_request("id,name,price\nP9,Nuovo,1\n"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("description"));
    assert!(backend.recorded(|r| r.uploads.is_empty()));

    let csv = "id,name,description,price,category,image_main,image_sub1,image_sub2\nP9,Nuovo,Desc,1,Detergenti,,,\n";
    let (status, body) = client.send_request(multipart_request(csv)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["file"], json!("products.csv"));

    let uploads = backend.recorded(|r| r.uploads.clone());
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].starts_with("multipart/form-data"));
}
