//! Integration tests for the API server.

use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use document_store::InMemoryDocumentStore;
use domain::{EmptyCartPolicy, EngineSettings};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup_with(settings: EngineSettings) -> (axum::Router, InMemoryDocumentStore) {
    let store = InMemoryDocumentStore::new();
    let state = api::create_state(store.clone(), &settings);
    (api::create_app(state, get_metrics_handle()), store)
}

fn setup() -> (axum::Router, InMemoryDocumentStore) {
    setup_with(EngineSettings::default())
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

async fn get(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    send(
        app,
        Request::builder().uri(uri).body(Body::empty()).unwrap(),
    )
    .await
}

async fn send_json(app: &axum::Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    send(
        app,
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
    )
    .await
}

async fn signup(app: &axum::Router, email: &str, phone: &str) -> String {
    let (status, json) = send_json(
        app,
        "POST",
        "/users/signup",
        json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": email,
            "phone": phone,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["user_id"].as_str().unwrap().to_string()
}

async fn add_product(app: &axum::Router, name: &str, cents: i64) -> String {
    let (status, json) = send_json(
        app,
        "POST",
        "/admin/addproduct",
        json!({ "product_name": name, "price": cents, "rating": 4, "image": "x.png" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["product_id"].as_str().unwrap().to_string()
}

fn address_body(city: &str) -> Value {
    json!({
        "house_name": "42",
        "street_name": "Park Lane",
        "city_name": city,
        "pin_code": "110001",
    })
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup();
    let (status, json) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_cart_checkout_flow() {
    let (app, _) = setup();
    let user_id = signup(&app, "flow@example.com", "100").await;
    let laptop = add_product(&app, "Laptop", 250).await;
    let mouse = add_product(&app, "Mouse", 100).await;

    for product_id in [&laptop, &mouse] {
        let (status, json) = get(&app, &format!("/addtocart?id={product_id}&userID={user_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Successfully added to the cart");
    }

    let (status, json) = get(&app, &format!("/listcart?id={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 350);
    assert_eq!(json["userCart"].as_array().unwrap().len(), 2);

    let (status, json) = get(&app, &format!("/cartcheckout?userId={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 350);
    assert!(json["order_id"].as_str().is_some());

    let (status, json) = get(&app, &format!("/listcart?id={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
    assert!(json["userCart"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_remove_item() {
    let (app, _) = setup();
    let user_id = signup(&app, "rm@example.com", "101").await;
    let pen = add_product(&app, "Pen", 150).await;

    get(&app, &format!("/addtocart?id={pen}&userID={user_id}")).await;
    get(&app, &format!("/addtocart?id={pen}&userID={user_id}")).await;

    let (status, _) = get(&app, &format!("/removeitem?id={pen}&userId={user_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = get(&app, &format!("/listcart?id={user_id}")).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_empty_cart_checkout_is_rejected() {
    let (app, _) = setup();
    let user_id = signup(&app, "empty@example.com", "102").await;

    let (status, json) = get(&app, &format!("/cartcheckout?userId={user_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "EMPTY_CART");
}

#[tokio::test]
async fn test_empty_cart_checkout_allowed_by_policy() {
    let (app, _) = setup_with(
        EngineSettings::default().with_empty_cart_policy(EmptyCartPolicy::AllowZeroTotal),
    );
    let user_id = signup(&app, "zero@example.com", "103").await;

    let (status, json) = get(&app, &format!("/cartcheckout?userId={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_instant_buy() {
    let (app, _) = setup();
    let user_id = signup(&app, "instant@example.com", "104").await;
    let book = add_product(&app, "Book", 1_999).await;

    let (status, json) = get(&app, &format!("/instantbuy?id={book}&userId={user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1_999);
}

#[tokio::test]
async fn test_missing_and_malformed_parameters() {
    let (app, _) = setup();
    let product_id = add_product(&app, "Cup", 300).await;

    let (status, json) = get(&app, &format!("/addtocart?id={product_id}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "MISSING_PARAMETER");

    let (status, json) = get(&app, "/listcart?id=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "MISSING_PARAMETER");

    let (status, json) = get(&app, &format!("/addtocart?id={product_id}&userID=nope")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "USER_INVALID");

    let (status, json) = get(&app, "/instantbuy?id=nope&userId=nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "PRODUCT_INVALID");
}

#[tokio::test]
async fn test_unknown_user_and_product() {
    let (app, _) = setup();
    let user_id = signup(&app, "known@example.com", "105").await;
    let product_id = add_product(&app, "Cup", 300).await;
    let ghost = common::UserId::new();
    let missing = common::ProductId::new();

    let (status, json) = get(&app, &format!("/listcart?id={ghost}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "USER_NOT_FOUND");

    let (status, json) = get(&app, &format!("/addtocart?id={product_id}&userID={ghost}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "USER_NOT_FOUND");

    let (status, json) = get(&app, &format!("/addtocart?id={missing}&userID={user_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "PRODUCT_NOT_FOUND");
}

#[tokio::test]
async fn test_address_lifecycle() {
    let (app, _) = setup();
    let user_id = signup(&app, "addr@example.com", "106").await;

    let (status, json) = send_json(
        &app,
        "PUT",
        &format!("/edithomeaddress?id={user_id}"),
        address_body("Pune"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "SLOT_NOT_FOUND");

    for (city, slot) in [("Pune", "home"), ("Mumbai", "work")] {
        let (status, json) = send_json(
            &app,
            "POST",
            &format!("/addaddress?id={user_id}"),
            address_body(city),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["slot"], slot);
    }

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/addaddress?id={user_id}"),
        address_body("Delhi"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "ADDRESS_LIMIT_REACHED");

    let (status, json) = send_json(
        &app,
        "PUT",
        &format!("/editworkaddress?id={user_id}"),
        address_body("Chennai"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["address"]["city_name"], "Chennai");

    let (status, _) = get(&app, &format!("/deleteaddresses?id={user_id}")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/addaddress?id={user_id}"),
        address_body("Goa"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_address_body() {
    let (app, _) = setup();
    let user_id = signup(&app, "badbody@example.com", "107").await;

    let (status, json) = send_json(
        &app,
        "POST",
        &format!("/addaddress?id={user_id}"),
        json!({ "house_name": "1" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_duplicate_signup() {
    let (app, _) = setup();
    signup(&app, "dup@example.com", "108").await;

    let (status, json) = send_json(
        &app,
        "POST",
        "/users/signup",
        json!({
            "first_name": "Ada",
            "last_name": "Byron",
            "email": "other@example.com",
            "phone": "108",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "DUPLICATE_USER");
}

#[tokio::test]
async fn test_catalog_listing_and_search() {
    let (app, _) = setup();
    add_product(&app, "Red Mug", 500).await;
    add_product(&app, "Plate", 700).await;

    let (status, json) = get(&app, "/users/productview").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (status, json) = get(&app, "/users/search?name=mug").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["product_name"], "Red Mug");

    let (status, json) = get(&app, "/users/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "MISSING_PARAMETER");
}

#[tokio::test]
async fn test_store_failure_is_generic_500() {
    let (app, store) = setup();
    let user_id = signup(&app, "boom@example.com", "109").await;
    let product_id = add_product(&app, "Cup", 300).await;

    store.fail_next_updates(1);
    let (status, json) = get(&app, &format!("/addtocart?id={product_id}&userID={user_id}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"]["code"], "UPDATE_FAILED");
    assert_eq!(json["error"]["message"], "internal server error");
}

#[tokio::test]
async fn test_slow_store_is_503() {
    let (app, store) = setup_with(
        EngineSettings::default().with_store_timeout(Duration::from_millis(20)),
    );
    let user_id = signup(&app, "slow@example.com", "110").await;

    store.set_latency(Duration::from_millis(200));
    let (status, json) = get(&app, &format!("/listcart?id={user_id}")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "STORE_TIMEOUT");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let (app, _) = setup();
    let user_id = signup(&app, "metrics@example.com", "111").await;
    let product_id = add_product(&app, "Cup", 300).await;
    get(&app, &format!("/addtocart?id={product_id}&userID={user_id}")).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("cart_items_added_total"));
}
