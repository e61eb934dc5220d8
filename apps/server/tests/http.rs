//! End-to-end tests through the full router against an in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use comanda_db::{Database, DbConfig};
use comanda_server::{build_router, AppState, ServerConfig};

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let mut config = ServerConfig::default();
    config.jwt.secret = "integration-secret".to_string();
    build_router(AppState::new(db, config))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Registers an account and logs in with it.
async fn login(app: &Router, email: &str, role: &str) -> String {
    let (status, _) = call(
        app,
        Method::POST,
        "/api/auth/users",
        None,
        Some(json!({ "name": "Fulano", "email": email, "password": "senha123", "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": email, "password": "senha123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

/// Creates a category and a product, returning the product id.
async fn seed_product(app: &Router, admin: &str, name: &str, price_cents: i64) -> String {
    let (status, category) = call(
        app,
        Method::POST,
        "/api/category",
        Some(admin),
        Some(json!({ "name": "Lanches" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, product) = call(
        app,
        Method::POST,
        "/api/product",
        Some(admin),
        Some(json!({
            "name": name,
            "price_cents": price_cents,
            "category_id": category["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    product["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;
    let (status, body) = call(&app, Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn auth_flow() {
    let app = app().await;

    let (status, body) = call(&app, Method::GET, "/api/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = call(&app, Method::GET, "/api/auth/me", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "garcom@bar.example", "STAFF").await;
    let (status, me) = call(&app, Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "garcom@bar.example");
    assert_eq!(me["role"], "STAFF");
    assert!(me.get("password_hash").is_none());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/auth/session",
        None,
        Some(json!({ "email": "garcom@bar.example", "password": "errada" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn anonymous_sign_up_cannot_pick_admin() {
    let app = app().await;
    let sign_up = |email: &'static str, token: Option<String>| {
        let app = app.clone();
        async move {
            call(
                &app,
                Method::POST,
                "/api/auth/users",
                token.as_deref(),
                Some(json!({ "name": "Fulano", "email": email, "password": "senha123", "role": "ADMIN" })),
            )
            .await
        }
    };

    // first account sets the place up
    let admin = login(&app, "dono@bar.example", "ADMIN").await;

    let (status, user) = sign_up("intruso@bar.example", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "STAFF");

    let (status, user) = sign_up("gerente@bar.example", Some(admin.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["role"], "ADMIN");

    let (status, _) = sign_up("outro@bar.example", Some("not-a-jwt".to_string())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn prices_and_totals_are_bounded() {
    let app = app().await;
    let admin = login(&app, "admin@bar.example", "ADMIN").await;

    let (status, category) = call(
        &app,
        Method::POST,
        "/api/category",
        Some(&admin),
        Some(json!({ "name": "Vinhos" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/product",
        Some(&admin),
        Some(json!({
            "name": "Safra rara",
            "price_cents": 4_611_686_018_427_387_904_i64,
            "category_id": category["id"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // the largest price at the largest quantity still adds up
    let product_id = seed_product(&app, &admin, "Garrafa", 100_000_000).await;
    let (status, order) = call(&app, Method::POST, "/api/order", Some(&admin), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, order) = call(
        &app,
        Method::POST,
        &format!("/api/order/{order_id}/add"),
        Some(&admin),
        Some(json!({ "product_id": product_id, "amount": 999 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["total_cents"], 99_900_000_000_i64);
}

#[tokio::test]
async fn admin_routes_reject_staff() {
    let app = app().await;
    let staff = login(&app, "caixa@bar.example", "STAFF").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/category",
        Some(&staff),
        Some(json!({ "name": "Bebidas" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    // reading is fine
    let (status, _) = call(&app, Method::GET, "/api/category", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_input_is_a_validation_error() {
    let app = app().await;
    let admin = login(&app, "admin@bar.example", "ADMIN").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/category")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, "/api/order/42", Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid order id");

    let (status, body) = call(&app, Method::GET, "/api/public/order/detail", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn order_lifecycle() {
    let app = app().await;
    let admin = login(&app, "admin@bar.example", "ADMIN").await;
    let product_id = seed_product(&app, &admin, "X-Salada", 2_250).await;

    let (status, table) = call(
        &app,
        Method::POST,
        "/api/table",
        Some(&admin),
        Some(json!({ "number": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // customer scans the QR code and opens an order
    let qr = table["qr_code"].as_str().unwrap();
    let (status, _) = call(&app, Method::GET, &format!("/api/table/qr/{qr}"), None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, order) = call(
        &app,
        Method::POST,
        "/api/public/order",
        None,
        Some(json!({ "table": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["draft"], true);
    assert_eq!(order["table_id"], table["id"]);
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, order) = call(
        &app,
        Method::POST,
        "/api/public/order/add",
        None,
        Some(json!({ "order_id": order_id, "product_id": product_id, "amount": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["total_cents"], 4_500);
    assert_eq!(order["items"].as_array().unwrap().len(), 1);

    let (status, order) = call(
        &app,
        Method::PUT,
        &format!("/api/public/order/send?order_id={order_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["draft"], false);

    let (status, orders) = call(
        &app,
        Method::GET,
        "/api/public/order/orders?table=7&draft=false",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    // split the bill in two
    let (status, result) = call(
        &app,
        Method::POST,
        &format!("/api/order/{order_id}/payments"),
        Some(&admin),
        Some(json!({ "payment_method": "PIX", "received_amount_cents": 2_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["remaining_amount_cents"], 2_500);

    let (status, result) = call(
        &app,
        Method::POST,
        &format!("/api/order/{order_id}/payments"),
        Some(&admin),
        Some(json!({ "payment_method": "DINHEIRO", "received_amount_cents": 3_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["remaining_amount_cents"], 0);

    let (status, order) = call(
        &app,
        Method::GET,
        &format!("/api/order/{order_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["finished"], true);

    let (status, receipt) = call(
        &app,
        Method::GET,
        &format!("/api/public/print/receipt/{order_id}?receipt_type=payment"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(receipt["received_amount_cents"], 5_000);
    assert_eq!(receipt["change_cents"], 500);
    assert_eq!(receipt["payment_method"], "PIX");

    // lower-case type in the body, same as the query string
    let (status, printed) = call(
        &app,
        Method::POST,
        "/api/print/receipt",
        Some(&admin),
        Some(json!({ "order_id": order_id, "receipt_type": "payment" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(printed["receipt"]["receipt_type"], "PAYMENT");

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/product/{product_id}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn public_products_hide_disabled() {
    let app = app().await;
    let admin = login(&app, "admin@bar.example", "ADMIN").await;
    let product_id = seed_product(&app, &admin, "Coxinha", 700).await;

    let (status, _) = call(
        &app,
        Method::PUT,
        "/api/product",
        Some(&admin),
        Some(json!({ "id": product_id, "disabled": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, products) = call(&app, Method::GET, "/api/public/products", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(products.as_array().unwrap().is_empty());

    let (status, products) = call(&app, Method::GET, "/api/product", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn cashier_through_alias() {
    let app = app().await;
    let staff = login(&app, "caixa@bar.example", "STAFF").await;

    let (status, body) = call(&app, Method::GET, "/api/caixa/status", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "is_open": false }));

    let (status, cashier) = call(
        &app,
        Method::POST,
        "/api/cashier/open",
        Some(&staff),
        Some(json!({ "initial_amount_cents": 10_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cashier["is_open"], true);

    let order_id = "3f2504e0-4f89-41d3-9a0c-0305e82c3301";
    let (status, payment) = call(
        &app,
        Method::POST,
        "/api/caixa/receive",
        Some(&staff),
        Some(json!({
            "order_id": order_id,
            "amount_cents": 3_500,
            "payment_method": "credito",
            "received_amount_cents": 3_500,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payment["payment_method"], "CARTAO_CREDITO");
    assert_eq!(payment["change_cents"], 0);

    let (status, body) = call(&app, Method::GET, "/api/cashier/status", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_amount_cents"], 13_500);
    assert_eq!(body["total_orders"], 1);

    let (status, movements) =
        call(&app, Method::GET, "/api/cashier/movements", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(movements.as_array().unwrap().len(), 2);

    let (status, metrics) =
        call(&app, Method::GET, "/api/analytics/daily-sales?days=1", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metrics["total_sales_cents"], 3_500);

    let (status, _) = call(&app, Method::POST, "/api/caixa/close", Some(&staff), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, "/api/caixa/close", Some(&staff), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No cashier is open");
}

#[tokio::test]
async fn analytics_range_validation() {
    let app = app().await;
    let staff = login(&app, "gerente@bar.example", "STAFF").await;

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/analytics/range?start=2026-10-10&end=2026-10-01",
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/analytics/daily?date=10/10/2026",
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, series) = call(
        &app,
        Method::GET,
        "/api/analytics/range?start=2026-10-01&end=2026-10-03",
        Some(&staff),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(series["days"].as_array().unwrap().len(), 3);
}
