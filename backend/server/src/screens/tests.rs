use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use gateway::memory::{MemoryGateway, PUBLIC_BASE};
use serde_json::{Value, json};
use tower::ServiceExt;

use crate::{
    config::Config,
    routes,
    screens::status::StatusPolicy,
    state::AppState,
    testing::{
        EMAIL, PASSWORD, app, app_with, body_json, get, location, request, returned_cookie,
        signed_in,
    },
    upload::OrphanPolicy,
};

/// Id `MemoryGateway` hands the account created by `signed_in`.
const STAFF_ID: &str = "user-1";

fn order(id: i64, status: &str) -> Value {
    json!({
        "id": id,
        "created_at": format!("2025-05-{:02}T08:30:00+00:00", id % 28 + 1),
        "customer_info": { "name": "Anna", "phone": "+1 555 0101" },
        "items": [{ "name": "Gate", "quantity": 1, "price": 45000 }],
        "total": 45000,
        "status": status,
        "shipping_method": "pickup",
        "shipping_cost": null,
        "delivery_detail": null
    })
}

fn multipart(file_name: &str, content_type: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    let boundary = "XBOUNDARYX";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={boundary}"), body)
}

fn upload_request(path: &str, cookie: &str, file_name: &str, content_type: &str) -> Request<Body> {
    let (form_type, body) = multipart(file_name, content_type, b"\x89PNG\r\n");

    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, form_type)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_dashboard_counts() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(1, "new"), order(2, "completed")]);
    gateway.seed("products", [json!({ "id": 1, "title": "Grill", "price": 100 })]);

    let res = app(&gateway).oneshot(get("/", Some(&cookie))).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({ "orders": 2, "products": 1, "services": 0, "applications": 0 })
    );
}

#[tokio::test]
async fn test_dashboard_degrades_to_zero() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(1, "new")]);
    gateway.set_tables_unreachable(true);

    let res = app(&gateway).oneshot(get("/", Some(&cookie))).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["orders"], 0);
}

#[tokio::test]
async fn test_login_sets_cookie() {
    let gateway = MemoryGateway::new();
    gateway.add_user(EMAIL, PASSWORD);

    let res = app(&gateway)
        .oneshot(request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": EMAIL, "password": PASSWORD })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/");
    let cookie = returned_cookie(&res).unwrap();
    assert!(cookie.starts_with("admin-session="));

    let res = app(&gateway).oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let gateway = MemoryGateway::new();
    gateway.add_user(EMAIL, PASSWORD);

    let res = app(&gateway)
        .oneshot(request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "email": EMAIL, "password": "nope" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        body_json(res).await["message"],
        "Invalid email or password"
    );
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(Method::POST, "/logout", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/login");
    let set_cookie = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.starts_with("admin-session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_order_status_update() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(42, "new"), order(7, "new")]);

    let res = app(&gateway)
        .oneshot(request(
            Method::PATCH,
            "/orders/42/status",
            Some(&cookie),
            Some(json!({ "status": "processing" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let records = body["records"].as_array().unwrap();
    let updated = records.iter().find(|o| o["id"] == 42).unwrap();
    let untouched = records.iter().find(|o| o["id"] == 7).unwrap();
    assert_eq!(updated["status"], "processing");
    assert_eq!(updated["total"], 45000.0);
    assert_eq!(updated["customer_info"]["name"], "Anna");
    assert_eq!(untouched["status"], "new");
}

#[tokio::test]
async fn test_same_status_is_a_no_op() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(42, "completed")]);
    let mut config = Config::testing();
    config.status_policy = StatusPolicy::ForwardOnly;

    let res = app_with(&gateway, config)
        .oneshot(request(
            Method::PATCH,
            "/orders/42/status",
            Some(&cookie),
            Some(json!({ "status": "completed" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(gateway.rows("orders")[0], order(42, "completed"));
}

#[tokio::test]
async fn test_forward_only_refuses_reopening() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("applications", [json!({
        "id": 3,
        "created_at": "2025-05-14T08:30:00+00:00",
        "name": "Oleg",
        "phone": "+1 555 0102",
        "details": null,
        "status": "rejected"
    })]);
    let mut config = Config::testing();
    config.status_policy = StatusPolicy::ForwardOnly;

    let res = app_with(&gateway, config)
        .oneshot(request(
            Method::PATCH,
            "/applications/3/status",
            Some(&cookie),
            Some(json!({ "status": "new" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(gateway.rows("applications")[0]["status"], "rejected");
}

#[tokio::test]
async fn test_invalid_status_is_rejected() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(42, "new")]);

    let res = app(&gateway)
        .oneshot(request(
            Method::PATCH,
            "/orders/42/status",
            Some(&cookie),
            Some(json!({ "status": "shipped" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(gateway.rows("orders")[0]["status"], "new");
}

#[tokio::test]
async fn test_status_of_missing_record() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PATCH,
            "/orders/99/status",
            Some(&cookie),
            Some(json!({ "status": "processing" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_rows_are_quarantined() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("orders", [order(1, "new"), json!({ "id": 2, "status": "lost" })]);

    let res = app(&gateway)
        .oneshot(get("/orders", Some(&cookie)))
        .await
        .unwrap();

    let body = body_json(res).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);
    assert_eq!(body["quarantined"][0]["row"]["id"], 2);
}

#[tokio::test]
async fn test_read_failure_is_surfaced() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.set_tables_unreachable(true);

    let res = app(&gateway)
        .oneshot(get("/products", Some(&cookie)))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(body_json(res).await["message"].is_string());
}

#[tokio::test]
async fn test_product_lifecycle() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::POST,
            "/products",
            Some(&cookie),
            Some(json!({ "title": "", "price": 100 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.rows("products").is_empty());

    let res = app(&gateway)
        .oneshot(request(
            Method::POST,
            "/products",
            Some(&cookie),
            Some(json!({ "title": "Grill 600", "price": 15000, "is_active": true })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    let product = &body["records"][0];
    assert_eq!(product["title"], "Grill 600");
    assert_eq!(product["weight"], 20000.0);
    let id = product["id"].as_i64().unwrap();

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            &format!("/products/{id}"),
            Some(&cookie),
            Some(json!({ "title": "Grill 800", "price": 18000 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["records"][0]["title"], "Grill 800");

    let res = app(&gateway)
        .oneshot(request(
            Method::DELETE,
            &format!("/products/{id}"),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["records"], json!([]));
}

#[tokio::test]
async fn test_replace_missing_record() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/services/5",
            Some(&cookie),
            Some(json!({ "title": "Bending" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_portfolio_sorted_by_sort_order() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed(
        "portfolio_items",
        [
            json!({ "id": 1, "title": "Stairs", "sort_order": 2 }),
            json!({ "id": 2, "title": "Gate", "sort_order": 1 }),
        ],
    );

    let res = app(&gateway)
        .oneshot(get("/portfolio", Some(&cookie)))
        .await
        .unwrap();

    let body = body_json(res).await;
    assert_eq!(body["records"][0]["title"], "Gate");
    assert_eq!(body["records"][1]["title"], "Stairs");
}

#[tokio::test]
async fn test_upload_png() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(upload_request("/uploads/products", &cookie, "photo.png", "image/png"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let url = body_json(res).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with(&format!("{PUBLIC_BASE}/products/")));
    assert!(url.ends_with(".png"));

    let key = url.rsplit('/').next().unwrap();
    let (token, _) = key.split_once('_').unwrap();
    assert_eq!(token.len(), 13);
    assert_eq!(gateway.object("products", key).unwrap().content_type, "image/png");
}

#[tokio::test]
async fn test_upload_refuses_non_image() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(upload_request("/uploads/products", &cookie, "notes.txt", "text/plain"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.object_keys("products").is_empty());
}

#[tokio::test]
async fn test_upload_to_unknown_bucket() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(upload_request("/uploads/secrets", &cookie, "photo.png", "image/png"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(gateway.object_keys("secrets").is_empty());
}

#[tokio::test]
async fn test_upload_storage_failure() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.set_reject_uploads(true);

    let res = app(&gateway)
        .oneshot(upload_request("/uploads/products", &cookie, "photo.png", "image/png"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.object_keys("products").is_empty());
}

#[tokio::test]
async fn test_deleting_product_removes_images_under_delete_policy() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    let mut config = Config::testing();
    config.orphan_policy = OrphanPolicy::Delete;

    let res = app_with(&gateway, config.clone())
        .oneshot(upload_request("/uploads/products", &cookie, "photo.png", "image/png"))
        .await
        .unwrap();
    let url = body_json(res).await["url"].as_str().unwrap().to_string();
    gateway.seed(
        "products",
        [json!({
            "id": 9,
            "title": "Grill",
            "price": 100,
            "images": [url, "https://elsewhere.test/a.png"]
        })],
    );

    let res = app_with(&gateway, config)
        .oneshot(request(Method::DELETE, "/products/9", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(gateway.object_keys("products").is_empty());
}

#[tokio::test]
async fn test_upload_slot_replace_and_clear() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    let mut config = Config::testing();
    config.orphan_policy = OrphanPolicy::Delete;
    let app = app_with(&gateway, config);

    let res = app.clone()
        .oneshot(upload_request("/uploads/products/cover", &cookie, "a.png", "image/png"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let first = body_json(res).await["url"].as_str().unwrap().to_string();

    let res = app.clone()
        .oneshot(get("/uploads/products/cover", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["preview"], first.as_str());
    assert_eq!(body["uploading"], false);

    let res = app.clone()
        .oneshot(upload_request("/uploads/products/cover", &cookie, "b.png", "image/png"))
        .await
        .unwrap();
    let second = body_json(res).await["url"].as_str().unwrap().to_string();
    let keys = gateway.object_keys("products");
    assert_eq!(keys.len(), 1);
    assert!(second.ends_with(&keys[0]));

    let res = app.clone()
        .oneshot(request(Method::DELETE, "/uploads/products/cover", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["url"], "");
    assert!(gateway.object_keys("products").is_empty());

    let res = app.oneshot(get("/uploads/products/cover", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["preview"], Value::Null);
}

#[tokio::test]
async fn test_upload_slot_opens_on_existing_image() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    let mut config = Config::testing();
    config.orphan_policy = OrphanPolicy::Delete;
    let app = app_with(&gateway, config);

    let res = app.clone()
        .oneshot(upload_request("/uploads/products", &cookie, "old.png", "image/png"))
        .await
        .unwrap();
    let existing = body_json(res).await["url"].as_str().unwrap().to_string();

    let res = app.clone()
        .oneshot(request(
            Method::PUT,
            "/uploads/products/edit-9",
            Some(&cookie),
            Some(json!({ "current": existing })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["preview"], existing.as_str());

    let res = app
        .oneshot(upload_request("/uploads/products/edit-9", &cookie, "new.png", "image/png"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let replacement = body_json(res).await["url"].as_str().unwrap().to_string();
    let keys = gateway.object_keys("products");
    assert_eq!(keys.len(), 1);
    assert!(replacement.ends_with(&keys[0]));
}

#[tokio::test]
async fn test_upload_slot_busy_refuses_changes() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    let state = AppState::new(Config::testing(), gateway.clone());
    let app = routes::router(state.clone());

    let widget = state.uploads.widget(STAFF_ID, "products", "cover");
    let busy = widget.begin().unwrap();

    let res = app.clone()
        .oneshot(get("/uploads/products/cover", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(body_json(res).await["uploading"], true);

    let res = app.clone()
        .oneshot(upload_request("/uploads/products/cover", &cookie, "a.png", "image/png"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app.clone()
        .oneshot(request(Method::DELETE, "/uploads/products/cover", Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert!(gateway.object_keys("products").is_empty());

    drop(busy);
    let res = app
        .oneshot(upload_request("/uploads/products/cover", &cookie, "a.png", "image/png"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_logout_closes_upload_slots() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    let state = AppState::new(Config::testing(), gateway.clone());
    let app = routes::router(state.clone());

    let res = app.clone()
        .oneshot(upload_request("/uploads/products/cover", &cookie, "a.png", "image/png"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(state.uploads.widget(STAFF_ID, "products", "cover").preview().is_some());

    app.oneshot(request(Method::POST, "/logout", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(state.uploads.widget(STAFF_ID, "products", "cover").preview(), None);
}

#[tokio::test]
async fn test_upload_slot_unknown_bucket() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/uploads/secrets/cover",
            Some(&cookie),
            Some(json!({ "current": "" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calculator_defaults_and_round_trip() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(get("/calculator", Some(&cookie)))
        .await
        .unwrap();
    let body = body_json(res).await;
    assert_eq!(body["settings"]["rate_mig"], 500.0);
    assert_eq!(body["settings"]["mult_titanium"], 3.0);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/calculator",
            Some(&cookie),
            Some(json!({ "rate_mig": 512.75, "mult_aluminum": 1.35 })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["written"], "batched");
    assert_eq!(body["settings"]["rate_mig"], 512.75);
    assert_eq!(body["settings"]["mult_aluminum"], 1.35);
    assert_eq!(body["settings"]["rate_tig"], 800.0);
}

#[tokio::test]
async fn test_calculator_falls_back_per_key() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.seed("calculator_settings", [json!({ "key": "rate_tig", "value": 800 })]);
    gateway.set_reject_upserts(true);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/calculator",
            Some(&cookie),
            Some(json!({ "rate_tig": 950 })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["written"], "per_key");
    assert_eq!(body["settings"]["rate_tig"], 950.0);
}

#[tokio::test]
async fn test_calculator_stores_full_precision_values() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let req = Request::builder()
        .method(Method::PUT)
        .uri("/calculator")
        .header(header::COOKIE, &cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"rate_mig":912.6760726776201,"mult_titanium":3857.6829194149445}"#))
        .unwrap();
    let res = app(&gateway).oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let stored = |key: &str| {
        gateway
            .rows("calculator_settings")
            .into_iter()
            .find(|row| row["key"] == key)
            .and_then(|row| row["value"].as_f64())
            .unwrap()
    };
    assert_eq!(stored("rate_mig").to_bits(), 912.6760726776201_f64.to_bits());
    assert_eq!(stored("mult_titanium").to_bits(), 3857.6829194149445_f64.to_bits());

    let body = body_json(res).await;
    assert_eq!(
        body["settings"]["rate_mig"].as_f64().unwrap().to_bits(),
        912.6760726776201_f64.to_bits()
    );
}

#[tokio::test]
async fn test_calculator_fallback_refuses_keys_without_rows() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);
    gateway.set_reject_upserts(true);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/calculator",
            Some(&cookie),
            Some(json!({ "rate_tig": 950 })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = body_json(res).await;
    assert!(body["message"].as_str().unwrap().contains("rate_tig"));
    assert!(gateway.rows("calculator_settings").is_empty());
}

#[tokio::test]
async fn test_calculator_rejects_out_of_range() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/calculator",
            Some(&cookie),
            Some(json!({ "mult_steel": 0.5, "mult_titanium": 0.5 })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.rows("calculator_settings").is_empty());
}

#[tokio::test]
async fn test_content_section_save() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/content/home_hero",
            Some(&cookie),
            Some(json!({ "title": "NEW TITLE", "subtitle": "Sub", "buttonText": "Go" })),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["content"]["home_hero"]["title"], "NEW TITLE");
    assert_eq!(body["content"]["home_hero"]["buttonText"], "Go");

    let rows = gateway.rows("cms_content");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["key"], "home_hero");
    assert!(rows[0]["updated_at"].is_string());
}

#[tokio::test]
async fn test_content_rejects_unknown_and_misshapen() {
    let gateway = MemoryGateway::new();
    let cookie = signed_in(&gateway);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/content/footer",
            Some(&cookie),
            Some(json!({ "title": "x" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = app(&gateway)
        .oneshot(request(
            Method::PUT,
            "/content/about_page",
            Some(&cookie),
            Some(json!({ "title": "About" })),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(gateway.rows("cms_content").is_empty());
}
