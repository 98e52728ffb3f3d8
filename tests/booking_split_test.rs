mod common;

use axum::http::{Method, StatusCode};
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::TestApp;

async fn advance(app: &TestApp, actor: &str, bill: &str, target: &str) -> Value {
    app.request_json(
        Method::POST,
        &format!("/api/v1/orders/{bill}/advance"),
        Some(json!({"actor_id": actor, "target_status": target})),
        StatusCode::OK,
    )
    .await
}

#[tokio::test]
async fn suit_booking_emits_two_independent_orders() {
    let app = TestApp::new();
    app.seed_crew();
    let customer = app.seed_customer("Ramesh", "9811111111");

    let body = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "actor_id": "MGR001",
                "customer_id": customer,
                "items": [{"item": "Suit", "price": "6000", "fabric_meters": "6"}],
                "advance_amount": "2000",
                "delivery_date": "2026-09-01",
            })),
            StatusCode::CREATED,
        )
        .await;

    let orders = body["data"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    let coat = &orders[0];
    let pant = &orders[1];

    assert_eq!(coat["garment"], "Coat");
    assert_eq!(pant["garment"], "Pant");

    // Alphabetic sub-suffixes, never numeric.
    let coat_bill = coat["bill_number"].as_str().unwrap();
    let pant_bill = pant["bill_number"].as_str().unwrap();
    assert!(coat_bill.ends_with("-COAT-A"), "got {coat_bill}");
    assert!(pant_bill.ends_with("-PANT-B"), "got {pant_bill}");

    // Proportional halves of price, advance and fabric.
    for order in [coat, pant] {
        assert_eq!(TestApp::decimal(&order["payment"]["total_amount"]), dec!(3000));
        assert_eq!(TestApp::decimal(&order["payment"]["advance_amount"]), dec!(1000));
        assert_eq!(TestApp::decimal(&order["payment"]["pending_amount"]), dec!(2000));
        assert_eq!(TestApp::decimal(&order["fabric_meters"]), dec!(3));
    }

    // Each part carries its own PIN.
    let coat_pin = app.state.services.orders.get(coat_bill).unwrap().handover_pin;
    let pant_pin = app.state.services.orders.get(pant_bill).unwrap().handover_pin;
    assert!(coat_pin.is_some());
    assert!(pant_pin.is_some());
}

#[tokio::test]
async fn split_orders_progress_independently_with_different_routes() {
    let app = TestApp::new();
    app.seed_crew();
    let customer = app.seed_customer("Ramesh", "9811111111");

    let body = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "actor_id": "MGR001",
                "customer_id": customer,
                "items": [{"item": "Suit", "price": "6000", "fabric_meters": "6"}],
                "advance_amount": "6000",
                "delivery_date": "2026-09-01",
            })),
            StatusCode::CREATED,
        )
        .await;
    let coat_bill = body["data"][0]["bill_number"].as_str().unwrap().to_string();
    let pant_bill = body["data"][1]["bill_number"].as_str().unwrap().to_string();

    // Drive only the pant; the coat must not move.
    advance(&app, "MSR001", &pant_bill, "CUTTING").await;
    advance(&app, "CUT001", &pant_bill, "STITCHING").await;
    // The pant skips kaj button entirely.
    advance(&app, "STC001", &pant_bill, "FINISHING").await;

    let coat = app
        .request_json(Method::GET, &format!("/api/v1/orders/{coat_bill}"), None, StatusCode::OK)
        .await;
    assert_eq!(coat["data"]["status"], "MEASUREMENT");

    // The coat goes through kaj button on its own schedule.
    advance(&app, "MSR001", &coat_bill, "CUTTING").await;
    advance(&app, "CUT001", &coat_bill, "STITCHING").await;
    advance(&app, "STC001", &coat_bill, "KAJ_BUTTON").await;
    advance(&app, "KAJ001", &coat_bill, "FINISHING").await;

    let pant = app
        .request_json(Method::GET, &format!("/api/v1/orders/{pant_bill}"), None, StatusCode::OK)
        .await;
    assert_eq!(pant["data"]["status"], "FINISHING");
}

#[tokio::test]
async fn kurta_pyjama_set_splits_into_its_named_parts() {
    let app = TestApp::new();
    app.seed_crew();
    let customer = app.seed_customer("Ramesh", "9811111111");

    let body = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "actor_id": "MGR001",
                "customer_id": customer,
                "items": [{"item": "KurtaPyjamaSet", "price": "2400", "fabric_meters": "5"}],
                "advance_amount": "0",
                "delivery_date": "2026-09-01",
            })),
            StatusCode::CREATED,
        )
        .await;
    let orders = body["data"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["garment"], "Kurta");
    assert_eq!(orders[1]["garment"], "Pyjama");
    assert!(orders[0]["bill_number"].as_str().unwrap().contains("-KURTA-"));
    assert!(orders[1]["bill_number"].as_str().unwrap().contains("-PYJAMA-"));
}

#[tokio::test]
async fn mixed_cart_allocates_advance_proportionally() {
    let app = TestApp::new();
    app.seed_crew();
    let customer = app.seed_customer("Ramesh", "9811111111");

    // Shirt 1000 + Pant 3000, advance 1000 → shirt gets 250, pant gets 750.
    let body = app
        .request_json(
            Method::POST,
            "/api/v1/orders",
            Some(json!({
                "actor_id": "MGR001",
                "customer_id": customer,
                "items": [
                    {"item": {"Single": "Shirt"}, "price": "1000", "fabric_meters": "2"},
                    {"item": {"Single": "Pant"}, "price": "3000", "fabric_meters": "1.5"}
                ],
                "advance_amount": "1000",
                "delivery_date": "2026-09-01",
            })),
            StatusCode::CREATED,
        )
        .await;
    let orders = body["data"].as_array().expect("orders");
    assert_eq!(orders.len(), 2);
    assert_eq!(TestApp::decimal(&orders[0]["payment"]["advance_amount"]), dec!(250));
    assert_eq!(TestApp::decimal(&orders[1]["payment"]["advance_amount"]), dec!(750));
    for order in orders {
        let payment = &order["payment"];
        let total = TestApp::decimal(&payment["total_amount"]);
        let advance = TestApp::decimal(&payment["advance_amount"]);
        let pending = TestApp::decimal(&payment["pending_amount"]);
        assert_eq!(advance + pending, total);
    }
}
