#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, Response, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use darzi_api::{
    config::AppConfig,
    events::EventSender,
    models::StaffRole,
    services::accounts::CreateAccountRequest,
    store::Datastore,
    AppState,
};

/// Test harness: a full application state over a fresh in-memory store, with
/// the router driven through `tower::ServiceExt::oneshot`.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        let store = Arc::new(Datastore::new());
        let (event_tx, event_rx) = mpsc::channel(cfg.event_buffer_size);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(darzi_api::events::process_events(event_rx, None));

        let state = AppState::new(cfg, store, event_sender);
        let router = darzi_api::handlers::router(state.clone());
        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Seed one staff account straight through the service layer.
    pub fn seed_account(&self, id: &str, role: StaffRole) {
        self.seed_account_referred(id, role, None);
    }

    pub fn seed_account_referred(&self, id: &str, role: StaffRole, referred_by: Option<&str>) {
        self.state
            .services
            .accounts
            .create(CreateAccountRequest {
                id: id.into(),
                name: format!("{id} staff"),
                mobile: "9876543210".into(),
                email: None,
                role,
                password: None,
                referred_by: referred_by.map(Into::into),
                wallet_pin: None,
            })
            .expect("seed account");
    }

    /// Seed the standard production crew plus the house admin account.
    pub fn seed_crew(&self) {
        for (id, role) in [
            ("ADM001", StaffRole::Admin),
            ("MGR001", StaffRole::Showroom),
            ("MSR001", StaffRole::Measurement),
            ("CUT001", StaffRole::Cutting),
            ("STC001", StaffRole::Stitching),
            ("KAJ001", StaffRole::KajButton),
            ("FIN001", StaffRole::Finishing),
            ("DEL001", StaffRole::Delivery),
        ] {
            self.seed_account(id, role);
        }
    }

    pub fn seed_customer(&self, name: &str, mobile: &str) -> String {
        self.state
            .services
            .customers
            .register(darzi_api::services::customers::RegisterCustomerRequest {
                name: name.into(),
                mobile: mobile.into(),
                address: None,
            })
            .expect("seed customer")
            .id
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        payload: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match payload {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(serde_json::to_vec(&value).expect("serialize payload"))
            }
            None => Body::empty(),
        };
        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("route request")
    }

    /// Parse a JSON string field (decimals serialize as strings) into a
    /// `Decimal` for scale-insensitive comparisons.
    pub fn decimal(value: &Value) -> rust_decimal::Decimal {
        value
            .as_str()
            .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
            .parse()
            .expect("parse decimal")
    }

    /// Issue a request and parse the JSON body, asserting the status.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        payload: Option<Value>,
        expected: StatusCode,
    ) -> Value {
        let response = self.request(method, uri, payload).await;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        assert_eq!(status, expected, "unexpected status; body: {value}");
        value
    }
}
