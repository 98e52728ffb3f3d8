//! darzi-api
//!
//! Backend engine for a bespoke tailoring house: order intake and the
//! production workflow (measurement → cutting → stitching → kaj button →
//! finishing → delivery), staff wallets over an append-only ledger,
//! piece-rate payouts with a six-level referral cascade, and a capped
//! profit-sharing investment pool.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::handlers::AppServices;
use crate::store::Datastore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<Datastore>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<Datastore>, event_sender: EventSender) -> Self {
        let services = AppServices::new(store.clone(), event_sender.clone(), &config);
        Self {
            config,
            store,
            event_sender,
            services,
        }
    }
}

/// Standard response envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Common listing filters accepted by collection endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub role: Option<models::StaffRole>,
    pub status: Option<models::OrderStatus>,
    pub assigned_worker_id: Option<String>,
    pub customer_id: Option<String>,
    pub account_id: Option<String>,
}
