//! HTTP surface. Handlers parse, validate, call the service layer and wrap
//! the result in the [`ApiResponse`](crate::ApiResponse) envelope; no
//! business rule lives here.

pub mod accounts;
pub mod customers;
pub mod health;
pub mod investments;
pub mod notifications;
pub mod orders;
pub mod rates;
pub mod referrals;
pub mod wallet;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    accounts::AccountService, customers::CustomerService, investments::InvestmentService,
    notifications::NotificationService, orders::OrderService, payouts::PayoutService,
    referrals::ReferralService, wallet::WalletService,
};
use crate::store::Datastore;
use crate::AppState;

/// Aggregated services used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub customers: Arc<CustomerService>,
    pub orders: Arc<OrderService>,
    pub payouts: Arc<PayoutService>,
    pub referrals: Arc<ReferralService>,
    pub wallet: Arc<WalletService>,
    pub investments: Arc<InvestmentService>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(store: Arc<Datastore>, event_sender: EventSender, config: &AppConfig) -> Self {
        let referrals = Arc::new(ReferralService::new(store.clone(), event_sender.clone()));
        let payouts = Arc::new(PayoutService::new(
            store.clone(),
            referrals.clone(),
            event_sender.clone(),
            config.referral_deduction_fraction(),
        ));
        let notifications = Arc::new(NotificationService::new(store.clone()));
        let orders = Arc::new(OrderService::new(
            store.clone(),
            payouts.clone(),
            notifications.clone(),
            event_sender.clone(),
            config.house_account_id.clone(),
            config.default_showroom_name.clone(),
        ));
        Self {
            accounts: Arc::new(AccountService::new(store.clone(), event_sender.clone())),
            customers: Arc::new(CustomerService::new(store.clone())),
            orders,
            payouts,
            referrals,
            wallet: Arc::new(WalletService::new(store.clone(), event_sender.clone())),
            investments: Arc::new(InvestmentService::new(store, event_sender)),
            notifications,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/login", post(accounts::login))
        // directory
        .route("/api/v1/accounts", post(accounts::create).get(accounts::list))
        .route(
            "/api/v1/accounts/:id",
            get(accounts::get_one)
                .put(accounts::update)
                .delete(accounts::deactivate),
        )
        .route(
            "/api/v1/accounts/:id/manager-stats",
            get(accounts::manager_stats),
        )
        .route(
            "/api/v1/customers",
            post(customers::register).get(customers::list),
        )
        .route("/api/v1/customers/:id", get(customers::get_one))
        .route(
            "/api/v1/customers/:id/measurements",
            put(customers::update_measurements),
        )
        // orders & workflow
        .route("/api/v1/orders", post(orders::book).get(orders::list))
        .route("/api/v1/orders/:bill", get(orders::get_one).delete(orders::remove))
        .route("/api/v1/orders/:bill/advance", post(orders::advance))
        .route("/api/v1/orders/:bill/force-status", post(orders::force_status))
        .route("/api/v1/orders/:bill/settle", post(orders::settle_payment))
        .route("/api/v1/orders/:bill/handover", post(orders::cash_handover))
        .route("/api/v1/orders/:bill/logs", post(orders::add_log))
        .route(
            "/api/v1/orders/:bill/material-issue",
            post(orders::material_issue),
        )
        .route("/api/v1/orders/:bill/priority", put(orders::set_priority))
        .route("/api/v1/orders/:bill/notes", put(orders::set_notes))
        .route("/api/v1/materials/stock-entry", post(orders::stock_entry))
        // wallets
        .route("/api/v1/wallets/:id/balance", get(wallet::balance))
        .route("/api/v1/wallets/:id/transactions", get(wallet::transactions))
        .route("/api/v1/wallets/:id/add-funds", post(wallet::add_funds))
        .route("/api/v1/wallets/:id/withdraw", post(wallet::withdraw))
        .route("/api/v1/wallets/transfer", post(wallet::transfer))
        // referrals
        .route("/api/v1/referrals/:id/stats", get(referrals::network_stats))
        .route("/api/v1/referrals/:id/team", get(referrals::team))
        .route("/api/v1/referrals/:id/logs", get(referrals::income_logs))
        .route("/api/v1/referrals/:id/claim", post(referrals::claim))
        // investments
        .route(
            "/api/v1/investments",
            post(investments::create).get(investments::list),
        )
        .route(
            "/api/v1/investments/distribute",
            post(investments::distribute),
        )
        // configuration
        .route("/api/v1/rates", get(rates::get_rates).put(rates::update_rates))
        .route(
            "/api/v1/rates/referral-levels",
            get(rates::get_referral_levels).put(rates::update_referral_levels),
        )
        // notifications
        .route(
            "/api/v1/notifications/:id",
            get(notifications::for_account),
        )
        .route(
            "/api/v1/notifications/:id/read",
            post(notifications::mark_read),
        )
        .with_state(state)
}
