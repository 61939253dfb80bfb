use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{accounts, auctions, chits, health, members, reports};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        // Members
        .route("/members", get(members::list_members).post(members::create_member))
        .route("/members/{id}", get(members::get_member))
        .route("/members/{id}/deactivate", post(members::deactivate_member))
        // Chit groups
        .route("/chits", get(chits::list_chits).post(chits::create_chit))
        .route("/chits/{id}", get(chits::get_chit))
        .route(
            "/chits/{id}/members",
            get(chits::list_memberships).post(chits::add_membership),
        )
        .route(
            "/chits/{id}/members/{member_id}",
            delete(chits::remove_membership),
        )
        .route("/chits/{id}/months", get(chits::list_months))
        .route("/chits/{id}/months/{n}", put(chits::record_month_result))
        // Auctions
        .route(
            "/auctions",
            get(auctions::list_auctions).post(auctions::schedule_auction),
        )
        .route("/auctions/bid", post(auctions::place_bid))
        .route("/auctions/{id}", get(auctions::get_auction))
        .route("/auctions/{id}/open", post(auctions::open_auction))
        .route("/auctions/{id}/close", post(auctions::close_auction))
        .route("/auctions/{id}/cancel", post(auctions::cancel_auction))
        // Accounts
        .route("/accounts/ledger", get(accounts::get_ledger))
        .route("/accounts/ledger/adjustment", post(accounts::create_adjustment))
        .route("/accounts/dashboard", get(accounts::get_dashboard))
        .route(
            "/accounts/dues/{chit_id}/{month_number}",
            post(accounts::generate_dues),
        )
        .route(
            "/accounts/payments",
            get(accounts::list_payments).post(accounts::record_payment),
        )
        .route("/accounts/payments/{id}", get(accounts::get_payment))
        .route("/accounts/payment-preview", get(accounts::preview_payment))
        .route("/accounts/members/{id}", get(accounts::get_member_account))
        .route("/accounts/defaulters", get(accounts::get_defaulters))
        .route("/accounts/defaulters/stats", get(accounts::get_defaulter_stats))
        // Reports
        .route("/reports/profit", get(reports::get_profit_summary))
        .route("/reports/profit/chits/{id}", get(reports::get_chit_profit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
