//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Bearer-token identity middleware
//! - Error to HTTP response mapping
//! - Form-friendly money extractors

pub mod error;
pub mod middleware;
pub mod money;
pub mod routes;

use axum::Router;
use koperasi_core::Clock;
use koperasi_db::{
    LoanRepository, MemberRepository, SavingsRepository, StaffRepository, SweepRepository,
};
use koperasi_shared::JwtService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token validation.
    pub jwt_service: Arc<JwtService>,
    /// Business clock deciding "today".
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Member registry repository.
    #[must_use]
    pub fn members(&self) -> MemberRepository {
        MemberRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Savings ledger repository.
    #[must_use]
    pub fn savings(&self) -> SavingsRepository {
        SavingsRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Loan and installment repository.
    #[must_use]
    pub fn loans(&self) -> LoanRepository {
        LoanRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Auto-sweep repository.
    #[must_use]
    pub fn sweeps(&self) -> SweepRepository {
        SweepRepository::new((*self.db).clone(), self.clock.clone())
    }

    /// Staff repository.
    #[must_use]
    pub fn staff(&self) -> StaffRepository {
        StaffRepository::new((*self.db).clone())
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
